//! Single-pass streaming PDF 1.7 generator.
//!
//! `pdf_scribe` writes a document front to back in one pass: every object
//! is appended to a growing body buffer the moment it is created, and its
//! byte offset is recorded in the cross-reference ledger at the same time.
//! The handful of references that cannot be known yet (a page's parent in
//! the page tree, its annotation array) are written as fixed-width
//! placeholder fields and patched in place during finalization, so no
//! already-recorded offset ever moves.
//!
//! # Example
//!
//! ```
//! use pdf_scribe::{Document, PageSize, TextConfig};
//!
//! let mut doc = Document::new()?;
//! doc.begin_page(PageSize::Letter);
//! let title = doc.add_text("Hello, world!", 100.0, 700.0, &TextConfig::default())?;
//! let page = doc.end_page()?;
//! doc.add_bookmark(&page, Some(&title), None, "Greeting");
//! doc.finish()?;
//! assert!(doc.as_bytes().starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_scribe::Error>(())
//! ```
//!
//! # Errors and preconditions
//!
//! Recoverable failures (allocation, IO, unreadable embedded fonts) are
//! surfaced as [`Error`]. API misuse, like opening a page while one is
//! already open or emitting content with no open page, panics at the call
//! site.

#![warn(missing_docs)]

pub mod debug;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod object;
pub mod writer;

pub use debug::{PatchRecord, PatchTrace};
pub use error::{Error, Result};
pub use fonts::{FontMetricsReader, TrueTypeError, TrueTypeResult};
pub use geometry::{Point, Rect};
pub use object::{ContentObject, ObjectRef};
pub use writer::{
    AnnotationConfig, AnnotationRef, BookmarkId, Color, Document, DocumentInfo, GraphicsConfig,
    ImageHandle, LineCap, LineJoin, MarkupKind, Page, PageSize, RenderMode, StreamEncoding,
    TextConfig,
};
