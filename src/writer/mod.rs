//! The streaming document writer.
//!
//! Everything here appends to one body buffer through [`sink::BodySink`];
//! no byte is ever written twice except through the placeholder patching
//! protocol. Submodules split the writer by lifecycle stage: document
//! begin/finish, page open/close, content emission, outline and annotation
//! objects, and the cross-reference ledger.

pub mod annotations;
pub mod content;
pub mod document;
pub mod outline;
pub mod page;
pub mod sink;
pub(crate) mod xref;

pub use annotations::{AnnotationConfig, AnnotationRef, MarkupKind};
pub use content::{
    Color, GraphicsConfig, ImageHandle, LineCap, LineJoin, RenderMode, TextConfig,
};
pub use document::{Document, DocumentInfo};
pub use outline::BookmarkId;
pub use page::{Page, PageSize};
pub use sink::{BodySink, StreamEncoding};
