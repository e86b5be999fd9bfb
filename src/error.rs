//! Error types for the PDF generator.
//!
//! Only genuinely recoverable conditions are surfaced as errors; violating an
//! API precondition (opening a page twice, emitting content with no open
//! page, malformed Bézier input) is a programmer bug and is reported by an
//! `assert!` at the call site instead.

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Growing the body or cross-reference buffer failed.
    ///
    /// The document is left in its previous state; no partial bytes are
    /// committed by the failed append.
    #[error("buffer growth failed: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),

    /// IO error while writing the finished document to storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedded font could not be read.
    #[error("font error: {0}")]
    Font(#[from] crate::fonts::TrueTypeError),
}
