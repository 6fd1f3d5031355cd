// Drawing onto a loaded base document: page canvases, embedded fonts and the
// text / image compositors. Everything here is synchronous and CPU-bound;
// callers run it inside tokio::task::spawn_blocking where it matters.

pub mod fonts;
pub mod image;
pub mod page;
pub mod text;

use thiserror::Error;

/// Failure confined to a single field. Logged and skipped, never fatal.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: i64, page_count: usize },

    #[error("image not found: {0}")]
    ImageMissing(String),

    #[error("image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("unsupported image encoding")]
    UnsupportedImageEncoding,

    #[error("inline image payload is malformed: {0}")]
    InlinePayload(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for FieldError {
    fn from(e: lopdf::Error) -> Self {
        FieldError::Pdf(e.to_string())
    }
}
