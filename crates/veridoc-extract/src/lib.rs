//! Document normalisation and structured field extraction.
//!
//! The extraction contract is the schema boundary, not a specific model:
//! [`FieldExtractor`] is the injectable seam the engine depends on, and
//! [`OpenAiExtractor`] (feature `openai`) is the production implementation
//! driving an OpenAI-compatible chat-completions endpoint with per-type
//! JSON schemas.

mod normalize;
pub use normalize::normalize_to_jpeg;

mod text;
pub use text::extract_pdf_text;

pub mod schema;

#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "openai")]
pub use openai::OpenAiExtractor;

use async_trait::async_trait;
use thiserror::Error;
use veridoc_core::{DocumentType, ExtractedRecord};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode/encode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF text extraction failed: {0}")]
    PdfText(String),

    #[cfg(feature = "pdfium")]
    #[error("PDF rendering failed: {0}")]
    PdfRender(String),

    #[cfg(not(feature = "pdfium"))]
    #[error("PDF rendering unavailable: built without the `pdfium` feature")]
    PdfRenderUnavailable,

    #[cfg(feature = "openai")]
    #[error("extraction request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input handed to the extractor: a normalised image frame or raw text.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Base64-encoded JPEG frame from [`normalize_to_jpeg`].
    Image(String),
    /// Concatenated page text (bank statements only).
    Text(String),
}

/// Structured-extraction capability, polymorphic over the four schemas.
///
/// One remote call per document; no retry or backoff here. A transport
/// failure surfaces to the caller, which treats the document as not yet
/// verified.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(
        &self,
        document_type: DocumentType,
        artifact: Artifact,
    ) -> Result<ExtractedRecord, ExtractError>;
}
