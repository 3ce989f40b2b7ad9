use thiserror::Error;
use veridoc_core::{DocumentType, TicketCategory};
use veridoc_extract::ExtractError;
use veridoc_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid ticket id")]
    InvalidTicketId,

    #[error("{category} ticket does not accept {document_type} uploads")]
    DocumentTypeNotAllowed {
        document_type: DocumentType,
        category: TicketCategory,
    },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}
