//! Storage layer: ticket/document/customer stores behind trait seams.
//!
//! The engine only ever talks to [`TicketStore`] and [`DocumentStore`];
//! [`MemoryStore`] backs tests and ephemeral runs, [`DuckStore`] (feature
//! `duckdb`) backs persistent deployments.

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

use uuid::Uuid;
use veridoc_core::{
    Customer, DocumentRecord, DocumentType, Ticket, TicketCategory, TicketStatus, Verdict,
};

/// Ticket and customer persistence.
pub trait TicketStore: Send + Sync {
    fn create_customer(&self, customer: &Customer) -> Result<(), StoreError>;

    fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    /// Create a ticket in `Pending` state awaiting document upload.
    fn create_ticket(&self, user_id: Uuid, category: TicketCategory) -> Result<Ticket, StoreError>;

    fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    fn set_all_documents_submitted(&self, id: Uuid) -> Result<(), StoreError>;

    fn set_status(&self, id: Uuid, status: TicketStatus) -> Result<(), StoreError>;
}

/// Per-slot document persistence.
pub trait DocumentStore: Send + Sync {
    /// Insert or replace the document record occupying a slot.
    ///
    /// An existing record for the same (ticket, user) whose storage link
    /// starts with `slot_key` is updated in place (refreshing `modified_at`);
    /// otherwise a new record is inserted. Returns the record id.
    fn upsert_document(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        slot_key: &str,
        document_type: DocumentType,
        storage_link: &str,
        verdict: Verdict,
    ) -> Result<Uuid, StoreError>;

    fn list_documents(&self, ticket_id: Uuid) -> Result<Vec<DocumentRecord>, StoreError>;
}
