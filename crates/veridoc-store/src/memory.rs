//! Mutex-guarded in-memory store, used by tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;
use veridoc_core::{
    Customer, DocumentRecord, DocumentType, Ticket, TicketCategory, TicketStatus, Verdict,
};

use crate::{DocumentStore, StoreError, TicketStore};

#[derive(Default)]
struct Inner {
    customers: HashMap<Uuid, Customer>,
    tickets: HashMap<Uuid, Ticket>,
    documents: Vec<DocumentRecord>,
}

/// In-memory implementation of both store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Other("store mutex poisoned".into()))
    }
}

impl TicketStore for MemoryStore {
    fn create_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        self.lock()?.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }

    fn create_ticket(&self, user_id: Uuid, category: TicketCategory) -> Result<Ticket, StoreError> {
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id,
            category,
            status: TicketStatus::Pending,
            all_documents_submitted: false,
            comments: "Awaiting document upload".into(),
            created_at: Utc::now(),
        };
        self.lock()?.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock()?.tickets.get(&id).cloned())
    }

    fn set_all_documents_submitted(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let ticket = inner
            .tickets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {id}")))?;
        ticket.all_documents_submitted = true;
        Ok(())
    }

    fn set_status(&self, id: Uuid, status: TicketStatus) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let ticket = inner
            .tickets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {id}")))?;
        ticket.status = status;
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn upsert_document(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        slot_key: &str,
        document_type: DocumentType,
        storage_link: &str,
        verdict: Verdict,
    ) -> Result<Uuid, StoreError> {
        let mut inner = self.lock()?;
        let now = Utc::now();

        if let Some(existing) = inner.documents.iter_mut().find(|d| {
            d.ticket_id == ticket_id
                && d.user_id == user_id
                && d.storage_link.starts_with(slot_key)
        }) {
            existing.document_type = document_type;
            existing.storage_link = storage_link.to_string();
            existing.verdict = verdict;
            existing.modified_at = now;
            return Ok(existing.id);
        }

        let record = DocumentRecord {
            id: Uuid::new_v4(),
            ticket_id,
            user_id,
            document_type,
            storage_link: storage_link.to_string(),
            verdict,
            created_at: now,
            modified_at: now,
        };
        let id = record.id;
        inner.documents.push(record);
        Ok(id)
    }

    fn list_documents(&self, ticket_id: Uuid) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .lock()?
            .documents
            .iter()
            .filter(|d| d.ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}
