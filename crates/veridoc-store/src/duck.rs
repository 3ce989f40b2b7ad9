//! Embedded DuckDB storage for customers, tickets, and documents.

use std::path::Path;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use tracing::info;
use uuid::Uuid;
use veridoc_core::{
    Customer, DocumentRecord, DocumentType, Ticket, TicketCategory, TicketStatus, Verdict,
};

use crate::{DocumentStore, StoreError, TicketStore};

/// DuckDB store backing persistent deployments.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts.
///
/// All identifiers and timestamps are stored as TEXT (UUID / RFC 3339) so the
/// schema stays portable.
pub struct DuckStore {
    conn: std::sync::Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    /// Create the `customers`, `tickets`, and `documents` tables if absent.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS customers (
                 id          TEXT PRIMARY KEY,
                 first_name  TEXT NOT NULL,
                 last_name   TEXT NOT NULL,
                 email       TEXT NOT NULL,
                 phone       TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tickets (
                 id                       TEXT PRIMARY KEY,
                 user_id                  TEXT NOT NULL,
                 ticket_type              TEXT NOT NULL,
                 status                   TEXT NOT NULL,
                 all_documents_submitted  BOOLEAN NOT NULL,
                 comments                 TEXT NOT NULL,
                 created_at               TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS documents (
                 id             TEXT PRIMARY KEY,
                 ticket_id      TEXT NOT NULL,
                 user_id        TEXT NOT NULL,
                 document_name  TEXT NOT NULL,
                 document_link  TEXT NOT NULL,
                 verification_response TEXT NOT NULL,
                 created_at     TEXT NOT NULL,
                 modified_at    TEXT NOT NULL
             );",
        )?;
        info!("store schema ready");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("store mutex poisoned".into()))
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Other(format!("bad uuid in store: {e}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Other(format!("bad timestamp in store: {e}")))
}

fn parse_stored<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, StoreError> {
    value.parse().map_err(StoreError::Other)
}

impl TicketStore for DuckStore {
    fn create_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO customers (id, first_name, last_name, email, phone)
             VALUES (?, ?, ?, ?, ?)",
            params![
                customer.id.to_string(),
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.phone,
            ],
        )?;
        Ok(())
    }

    fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, email, phone FROM customers WHERE id = ?",
        )?;
        let result = stmt.query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        });
        match result {
            Ok((id, first_name, last_name, email, phone)) => Ok(Some(Customer {
                id: parse_uuid(&id)?,
                first_name,
                last_name,
                email,
                phone,
            })),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
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
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tickets (id, user_id, ticket_type, status, all_documents_submitted, comments, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.id.to_string(),
                ticket.user_id.to_string(),
                ticket.category.as_str(),
                ticket.status.as_str(),
                ticket.all_documents_submitted,
                ticket.comments,
                ticket.created_at.to_rfc3339(),
            ],
        )?;
        info!(ticket_id = %ticket.id, category = %ticket.category, "created ticket");
        Ok(ticket)
    }

    fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, ticket_type, status, all_documents_submitted, comments, created_at
             FROM tickets WHERE id = ?",
        )?;
        let result = stmt.query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        });
        match result {
            Ok((id, user_id, category, status, all_documents_submitted, comments, created_at)) => {
                Ok(Some(Ticket {
                    id: parse_uuid(&id)?,
                    user_id: parse_uuid(&user_id)?,
                    category: parse_stored(&category)?,
                    status: parse_stored(&status)?,
                    all_documents_submitted,
                    comments,
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_all_documents_submitted(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE tickets SET all_documents_submitted = TRUE WHERE id = ?",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("ticket {id}")));
        }
        Ok(())
    }

    fn set_status(&self, id: Uuid, status: TicketStatus) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE tickets SET status = ? WHERE id = ?",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("ticket {id}")));
        }
        Ok(())
    }
}

impl DocumentStore for DuckStore {
    fn upsert_document(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        slot_key: &str,
        document_type: DocumentType,
        storage_link: &str,
        verdict: Verdict,
    ) -> Result<Uuid, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let existing = {
            let mut stmt = conn.prepare(
                "SELECT id FROM documents
                 WHERE ticket_id = ? AND user_id = ? AND document_link LIKE ?",
            )?;
            match stmt.query_row(
                params![
                    ticket_id.to_string(),
                    user_id.to_string(),
                    format!("{slot_key}%"),
                ],
                |row| row.get::<_, String>(0),
            ) {
                Ok(id) => Some(parse_uuid(&id)?),
                Err(duckdb::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(id) = existing {
            conn.execute(
                "UPDATE documents
                 SET document_name = ?, document_link = ?, verification_response = ?, modified_at = ?
                 WHERE id = ?",
                params![
                    document_type.as_str(),
                    storage_link,
                    verdict.as_str(),
                    now,
                    id.to_string(),
                ],
            )?;
            info!(document_id = %id, verdict = %verdict, "replaced document slot");
            return Ok(id);
        }

        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO documents
             (id, ticket_id, user_id, document_name, document_link, verification_response, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                ticket_id.to_string(),
                user_id.to_string(),
                document_type.as_str(),
                storage_link,
                verdict.as_str(),
                now,
                now,
            ],
        )?;
        info!(document_id = %id, verdict = %verdict, "recorded document");
        Ok(id)
    }

    fn list_documents(&self, ticket_id: Uuid) -> Result<Vec<DocumentRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, user_id, document_name, document_link, verification_response,
                    created_at, modified_at
             FROM documents WHERE ticket_id = ?",
        )?;
        let rows = stmt.query_map(params![ticket_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, ticket_id, user_id, name, link, response, created_at, modified_at) = row?;
            documents.push(DocumentRecord {
                id: parse_uuid(&id)?,
                ticket_id: parse_uuid(&ticket_id)?,
                user_id: parse_uuid(&user_id)?,
                document_type: parse_stored(&name)?,
                storage_link: link,
                verdict: parse_stored(&response)?,
                created_at: parse_timestamp(&created_at)?,
                modified_at: parse_timestamp(&modified_at)?,
            });
        }
        Ok(documents)
    }
}
