//! Per-brand message templates for document upload requests.

use veridoc_core::{Customer, Ticket, TicketCategory};

/// Portal branding for the company issuing the request.
#[derive(Debug, Clone)]
pub struct Brand {
    pub name: String,
    /// Portal base URL, no trailing slash.
    pub portal_base_url: String,
}

impl Brand {
    pub fn new(name: impl Into<String>, portal_base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            portal_base_url: portal_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Upload-tracking link for a ticket: `<base>/?ticket_id=<uuid>`.
pub fn tracking_link(base_url: &str, ticket_id: uuid::Uuid) -> String {
    format!("{}/?ticket_id={ticket_id}", base_url.trim_end_matches('/'))
}

/// Checklist of the document names a ticket category requires.
pub fn document_checklist(category: TicketCategory) -> String {
    let mut table = String::from("Required Documents:\n");
    for document_type in category.allowed_types() {
        table.push_str(&format!(" -> {document_type}\n"));
    }
    table
}

pub fn upload_request_subject(brand: &Brand) -> String {
    format!("Document Upload Request - {}", brand.name)
}

/// Body of the document-request message: greeting, checklist, tracking link,
/// and ticket number.
pub fn upload_request_body(brand: &Brand, customer: &Customer, ticket: &Ticket) -> String {
    let checklist = document_checklist(ticket.category);
    let link = tracking_link(&brand.portal_base_url, ticket.id);
    format!(
        "Hi {first} {last},\n\n\
         {brand} has reviewed your application and would like to proceed with \
         {category} verification. To continue, please upload the documents listed below:\n\n\
         {checklist}\n\
         Upload link: {link}\n\
         Your ticket number is: {ticket_id}\n\n\
         Thank you",
        first = customer.first_name,
        last = customer.last_name,
        brand = brand.name,
        category = ticket.category,
        checklist = checklist,
        link = link,
        ticket_id = ticket.id,
    )
}
