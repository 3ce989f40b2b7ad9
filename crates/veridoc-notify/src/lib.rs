//! Document-request messaging: per-brand templates and delivery channels.
//!
//! Templates are pure functions over the domain types; the actual senders
//! live behind async traits so the dashboard can swap in test doubles, with
//! reqwest-backed Twilio/Gmail implementations behind the `http` feature.

mod template;
pub use template::{
    document_checklist, tracking_link, upload_request_body, upload_request_subject, Brand,
};

#[cfg(feature = "http")]
mod senders;
#[cfg(feature = "http")]
pub use senders::{GmailSender, TwilioWhatsApp};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

/// Email delivery channel.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// WhatsApp delivery channel.
///
/// On success returns a delivery detail string (message SID or similar).
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    async fn send_whatsapp(&self, to: &str, body: &str) -> Result<String, NotifyError>;
}
