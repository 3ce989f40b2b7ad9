//! Domain types shared across the verification pipeline and its stores.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four document kinds the portal accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Payslip,
    BankStatement,
    Passport,
    DrivingLicense,
}

impl DocumentType {
    /// Storage/display name, as persisted in the documents table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payslip => "Payslip",
            Self::BankStatement => "Bank Statement",
            Self::Passport => "Passport",
            Self::DrivingLicense => "Driving License",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payslip" => Ok(Self::Payslip),
            "bank statement" | "bank-statement" | "bankstatement" => Ok(Self::BankStatement),
            "passport" => Ok(Self::Passport),
            "driving license" | "driving-license" | "drivinglicense" | "license" => {
                Ok(Self::DrivingLicense)
            }
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

/// Ticket category: constrains which document types an upload may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketCategory {
    Income,
    Kyc,
    KycAndIncome,
}

impl TicketCategory {
    /// Document types a ticket of this category will accept.
    pub fn allowed_types(&self) -> &'static [DocumentType] {
        match self {
            Self::Income => &[DocumentType::Payslip, DocumentType::BankStatement],
            Self::Kyc => &[DocumentType::Passport, DocumentType::DrivingLicense],
            Self::KycAndIncome => &[
                DocumentType::Payslip,
                DocumentType::BankStatement,
                DocumentType::Passport,
                DocumentType::DrivingLicense,
            ],
        }
    }

    pub fn allows(&self, document_type: DocumentType) -> bool {
        self.allowed_types().contains(&document_type)
    }

    /// Storage name, as persisted in the tickets table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Kyc => "KYC",
            Self::KycAndIncome => "KYC and Income",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "kyc" => Ok(Self::Kyc),
            "kyc and income" | "kyc-and-income" | "both" => Ok(Self::KycAndIncome),
            other => Err(format!("unknown ticket category: {other}")),
        }
    }
}

/// Tri-state outcome of validating one uploaded document.
///
/// An explicit enum rather than the -1/0/1 integers the verdict is sometimes
/// encoded as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The uploaded file is not the declared document kind at all.
    Invalid,
    /// Extraction was incomplete or a business rule failed; ask the user again.
    NeedsReupload,
    /// Every check passed.
    Verified,
}

impl Verdict {
    /// Storage string, as persisted in the documents table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "Incorrect Document",
            Self::NeedsReupload => "Reupload",
            Self::Verified => "Verified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Incorrect Document" => Ok(Self::Invalid),
            "Reupload" => Ok(Self::NeedsReupload),
            "Verified" => Ok(Self::Verified),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Pending,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// One user's pending document-verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: TicketCategory,
    pub status: TicketStatus,
    pub all_documents_submitted: bool,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted record for one uploaded document slot.
///
/// Keyed by (ticket, user, slot): a later upload for the same logical slot
/// overwrites the prior verdict rather than creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub document_type: DocumentType,
    pub storage_link: String,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// CRM customer record owning tickets and documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// The identity extracted names are matched against.
///
/// Resolved from the ticket's owning customer by callers, never assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub first_name: String,
    pub last_name: String,
}

impl ExpectedIdentity {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl From<&Customer> for ExpectedIdentity {
    fn from(customer: &Customer) -> Self {
        Self::new(customer.first_name.clone(), customer.last_name.clone())
    }
}

/// Slot key for a storage link: the link with its final extension stripped.
///
/// Two uploads whose links differ only by extension occupy the same slot.
pub fn slot_key(storage_link: &str) -> &str {
    match storage_link.rfind('.') {
        Some(i) if !storage_link[i..].contains('/') => &storage_link[..i],
        _ => storage_link,
    }
}
