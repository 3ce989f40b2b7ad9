pub mod record;
pub mod rules;
pub mod types;

pub use record::{
    BankStatementRecord, ExtractedRecord, LicenseRecord, PassportRecord, PayslipRecord,
    NULL_SENTINEL,
};
pub use rules::{evaluate, RuleError, RulePolicy};
pub use types::{
    slot_key, Customer, DocumentRecord, DocumentType, ExpectedIdentity, Ticket, TicketCategory,
    TicketStatus, Verdict,
};
