//! Typed records produced by structured field extraction.
//!
//! One variant per document type, with a single shared notion of "missing
//! field": blank after trimming, or the literal `NULL` sentinel the extraction
//! schemas instruct the model to emit for unidentifiable fields.

use serde::{Deserialize, Serialize};

use crate::types::DocumentType;

/// Sentinel the extraction schemas use for fields the model could not identify.
pub const NULL_SENTINEL: &str = "NULL";

/// Fields extracted from a payslip image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipRecord {
    /// The model's judgement of whether the document is a payslip at all.
    pub verified: bool,
    pub first_name: String,
    pub last_name: String,
    /// Payslip date, `YYYY-MM-DD`.
    pub date: String,
}

/// Fields extracted from bank statement text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatementRecord {
    pub verified: bool,
    pub first_name: String,
    pub last_name: String,
    /// Date of the first transaction in the ledger, `YYYY-MM-DD`.
    pub first_transaction_date: String,
    /// Date of the last transaction in the ledger, `YYYY-MM-DD`.
    pub last_transaction_date: String,
}

/// Fields extracted from a passport image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportRecord {
    pub verified: bool,
    pub first_name: String,
    pub last_name: String,
    /// Passport expiry date, `YYYY-MM-DD`.
    pub expiry_date: String,
    pub nationality: String,
    pub passport_number: String,
}

/// Fields extracted from a driving license image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub verified: bool,
    pub first_name: String,
    pub last_name: String,
    /// License expiry date, `YYYY-MM-DD`.
    pub expiry_date: String,
    pub country: String,
    pub license_number: String,
}

/// Tagged union over the four extraction schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractedRecord {
    Payslip(PayslipRecord),
    BankStatement(BankStatementRecord),
    Passport(PassportRecord),
    License(LicenseRecord),
}

/// Shared seam for the generic missing-field check.
trait TextFields {
    fn text_fields(&self) -> Vec<&str>;
}

impl TextFields for PayslipRecord {
    fn text_fields(&self) -> Vec<&str> {
        vec![&self.first_name, &self.last_name, &self.date]
    }
}

impl TextFields for BankStatementRecord {
    fn text_fields(&self) -> Vec<&str> {
        vec![
            &self.first_name,
            &self.last_name,
            &self.first_transaction_date,
            &self.last_transaction_date,
        ]
    }
}

impl TextFields for PassportRecord {
    fn text_fields(&self) -> Vec<&str> {
        vec![
            &self.first_name,
            &self.last_name,
            &self.expiry_date,
            &self.nationality,
            &self.passport_number,
        ]
    }
}

impl TextFields for LicenseRecord {
    fn text_fields(&self) -> Vec<&str> {
        vec![
            &self.first_name,
            &self.last_name,
            &self.expiry_date,
            &self.country,
            &self.license_number,
        ]
    }
}

fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NULL_SENTINEL)
}

impl ExtractedRecord {
    /// The document type this record was extracted under.
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Payslip(_) => DocumentType::Payslip,
            Self::BankStatement(_) => DocumentType::BankStatement,
            Self::Passport(_) => DocumentType::Passport,
            Self::License(_) => DocumentType::DrivingLicense,
        }
    }

    /// The model's stated boolean for "is this the expected document kind".
    pub fn verified(&self) -> bool {
        match self {
            Self::Payslip(r) => r.verified,
            Self::BankStatement(r) => r.verified,
            Self::Passport(r) => r.verified,
            Self::License(r) => r.verified,
        }
    }

    /// True when any textual field is blank or the `NULL` sentinel.
    pub fn has_empty_fields(&self) -> bool {
        let fields = match self {
            Self::Payslip(r) => r.text_fields(),
            Self::BankStatement(r) => r.text_fields(),
            Self::Passport(r) => r.text_fields(),
            Self::License(r) => r.text_fields(),
        };
        fields.into_iter().any(is_missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passport() -> PassportRecord {
        PassportRecord {
            verified: true,
            first_name: "Mona".into(),
            last_name: "Lisa".into(),
            expiry_date: "2030-01-01".into(),
            nationality: "British".into(),
            passport_number: "123456789".into(),
        }
    }

    #[test]
    fn complete_record_has_no_empty_fields() {
        assert!(!ExtractedRecord::Passport(passport()).has_empty_fields());
    }

    #[test]
    fn null_sentinel_counts_as_empty() {
        let mut record = passport();
        record.nationality = "NULL".into();
        assert!(ExtractedRecord::Passport(record).has_empty_fields());

        // Sentinel comparison is case-insensitive.
        let mut record = passport();
        record.passport_number = "null".into();
        assert!(ExtractedRecord::Passport(record).has_empty_fields());
    }

    #[test]
    fn blank_and_whitespace_count_as_empty() {
        let mut record = passport();
        record.first_name = String::new();
        assert!(ExtractedRecord::Passport(record).has_empty_fields());

        let mut record = passport();
        record.last_name = "   ".into();
        assert!(ExtractedRecord::Passport(record).has_empty_fields());
    }

    #[test]
    fn every_text_field_is_checked() {
        // Injecting the sentinel into any one field flips the check.
        let complete = passport();
        let field_count = 5;
        for i in 0..field_count {
            let mut record = complete.clone();
            match i {
                0 => record.first_name = "NULL".into(),
                1 => record.last_name = "NULL".into(),
                2 => record.expiry_date = "NULL".into(),
                3 => record.nationality = "NULL".into(),
                _ => record.passport_number = "NULL".into(),
            }
            assert!(
                ExtractedRecord::Passport(record).has_empty_fields(),
                "field {i} not covered by the empty check"
            );
        }
    }

    #[test]
    fn document_type_matches_variant() {
        let record = ExtractedRecord::BankStatement(BankStatementRecord {
            verified: true,
            first_name: "A".into(),
            last_name: "B".into(),
            first_transaction_date: "2026-01-01".into(),
            last_transaction_date: "2026-03-15".into(),
        });
        assert_eq!(record.document_type(), DocumentType::BankStatement);
        assert!(record.verified());
    }
}
