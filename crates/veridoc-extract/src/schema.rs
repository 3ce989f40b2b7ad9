//! Per-document-type extraction schemas, prompts, and wire parsing.
//!
//! Each document type binds the model call to a strict JSON schema. Fields
//! the model cannot identify come back as the literal `NULL` sentinel, and
//! absent fields are defaulted to it during parsing so the rule evaluator
//! sees a uniform shape.

use serde::Deserialize;
use serde_json::{json, Value};
use veridoc_core::{
    BankStatementRecord, DocumentType, ExtractedRecord, LicenseRecord, PassportRecord,
    PayslipRecord, NULL_SENTINEL,
};

use crate::ExtractError;

/// Schema name sent with the structured-output request.
pub fn schema_name(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Payslip => "payslip_extraction",
        DocumentType::BankStatement => "bank_statement_extraction",
        DocumentType::Passport => "passport_extraction",
        DocumentType::DrivingLicense => "driving_license_extraction",
    }
}

/// Natural-language instruction accompanying the artifact.
pub fn prompt(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Payslip => {
            "Verify whether this document is a payslip. Return verification as a \
             boolean, the first name, the last name, and the payslip date as \
             YYYY-MM-DD. Use the string NULL for any field you cannot identify."
        }
        DocumentType::BankStatement => {
            "Verify whether the following text is a bank statement. Return \
             verification as a boolean, the account holder's first and last name, \
             and the dates of the first and last transactions in the ledger as \
             YYYY-MM-DD. Use the string NULL for any field you cannot identify."
        }
        DocumentType::Passport => {
            "Verify whether this document is a passport. Return verification as a \
             boolean, the first name, the last name, the expiry date as YYYY-MM-DD, \
             the issuing nationality, and the passport number. Use the string NULL \
             for any field you cannot identify."
        }
        DocumentType::DrivingLicense => {
            "Verify whether this document is a driving license. Entry 1 on the \
             license holds the surname and entry 2 the first name; the issuing \
             country appears in the header. Return verification as a boolean, the \
             first name, the last name, the expiry date as YYYY-MM-DD, the country, \
             and the license number. Use the string NULL for any field you cannot \
             identify."
        }
    }
}

fn string_field(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Strict JSON schema for the structured-output response format.
pub fn response_schema(document_type: DocumentType) -> Value {
    let (properties, required) = match document_type {
        DocumentType::Payslip => (
            json!({
                "verification": { "type": "boolean", "description": "true if the document is a payslip" },
                "first_name": string_field("first name, or NULL if unidentifiable"),
                "last_name": string_field("last name, or NULL if unidentifiable"),
                "date": string_field("payslip date as YYYY-MM-DD, or NULL"),
            }),
            vec!["verification", "first_name", "last_name", "date"],
        ),
        DocumentType::BankStatement => (
            json!({
                "verification": { "type": "boolean", "description": "true if the text is a bank statement" },
                "first_name": string_field("account holder first name, or NULL"),
                "last_name": string_field("account holder last name, or NULL"),
                "first_transaction_date": string_field("date of the first ledger transaction as YYYY-MM-DD, or NULL"),
                "last_transaction_date": string_field("date of the last ledger transaction as YYYY-MM-DD, or NULL"),
            }),
            vec![
                "verification",
                "first_name",
                "last_name",
                "first_transaction_date",
                "last_transaction_date",
            ],
        ),
        DocumentType::Passport => (
            json!({
                "verification": { "type": "boolean", "description": "true if the document is a passport" },
                "first_name": string_field("first name, or NULL if unidentifiable"),
                "last_name": string_field("last name, or NULL if unidentifiable"),
                "expiry_date": string_field("passport expiry date as YYYY-MM-DD, or NULL"),
                "nationality": string_field("issuing country of the passport, or NULL"),
                "passport_number": string_field("passport number, or NULL"),
            }),
            vec![
                "verification",
                "first_name",
                "last_name",
                "expiry_date",
                "nationality",
                "passport_number",
            ],
        ),
        DocumentType::DrivingLicense => (
            json!({
                "verification": { "type": "boolean", "description": "true if the document is a driving license" },
                "first_name": string_field("first name (entry 2 on the license), or NULL"),
                "last_name": string_field("last name from the surname (entry 1), or NULL"),
                "expiry_date": string_field("license expiry date as YYYY-MM-DD, or NULL"),
                "country": string_field("issuing country from the license header, or NULL"),
                "license_number": string_field("license number, or NULL"),
            }),
            vec![
                "verification",
                "first_name",
                "last_name",
                "expiry_date",
                "country",
                "license_number",
            ],
        ),
    };

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn null_text() -> String {
    NULL_SENTINEL.to_string()
}

#[derive(Deserialize)]
struct PayslipWire {
    #[serde(default)]
    verification: bool,
    #[serde(default = "null_text")]
    first_name: String,
    #[serde(default = "null_text")]
    last_name: String,
    #[serde(default = "null_text")]
    date: String,
}

#[derive(Deserialize)]
struct BankStatementWire {
    #[serde(default)]
    verification: bool,
    #[serde(default = "null_text")]
    first_name: String,
    #[serde(default = "null_text")]
    last_name: String,
    #[serde(default = "null_text")]
    first_transaction_date: String,
    #[serde(default = "null_text")]
    last_transaction_date: String,
}

#[derive(Deserialize)]
struct PassportWire {
    #[serde(default)]
    verification: bool,
    #[serde(default = "null_text")]
    first_name: String,
    #[serde(default = "null_text")]
    last_name: String,
    #[serde(default = "null_text")]
    expiry_date: String,
    #[serde(default = "null_text")]
    nationality: String,
    #[serde(default = "null_text")]
    passport_number: String,
}

#[derive(Deserialize)]
struct LicenseWire {
    #[serde(default)]
    verification: bool,
    #[serde(default = "null_text")]
    first_name: String,
    #[serde(default = "null_text")]
    last_name: String,
    #[serde(default = "null_text")]
    expiry_date: String,
    #[serde(default = "null_text")]
    country: String,
    #[serde(default = "null_text")]
    license_number: String,
}

/// Coerce the model's JSON payload into the exact typed record.
pub fn parse_record(
    document_type: DocumentType,
    payload: &str,
) -> Result<ExtractedRecord, ExtractError> {
    let record = match document_type {
        DocumentType::Payslip => {
            let wire: PayslipWire = serde_json::from_str(payload)?;
            ExtractedRecord::Payslip(PayslipRecord {
                verified: wire.verification,
                first_name: wire.first_name,
                last_name: wire.last_name,
                date: wire.date,
            })
        }
        DocumentType::BankStatement => {
            let wire: BankStatementWire = serde_json::from_str(payload)?;
            ExtractedRecord::BankStatement(BankStatementRecord {
                verified: wire.verification,
                first_name: wire.first_name,
                last_name: wire.last_name,
                first_transaction_date: wire.first_transaction_date,
                last_transaction_date: wire.last_transaction_date,
            })
        }
        DocumentType::Passport => {
            let wire: PassportWire = serde_json::from_str(payload)?;
            ExtractedRecord::Passport(PassportRecord {
                verified: wire.verification,
                first_name: wire.first_name,
                last_name: wire.last_name,
                expiry_date: wire.expiry_date,
                nationality: wire.nationality,
                passport_number: wire.passport_number,
            })
        }
        DocumentType::DrivingLicense => {
            let wire: LicenseWire = serde_json::from_str(payload)?;
            ExtractedRecord::License(LicenseRecord {
                verified: wire.verification,
                first_name: wire.first_name,
                last_name: wire.last_name,
                expiry_date: wire.expiry_date,
                country: wire.country,
                license_number: wire.license_number,
            })
        }
    };
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_passport_payload() {
        let payload = r#"{
            "verification": true,
            "first_name": "Mona",
            "last_name": "Lisa",
            "expiry_date": "2030-01-01",
            "nationality": "British",
            "passport_number": "123456789"
        }"#;
        let record = parse_record(DocumentType::Passport, payload).unwrap();
        match record {
            ExtractedRecord::Passport(p) => {
                assert!(p.verified);
                assert_eq!(p.passport_number, "123456789");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn absent_fields_default_to_sentinel() {
        let payload = r#"{ "verification": true, "first_name": "Mona" }"#;
        let record = parse_record(DocumentType::Payslip, payload).unwrap();
        assert!(record.has_empty_fields());
        match record {
            ExtractedRecord::Payslip(p) => {
                assert_eq!(p.last_name, NULL_SENTINEL);
                assert_eq!(p.date, NULL_SENTINEL);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        assert!(matches!(
            parse_record(DocumentType::BankStatement, "not json"),
            Err(ExtractError::Json(_))
        ));
    }

    #[test]
    fn every_schema_lists_its_required_fields() {
        for ty in [
            DocumentType::Payslip,
            DocumentType::BankStatement,
            DocumentType::Passport,
            DocumentType::DrivingLicense,
        ] {
            let schema = response_schema(ty);
            let required = schema["required"].as_array().unwrap();
            let properties = schema["properties"].as_object().unwrap();
            assert_eq!(required.len(), properties.len(), "{ty}");
            assert!(properties.contains_key("verification"), "{ty}");
        }
    }

    #[test]
    fn bank_statement_wire_field_names() {
        let payload = r#"{
            "verification": true,
            "first_name": "Mona",
            "last_name": "Lisa",
            "first_transaction_date": "2026-01-01",
            "last_transaction_date": "2026-04-01"
        }"#;
        let record = parse_record(DocumentType::BankStatement, payload).unwrap();
        assert!(!record.has_empty_fields());
    }
}
