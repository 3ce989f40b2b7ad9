//! Deterministic validation rules applied to extracted records.
//!
//! The evaluator runs a fixed short-circuit order: wrong document kind,
//! then incomplete extraction, then the type-specific business rules. The
//! first failing predicate determines the verdict.

use chrono::{Months, NaiveDate};
use thiserror::Error;
use tracing::warn;

use crate::record::ExtractedRecord;
use crate::types::{ExpectedIdentity, Verdict};

/// Nationality/country values accepted for UK documents.
const UK_MARKERS: [&str; 5] = ["britain", "uk", "gbr", "british", "united kingdom"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid date format, expected YYYY-MM-DD: {0:?}")]
    InvalidDateFormat(String),
}

/// Per-document-type windows and thresholds.
///
/// The license expiry window is explicitly configurable: deployed variants
/// disagreed on 2 versus 6 months, so the policy carries it rather than a
/// constant.
#[derive(Debug, Clone)]
pub struct RulePolicy {
    /// A payslip must be dated within this many calendar months of evaluation.
    pub payslip_recency_months: u32,
    /// Minimum span, in days, between first and last bank statement transactions.
    pub bank_statement_min_span_days: i64,
    /// Grace window for passport expiry: expiry must fall after
    /// `today - passport_expiry_grace_months`.
    pub passport_expiry_grace_months: u32,
    /// Grace window for driving license expiry.
    pub license_expiry_grace_months: u32,
    /// Required passport number length (all digits).
    pub passport_number_length: usize,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            payslip_recency_months: 2,
            bank_statement_min_span_days: 60,
            passport_expiry_grace_months: 2,
            license_expiry_grace_months: 2,
            passport_number_length: 9,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RuleError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| RuleError::InvalidDateFormat(value.to_string()))
}

/// True when `date` falls strictly after `today - months`.
///
/// Strict: a date exactly on the boundary does not pass.
pub fn within_recent_months(
    date: &str,
    months: u32,
    today: NaiveDate,
) -> Result<bool, RuleError> {
    let date = parse_date(date)?;
    Ok(date > today - Months::new(months))
}

/// True when the two dates are at least `min_days` apart, in either order.
pub fn span_at_least_days(
    first: &str,
    last: &str,
    min_days: i64,
) -> Result<bool, RuleError> {
    let first = parse_date(first)?;
    let last = parse_date(last)?;
    Ok((last - first).num_days().abs() >= min_days)
}

/// Case-insensitive match on the first whitespace token of the extracted name.
///
/// Extraction sometimes returns multi-word name fields ("Mona Elisabeth");
/// taking the first token tolerates that noise.
pub fn name_matches(extracted: &str, expected: &str) -> bool {
    let token = extracted.split_whitespace().next().unwrap_or("");
    token.eq_ignore_ascii_case(expected.trim())
}

/// Case-insensitive membership in the UK nationality/country marker set.
pub fn is_uk_marker(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    UK_MARKERS.contains(&lowered.as_str())
}

/// Passport number format: exactly `length` ASCII digits.
pub fn passport_number_ok(value: &str, length: usize) -> bool {
    value.len() == length && value.bytes().all(|b| b.is_ascii_digit())
}

/// Apply the document-type-specific rule set to an extracted record.
///
/// Malformed dates never escape: they degrade to [`Verdict::NeedsReupload`]
/// so the user is asked for a better upload rather than the interaction
/// failing outright.
pub fn evaluate(
    record: &ExtractedRecord,
    identity: &ExpectedIdentity,
    policy: &RulePolicy,
    today: NaiveDate,
) -> Verdict {
    if !record.verified() {
        return Verdict::Invalid;
    }
    if record.has_empty_fields() {
        return Verdict::NeedsReupload;
    }

    let passed = match record {
        ExtractedRecord::Payslip(r) => {
            within_recent_months(&r.date, policy.payslip_recency_months, today)
        }
        ExtractedRecord::BankStatement(r) => span_at_least_days(
            &r.first_transaction_date,
            &r.last_transaction_date,
            policy.bank_statement_min_span_days,
        ),
        ExtractedRecord::Passport(r) => {
            if !name_matches(&r.first_name, &identity.first_name)
                || !name_matches(&r.last_name, &identity.last_name)
            {
                Ok(false)
            } else if !is_uk_marker(&r.nationality) {
                Ok(false)
            } else if !passport_number_ok(&r.passport_number, policy.passport_number_length) {
                Ok(false)
            } else {
                within_recent_months(&r.expiry_date, policy.passport_expiry_grace_months, today)
            }
        }
        ExtractedRecord::License(r) => {
            if !name_matches(&r.first_name, &identity.first_name)
                || !name_matches(&r.last_name, &identity.last_name)
            {
                Ok(false)
            } else if !is_uk_marker(&r.country) {
                Ok(false)
            } else {
                within_recent_months(&r.expiry_date, policy.license_expiry_grace_months, today)
            }
        }
    };

    match passed {
        Ok(true) => Verdict::Verified,
        Ok(false) => Verdict::NeedsReupload,
        Err(err) => {
            warn!(document_type = %record.document_type(), %err, "date check failed");
            Verdict::NeedsReupload
        }
    }
}
