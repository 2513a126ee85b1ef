// crates/grant-gate-core/src/core/intake.rs
// ============================================================================
// Module: Grant Gate Intent Intake
// Description: Validation of raw intent payloads into typed intents.
// Purpose: Reject malformed model output before it reaches policy evaluation.
// Dependencies: crate::core::{grant, time}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Intake turns an untrusted JSON object into an [`Intent`]. Strings are
//! trimmed, `currency` and `object_code` are upper-cased, `risk_class` is
//! lower-cased, and blank evidence references are dropped. Any missing or
//! malformed field fails the whole payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use time::Date;

use crate::core::grant::Intent;
use crate::core::grant::RiskClass;
use crate::core::time::parse_date;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Intent payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentValidationError {
    /// Payload is not a JSON object.
    #[error("payload must be a json object")]
    NotAnObject,
    /// Required string is missing or blank.
    #[error("{0} must be a non-empty string")]
    MissingString(&'static str),
    /// Field is not numeric.
    #[error("{0} must be a numeric value")]
    NotNumeric(&'static str),
    /// Amount is zero or negative.
    #[error("amount must be greater than 0")]
    NonPositiveAmount,
    /// Confidence is outside `[0, 1]`.
    #[error("model_confidence must be between 0 and 1")]
    ConfidenceOutOfRange,
    /// Risk label is not recognized.
    #[error("risk_class must be one of: high, low, medium")]
    UnknownRiskClass,
    /// Date is not `YYYY-MM-DD`.
    #[error("{0} must be in YYYY-MM-DD format")]
    InvalidDate(&'static str),
    /// Evidence references are not a list.
    #[error("evidence_refs must be a list of strings")]
    EvidenceNotList,
    /// No usable evidence references remain.
    #[error("at least one evidence reference is required")]
    MissingEvidence,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a raw intent payload.
///
/// # Errors
///
/// Returns [`IntentValidationError`] for the first field that fails.
pub fn validate_intent(payload: &Value) -> Result<Intent, IntentValidationError> {
    let Value::Object(fields) = payload else {
        return Err(IntentValidationError::NotAnObject);
    };

    let amount = required_number(fields, "amount")?;
    if amount <= 0.0 {
        return Err(IntentValidationError::NonPositiveAmount);
    }

    let model_confidence = required_number(fields, "model_confidence")?;
    if !(0.0 ..= 1.0).contains(&model_confidence) {
        return Err(IntentValidationError::ConfidenceOutOfRange);
    }

    let risk_class = RiskClass::parse(&required_string(fields, "risk_class")?)
        .ok_or(IntentValidationError::UnknownRiskClass)?;

    let evidence_refs = evidence_refs(fields)?;

    Ok(Intent {
        transaction_id: required_string(fields, "transaction_id")?.into(),
        grant_id: required_string(fields, "grant_id")?.into(),
        org_unit: required_string(fields, "org_unit")?,
        amount,
        currency: required_string(fields, "currency")?.to_uppercase(),
        object_code: required_string(fields, "object_code")?.to_uppercase(),
        expense_date: required_date(fields, "expense_date")?,
        posting_date: required_date(fields, "posting_date")?,
        description: required_string(fields, "description")?,
        evidence_refs,
        model_confidence,
        risk_class,
        rationale_summary: required_string(fields, "rationale_summary")?,
    })
}

// ============================================================================
// SECTION: Field Helpers
// ============================================================================

/// Reads a required, trimmed, non-empty string.
fn required_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, IntentValidationError> {
    match fields.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(IntentValidationError::MissingString(field)),
    }
}

/// Reads a required finite number from a JSON number or numeric string.
/// Booleans are rejected.
fn required_number(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, IntentValidationError> {
    let number = match fields.get(field) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|value| value.is_finite()).ok_or(IntentValidationError::NotNumeric(field))
}

/// Reads a required `YYYY-MM-DD` date.
fn required_date(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Date, IntentValidationError> {
    let text = required_string(fields, field)?;
    parse_date(&text).map_err(|_| IntentValidationError::InvalidDate(field))
}

/// Reads evidence references, dropping blank and non-string entries.
fn evidence_refs(fields: &Map<String, Value>) -> Result<Vec<String>, IntentValidationError> {
    let refs = match fields.get("evidence_refs") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Some(_) => return Err(IntentValidationError::EvidenceNotList),
    };
    if refs.is_empty() {
        return Err(IntentValidationError::MissingEvidence);
    }
    Ok(refs)
}
