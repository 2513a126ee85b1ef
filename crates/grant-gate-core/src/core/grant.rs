// crates/grant-gate-core/src/core/grant.rs
// ============================================================================
// Module: Grant Gate Intent and Snapshot Records
// Description: Validated transaction intents and point-in-time grant snapshots.
// Purpose: Provide the read-only inputs consumed by grant policy evaluation.
// Dependencies: crate::core::{identifiers, time}, serde, time
// ============================================================================

//! ## Overview
//! An [`Intent`] is a proposed transaction that has already passed intake
//! validation (see [`crate::core::intake`]). A [`GrantSnapshot`] is an
//! immutable read model materialized from source ledgers. Neither is mutated
//! by evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use time::Date;

use crate::core::identifiers::GrantId;
use crate::core::identifiers::SnapshotId;
use crate::core::identifiers::TransactionId;
use crate::core::time::iso_date;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default amount at or above which an intent is routed to review.
pub const DEFAULT_HIGH_DOLLAR_THRESHOLD: f64 = 10_000.0;

/// Default maximum snapshot age in days.
pub const DEFAULT_MAX_SNAPSHOT_AGE_DAYS: u32 = 1;

// ============================================================================
// SECTION: Risk Class
// ============================================================================

/// Risk classification attached to an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskClass {
    /// Parses a case-insensitive risk label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ============================================================================
// SECTION: Intent
// ============================================================================

/// Validated proposed transaction.
///
/// # Invariants
/// - `amount > 0`, `model_confidence` in `[0, 1]`, `evidence_refs` non-empty
///   when produced by [`crate::core::intake::validate_intent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Grant identifier.
    pub grant_id: GrantId,
    /// Organisational unit that incurred the expense.
    pub org_unit: String,
    /// Monetary amount.
    pub amount: f64,
    /// ISO currency code (upper-case).
    pub currency: String,
    /// Object or category code (upper-case).
    pub object_code: String,
    /// Date the expense was incurred.
    #[serde(with = "iso_date")]
    pub expense_date: Date,
    /// Date the expense is to be posted.
    #[serde(with = "iso_date")]
    pub posting_date: Date,
    /// Free-text description.
    pub description: String,
    /// Ordered evidence references.
    pub evidence_refs: Vec<String>,
    /// Model confidence score in `[0, 1]`.
    pub model_confidence: f64,
    /// Risk classification.
    pub risk_class: RiskClass,
    /// Rationale text.
    pub rationale_summary: String,
}

// ============================================================================
// SECTION: Grant Snapshot
// ============================================================================

/// Immutable point-in-time grant read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantSnapshot {
    /// Snapshot identifier.
    pub snapshot_id: SnapshotId,
    /// Integrity hash of the source data.
    pub snapshot_hash: String,
    /// Materialization date.
    #[serde(with = "iso_date")]
    pub as_of_date: Date,
    /// First day of the grant validity window (inclusive).
    #[serde(with = "iso_date")]
    pub grant_start_date: Date,
    /// Last day of the grant validity window (inclusive).
    #[serde(with = "iso_date")]
    pub grant_end_date: Date,
    /// Remaining budget.
    pub budget_remaining: f64,
    /// Allowed object codes (compared case-insensitively).
    pub allowed_object_codes: BTreeSet<String>,
    /// Amount at or above which review is required.
    #[serde(default = "default_high_dollar_threshold")]
    pub high_dollar_threshold: f64,
    /// Maximum allowed snapshot age in days.
    #[serde(default = "default_max_snapshot_age_days")]
    pub max_snapshot_age_days: u32,
}

impl GrantSnapshot {
    /// Returns true when the object code is allowed, ignoring case.
    #[must_use]
    pub fn allows_object_code(&self, object_code: &str) -> bool {
        let wanted = object_code.to_uppercase();
        self.allowed_object_codes.iter().any(|code| code.to_uppercase() == wanted)
    }
}

/// Serde default for [`GrantSnapshot::high_dollar_threshold`].
const fn default_high_dollar_threshold() -> f64 {
    DEFAULT_HIGH_DOLLAR_THRESHOLD
}

/// Serde default for [`GrantSnapshot::max_snapshot_age_days`].
const fn default_max_snapshot_age_days() -> u32 {
    DEFAULT_MAX_SNAPSHOT_AGE_DAYS
}
