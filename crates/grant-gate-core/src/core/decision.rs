// crates/grant-gate-core/src/core/decision.rs
// ============================================================================
// Module: Grant Gate Decision Types
// Description: Findings, verdicts, raw module results, and final decisions.
// Purpose: Shared value types consumed by policy packs, the orchestrator, and callers.
// Dependencies: crate::core::{hashing, identifiers}, serde, time
// ============================================================================

//! ## Overview
//! A policy pack emits a [`DecisionResult`]: verdict, ordered findings, the
//! review routing flag, and the explicit [`HashMaterial`] to digest. The
//! orchestrator seals it into an immutable [`Decision`] by attaching the
//! digest and evaluation timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::hashing::HashDigest;
use crate::core::hashing::HashMaterial;
use crate::core::identifiers::PolicyVersionId;
use crate::core::identifiers::SnapshotId;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// The intent may be posted.
    Approve,
    /// The intent violates at least one blocking rule.
    Reject,
    /// The intent passed all rules but must be routed to a human reviewer.
    RequireReview,
}

impl Verdict {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::RequireReview => "REQUIRE_REVIEW",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Severity of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocking violation; forces rejection.
    High,
    /// Non-blocking violation.
    Medium,
}

/// A single rule violation produced by a policy pack.
///
/// # Invariants
/// - Observed and expected values are pre-rendered strings so the finding
///   hashes identically wherever it is recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier (for example `R-BUDGET-002`).
    pub rule_id: String,
    /// Violation severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Observed value, stringified.
    pub actual_value: String,
    /// Expected condition, stringified.
    pub expected_condition: String,
}

impl Finding {
    /// Creates a finding.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        actual_value: impl Into<String>,
        expected_condition: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            actual_value: actual_value.into(),
            expected_condition: expected_condition.into(),
        }
    }

    /// Returns true when the finding blocks approval.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::High
    }
}

// ============================================================================
// SECTION: Module Result
// ============================================================================

/// Raw output of a governance module before sealing.
///
/// # Invariants
/// - `hash_material` holds exactly the fields the module commits to hashing.
/// - Two results with equal material hash identically regardless of time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    /// Decision verdict.
    pub verdict: Verdict,
    /// Findings in rule-evaluation order.
    pub findings: Vec<Finding>,
    /// Whether the intent is routed to human review.
    pub requires_review: bool,
    /// Policy version used for evaluation.
    pub policy_version_id: PolicyVersionId,
    /// Snapshot identifier used for evaluation.
    pub snapshot_id: SnapshotId,
    /// Canonicalization contract between the module and the hasher.
    pub hash_material: HashMaterial,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Sealed, immutable decision returned to callers.
///
/// # Invariants
/// - Constructed only by the orchestrator; fields are read-only.
/// - `decision_hash` covers the module hash material, not `evaluated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Decision verdict.
    #[serde(rename = "decision")]
    verdict: Verdict,
    /// Findings in rule-evaluation order.
    #[serde(rename = "violations")]
    findings: Vec<Finding>,
    /// Whether the intent is routed to human review.
    requires_review: bool,
    /// Digest of the module hash material.
    decision_hash: HashDigest,
    /// UTC evaluation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    evaluated_at: OffsetDateTime,
    /// Policy version used for evaluation.
    policy_version_id: PolicyVersionId,
    /// Snapshot identifier used for evaluation.
    #[serde(rename = "state_snapshot_id")]
    snapshot_id: SnapshotId,
}

impl Decision {
    /// Seals a module result with its digest and evaluation time.
    pub(crate) fn seal(
        result: &DecisionResult,
        decision_hash: HashDigest,
        evaluated_at: OffsetDateTime,
    ) -> Self {
        Self {
            verdict: result.verdict,
            findings: result.findings.clone(),
            requires_review: result.requires_review,
            decision_hash,
            evaluated_at,
            policy_version_id: result.policy_version_id.clone(),
            snapshot_id: result.snapshot_id.clone(),
        }
    }

    /// Returns the verdict.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Returns the findings in evaluation order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns true when a finding with the rule identifier is present.
    #[must_use]
    pub fn has_finding(&self, rule_id: &str) -> bool {
        self.findings.iter().any(|finding| finding.rule_id == rule_id)
    }

    /// Returns the review routing flag.
    #[must_use]
    pub const fn requires_review(&self) -> bool {
        self.requires_review
    }

    /// Returns the decision digest.
    #[must_use]
    pub const fn decision_hash(&self) -> &HashDigest {
        &self.decision_hash
    }

    /// Returns the evaluation timestamp.
    #[must_use]
    pub const fn evaluated_at(&self) -> OffsetDateTime {
        self.evaluated_at
    }

    /// Returns the policy version identifier.
    #[must_use]
    pub const fn policy_version_id(&self) -> &PolicyVersionId {
        &self.policy_version_id
    }

    /// Returns the snapshot identifier.
    #[must_use]
    pub const fn snapshot_id(&self) -> &SnapshotId {
        &self.snapshot_id
    }
}
