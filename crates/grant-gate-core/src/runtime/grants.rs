// crates/grant-gate-core/src/runtime/grants.rs
// ============================================================================
// Module: Grants Policy Pack
// Description: Grant-expenditure rules implementing the governance contract.
// Purpose: Turn an intent and snapshot into findings, routing, and a verdict.
// Dependencies: crate::{core, interfaces}, time
// ============================================================================

//! ## Overview
//! Rules run in a fixed order and accumulate findings:
//!
//! | Rule | Severity | Check |
//! |------|----------|-------|
//! | `R-PERIOD-001` | high | expense date within the grant window (inclusive) |
//! | `R-BUDGET-002` | high | amount does not exceed remaining budget |
//! | `R-ALLOW-003` | high | object code in the allowed set (case-insensitive) |
//! | `R-DOC-004` | medium | at least one evidence reference |
//! | `R-SNAP-008` | high | snapshot age within the freshness limit |
//!
//! Review routing is independent of findings: high-dollar amounts, medium or
//! high risk, and low model confidence all request review. A high-severity
//! finding rejects and clears the review flag.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use time::Date;

use crate::core::DecisionResult;
use crate::core::Finding;
use crate::core::GrantSnapshot;
use crate::core::HashMaterial;
use crate::core::Intent;
use crate::core::PolicyVersionId;
use crate::core::RiskClass;
use crate::core::Severity;
use crate::core::Verdict;
use crate::core::time::days_between;
use crate::core::time::format_date;
use crate::interfaces::GovernanceError;
use crate::interfaces::GovernanceModule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Scope granted to approved grant expenses.
pub const POST_GRANT_EXPENSE_SCOPE: &str = "post_grant_expense";

/// Confidence below which an intent is routed to review.
pub const REVIEW_CONFIDENCE_FLOOR: f64 = 0.85;

/// Rule identifier: expense date within the grant period.
pub const RULE_PERIOD: &str = "R-PERIOD-001";
/// Rule identifier: amount within remaining budget.
pub const RULE_BUDGET: &str = "R-BUDGET-002";
/// Rule identifier: object code allowed.
pub const RULE_ALLOWED_CODE: &str = "R-ALLOW-003";
/// Rule identifier: supporting evidence present.
pub const RULE_EVIDENCE: &str = "R-DOC-004";
/// Rule identifier: snapshot freshness.
pub const RULE_SNAPSHOT_AGE: &str = "R-SNAP-008";

// ============================================================================
// SECTION: Module
// ============================================================================

/// Grants governance policy pack.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantsGovernanceModule;

impl GrantsGovernanceModule {
    /// Creates the grants module.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl GovernanceModule for GrantsGovernanceModule {
    type Intent = Intent;
    type Snapshot = GrantSnapshot;

    fn name(&self) -> &'static str {
        "grants"
    }

    fn evaluate(
        &self,
        intent: &Intent,
        snapshot: &GrantSnapshot,
        policy_version_id: &PolicyVersionId,
        evaluation_date: Date,
    ) -> Result<DecisionResult, GovernanceError> {
        check_inputs(intent, snapshot, policy_version_id)?;

        let findings = evaluate_rules(intent, snapshot, evaluation_date);
        let routed_to_review = review_requested(intent, snapshot);

        let (verdict, requires_review) = if findings.iter().any(Finding::is_blocking) {
            (Verdict::Reject, false)
        } else if routed_to_review {
            (Verdict::RequireReview, true)
        } else {
            (Verdict::Approve, false)
        };

        let hash_material = HashMaterial::new()
            .with("decision", &verdict)?
            .with("violations", &findings)?
            .with("requires_review", &requires_review)?
            .with("policy_version_id", policy_version_id)?
            .with("snapshot_id", &snapshot.snapshot_id)?
            .with("snapshot_hash", &snapshot.snapshot_hash)?
            .with("transaction_id", &intent.transaction_id)?;

        Ok(DecisionResult {
            verdict,
            findings,
            requires_review,
            policy_version_id: policy_version_id.clone(),
            snapshot_id: snapshot.snapshot_id.clone(),
            hash_material,
        })
    }

    fn scopes_for(&self, _intent: &Intent, result: &DecisionResult) -> BTreeSet<String> {
        if result.verdict == Verdict::Approve {
            BTreeSet::from([POST_GRANT_EXPENSE_SCOPE.to_string()])
        } else {
            BTreeSet::new()
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Runs every rule in order and collects findings.
fn evaluate_rules(intent: &Intent, snapshot: &GrantSnapshot, evaluation_date: Date) -> Vec<Finding> {
    let mut findings = Vec::new();

    let start = snapshot.grant_start_date;
    let end = snapshot.grant_end_date;
    if !(start ..= end).contains(&intent.expense_date) {
        findings.push(Finding::new(
            RULE_PERIOD,
            Severity::High,
            "Expense date falls outside active grant period.",
            format_date(intent.expense_date),
            format!("{} <= expense_date <= {}", format_date(start), format_date(end)),
        ));
    }

    if intent.amount > snapshot.budget_remaining {
        findings.push(Finding::new(
            RULE_BUDGET,
            Severity::High,
            "Requested amount exceeds remaining grant budget.",
            intent.amount.to_string(),
            format!("amount <= {}", snapshot.budget_remaining),
        ));
    }

    if !snapshot.allows_object_code(&intent.object_code) {
        findings.push(Finding::new(
            RULE_ALLOWED_CODE,
            Severity::High,
            "Object code is not allowed for this grant policy.",
            intent.object_code.clone(),
            "object_code in allowed_object_codes",
        ));
    }

    if intent.evidence_refs.is_empty() {
        findings.push(Finding::new(
            RULE_EVIDENCE,
            Severity::Medium,
            "Supporting evidence is missing.",
            "[]",
            "count(evidence_refs) > 0",
        ));
    }

    let snapshot_age_days = days_between(snapshot.as_of_date, evaluation_date);
    if snapshot_age_days > i64::from(snapshot.max_snapshot_age_days) {
        findings.push(Finding::new(
            RULE_SNAPSHOT_AGE,
            Severity::High,
            "Snapshot age exceeds freshness threshold.",
            snapshot_age_days.to_string(),
            format!("snapshot_age_days <= {}", snapshot.max_snapshot_age_days),
        ));
    }

    findings
}

/// Returns true when any routing signal asks for human review.
fn review_requested(intent: &Intent, snapshot: &GrantSnapshot) -> bool {
    intent.amount >= snapshot.high_dollar_threshold
        || matches!(intent.risk_class, RiskClass::Medium | RiskClass::High)
        || intent.model_confidence < REVIEW_CONFIDENCE_FLOOR
}

/// Rejects inputs that would make rule comparisons meaningless.
fn check_inputs(
    intent: &Intent,
    snapshot: &GrantSnapshot,
    policy_version_id: &PolicyVersionId,
) -> Result<(), GovernanceError> {
    if policy_version_id.is_blank() {
        return Err(GovernanceError::InvalidInput("policy_version_id is empty".to_string()));
    }
    let money = [
        ("amount", intent.amount),
        ("budget_remaining", snapshot.budget_remaining),
        ("high_dollar_threshold", snapshot.high_dollar_threshold),
    ];
    if let Some((field, _)) = money.iter().find(|(_, value)| !value.is_finite()) {
        return Err(GovernanceError::InvalidInput(format!("{field} is not a finite number")));
    }
    if intent.amount <= 0.0 {
        return Err(GovernanceError::InvalidInput("amount must be greater than 0".to_string()));
    }
    if !(0.0 ..= 1.0).contains(&intent.model_confidence) {
        return Err(GovernanceError::InvalidInput(
            "model_confidence is outside [0, 1]".to_string(),
        ));
    }
    if snapshot.grant_start_date > snapshot.grant_end_date {
        return Err(GovernanceError::InvalidInput(
            "grant_start_date is after grant_end_date".to_string(),
        ));
    }
    Ok(())
}
