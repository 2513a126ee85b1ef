// crates/grant-gate-core/tests/grants_rules.rs
// ============================================================================
// Module: Grants Policy Pack Tests
// Description: Rule, routing, and verdict derivation for the grants module.
// ============================================================================
//! ## Overview
//! Exercises each grants rule, the review routing signals, severity
//! dominance, and the fail-fast behavior on inconsistent inputs.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    reason = "Tests use unwrap and panic on deterministic fixtures."
)]

use std::collections::BTreeSet;

use grant_gate_core::GovernanceError;
use grant_gate_core::GovernanceModule;
use grant_gate_core::GrantSnapshot;
use grant_gate_core::GrantsGovernanceModule;
use grant_gate_core::Intent;
use grant_gate_core::PolicyVersionId;
use grant_gate_core::RiskClass;
use grant_gate_core::Severity;
use grant_gate_core::Verdict;
use grant_gate_core::runtime::grants::POST_GRANT_EXPENSE_SCOPE;
use grant_gate_core::runtime::grants::RULE_ALLOWED_CODE;
use grant_gate_core::runtime::grants::RULE_BUDGET;
use grant_gate_core::runtime::grants::RULE_EVIDENCE;
use grant_gate_core::runtime::grants::RULE_PERIOD;
use grant_gate_core::runtime::grants::RULE_SNAPSHOT_AGE;
use time::Date;
use time::macros::date;

fn intent() -> Intent {
    Intent {
        transaction_id: "txn-1001".into(),
        grant_id: "grant-nsf-42".into(),
        org_unit: "physics".to_string(),
        amount: 5_000.0,
        currency: "USD".to_string(),
        object_code: "EQUIPMENT".to_string(),
        expense_date: date!(2025 - 03 - 05),
        posting_date: date!(2025 - 03 - 10),
        description: "Spectrometer calibration kit".to_string(),
        evidence_refs: vec!["invoice-88".to_string()],
        model_confidence: 0.95,
        risk_class: RiskClass::Low,
        rationale_summary: "Allowed equipment purchase within budget.".to_string(),
    }
}

fn snapshot() -> GrantSnapshot {
    GrantSnapshot {
        snapshot_id: "snap-2025-03-10".into(),
        snapshot_hash: "sha256:feedface".to_string(),
        as_of_date: date!(2025 - 03 - 10),
        grant_start_date: date!(2025 - 01 - 01),
        grant_end_date: date!(2025 - 12 - 31),
        budget_remaining: 50_000.0,
        allowed_object_codes: BTreeSet::from(["EQUIPMENT".to_string(), "SUPPLIES".to_string()]),
        high_dollar_threshold: 10_000.0,
        max_snapshot_age_days: 1,
    }
}

fn policy() -> PolicyVersionId {
    PolicyVersionId::new("grants-policy-v1")
}

fn evaluate_on(
    intent: &Intent,
    snapshot: &GrantSnapshot,
    evaluation_date: Date,
) -> grant_gate_core::DecisionResult {
    GrantsGovernanceModule::new().evaluate(intent, snapshot, &policy(), evaluation_date).unwrap()
}

fn rule_ids(result: &grant_gate_core::DecisionResult) -> Vec<&str> {
    result.findings.iter().map(|finding| finding.rule_id.as_str()).collect()
}

#[test]
fn clean_intent_is_approved_without_findings() {
    let result = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::Approve);
    assert!(result.findings.is_empty());
    assert!(!result.requires_review);
}

#[test]
fn disallowed_object_code_is_rejected() {
    let mut intent = intent();
    intent.object_code = "TRAVEL".to_string();
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::Reject);
    assert_eq!(rule_ids(&result), vec![RULE_ALLOWED_CODE]);
    assert_eq!(result.findings[0].actual_value, "TRAVEL");
}

#[test]
fn object_code_comparison_ignores_case() {
    let mut intent = intent();
    intent.object_code = "supplies".to_string();
    let mut snapshot = snapshot();
    snapshot.allowed_object_codes = BTreeSet::from(["Supplies".to_string()]);
    let result = evaluate_on(&intent, &snapshot, date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::Approve);
}

#[test]
fn high_dollar_amount_requires_review_without_findings() {
    let mut intent = intent();
    intent.amount = 12_000.0;
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::RequireReview);
    assert!(result.findings.is_empty());
    assert!(result.requires_review);
}

#[test]
fn stale_snapshot_is_rejected() {
    let result = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 13));
    assert_eq!(result.verdict, Verdict::Reject);
    assert_eq!(rule_ids(&result), vec![RULE_SNAPSHOT_AGE]);
    assert_eq!(result.findings[0].actual_value, "3");
    assert_eq!(result.findings[0].expected_condition, "snapshot_age_days <= 1");
}

#[test]
fn amount_equal_to_threshold_requires_review() {
    let mut intent = intent();
    intent.amount = 10_000.0;
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::RequireReview);
    assert!(result.requires_review);
}

#[test]
fn amount_one_cent_below_threshold_is_approved() {
    let mut intent = intent();
    intent.amount = 9_999.99;
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::Approve);
    assert!(!result.requires_review);
}

#[test]
fn snapshot_at_max_age_passes_and_one_day_more_fails() {
    let at_limit = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 11));
    assert!(at_limit.findings.is_empty());

    let past_limit = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 12));
    assert_eq!(rule_ids(&past_limit), vec![RULE_SNAPSHOT_AGE]);
}

#[test]
fn evaluation_before_as_of_date_passes_freshness() {
    let result = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 01));
    assert!(result.findings.is_empty());
}

#[test]
fn period_bounds_are_inclusive() {
    let mut on_start = intent();
    on_start.expense_date = date!(2025 - 01 - 01);
    assert!(evaluate_on(&on_start, &snapshot(), date!(2025 - 03 - 10)).findings.is_empty());

    let mut on_end = intent();
    on_end.expense_date = date!(2025 - 12 - 31);
    assert!(evaluate_on(&on_end, &snapshot(), date!(2025 - 03 - 10)).findings.is_empty());

    let mut after_end = intent();
    after_end.expense_date = date!(2026 - 01 - 01);
    let result = evaluate_on(&after_end, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(rule_ids(&result), vec![RULE_PERIOD]);
    assert_eq!(result.findings[0].expected_condition, "2025-01-01 <= expense_date <= 2025-12-31");
}

#[test]
fn amount_equal_to_budget_passes_and_above_fails() {
    let mut equal = intent();
    equal.amount = 50_000.0;
    let result = evaluate_on(&equal, &snapshot(), date!(2025 - 03 - 10));
    assert!(result.findings.is_empty());

    let mut above = intent();
    above.amount = 50_000.5;
    let result = evaluate_on(&above, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(rule_ids(&result), vec![RULE_BUDGET]);
    assert_eq!(result.findings[0].actual_value, "50000.5");
    assert_eq!(result.findings[0].expected_condition, "amount <= 50000");
}

#[test]
fn findings_follow_rule_order() {
    let mut intent = intent();
    intent.expense_date = date!(2024 - 12 - 31);
    intent.amount = 60_000.0;
    intent.object_code = "TRAVEL".to_string();
    intent.evidence_refs.clear();
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 20));
    assert_eq!(
        rule_ids(&result),
        vec![RULE_PERIOD, RULE_BUDGET, RULE_ALLOWED_CODE, RULE_EVIDENCE, RULE_SNAPSHOT_AGE]
    );
}

#[test]
fn missing_evidence_is_a_medium_finding() {
    let mut intent = intent();
    intent.evidence_refs.clear();
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(rule_ids(&result), vec![RULE_EVIDENCE]);
    assert_eq!(result.findings[0].severity, Severity::Medium);
    assert_eq!(result.findings[0].actual_value, "[]");
    assert_eq!(result.findings[0].expected_condition, "count(evidence_refs) > 0");
    assert_ne!(result.verdict, Verdict::Reject);
}

#[test]
fn high_severity_finding_clears_review_routing() {
    let mut intent = intent();
    intent.amount = 60_000.0;
    intent.risk_class = RiskClass::High;
    intent.model_confidence = 0.2;
    let result = evaluate_on(&intent, &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(result.verdict, Verdict::Reject);
    assert!(!result.requires_review);
}

#[test]
fn risk_and_confidence_route_to_review() {
    let mut medium_risk = intent();
    medium_risk.risk_class = RiskClass::Medium;
    assert_eq!(
        evaluate_on(&medium_risk, &snapshot(), date!(2025 - 03 - 10)).verdict,
        Verdict::RequireReview
    );

    let mut low_confidence = intent();
    low_confidence.model_confidence = 0.84;
    assert_eq!(
        evaluate_on(&low_confidence, &snapshot(), date!(2025 - 03 - 10)).verdict,
        Verdict::RequireReview
    );

    let mut at_floor = intent();
    at_floor.model_confidence = 0.85;
    assert_eq!(evaluate_on(&at_floor, &snapshot(), date!(2025 - 03 - 10)).verdict, Verdict::Approve);
}

#[test]
fn hash_material_contains_exactly_the_committed_fields() {
    let result = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 10));
    let keys: Vec<&str> = result.hash_material.keys().collect();
    assert_eq!(
        keys,
        vec![
            "decision",
            "policy_version_id",
            "requires_review",
            "snapshot_hash",
            "snapshot_id",
            "transaction_id",
            "violations",
        ]
    );
    assert_eq!(result.hash_material.get("decision").unwrap(), "APPROVE");
    assert_eq!(result.hash_material.get("snapshot_hash").unwrap(), "sha256:feedface");
}

#[test]
fn scopes_only_for_approvals() {
    let module = GrantsGovernanceModule::new();
    let approved = evaluate_on(&intent(), &snapshot(), date!(2025 - 03 - 10));
    assert_eq!(
        module.scopes_for(&intent(), &approved),
        BTreeSet::from([POST_GRANT_EXPENSE_SCOPE.to_string()])
    );

    let mut review = intent();
    review.amount = 12_000.0;
    let routed = evaluate_on(&review, &snapshot(), date!(2025 - 03 - 10));
    assert!(module.scopes_for(&review, &routed).is_empty());
}

#[test]
fn inconsistent_inputs_fail_fast() {
    let module = GrantsGovernanceModule::new();
    let evaluation_date = date!(2025 - 03 - 10);

    let blank = PolicyVersionId::new("  ");
    assert!(matches!(
        module.evaluate(&intent(), &snapshot(), &blank, evaluation_date),
        Err(GovernanceError::InvalidInput(_))
    ));

    let mut inverted = snapshot();
    inverted.grant_start_date = date!(2026 - 01 - 01);
    assert!(matches!(
        module.evaluate(&intent(), &inverted, &policy(), evaluation_date),
        Err(GovernanceError::InvalidInput(_))
    ));

    let mut not_finite = intent();
    not_finite.amount = f64::NAN;
    assert!(matches!(
        module.evaluate(&not_finite, &snapshot(), &policy(), evaluation_date),
        Err(GovernanceError::InvalidInput(_))
    ));

    for amount in [0.0, -5_000.0] {
        let mut non_positive = intent();
        non_positive.amount = amount;
        match module.evaluate(&non_positive, &snapshot(), &policy(), evaluation_date) {
            Err(GovernanceError::InvalidInput(message)) => {
                assert_eq!(message, "amount must be greater than 0");
            }
            other => panic!("amount {amount} was not rejected: {}", other.is_ok()),
        }
    }

    let mut bad_confidence = intent();
    bad_confidence.model_confidence = 1.5;
    assert!(matches!(
        module.evaluate(&bad_confidence, &snapshot(), &policy(), evaluation_date),
        Err(GovernanceError::InvalidInput(_))
    ));
}
