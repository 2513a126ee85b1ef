// crates/grant-gate-core/tests/orchestrator.rs
// ============================================================================
// Module: Decision Orchestrator Tests
// Description: Sealing, timestamping, and error pass-through.
// ============================================================================
//! ## Overview
//! Validates that the orchestrator reads the injected clock once, derives the
//! default evaluation date from it, and hashes only the module material.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use grant_gate_core::DecisionOrchestrator;
use grant_gate_core::DecisionResult;
use grant_gate_core::FixedClock;
use grant_gate_core::GovernanceError;
use grant_gate_core::GovernanceModule;
use grant_gate_core::GrantSnapshot;
use grant_gate_core::GrantsGovernanceModule;
use grant_gate_core::HashMaterial;
use grant_gate_core::Intent;
use grant_gate_core::OrchestratorError;
use grant_gate_core::PolicyVersionId;
use grant_gate_core::RiskClass;
use grant_gate_core::Verdict;
use grant_gate_core::evaluate_grant_intent;
use grant_gate_core::runtime::grants::RULE_SNAPSHOT_AGE;
use time::Date;
use time::OffsetDateTime;
use time::macros::date;
use time::macros::datetime;

fn intent() -> Intent {
    Intent {
        transaction_id: "txn-2001".into(),
        grant_id: "grant-doe-9".into(),
        org_unit: "biology".to_string(),
        amount: 5_000.0,
        currency: "USD".to_string(),
        object_code: "EQUIPMENT".to_string(),
        expense_date: date!(2025 - 03 - 05),
        posting_date: date!(2025 - 03 - 10),
        description: "Centrifuge rotor".to_string(),
        evidence_refs: vec!["po-314".to_string()],
        model_confidence: 0.95,
        risk_class: RiskClass::Low,
        rationale_summary: "Equipment within budget.".to_string(),
    }
}

fn snapshot() -> GrantSnapshot {
    GrantSnapshot {
        snapshot_id: "snap-2025-03-10".into(),
        snapshot_hash: "c0ffee".to_string(),
        as_of_date: date!(2025 - 03 - 10),
        grant_start_date: date!(2025 - 01 - 01),
        grant_end_date: date!(2025 - 12 - 31),
        budget_remaining: 50_000.0,
        allowed_object_codes: BTreeSet::from(["EQUIPMENT".to_string()]),
        high_dollar_threshold: 10_000.0,
        max_snapshot_age_days: 1,
    }
}

fn orchestrator_at(now: OffsetDateTime) -> DecisionOrchestrator<GrantsGovernanceModule, FixedClock> {
    DecisionOrchestrator::with_clock(GrantsGovernanceModule::new(), FixedClock::new(now))
}

#[test]
fn identical_inputs_produce_identical_digests() {
    let policy = PolicyVersionId::new("v1");
    let first = orchestrator_at(datetime!(2025-03-10 09:00 UTC))
        .run(&intent(), &snapshot(), &policy, Some(date!(2025 - 03 - 10)))
        .unwrap();
    let second = orchestrator_at(datetime!(2025-03-10 17:45 UTC))
        .run(&intent(), &snapshot(), &policy, Some(date!(2025 - 03 - 10)))
        .unwrap();
    assert_eq!(first.decision_hash(), second.decision_hash());
    assert_ne!(first.evaluated_at(), second.evaluated_at());
}

#[test]
fn convenience_entry_point_approves_clean_intent() {
    let policy = PolicyVersionId::new("v1");
    let evaluation_date = Some(date!(2025 - 03 - 10));
    let decision = evaluate_grant_intent(&intent(), &snapshot(), &policy, evaluation_date).unwrap();
    assert_eq!(decision.verdict(), Verdict::Approve);
    assert!(decision.findings().is_empty());
    assert!(!decision.requires_review());

    let pinned = orchestrator_at(datetime!(2025-03-10 09:00 UTC))
        .run(&intent(), &snapshot(), &policy, evaluation_date)
        .unwrap();
    assert_eq!(decision.decision_hash(), pinned.decision_hash());
}

#[test]
fn decision_is_stamped_with_the_clock_instant() {
    let now = datetime!(2025-03-11 08:30 UTC);
    let decision = orchestrator_at(now)
        .run(&intent(), &snapshot(), &PolicyVersionId::new("v1"), None)
        .unwrap();
    assert_eq!(decision.evaluated_at(), now);
    assert_eq!(decision.verdict(), Verdict::Approve);
    assert_eq!(decision.policy_version_id().as_str(), "v1");
    assert_eq!(decision.snapshot_id().as_str(), "snap-2025-03-10");
}

#[test]
fn default_evaluation_date_comes_from_the_clock() {
    let decision = orchestrator_at(datetime!(2025-03-13 00:00:01 UTC))
        .run(&intent(), &snapshot(), &PolicyVersionId::new("v1"), None)
        .unwrap();
    assert_eq!(decision.verdict(), Verdict::Reject);
    assert!(decision.has_finding(RULE_SNAPSHOT_AGE));
}

#[test]
fn explicit_evaluation_date_overrides_the_clock() {
    let decision = orchestrator_at(datetime!(2030-01-01 00:00 UTC))
        .run(&intent(), &snapshot(), &PolicyVersionId::new("v1"), Some(date!(2025 - 03 - 10)))
        .unwrap();
    assert_eq!(decision.verdict(), Verdict::Approve);
}

#[test]
fn module_errors_pass_through_unchanged() {
    let result = orchestrator_at(datetime!(2025-03-10 09:00 UTC)).run(
        &intent(),
        &snapshot(),
        &PolicyVersionId::new(""),
        None,
    );
    assert!(matches!(
        result,
        Err(OrchestratorError::Evaluation(GovernanceError::InvalidInput(_)))
    ));
}

#[test]
fn decision_serializes_with_wire_field_names() {
    let decision = orchestrator_at(datetime!(2025-03-10 09:00 UTC))
        .run(&intent(), &snapshot(), &PolicyVersionId::new("v1"), None)
        .unwrap();
    let value = serde_json::to_value(&decision).unwrap();
    assert_eq!(value["decision"], "APPROVE");
    assert_eq!(value["violations"], serde_json::json!([]));
    assert_eq!(value["requires_review"], false);
    assert_eq!(value["evaluated_at"], "2025-03-10T09:00:00Z");
    assert_eq!(value["state_snapshot_id"], "snap-2025-03-10");
    assert_eq!(value["decision_hash"]["value"], decision.decision_hash().value.as_str());
}

struct FixedVerdictModule;

impl GovernanceModule for FixedVerdictModule {
    type Intent = String;
    type Snapshot = ();

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn evaluate(
        &self,
        intent: &String,
        _snapshot: &(),
        policy_version_id: &PolicyVersionId,
        _evaluation_date: Date,
    ) -> Result<DecisionResult, GovernanceError> {
        Ok(DecisionResult {
            verdict: Verdict::RequireReview,
            findings: Vec::new(),
            requires_review: true,
            policy_version_id: policy_version_id.clone(),
            snapshot_id: "none".into(),
            hash_material: HashMaterial::new().with("intent", intent)?,
        })
    }

    fn scopes_for(&self, _intent: &String, _result: &DecisionResult) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

#[test]
fn orchestrator_accepts_any_governance_module() {
    let orchestrator = DecisionOrchestrator::with_clock(
        FixedVerdictModule,
        FixedClock::new(datetime!(2025-01-01 00:00 UTC)),
    );
    let evaluation = orchestrator
        .evaluate(&"payload".to_string(), &(), &PolicyVersionId::new("v9"), None)
        .unwrap();
    assert_eq!(orchestrator.module().name(), "fixed");
    assert_eq!(evaluation.decision.verdict(), Verdict::RequireReview);
    assert_eq!(
        *evaluation.decision.decision_hash(),
        grant_gate_core::compute_decision_hash(&evaluation.result.hash_material).unwrap()
    );
}
