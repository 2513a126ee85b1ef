// crates/grant-gate-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Decision Orchestrator
// Description: Delegates to a governance module and seals the decision.
// Purpose: Single path that turns module output into a hashed, timestamped decision.
// Dependencies: crate::{core, interfaces, runtime::clock}, thiserror, time
// ============================================================================

//! ## Overview
//! The orchestrator reads the clock exactly once per run. That instant stamps
//! the decision and, when no evaluation date is supplied, provides the UTC
//! calendar date handed to the module. The module never reads the clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::Date;

use crate::core::Decision;
use crate::core::DecisionResult;
use crate::core::GrantSnapshot;
use crate::core::HashError;
use crate::core::Intent;
use crate::core::PolicyVersionId;
use crate::core::hashing::compute_decision_hash;
use crate::interfaces::Clock;
use crate::interfaces::GovernanceError;
use crate::interfaces::GovernanceModule;
use crate::runtime::clock::SystemClock;
use crate::runtime::grants::GrantsGovernanceModule;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Orchestration failures.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The governance module failed; the error is passed through unchanged.
    #[error(transparent)]
    Evaluation(#[from] GovernanceError),
    /// Hash material could not be canonicalized.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Sealed decision together with the module result it was sealed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Raw module output, including hash material.
    pub result: DecisionResult,
    /// Sealed decision.
    pub decision: Decision,
}

/// Runs a governance module and seals its result into a [`Decision`].
#[derive(Debug, Clone)]
pub struct DecisionOrchestrator<M, C = SystemClock> {
    /// Policy pack used for evaluation.
    module: M,
    /// Clock used for the evaluation timestamp.
    clock: C,
}

impl<M: GovernanceModule> DecisionOrchestrator<M> {
    /// Creates an orchestrator backed by the system clock.
    #[must_use]
    pub const fn new(module: M) -> Self {
        Self {
            module,
            clock: SystemClock,
        }
    }
}

impl<M: GovernanceModule, C: Clock> DecisionOrchestrator<M, C> {
    /// Creates an orchestrator with an explicit clock.
    #[must_use]
    pub const fn with_clock(module: M, clock: C) -> Self {
        Self {
            module,
            clock,
        }
    }

    /// Returns the configured governance module.
    #[must_use]
    pub const fn module(&self) -> &M {
        &self.module
    }

    /// Evaluates an intent and returns the sealed decision.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Evaluation`] when the module rejects its
    /// inputs, or [`OrchestratorError::Hash`] when the material cannot be encoded.
    pub fn run(
        &self,
        intent: &M::Intent,
        snapshot: &M::Snapshot,
        policy_version_id: &PolicyVersionId,
        evaluation_date: Option<Date>,
    ) -> Result<Decision, OrchestratorError> {
        self.evaluate(intent, snapshot, policy_version_id, evaluation_date)
            .map(|evaluation| evaluation.decision)
    }

    /// Evaluates an intent and returns both the module result and the decision.
    ///
    /// # Errors
    ///
    /// Same as [`DecisionOrchestrator::run`].
    pub fn evaluate(
        &self,
        intent: &M::Intent,
        snapshot: &M::Snapshot,
        policy_version_id: &PolicyVersionId,
        evaluation_date: Option<Date>,
    ) -> Result<Evaluation, OrchestratorError> {
        let evaluated_at = self.clock.now();
        let evaluation_date = evaluation_date.unwrap_or_else(|| evaluated_at.date());
        let result = self.module.evaluate(intent, snapshot, policy_version_id, evaluation_date)?;
        let decision_hash = compute_decision_hash(&result.hash_material)?;
        let decision = Decision::seal(&result, decision_hash, evaluated_at);
        Ok(Evaluation {
            result,
            decision,
        })
    }
}

// ============================================================================
// SECTION: Convenience Entry Point
// ============================================================================

/// Evaluates a grant intent with the grants module and the system clock.
///
/// # Errors
///
/// Returns [`OrchestratorError`] when evaluation fails.
pub fn evaluate_grant_intent(
    intent: &Intent,
    snapshot: &GrantSnapshot,
    policy_version_id: &PolicyVersionId,
    evaluation_date: Option<Date>,
) -> Result<Decision, OrchestratorError> {
    DecisionOrchestrator::new(GrantsGovernanceModule::new()).run(
        intent,
        snapshot,
        policy_version_id,
        evaluation_date,
    )
}
