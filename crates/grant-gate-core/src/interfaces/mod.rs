// crates/grant-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Grant Gate Interfaces
// Description: Contracts for policy packs, clocks, and token identifier sources.
// Purpose: Define the seams the runtime is generic over.
// Dependencies: crate::core, thiserror, time
// ============================================================================

//! ## Overview
//! Interfaces isolate the only non-deterministic inputs (wall-clock time and
//! randomness) and the policy pack itself. Policy packs must be pure functions
//! of their arguments and fail closed on inconsistent inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;
use time::Date;
use time::OffsetDateTime;

use crate::core::DecisionResult;
use crate::core::HashError;
use crate::core::PolicyVersionId;

// ============================================================================
// SECTION: Governance Module
// ============================================================================

/// Domain evaluation failures raised by governance modules.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any error denies; no module approves by default on failure.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Intent or snapshot data is structurally inconsistent.
    #[error("inconsistent evaluation input: {0}")]
    InvalidInput(String),
    /// Hash material could not be assembled.
    #[error("hash material error: {0}")]
    Material(#[from] HashError),
}

/// Contract implemented by every domain-specific policy pack.
pub trait GovernanceModule {
    /// Intent record evaluated by the module.
    type Intent;
    /// Snapshot read model evaluated by the module.
    type Snapshot;

    /// Returns a stable module name for audit records.
    fn name(&self) -> &'static str;

    /// Evaluates an intent against a snapshot on the supplied date.
    ///
    /// Implementations must not read wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when inputs are inconsistent.
    fn evaluate(
        &self,
        intent: &Self::Intent,
        snapshot: &Self::Snapshot,
        policy_version_id: &PolicyVersionId,
        evaluation_date: Date,
    ) -> Result<DecisionResult, GovernanceError>;

    /// Returns the scopes an approving result authorizes; empty otherwise.
    fn scopes_for(&self, intent: &Self::Intent, result: &DecisionResult) -> BTreeSet<String>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current instant.
pub trait Clock {
    /// Returns the current UTC instant.
    fn now(&self) -> OffsetDateTime;
}

// ============================================================================
// SECTION: Token Identifier Source
// ============================================================================

/// Source of opaque token identifiers.
pub trait TokenIdSource {
    /// Returns a fresh token identifier.
    fn next_token_id(&self) -> String;
}
