// crates/grant-gate-core/src/lib.rs
// ============================================================================
// Module: Grant Gate Core Library
// Description: Public API surface for the grant expense governance gate.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Grant Gate evaluates proposed grant expense postings against a snapshot of
//! grant state, seals a content-hashed decision, and issues short-lived
//! signed tokens that bind a posting authorization to exactly one decision.
//! Evaluation is deterministic; clocks and token identifiers are injected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::Decision;
pub use core::DecisionResult;
pub use core::Finding;
pub use core::GrantId;
pub use core::GrantSnapshot;
pub use core::HashDigest;
pub use core::HashError;
pub use core::HashMaterial;
pub use core::Intent;
pub use core::IntentValidationError;
pub use core::PolicyVersionId;
pub use core::RequestId;
pub use core::RiskClass;
pub use core::Severity;
pub use core::SnapshotId;
pub use core::TokenId;
pub use core::TransactionId;
pub use core::Verdict;
pub use core::hashing::compute_decision_hash;
pub use core::validate_intent;

pub use interfaces::Clock;
pub use interfaces::GovernanceError;
pub use interfaces::GovernanceModule;
pub use interfaces::TokenIdSource;
pub use runtime::Authorization;
pub use runtime::DecisionOrchestrator;
pub use runtime::EvaluationRequest;
pub use runtime::FixedClock;
pub use runtime::GateAuditSink;
pub use runtime::GateError;
pub use runtime::GrantGate;
pub use runtime::GrantsGovernanceModule;
pub use runtime::OrchestratorError;
pub use runtime::PostingBinding;
pub use runtime::SequentialTokenIds;
pub use runtime::SystemClock;
pub use runtime::TokenClaims;
pub use runtime::TokenError;
pub use runtime::TokenGateway;
pub use runtime::TokenRequest;
pub use runtime::TokenSettings;
pub use runtime::evaluate_grant_intent;
pub use runtime::issue_token;
pub use runtime::validate_token;
