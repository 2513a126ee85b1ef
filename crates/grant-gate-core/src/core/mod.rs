// crates/grant-gate-core/src/core/mod.rs
// ============================================================================
// Module: Grant Gate Core Types
// Description: Value types shared by policy packs, the orchestrator, and the gateway.
// Purpose: Provide stable, serializable records for intents, snapshots, and decisions.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types carry no behavior beyond construction and inspection. They are
//! the source of truth for every derived surface (CLI output, audit events,
//! token claims).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod decision;
pub mod grant;
pub mod hashing;
pub mod identifiers;
pub mod intake;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::Decision;
pub use decision::DecisionResult;
pub use decision::Finding;
pub use decision::Severity;
pub use decision::Verdict;
pub use grant::GrantSnapshot;
pub use grant::Intent;
pub use grant::RiskClass;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::HashMaterial;
pub use identifiers::GrantId;
pub use identifiers::PolicyVersionId;
pub use identifiers::RequestId;
pub use identifiers::SnapshotId;
pub use identifiers::TokenId;
pub use identifiers::TransactionId;
pub use intake::IntentValidationError;
pub use intake::validate_intent;
