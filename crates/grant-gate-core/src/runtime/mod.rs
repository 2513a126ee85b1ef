// crates/grant-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Grant Gate Runtime
// Description: Policy pack, orchestrator, token gateway, audit, and facade.
// Purpose: Turn intents into sealed decisions and decision-bound tokens.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules evaluate intents through a governance module, seal the
//! result, and mint or verify posting tokens. Every surface (library, CLI)
//! goes through the same orchestrator so decisions hash identically.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod clock;
pub mod gate;
pub mod grants;
pub mod orchestrator;
pub mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DecisionAuditEvent;
pub use audit::FileAuditSink;
pub use audit::GateAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::TokenAuditEvent;
pub use audit::TokenOutcome;
pub use clock::FixedClock;
pub use clock::RandomTokenIds;
pub use clock::SequentialTokenIds;
pub use clock::SystemClock;
pub use gate::Authorization;
pub use gate::EvaluationRequest;
pub use gate::GateError;
pub use gate::GrantGate;
pub use gate::IssuedToken;
pub use gate::PostingBinding;
pub use grants::GrantsGovernanceModule;
pub use grants::POST_GRANT_EXPENSE_SCOPE;
pub use orchestrator::DecisionOrchestrator;
pub use orchestrator::Evaluation;
pub use orchestrator::OrchestratorError;
pub use orchestrator::evaluate_grant_intent;
pub use token::TokenClaims;
pub use token::TokenError;
pub use token::TokenErrorClass;
pub use token::TokenGateway;
pub use token::TokenRequest;
pub use token::TokenSettings;
pub use token::issue_token;
pub use token::validate_token;
