// crates/grant-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Grant Gate Facade
// Description: Evaluation-to-token flow and the posting authorization check.
// Purpose: Compose the orchestrator, token gateway, and audit sink.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror, time
// ============================================================================

//! ## Overview
//! [`GrantGate::evaluate`] runs the orchestrator and, only for APPROVE
//! verdicts with a non-empty scope set, mints a token bound to the decision
//! digest and the snapshot integrity hash.
//!
//! [`GrantGate::authorize_posting`] is the check a posting system runs before
//! acting: the token must verify, and its bound digest, snapshot hash,
//! transaction, and policy version must equal the caller's freshly derived
//! [`PostingBinding`]. A token minted for one decision never authorizes a
//! different, later-recomputed decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::core::Decision;
use crate::core::GrantSnapshot;
use crate::core::HashMaterial;
use crate::core::Intent;
use crate::core::PolicyVersionId;
use crate::core::RequestId;
use crate::core::TransactionId;
use crate::core::Verdict;
use crate::interfaces::Clock;
use crate::interfaces::GovernanceModule;
use crate::interfaces::TokenIdSource;
use crate::runtime::audit::DecisionAuditEvent;
use crate::runtime::audit::GateAuditSink;
use crate::runtime::audit::TokenAuditEvent;
use crate::runtime::clock::RandomTokenIds;
use crate::runtime::clock::SystemClock;
use crate::runtime::orchestrator::DecisionOrchestrator;
use crate::runtime::orchestrator::Evaluation;
use crate::runtime::orchestrator::OrchestratorError;
use crate::runtime::token::TokenClaims;
use crate::runtime::token::TokenError;
use crate::runtime::token::TokenGateway;
use crate::runtime::token::TokenRequest;
use crate::runtime::token::TokenSettings;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gate failures.
#[derive(Debug, Error)]
pub enum GateError {
    /// Evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] OrchestratorError),
    /// Token issuance or verification failed.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// A verified token is bound to different decision inputs.
    #[error("token binding mismatch: {field}")]
    BindingMismatch {
        /// Claim that did not match.
        field: &'static str,
    },
}

// ============================================================================
// SECTION: Requests and Results
// ============================================================================

/// Inputs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    /// Validated intent.
    pub intent: &'a Intent,
    /// Snapshot to evaluate against.
    pub snapshot: &'a GrantSnapshot,
    /// Policy version identifier.
    pub policy_version_id: &'a PolicyVersionId,
    /// Evaluation date; defaults to the current UTC date.
    pub evaluation_date: Option<Date>,
    /// Caller request identifier recorded in token claims.
    pub request_id: &'a RequestId,
}

/// Token minted for an approved decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// Compact signed token.
    pub token: String,
    /// Claims embedded in the token.
    pub claims: TokenClaims,
}

/// Outcome of [`GrantGate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    /// Sealed decision.
    pub decision: Decision,
    /// Material the decision digest was computed from.
    pub hash_material: HashMaterial,
    /// Scopes the decision authorizes.
    pub scopes: BTreeSet<String>,
    /// Token, present only for approvals.
    pub token: Option<IssuedToken>,
}

/// Values a posting system re-derives before honoring a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingBinding {
    /// Transaction being posted.
    pub transaction_id: TransactionId,
    /// Digest of the current decision.
    pub decision_hash: String,
    /// Integrity hash of the snapshot the current decision used.
    pub snapshot_hash: String,
    /// Policy version of the current decision.
    pub policy_version_id: PolicyVersionId,
}

impl PostingBinding {
    /// Derives the binding from a decision and the inputs it was computed from.
    #[must_use]
    pub fn for_decision(decision: &Decision, intent: &Intent, snapshot: &GrantSnapshot) -> Self {
        Self {
            transaction_id: intent.transaction_id.clone(),
            decision_hash: decision.decision_hash().value.clone(),
            snapshot_hash: snapshot.snapshot_hash.clone(),
            policy_version_id: decision.policy_version_id().clone(),
        }
    }

    /// Returns the first claim that differs from the binding.
    fn mismatch(&self, claims: &TokenClaims) -> Option<&'static str> {
        if claims.decision_hash != self.decision_hash {
            Some("decision_hash")
        } else if claims.state_snapshot_hash != self.snapshot_hash {
            Some("state_snapshot_hash")
        } else if claims.transaction_id != self.transaction_id {
            Some("transaction_id")
        } else if claims.policy_version_id != self.policy_version_id {
            Some("policy_version_id")
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Evaluation and authorization facade.
pub struct GrantGate<M, C = SystemClock, I = RandomTokenIds> {
    /// Decision orchestrator.
    orchestrator: DecisionOrchestrator<M, C>,
    /// Token gateway.
    gateway: TokenGateway<C, I>,
    /// Clock used for audit timestamps.
    clock: C,
    /// Audit sink.
    audit: Arc<dyn GateAuditSink>,
}

impl<M> GrantGate<M>
where
    M: GovernanceModule<Intent = Intent, Snapshot = GrantSnapshot>,
{
    /// Creates a gate with the system clock and random token identifiers.
    #[must_use]
    pub fn new(module: M, settings: TokenSettings, audit: Arc<dyn GateAuditSink>) -> Self {
        Self::with_sources(module, SystemClock, RandomTokenIds, settings, audit)
    }
}

impl<M, C, I> GrantGate<M, C, I>
where
    M: GovernanceModule<Intent = Intent, Snapshot = GrantSnapshot>,
    C: Clock + Clone,
    I: TokenIdSource,
{
    /// Creates a gate with explicit clock and identifier sources.
    #[must_use]
    pub fn with_sources(
        module: M,
        clock: C,
        ids: I,
        settings: TokenSettings,
        audit: Arc<dyn GateAuditSink>,
    ) -> Self {
        Self {
            orchestrator: DecisionOrchestrator::with_clock(module, clock.clone()),
            gateway: TokenGateway::with_sources(clock.clone(), ids, settings),
            clock,
            audit,
        }
    }

    /// Evaluates an intent and mints a token when it is approved.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Evaluation`] when evaluation fails and
    /// [`GateError::Token`] when an approved decision cannot be signed.
    pub fn evaluate(
        &self,
        request: EvaluationRequest<'_>,
        secret: &[u8],
    ) -> Result<Authorization, GateError> {
        let Evaluation {
            result,
            decision,
        } = self.orchestrator.evaluate(
            request.intent,
            request.snapshot,
            request.policy_version_id,
            request.evaluation_date,
        )?;
        let module = self.orchestrator.module();
        self.audit.record_decision(&DecisionAuditEvent::new(
            module.name(),
            &request.intent.transaction_id,
            &decision,
            self.clock.now(),
        ));

        let scopes = if decision.verdict() == Verdict::Approve {
            module.scopes_for(request.intent, &result)
        } else {
            BTreeSet::new()
        };
        if scopes.is_empty() {
            return Ok(Authorization {
                decision,
                hash_material: result.hash_material,
                scopes,
                token: None,
            });
        }

        let token = self.mint(&decision, &request, &scopes, secret)?;
        Ok(Authorization {
            decision,
            hash_material: result.hash_material,
            scopes,
            token: Some(token),
        })
    }

    /// Verifies a token and its binding to the caller's current decision.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Token`] when verification fails and
    /// [`GateError::BindingMismatch`] when the token is bound elsewhere.
    pub fn authorize_posting(
        &self,
        token: &str,
        secret: &[u8],
        required_scope: &str,
        binding: &PostingBinding,
    ) -> Result<TokenClaims, GateError> {
        let claims = match self.gateway.validate(token, secret, required_scope) {
            Ok(claims) => claims,
            Err(err) => {
                self.audit.record_token(&TokenAuditEvent::rejected(
                    &err,
                    required_scope,
                    self.clock.now(),
                ));
                return Err(err.into());
            }
        };
        if let Some(field) = binding.mismatch(&claims) {
            self.audit.record_token(&TokenAuditEvent::denied(
                "token_rejected",
                "binding_mismatch",
                Some(&claims),
                Some(required_scope),
                self.clock.now(),
            ));
            return Err(GateError::BindingMismatch {
                field,
            });
        }
        self.audit.record_token(&TokenAuditEvent::verified(&claims, required_scope, self.clock.now()));
        Ok(claims)
    }

    /// Builds, signs, and audits a token for an approved decision.
    fn mint(
        &self,
        decision: &Decision,
        request: &EvaluationRequest<'_>,
        scopes: &BTreeSet<String>,
        secret: &[u8],
    ) -> Result<IssuedToken, GateError> {
        let claims = self.gateway.claims(TokenRequest {
            request_id: request.request_id.clone(),
            transaction_id: request.intent.transaction_id.clone(),
            decision_hash: decision.decision_hash().value.clone(),
            policy_version_id: decision.policy_version_id().clone(),
            state_snapshot_hash: request.snapshot.snapshot_hash.clone(),
            scope: scopes.clone(),
        })?;
        match self.gateway.issue(&claims, secret) {
            Ok(token) => {
                self.audit.record_token(&TokenAuditEvent::issued(&claims, self.clock.now()));
                Ok(IssuedToken {
                    token,
                    claims,
                })
            }
            Err(err) => {
                self.audit.record_token(&TokenAuditEvent::denied(
                    "token_issue_failed",
                    err.label(),
                    Some(&claims),
                    None,
                    self.clock.now(),
                ));
                Err(err.into())
            }
        }
    }
}
