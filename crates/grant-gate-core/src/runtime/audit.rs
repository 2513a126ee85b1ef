// crates/grant-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Grant Gate Audit Logging
// Description: Structured audit events for decisions and token checks.
// Purpose: Emit redacted JSON-lines audit records without hard dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are flat, serializable records routed through a
//! [`GateAuditSink`]. Token strings and secrets are never recorded; token
//! events carry identifiers and an error label only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;

use crate::core::Decision;
use crate::core::TransactionId;
use crate::core::Verdict;
use crate::core::time::unix_millis;
use crate::runtime::token::TokenClaims;
use crate::runtime::token::TokenError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Decision audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i128,
    /// Governance module name.
    pub module: &'static str,
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Decision verdict.
    pub verdict: Verdict,
    /// Review routing flag.
    pub requires_review: bool,
    /// Rule identifiers of all findings, in order.
    pub rule_ids: Vec<String>,
    /// Decision digest (lowercase hex).
    pub decision_hash: String,
    /// Policy version identifier.
    pub policy_version_id: String,
    /// Snapshot identifier.
    pub snapshot_id: String,
}

impl DecisionAuditEvent {
    /// Creates a decision event from a sealed decision.
    #[must_use]
    pub fn new(
        module: &'static str,
        transaction_id: &TransactionId,
        decision: &Decision,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            event: "decision_evaluated",
            timestamp_ms: unix_millis(now),
            module,
            transaction_id: transaction_id.clone(),
            verdict: decision.verdict(),
            requires_review: decision.requires_review(),
            rule_ids: decision.findings().iter().map(|finding| finding.rule_id.clone()).collect(),
            decision_hash: decision.decision_hash().value.clone(),
            policy_version_id: decision.policy_version_id().to_string(),
            snapshot_id: decision.snapshot_id().to_string(),
        }
    }
}

/// Token check outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOutcome {
    /// Token issued or accepted.
    Ok,
    /// Token refused.
    Deny,
}

/// Token audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i128,
    /// Token identifier when known.
    pub token_id: Option<String>,
    /// Request identifier when known.
    pub request_id: Option<String>,
    /// Transaction identifier when known.
    pub transaction_id: Option<String>,
    /// Scope requested by the verifier.
    pub required_scope: Option<String>,
    /// Outcome classification.
    pub outcome: TokenOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl TokenAuditEvent {
    /// Creates an event for a successfully issued token.
    #[must_use]
    pub fn issued(claims: &TokenClaims, now: OffsetDateTime) -> Self {
        Self::from_claims("token_issued", claims, None, now)
    }

    /// Creates an event for an accepted token.
    #[must_use]
    pub fn verified(claims: &TokenClaims, required_scope: &str, now: OffsetDateTime) -> Self {
        Self::from_claims("token_verified", claims, Some(required_scope), now)
    }

    /// Creates an event for a refused issuance or verification.
    #[must_use]
    pub fn denied(
        event: &'static str,
        error_kind: &'static str,
        claims: Option<&TokenClaims>,
        required_scope: Option<&str>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            event,
            timestamp_ms: unix_millis(now),
            token_id: claims.map(|claims| claims.token_id.to_string()),
            request_id: claims.map(|claims| claims.request_id.to_string()),
            transaction_id: claims.map(|claims| claims.transaction_id.to_string()),
            required_scope: required_scope.map(str::to_string),
            outcome: TokenOutcome::Deny,
            error_kind: Some(error_kind),
        }
    }

    /// Creates an event for a token error without verified claims.
    #[must_use]
    pub fn rejected(error: &TokenError, required_scope: &str, now: OffsetDateTime) -> Self {
        Self::denied("token_rejected", error.label(), None, Some(required_scope), now)
    }

    /// Builds a successful event from claims.
    fn from_claims(
        event: &'static str,
        claims: &TokenClaims,
        required_scope: Option<&str>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            event,
            timestamp_ms: unix_millis(now),
            token_id: Some(claims.token_id.to_string()),
            request_id: Some(claims.request_id.to_string()),
            transaction_id: Some(claims.transaction_id.to_string()),
            required_scope: required_scope.map(str::to_string),
            outcome: TokenOutcome::Ok,
            error_kind: None,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for decision and token events.
pub trait GateAuditSink: Send + Sync {
    /// Record a decision event.
    fn record_decision(&self, event: &DecisionAuditEvent);

    /// Record a token event.
    fn record_token(&self, event: &TokenAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl GateAuditSink for StderrAuditSink {
    fn record_decision(&self, event: &DecisionAuditEvent) {
        write_stderr(event);
    }

    fn record_token(&self, event: &TokenAuditEvent) {
        write_stderr(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl GateAuditSink for FileAuditSink {
    fn record_decision(&self, event: &DecisionAuditEvent) {
        self.append(event);
    }

    fn record_token(&self, event: &TokenAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl GateAuditSink for NoopAuditSink {
    fn record_decision(&self, _event: &DecisionAuditEvent) {}

    fn record_token(&self, _event: &TokenAuditEvent) {}
}

/// Writes one serialized event to stderr.
fn write_stderr<T: Serialize>(event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(std::io::stderr(), "{payload}");
    }
}
