// crates/grant-gate-core/src/runtime/token.rs
// ============================================================================
// Module: Token Gateway
// Description: Issuance and verification of decision-bound posting tokens.
// Purpose: Bind a posting authorization to one decision digest and snapshot hash.
// Dependencies: base64, crate::{core, interfaces, runtime::clock}, hmac, serde, sha2, subtle
// ============================================================================

//! ## Overview
//! A token is `base64url(payload) + "." + base64url(signature)` with padding
//! stripped, where `payload` is the RFC 8785 encoding of [`TokenClaims`] and
//! `signature` is HMAC-SHA256 over those bytes.
//!
//! Verification checks, in order: token shape, secret, segment encoding,
//! signature (constant-time), claims decoding and timestamps, expiry,
//! future-dated issuance, and scope. The first failing check is reported.
//!
//! The gateway keeps no redemption state. `one_time_use` is carried for
//! downstream ledgers; replay prevention beyond expiry is external.
//!
//! Security posture: every error denies. Callers must additionally compare
//! `decision_hash` and `state_snapshot_hash` against the current decision
//! before acting (see [`crate::runtime::gate::GrantGate::authorize_posting`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::PolicyVersionId;
use crate::core::RequestId;
use crate::core::TokenId;
use crate::core::TransactionId;
use crate::core::hashing::canonical_json_bytes;
use crate::core::time::checked_add_seconds;
use crate::core::time::format_rfc3339;
use crate::core::time::parse_rfc3339;
use crate::interfaces::Clock;
use crate::interfaces::TokenIdSource;
use crate::runtime::clock::RandomTokenIds;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 300;

/// Default tolerance for `issued_at` values ahead of the verifier clock.
pub const DEFAULT_MAX_FUTURE_SKEW_SECONDS: i64 = 10;

/// Separator between the payload and signature segments.
const SEGMENT_SEPARATOR: char = '.';

/// HMAC-SHA256 keyed MAC.
type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error class used by callers to route token failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorClass {
    /// Malformed input; surfaced to the immediate caller.
    Validation,
    /// Integrity, lifetime, or authorization failure.
    Security,
}

/// Token issuance and verification failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Every variant is a denial; there is no fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token is not two non-empty segments joined by one separator.
    #[error("malformed token")]
    Malformed,
    /// Signing secret is empty.
    #[error("invalid secret")]
    InvalidSecret,
    /// A segment is not valid unpadded base64url.
    #[error("invalid encoding")]
    InvalidEncoding,
    /// Signature does not match the payload.
    #[error("invalid signature")]
    InvalidSignature,
    /// Payload does not decode into claims.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    /// Timestamps are not timezone-qualified RFC 3339 values.
    #[error("invalid timestamps")]
    InvalidTimestamps,
    /// Token is at or past its expiry.
    #[error("expired")]
    Expired,
    /// Token was issued beyond the allowed clock skew.
    #[error("issued in the future")]
    IssuedInFuture,
    /// Required scope is not granted.
    #[error("missing scope: {0}")]
    MissingScope(String),
}

impl TokenError {
    /// Returns the error class.
    #[must_use]
    pub const fn class(&self) -> TokenErrorClass {
        match self {
            Self::Malformed
            | Self::InvalidSecret
            | Self::InvalidEncoding
            | Self::InvalidClaims(_)
            | Self::InvalidTimestamps => TokenErrorClass::Validation,
            Self::InvalidSignature | Self::Expired | Self::IssuedInFuture | Self::MissingScope(_) => {
                TokenErrorClass::Security
            }
        }
    }

    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed_token",
            Self::InvalidSecret => "invalid_secret",
            Self::InvalidEncoding => "invalid_encoding",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidClaims(_) => "invalid_claims",
            Self::InvalidTimestamps => "invalid_timestamps",
            Self::Expired => "expired",
            Self::IssuedInFuture => "issued_in_future",
            Self::MissingScope(_) => "missing_scope",
        }
    }
}

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Decision-derived inputs for a new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Caller request identifier.
    pub request_id: RequestId,
    /// Transaction the token authorizes.
    pub transaction_id: TransactionId,
    /// Digest of the authorizing decision.
    pub decision_hash: String,
    /// Policy version that produced the decision.
    pub policy_version_id: PolicyVersionId,
    /// Integrity hash of the snapshot the decision used.
    pub state_snapshot_hash: String,
    /// Authorized scopes.
    pub scope: BTreeSet<String>,
}

/// Signed token claims.
///
/// # Invariants
/// - `issued_at` and `expires_at` are RFC 3339 strings with an offset.
/// - `one_time_use` is always true for tokens minted by [`TokenClaims::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenClaims {
    /// Opaque random token identifier.
    pub token_id: TokenId,
    /// Caller request identifier.
    pub request_id: RequestId,
    /// Transaction the token authorizes.
    pub transaction_id: TransactionId,
    /// Digest of the authorizing decision.
    pub decision_hash: String,
    /// Policy version that produced the decision.
    pub policy_version_id: PolicyVersionId,
    /// Integrity hash of the snapshot the decision used.
    pub state_snapshot_hash: String,
    /// Authorized scopes.
    pub scope: BTreeSet<String>,
    /// Issuance instant (RFC 3339).
    pub issued_at: String,
    /// Expiry instant (RFC 3339).
    pub expires_at: String,
    /// Single-redemption marker for downstream ledgers.
    pub one_time_use: bool,
}

impl TokenClaims {
    /// Builds claims with a random identifier and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidTimestamps`] when `now + ttl` overflows.
    pub fn new(request: TokenRequest, ttl_seconds: i64) -> Result<Self, TokenError> {
        Self::new_with(request, ttl_seconds, &SystemClock, &RandomTokenIds)
    }

    /// Builds claims from explicit clock and identifier sources.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidTimestamps`] when `now + ttl` overflows.
    pub fn new_with(
        request: TokenRequest,
        ttl_seconds: i64,
        clock: &impl Clock,
        ids: &impl TokenIdSource,
    ) -> Result<Self, TokenError> {
        let issued_at = clock.now();
        let expires_at =
            checked_add_seconds(issued_at, ttl_seconds).ok_or(TokenError::InvalidTimestamps)?;
        Ok(Self {
            token_id: TokenId::new(ids.next_token_id()),
            request_id: request.request_id,
            transaction_id: request.transaction_id,
            decision_hash: request.decision_hash,
            policy_version_id: request.policy_version_id,
            state_snapshot_hash: request.state_snapshot_hash,
            scope: request.scope,
            issued_at: format_rfc3339(issued_at).map_err(|_| TokenError::InvalidTimestamps)?,
            expires_at: format_rfc3339(expires_at).map_err(|_| TokenError::InvalidTimestamps)?,
            one_time_use: true,
        })
    }

    /// Returns true when the scope is granted.
    #[must_use]
    pub fn grants(&self, scope: &str) -> bool {
        self.scope.contains(scope)
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Token lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Lifetime applied to new claims.
    pub ttl_seconds: i64,
    /// Allowed lead of `issued_at` over the verifier clock.
    pub max_future_skew_seconds: i64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            max_future_skew_seconds: DEFAULT_MAX_FUTURE_SKEW_SECONDS,
        }
    }
}

/// Issues and verifies tokens against an injected clock and id source.
#[derive(Debug, Clone)]
pub struct TokenGateway<C = SystemClock, I = RandomTokenIds> {
    /// Clock used for issuance and expiry checks.
    clock: C,
    /// Source of token identifiers.
    ids: I,
    /// Lifetime settings.
    settings: TokenSettings,
}

impl TokenGateway {
    /// Creates a gateway with the system clock and random identifiers.
    #[must_use]
    pub const fn new(settings: TokenSettings) -> Self {
        Self {
            clock: SystemClock,
            ids: RandomTokenIds,
            settings,
        }
    }
}

impl Default for TokenGateway {
    fn default() -> Self {
        Self::new(TokenSettings::default())
    }
}

impl<C: Clock, I: TokenIdSource> TokenGateway<C, I> {
    /// Creates a gateway with explicit sources.
    #[must_use]
    pub const fn with_sources(clock: C, ids: I, settings: TokenSettings) -> Self {
        Self {
            clock,
            ids,
            settings,
        }
    }

    /// Returns the lifetime settings.
    #[must_use]
    pub const fn settings(&self) -> TokenSettings {
        self.settings
    }

    /// Builds claims for a request using the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidTimestamps`] when the expiry overflows.
    pub fn claims(&self, request: TokenRequest) -> Result<TokenClaims, TokenError> {
        TokenClaims::new_with(request, self.settings.ttl_seconds, &self.clock, &self.ids)
    }

    /// Signs claims into a compact token string.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidSecret`] when `secret` is empty.
    pub fn issue(&self, claims: &TokenClaims, secret: &[u8]) -> Result<String, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        let payload =
            canonical_json_bytes(claims).map_err(|err| TokenError::InvalidClaims(err.to_string()))?;
        let signature = sign(&payload, secret)?;
        Ok(format!(
            "{}{SEGMENT_SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verifies a token and returns its claims unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] for the first failing check.
    pub fn validate(
        &self,
        token: &str,
        secret: &[u8],
        required_scope: &str,
    ) -> Result<TokenClaims, TokenError> {
        let (encoded_payload, encoded_signature) = split_token(token)?;
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        let payload =
            URL_SAFE_NO_PAD.decode(encoded_payload).map_err(|_| TokenError::InvalidEncoding)?;
        let supplied =
            URL_SAFE_NO_PAD.decode(encoded_signature).map_err(|_| TokenError::InvalidEncoding)?;

        let expected = sign(&payload, secret)?;
        if !bool::from(expected.as_slice().ct_eq(supplied.as_slice())) {
            return Err(TokenError::InvalidSignature);
        }

        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|err| TokenError::InvalidClaims(err.to_string()))?;
        self.check_lifetime(&claims)?;
        if !claims.grants(required_scope) {
            return Err(TokenError::MissingScope(required_scope.to_string()));
        }
        Ok(claims)
    }

    /// Checks timestamp shape, expiry, and future-dated issuance.
    fn check_lifetime(&self, claims: &TokenClaims) -> Result<(), TokenError> {
        let issued_at = parse_rfc3339(&claims.issued_at).map_err(|_| TokenError::InvalidTimestamps)?;
        let expires_at =
            parse_rfc3339(&claims.expires_at).map_err(|_| TokenError::InvalidTimestamps)?;
        let now = self.clock.now();
        if expires_at <= now {
            return Err(TokenError::Expired);
        }
        if is_beyond_skew(issued_at, now, self.settings.max_future_skew_seconds) {
            return Err(TokenError::IssuedInFuture);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Free Functions
// ============================================================================

/// Signs claims with default settings.
///
/// # Errors
///
/// Returns [`TokenError::InvalidSecret`] when `secret` is empty.
pub fn issue_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, TokenError> {
    TokenGateway::default().issue(claims, secret)
}

/// Verifies a token against the system clock with default settings.
///
/// # Errors
///
/// Returns the [`TokenError`] for the first failing check.
pub fn validate_token(
    token: &str,
    secret: &[u8],
    required_scope: &str,
) -> Result<TokenClaims, TokenError> {
    TokenGateway::default().validate(token, secret, required_scope)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits a token into exactly two non-empty segments.
fn split_token(token: &str) -> Result<(&str, &str), TokenError> {
    let mut segments = token.split(SEGMENT_SEPARATOR);
    match (segments.next(), segments.next(), segments.next()) {
        (Some(payload), Some(signature), None) if !payload.is_empty() && !signature.is_empty() => {
            Ok((payload, signature))
        }
        _ => Err(TokenError::Malformed),
    }
}

/// Computes HMAC-SHA256 over the payload.
fn sign(payload: &[u8], secret: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSecret)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Returns true when `issued_at` leads `now` by more than the skew.
fn is_beyond_skew(issued_at: OffsetDateTime, now: OffsetDateTime, skew_seconds: i64) -> bool {
    checked_add_seconds(now, skew_seconds).is_none_or(|latest| issued_at > latest)
}
