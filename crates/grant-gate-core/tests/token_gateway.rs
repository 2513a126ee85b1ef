// crates/grant-gate-core/tests/token_gateway.rs
// ============================================================================
// Module: Token Gateway Tests
// Description: Issuance, verification order, and error classification.
// ============================================================================
//! ## Overview
//! Each verification failure point is triggered in isolation against a fixed
//! clock so lifetimes and skew are exact.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use grant_gate_core::FixedClock;
use grant_gate_core::SequentialTokenIds;
use grant_gate_core::TokenClaims;
use grant_gate_core::TokenError;
use grant_gate_core::TokenGateway;
use grant_gate_core::TokenRequest;
use grant_gate_core::TokenSettings;
use grant_gate_core::issue_token;
use grant_gate_core::validate_token;
use grant_gate_core::core::hashing::canonical_json_bytes;
use grant_gate_core::runtime::TokenErrorClass;
use grant_gate_core::runtime::grants::POST_GRANT_EXPENSE_SCOPE;
use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;
use time::OffsetDateTime;
use time::macros::datetime;

const SECRET: &[u8] = b"test-signing-secret";

fn now() -> OffsetDateTime {
    datetime!(2025-03-10 12:00 UTC)
}

fn gateway_at(instant: OffsetDateTime) -> TokenGateway<FixedClock, SequentialTokenIds> {
    TokenGateway::with_sources(
        FixedClock::new(instant),
        SequentialTokenIds::new(),
        TokenSettings::default(),
    )
}

fn request() -> TokenRequest {
    TokenRequest {
        request_id: "req-1".into(),
        transaction_id: "txn-1".into(),
        decision_hash: "d".repeat(64),
        policy_version_id: "v1".into(),
        state_snapshot_hash: "s".repeat(64),
        scope: BTreeSet::from([POST_GRANT_EXPENSE_SCOPE.to_string()]),
    }
}

fn signed_token(claims: &TokenClaims) -> String {
    gateway_at(now()).issue(claims, SECRET).unwrap()
}

#[test]
fn new_claims_carry_lifetime_and_single_use_flag() {
    let claims = gateway_at(now()).claims(request()).unwrap();
    assert_eq!(claims.token_id.as_str(), "tok_000001");
    assert_eq!(claims.issued_at, "2025-03-10T12:00:00Z");
    assert_eq!(claims.expires_at, "2025-03-10T12:05:00Z");
    assert!(claims.one_time_use);
}

#[test]
fn sequential_ids_advance_per_claim() {
    let gateway = gateway_at(now());
    let first = gateway.claims(request()).unwrap();
    let second = gateway.claims(request()).unwrap();
    assert_eq!(first.token_id.as_str(), "tok_000001");
    assert_eq!(second.token_id.as_str(), "tok_000002");
}

#[test]
fn random_token_ids_are_prefixed_hex() {
    let claims = TokenClaims::new(request(), 60).unwrap();
    let id = claims.token_id.as_str();
    assert!(id.starts_with("tok_"));
    assert_eq!(id.len(), 4 + 24);
    assert!(id[4 ..].chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
}

#[test]
fn round_trip_returns_identical_claims() {
    let gateway = gateway_at(now());
    let claims = gateway.claims(request()).unwrap();
    let token = gateway.issue(&claims, SECRET).unwrap();
    assert_eq!(token.matches('.').count(), 1);
    assert!(!token.contains('='));
    let verified = gateway.validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE).unwrap();
    assert_eq!(verified, claims);
}

#[test]
fn payload_segment_is_canonical_claims_json() {
    let gateway = gateway_at(now());
    let claims = gateway.claims(request()).unwrap();
    let token = gateway.issue(&claims, SECRET).unwrap();
    let (payload, _) = token.split_once('.').unwrap();
    assert_eq!(URL_SAFE_NO_PAD.decode(payload).unwrap(), canonical_json_bytes(&claims).unwrap());
}

#[test]
fn issuing_with_empty_secret_fails() {
    let claims = gateway_at(now()).claims(request()).unwrap();
    assert_eq!(gateway_at(now()).issue(&claims, b""), Err(TokenError::InvalidSecret));
}

#[test]
fn malformed_shapes_are_rejected_first() {
    let gateway = gateway_at(now());
    for token in ["", "abc", ".", "abc.", ".abc", "a.b.c"] {
        assert_eq!(
            gateway.validate(token, b"", POST_GRANT_EXPENSE_SCOPE),
            Err(TokenError::Malformed),
            "token `{token}`"
        );
    }
}

#[test]
fn empty_secret_is_rejected_before_decoding() {
    let gateway = gateway_at(now());
    assert_eq!(
        gateway.validate("!!!.!!!", b"", POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidSecret)
    );
}

#[test]
fn non_base64url_segments_are_rejected() {
    let gateway = gateway_at(now());
    assert_eq!(
        gateway.validate("not+base64.abc", SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidEncoding)
    );
    assert_eq!(
        gateway.validate("YWJj.a/b", SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidEncoding)
    );
}

#[test]
fn wrong_secret_fails_signature_check() {
    let token = signed_token(&gateway_at(now()).claims(request()).unwrap());
    assert_eq!(
        gateway_at(now()).validate(&token, b"other-secret", POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn tampered_payload_fails_signature_check() {
    let token = signed_token(&gateway_at(now()).claims(request()).unwrap());
    let (payload, signature) = token.split_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(payload).unwrap();
    bytes[10] ^= 0x01;
    let forged = format!("{}.{signature}", URL_SAFE_NO_PAD.encode(&bytes));
    assert_eq!(
        gateway_at(now()).validate(&forged, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn signed_payload_that_is_not_claims_is_rejected() {
    let payload = br#"{"unexpected":true}"#;
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET).unwrap();
    mac.update(payload);
    let signature = mac.finalize().into_bytes();
    let token =
        format!("{}.{}", URL_SAFE_NO_PAD.encode(payload), URL_SAFE_NO_PAD.encode(signature));
    assert!(matches!(
        gateway_at(now()).validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidClaims(_))
    ));
}

#[test]
fn timestamps_without_offset_are_invalid() {
    let mut claims = gateway_at(now()).claims(request()).unwrap();
    claims.expires_at = "2025-03-10T12:05:00".to_string();
    let token = signed_token(&claims);
    assert_eq!(
        gateway_at(now()).validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidTimestamps)
    );
}

#[test]
fn negative_ttl_is_always_expired() {
    let gateway = TokenGateway::with_sources(
        FixedClock::new(now()),
        SequentialTokenIds::new(),
        TokenSettings {
            ttl_seconds: -1,
            max_future_skew_seconds: 10,
        },
    );
    let claims = gateway.claims(request()).unwrap();
    let token = gateway.issue(&claims, SECRET).unwrap();
    assert_eq!(
        gateway.validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::Expired)
    );
}

#[test]
fn expiry_is_exclusive() {
    let claims = gateway_at(now()).claims(request()).unwrap();
    let token = signed_token(&claims);
    let just_before = gateway_at(datetime!(2025-03-10 12:04:59 UTC));
    assert!(just_before.validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE).is_ok());
    let at_expiry = gateway_at(datetime!(2025-03-10 12:05 UTC));
    assert_eq!(
        at_expiry.validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::Expired)
    );
}

#[test]
fn future_issuance_beyond_skew_is_rejected() {
    let claims = gateway_at(datetime!(2025-03-10 12:00:11 UTC)).claims(request()).unwrap();
    let token = signed_token(&claims);
    assert_eq!(
        gateway_at(now()).validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::IssuedInFuture)
    );

    let within_skew = gateway_at(datetime!(2025-03-10 12:00:10 UTC)).claims(request()).unwrap();
    let token = signed_token(&within_skew);
    assert!(gateway_at(now()).validate(&token, SECRET, POST_GRANT_EXPENSE_SCOPE).is_ok());
}

#[test]
fn missing_scope_is_rejected() {
    let token = signed_token(&gateway_at(now()).claims(request()).unwrap());
    assert_eq!(
        gateway_at(now()).validate(&token, SECRET, "void_grant_expense"),
        Err(TokenError::MissingScope("void_grant_expense".to_string()))
    );
}

#[test]
fn error_classes_split_validation_from_security() {
    for error in [
        TokenError::Malformed,
        TokenError::InvalidSecret,
        TokenError::InvalidEncoding,
        TokenError::InvalidClaims("x".to_string()),
        TokenError::InvalidTimestamps,
    ] {
        assert_eq!(error.class(), TokenErrorClass::Validation, "{error}");
    }
    for error in [
        TokenError::InvalidSignature,
        TokenError::Expired,
        TokenError::IssuedInFuture,
        TokenError::MissingScope("x".to_string()),
    ] {
        assert_eq!(error.class(), TokenErrorClass::Security, "{error}");
    }
}

#[test]
fn free_functions_round_trip_on_the_system_clock() {
    let claims = TokenClaims::new(request(), 300).unwrap();
    let token = issue_token(&claims, SECRET).unwrap();
    let verified = validate_token(&token, SECRET, POST_GRANT_EXPENSE_SCOPE).unwrap();
    assert_eq!(verified, claims);
}

#[test]
fn free_functions_fail_closed() {
    let claims = TokenClaims::new(request(), 300).unwrap();
    assert!(matches!(issue_token(&claims, b""), Err(TokenError::InvalidSecret)));

    let token = issue_token(&claims, SECRET).unwrap();
    assert!(matches!(
        validate_token(&token, SECRET, "approve_budget_transfer"),
        Err(TokenError::MissingScope(scope)) if scope == "approve_budget_transfer"
    ));
    assert!(matches!(
        validate_token(&token, b"", POST_GRANT_EXPENSE_SCOPE),
        Err(TokenError::InvalidSecret)
    ));
}
