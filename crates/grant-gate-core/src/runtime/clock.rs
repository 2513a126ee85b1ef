// crates/grant-gate-core/src/runtime/clock.rs
// ============================================================================
// Module: Grant Gate Clocks and Identifier Sources
// Description: System and fixed clocks, random and sequential token ids.
// Purpose: Provide the default non-deterministic sources and their test doubles.
// Dependencies: crate::interfaces, rand, time
// ============================================================================

//! ## Overview
//! [`SystemClock`] and [`RandomTokenIds`] are the production sources.
//! [`FixedClock`] and [`SequentialTokenIds`] make evaluation and token
//! lifecycles reproducible in tests and replay tooling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use time::OffsetDateTime;

use crate::core::hashing::hex_encode;
use crate::interfaces::Clock;
use crate::interfaces::TokenIdSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix applied to every token identifier.
pub const TOKEN_ID_PREFIX: &str = "tok_";

/// Random bytes per generated token identifier.
const TOKEN_ID_RANDOM_BYTES: usize = 12;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    /// Instant returned by every read.
    instant: OffsetDateTime,
}

impl FixedClock {
    /// Creates a clock that always returns `instant`.
    #[must_use]
    pub const fn new(instant: OffsetDateTime) -> Self {
        Self {
            instant,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.instant
    }
}

// ============================================================================
// SECTION: Token Identifier Sources
// ============================================================================

/// CSPRNG-backed token identifiers (`tok_` + 24 hex characters).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenIds;

impl TokenIdSource for RandomTokenIds {
    fn next_token_id(&self) -> String {
        let mut bytes = [0_u8; TOKEN_ID_RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{TOKEN_ID_PREFIX}{}", hex_encode(&bytes))
    }
}

/// Deterministic token identifiers (`tok_000001`, `tok_000002`, ...).
#[derive(Debug, Default)]
pub struct SequentialTokenIds {
    /// Last issued sequence number.
    counter: AtomicU64,
}

impl SequentialTokenIds {
    /// Creates a source starting at `tok_000001`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl TokenIdSource for SequentialTokenIds {
    fn next_token_id(&self) -> String {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{TOKEN_ID_PREFIX}{next:06}")
    }
}
