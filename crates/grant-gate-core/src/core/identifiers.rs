// crates/grant-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Grant Gate Identifiers
// Description: Opaque identifiers for intents, snapshots, policies, and tokens.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings, so typed fields are
//! wire-identical to the string fields they replace. Validation happens at the
//! intake boundary, not inside these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent string identifier with the shared accessor set.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty or whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier!(
    /// Transaction identifier carried by an intent.
    TransactionId
);

string_identifier!(
    /// Grant identifier the transaction is charged against.
    GrantId
);

string_identifier!(
    /// Opaque policy version identifier supplied by the caller.
    PolicyVersionId
);

string_identifier!(
    /// Snapshot identifier of a materialized grant read model.
    SnapshotId
);

string_identifier!(
    /// Caller request identifier recorded in token claims.
    RequestId
);

string_identifier!(
    /// Opaque, randomly generated token identifier.
    TokenId
);
