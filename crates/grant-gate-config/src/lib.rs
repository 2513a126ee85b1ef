// crates/grant-gate-config/src/lib.rs
// ============================================================================
// Module: Grant Gate Config Library
// Description: Configuration model and validation.
// Purpose: Single source of truth for grant-gate.toml semantics.
// Dependencies: grant-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `grant-gate-config` defines the configuration model for Grant Gate with
//! strict, fail-closed validation. Signing secrets never live in the file;
//! the file names the environment variable that holds them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::DEFAULT_SECRET_ENV;
pub use config::GrantGateConfig;
pub use config::PolicyConfig;
pub use config::TokenConfig;
