// crates/grant-gate-config/src/config.rs
// ============================================================================
// Module: Grant Gate Configuration
// Description: Configuration loading and validation for Grant Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: grant-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected. Missing or invalid configuration fails closed.
//!
//! ```toml
//! [policy]
//! version_id = "grants-policy-v1"
//!
//! [token]
//! ttl_seconds = 300
//! secret_env = "GRANT_GATE_TOKEN_SECRET"
//!
//! [audit]
//! sink = "file"
//! path = "grant-gate-audit.jsonl"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use grant_gate_core::PolicyVersionId;
use grant_gate_core::TokenSettings;
use grant_gate_core::runtime::FileAuditSink;
use grant_gate_core::runtime::GateAuditSink;
use grant_gate_core::runtime::NoopAuditSink;
use grant_gate_core::runtime::StderrAuditSink;
use grant_gate_core::runtime::grants::POST_GRANT_EXPENSE_SCOPE;
use grant_gate_core::runtime::token::DEFAULT_MAX_FUTURE_SKEW_SECONDS;
use grant_gate_core::runtime::token::DEFAULT_TOKEN_TTL_SECONDS;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "grant-gate.toml";
/// Environment variable that overrides the configuration path.
pub const CONFIG_ENV_VAR: &str = "GRANT_GATE_CONFIG";
/// Default environment variable holding the token signing secret.
pub const DEFAULT_SECRET_ENV: &str = "GRANT_GATE_TOKEN_SECRET";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum token lifetime in seconds.
const MAX_TOKEN_TTL_SECONDS: i64 = 86_400;
/// Maximum clock-skew tolerance in seconds.
const MAX_FUTURE_SKEW_SECONDS: i64 = 300;
/// Maximum length of identifiers and variable names.
const MAX_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Grant Gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantGateConfig {
    /// Policy selection.
    pub policy: PolicyConfig,
    /// Token issuance and verification settings.
    #[serde(default)]
    pub token: TokenConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl GrantGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        self.token.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Policy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Policy version recorded on every decision.
    pub version_id: String,
}

impl PolicyConfig {
    /// Returns the policy version identifier.
    #[must_use]
    pub fn version_id(&self) -> PolicyVersionId {
        PolicyVersionId::new(self.version_id.trim())
    }

    /// Validates the policy section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("policy.version_id", &self.version_id)
    }
}

// ============================================================================
// SECTION: Token
// ============================================================================

/// Token issuance and verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Token lifetime in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,
    /// Allowed lead of `issued_at` over the verifier clock.
    #[serde(default = "default_max_future_skew_seconds")]
    pub max_future_skew_seconds: i64,
    /// Environment variable holding the HMAC secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    /// Scope required when verifying posting tokens.
    #[serde(default = "default_required_scope")]
    pub required_scope: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            max_future_skew_seconds: default_max_future_skew_seconds(),
            secret_env: default_secret_env(),
            required_scope: default_required_scope(),
        }
    }
}

impl TokenConfig {
    /// Returns runtime token settings.
    #[must_use]
    pub const fn settings(&self) -> TokenSettings {
        TokenSettings {
            ttl_seconds: self.ttl_seconds,
            max_future_skew_seconds: self.max_future_skew_seconds,
        }
    }

    /// Reads the signing secret from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the variable is unset or empty.
    pub fn resolve_secret(&self) -> Result<Vec<u8>, ConfigError> {
        self.resolve_secret_with(|name| env::var(name).ok())
    }

    /// Reads the signing secret through a caller-supplied lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the lookup yields nothing usable.
    pub fn resolve_secret_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<u8>, ConfigError> {
        match lookup(&self.secret_env) {
            Some(secret) if !secret.is_empty() => Ok(secret.into_bytes()),
            _ => Err(ConfigError::Invalid(format!(
                "token secret environment variable {} is unset or empty",
                self.secret_env
            ))),
        }
    }

    /// Validates the token section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_TOKEN_TTL_SECONDS).contains(&self.ttl_seconds) {
            return Err(ConfigError::Invalid(format!(
                "token.ttl_seconds must be between 1 and {MAX_TOKEN_TTL_SECONDS}"
            )));
        }
        if !(0 ..= MAX_FUTURE_SKEW_SECONDS).contains(&self.max_future_skew_seconds) {
            return Err(ConfigError::Invalid(format!(
                "token.max_future_skew_seconds must be between 0 and {MAX_FUTURE_SKEW_SECONDS}"
            )));
        }
        validate_name("token.secret_env", &self.secret_env)?;
        if !self.secret_env.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
        {
            return Err(ConfigError::Invalid(
                "token.secret_env must contain only A-Z, 0-9, and _".to_string(),
            ));
        }
        validate_name("token.required_scope", &self.required_scope)
    }
}

/// Default token lifetime.
const fn default_ttl_seconds() -> i64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

/// Default clock-skew tolerance.
const fn default_max_future_skew_seconds() -> i64 {
    DEFAULT_MAX_FUTURE_SKEW_SECONDS
}

/// Default secret environment variable.
fn default_secret_env() -> String {
    DEFAULT_SECRET_ENV.to_string()
}

/// Default verification scope.
fn default_required_scope() -> String {
    POST_GRANT_EXPENSE_SCOPE.to_string()
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON-lines file.
    File,
    /// Discard events.
    None,
}

/// Audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn GateAuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileAuditSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
        }
    }

    /// Validates the audit section.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid("audit.path must be non-empty".to_string()));
                }
                validate_path(path)
            }
            (AuditSinkKind::Stderr | AuditSinkKind::None, _) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, environment, or default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a required short name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds {MAX_NAME_LENGTH} bytes")));
    }
    Ok(())
}
