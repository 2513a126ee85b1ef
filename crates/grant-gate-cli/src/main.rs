// crates/grant-gate-cli/src/main.rs
// ============================================================================
// Module: Grant Gate CLI Entry Point
// Description: Command dispatcher for evaluation, token checks, and digests.
// Purpose: Run the grant gate over JSON files without embedding the library.
// Dependencies: clap, grant-gate-config, grant-gate-core, serde, serde_jcs, thiserror.
// ============================================================================

//! ## Overview
//! `grant-gate evaluate` validates an intent, evaluates it against a snapshot,
//! and prints the decision with its hash material and, for approvals, the
//! signed token. `grant-gate verify` checks a token. `grant-gate hash`
//! recomputes a digest from logged hash material.
//!
//! Output is canonical JSON on stdout; errors are one line on stderr with a
//! failure exit code. Inputs are untrusted and read with hard size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use grant_gate_config::GrantGateConfig;
use grant_gate_core::Authorization;
use grant_gate_core::Clock;
use grant_gate_core::EvaluationRequest;
use grant_gate_core::GateAuditSink;
use grant_gate_core::GrantGate;
use grant_gate_core::GrantSnapshot;
use grant_gate_core::GrantsGovernanceModule;
use grant_gate_core::HashDigest;
use grant_gate_core::HashMaterial;
use grant_gate_core::RequestId;
use grant_gate_core::SystemClock;
use grant_gate_core::TokenClaims;
use grant_gate_core::TokenGateway;
use grant_gate_core::compute_decision_hash;
use grant_gate_core::core::time::parse_date;
use grant_gate_core::runtime::TokenAuditEvent;
use grant_gate_core::validate_intent;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an intent JSON input.
const MAX_INTENT_BYTES: usize = 256 * 1024;
/// Maximum size of a snapshot JSON input.
const MAX_SNAPSHOT_BYTES: usize = 1024 * 1024;
/// Maximum size of a hash material JSON input.
const MAX_MATERIAL_BYTES: usize = 1024 * 1024;
/// Maximum accepted token length.
const MAX_TOKEN_LENGTH: usize = 16 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "grant-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an intent against a snapshot.
    Evaluate(EvaluateCommand),
    /// Verify a posting token.
    Verify(VerifyCommand),
    /// Recompute a decision digest from logged hash material.
    Hash(HashCommand),
}

/// Arguments for `evaluate`.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Intent JSON file.
    #[arg(long, value_name = "FILE")]
    intent: PathBuf,
    /// Snapshot JSON file.
    #[arg(long, value_name = "FILE")]
    snapshot: PathBuf,
    /// Evaluation date (YYYY-MM-DD); defaults to today (UTC).
    #[arg(long, value_name = "DATE")]
    as_of: Option<String>,
    /// Request identifier recorded in token claims.
    #[arg(long, value_name = "ID")]
    request_id: Option<String>,
    /// Config file path.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Compact token string.
    #[arg(long, value_name = "TOKEN")]
    token: String,
    /// Required scope; defaults to the configured scope.
    #[arg(long, value_name = "SCOPE")]
    scope: Option<String>,
    /// Config file path.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Arguments for `hash`.
#[derive(Args, Debug)]
struct HashCommand {
    /// Hash material JSON file.
    #[arg(long, value_name = "FILE")]
    material: PathBuf,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Output of `verify`.
#[derive(Debug, Serialize)]
struct VerifyOutput {
    /// Always `"ok"` on success.
    status: &'static str,
    /// Verified claims.
    claims: TokenClaims,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a single-line message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Evaluate(command) => command_evaluate(&command),
        Commands::Verify(command) => command_verify(&command),
        Commands::Hash(command) => command_hash(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `evaluate` command.
fn command_evaluate(command: &EvaluateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let secret = config.token.resolve_secret().map_err(|err| CliError::new(err.to_string()))?;
    let audit = config.audit.build_sink().map_err(|err| CliError::new(err.to_string()))?;
    let output = evaluate_files(command, &config, &secret, audit)?;
    write_canonical_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `verify` command.
fn command_verify(command: &VerifyCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let secret = config.token.resolve_secret().map_err(|err| CliError::new(err.to_string()))?;
    let audit = config.audit.build_sink().map_err(|err| CliError::new(err.to_string()))?;
    let output = verify_token(command, &config, &secret, audit.as_ref())?;
    write_canonical_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `hash` command.
fn command_hash(command: &HashCommand) -> CliResult<ExitCode> {
    let digest = hash_material_file(&command.material)?;
    write_canonical_json(&digest)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Command Bodies
// ============================================================================

/// Evaluates intent and snapshot files through the gate.
fn evaluate_files(
    command: &EvaluateCommand,
    config: &GrantGateConfig,
    secret: &[u8],
    audit: Arc<dyn GateAuditSink>,
) -> CliResult<Authorization> {
    let payload: Value = read_json(&command.intent, "intent", MAX_INTENT_BYTES)?;
    let intent = validate_intent(&payload)
        .map_err(|err| CliError::new(format!("invalid intent: {err}")))?;
    let snapshot: GrantSnapshot = read_json(&command.snapshot, "snapshot", MAX_SNAPSHOT_BYTES)?;
    let evaluation_date = command
        .as_of
        .as_deref()
        .map(|text| {
            parse_date(text.trim())
                .map_err(|_| CliError::new(format!("--as-of must be YYYY-MM-DD, got {text}")))
        })
        .transpose()?;
    let request_id = command
        .request_id
        .as_deref()
        .map_or_else(|| RequestId::new(format!("cli-{}", intent.transaction_id)), RequestId::from);
    let policy_version_id = config.policy.version_id();

    let gate = GrantGate::new(GrantsGovernanceModule::new(), config.token.settings(), audit);
    gate.evaluate(
        EvaluationRequest {
            intent: &intent,
            snapshot: &snapshot,
            policy_version_id: &policy_version_id,
            evaluation_date,
            request_id: &request_id,
        },
        secret,
    )
    .map_err(|err| CliError::new(format!("evaluation failed: {err}")))
}

/// Verifies a token and audits the outcome.
fn verify_token(
    command: &VerifyCommand,
    config: &GrantGateConfig,
    secret: &[u8],
    audit: &dyn GateAuditSink,
) -> CliResult<VerifyOutput> {
    let token = command.token.trim();
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(CliError::new(format!("token exceeds {MAX_TOKEN_LENGTH} bytes")));
    }
    let scope = command.scope.as_deref().unwrap_or(&config.token.required_scope);
    let gateway = TokenGateway::new(config.token.settings());
    match gateway.validate(token, secret, scope) {
        Ok(claims) => {
            audit.record_token(&TokenAuditEvent::verified(&claims, scope, SystemClock.now()));
            Ok(VerifyOutput {
                status: "ok",
                claims,
            })
        }
        Err(err) => {
            audit.record_token(&TokenAuditEvent::rejected(&err, scope, SystemClock.now()));
            Err(CliError::new(format!("token rejected: {} ({err})", err.label())))
        }
    }
}

/// Recomputes the digest of a hash material document.
fn hash_material_file(path: &Path) -> CliResult<HashDigest> {
    let material: HashMaterial = read_json(path, "hash material", MAX_MATERIAL_BYTES)?;
    compute_decision_hash(&material).map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Loads configuration from the flag, environment, or default path.
fn load_config(path: Option<&Path>) -> CliResult<GrantGateConfig> {
    GrantGateConfig::load(path).map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Reads and deserializes a bounded JSON file.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} {} exceeds size limit ({size} > {limit} bytes)",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {kind} json {}: {err}", path.display())))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes canonical JSON and a trailing newline to stdout.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout()
        .write_all(&bytes)
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
