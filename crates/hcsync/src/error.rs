//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a category-specific exit code.

use miette::Diagnostic;
use thiserror::Error;

use hcsync_config::ConfigError;
use hcsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PROTOCOL: i32 = 9;
    pub const CONFIG: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the hub at {url}: {reason}")]
    #[diagnostic(
        code(hcsync::connection_failed),
        help(
            "Check that the hub is running and reachable.\n\
             URL: {url}\n\
             For self-signed HTTPS hubs try: hcsync {url} --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Hub request timed out after {seconds}s")]
    #[diagnostic(
        code(hcsync::timeout),
        help("Increase the timeout with --timeout or check hub responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Access denied")]
    #[diagnostic(
        code(hcsync::auth_failed),
        help("Verify the login and password for this hub.\nHub reply: {message}")
    )]
    AuthFailed { message: String },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("Unexpected reply from the hub: {message}")]
    #[diagnostic(
        code(hcsync::protocol),
        help("The address may not point at a hub REST API.")
    )]
    Protocol { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hcsync::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(hcsync::config),
        help("Config file: {path}\nEnvironment overrides use the HCSYNC_ prefix.")
    )]
    Config { message: String, path: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(hcsync::prompt),
        help("Run in an interactive terminal, or pass --username and --yes.")
    )]
    Prompt(String),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(hcsync::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Protocol { .. } => exit_code::PROTOCOL,
            Self::Validation { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::Prompt(_) | Self::Internal(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }

    /// Translate a core error raised while talking to `url`.
    pub fn from_core(err: CoreError, url: &str, timeout_secs: u64) -> Self {
        match err {
            CoreError::Transport {
                timed_out: true, ..
            } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Transport { message, .. } => Self::ConnectionFailed {
                url: url.to_owned(),
                reason: message,
            },
            CoreError::Authentication { message } => Self::AuthFailed { message },
            CoreError::Protocol { message } | CoreError::Validation { message } => {
                Self::Protocol { message }
            }
            CoreError::Config { message } => Self::Config {
                message,
                path: crate::config::config_path().display().to_string(),
            },
            err @ CoreError::InvalidState { .. } => Self::Internal(err.to_string()),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Figment(e) => Self::Config {
                message: e.to_string(),
                path: crate::config::config_path().display().to_string(),
            },
        }
    }
}
