// ── Core error types ──
//
// Errors surfaced by the sync engine. Consumers never see raw reqwest or
// serde failures: the `From<hcsync_api::Error>` impl translates them into
// the authentication / protocol / transport / validation taxonomy.

use thiserror::Error;

use crate::session::SessionState;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The hub rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A hub response did not match the expected shape.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The request did not complete: connection failure, timeout, or a
    /// non-success HTTP status.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        timed_out: bool,
    },

    /// A device description is not a JSON object.
    #[error("Invalid device description: {message}")]
    Validation { message: String },

    /// An operation was called in the wrong session state.
    #[error("Session is {actual}, operation requires {required}")]
    InvalidState {
        actual: SessionState,
        required: SessionState,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if the error was a client-side timeout (no change-set
    /// arrived within the long-poll window).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hcsync_api::Error> for CoreError {
    fn from(err: hcsync_api::Error) -> Self {
        match err {
            hcsync_api::Error::Authentication { message } => CoreError::Authentication { message },
            hcsync_api::Error::Transport(ref e) => CoreError::Transport {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
                timed_out: e.is_timeout(),
            },
            hcsync_api::Error::Http { status, message } => CoreError::Transport {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
                timed_out: false,
            },
            hcsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hcsync_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            hcsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
        }
    }
}
