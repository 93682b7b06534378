// ── Runtime hub configuration ──
//
// These types describe *how* to talk to a hub and how to drive the refresh
// loop. They never touch disk: the CLI builds a `HubConfig` and hands it in.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use hcsync_api::{TlsMode, TransportConfig};

/// Address of the public demo hub, used when none is given.
pub const DEMO_HUB_ADDRESS: &str = "http://styx.fibaro.com:7777";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// How the refresh loop picks the cursor for its next long-poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorPolicy {
    /// Use the `last` returned with each change-set, keeping the current
    /// cursor when the hub does not supply one.
    #[default]
    Advance,
    /// Always reuse the cursor obtained when streaming started.
    Replay,
}

impl CursorPolicy {
    /// Cursor for the next call after a successful refresh.
    pub fn next(self, current: i64, returned: Option<i64>) -> i64 {
        match self {
            Self::Advance => returned.unwrap_or(current),
            Self::Replay => current,
        }
    }
}

impl fmt::Display for CursorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advance => f.write_str("advance"),
            Self::Replay => f.write_str("replay"),
        }
    }
}

impl FromStr for CursorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "advance" => Ok(Self::Advance),
            "replay" => Ok(Self::Replay),
            other => Err(format!("expected 'advance' or 'replay', got '{other}'")),
        }
    }
}

/// Configuration for one hub session.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub base URL (e.g. `http://styx.fibaro.com:7777`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout. Also bounds each long-poll.
    pub timeout: Duration,
    /// Cursor selection between refresh calls.
    pub cursor_policy: CursorPolicy,
    /// Pause after each successful change-set. Failures retry immediately.
    pub refresh_pause: Duration,
}

impl HubConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            cursor_policy: CursorPolicy::default(),
            refresh_pause: Duration::from_secs(1),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_uses_returned_cursor() {
        assert_eq!(CursorPolicy::Advance.next(10, Some(11)), 11);
    }

    #[test]
    fn advance_keeps_cursor_when_none_returned() {
        assert_eq!(CursorPolicy::Advance.next(10, None), 10);
    }

    #[test]
    fn replay_ignores_returned_cursor() {
        assert_eq!(CursorPolicy::Replay.next(10, Some(11)), 10);
    }

    #[test]
    fn cursor_policy_parses_case_insensitively() {
        assert_eq!("Replay".parse::<CursorPolicy>(), Ok(CursorPolicy::Replay));
        assert_eq!("advance".parse::<CursorPolicy>(), Ok(CursorPolicy::Advance));
        assert!("forward".parse::<CursorPolicy>().is_err());
    }
}
