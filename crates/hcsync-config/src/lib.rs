//! Configuration for the hcsync CLI.
//!
//! Layered loading (defaults, TOML file, `HCSYNC_` environment), hub
//! address normalization, and translation to `hcsync_core::HubConfig`.
//! Passwords are never read from or written to configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use hcsync_core::{CursorPolicy, HubConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Settings read from `config.toml` and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Hub base address; a missing scheme means `http://`.
    pub address: Option<String>,

    /// Login name. Prompted for when absent.
    pub username: Option<String>,

    /// Request timeout in seconds. Also the long-poll window.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub cursor_policy: CursorPolicy,

    /// Pause after each applied change-set, in milliseconds.
    #[serde(default = "default_refresh_pause_ms")]
    pub refresh_pause_ms: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: None,
            username: None,
            timeout: default_timeout(),
            cursor_policy: CursorPolicy::default(),
            refresh_pause_ms: default_refresh_pause_ms(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_refresh_pause_ms() -> u64 {
    1000
}

impl Config {
    /// Build the runtime session config for `address`.
    pub fn to_hub_config(&self, address: Url) -> Result<HubConfig, ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let mut hub = HubConfig::new(address);
        hub.tls = tls;
        hub.timeout = Duration::from_secs(self.timeout);
        hub.cursor_policy = self.cursor_policy;
        hub.refresh_pause = Duration::from_millis(self.refresh_pause_ms);
        Ok(hub)
    }
}

// ── Hub address ─────────────────────────────────────────────────────

/// Parse a user-supplied hub address, prefixing `http://` when no scheme
/// is given.
pub fn normalize_address(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: "hub address is empty".into(),
        });
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ConfigError::Validation {
        field: "address".into(),
        reason: format!("'{trimmed}' is not a valid URL: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: format!("unsupported scheme '{}', expected http or https", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: format!("'{trimmed}' has no host"),
        });
    }

    Ok(url)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hcsync", "hcsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hcsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment. A missing file is not
/// an error; the defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HCSYNC_"));

    let config: Config = figment.extract()?;
    Ok(config)
}
