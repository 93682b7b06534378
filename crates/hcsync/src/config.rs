//! CLI configuration: a thin wrapper around `hcsync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides on top of
//! the file and environment layers.

use hcsync_core::{CursorPolicy, DEMO_HUB_ADDRESS, HubConfig};

use crate::cli::{Cli, CursorPolicyArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use hcsync_config::{Config, config_path, load_config, load_config_from, normalize_address};

/// Everything the mirror flow needs before it touches the network.
#[derive(Debug)]
pub struct Settings {
    pub hub: HubConfig,
    /// Login name from flags or config; prompted for when `None`.
    pub username: Option<String>,
    /// No address was given anywhere; the demo hub is used.
    pub demo: bool,
}

impl From<CursorPolicyArg> for CursorPolicy {
    fn from(arg: CursorPolicyArg) -> Self {
        match arg {
            CursorPolicyArg::Advance => Self::Advance,
            CursorPolicyArg::Replay => Self::Replay,
        }
    }
}

/// Load the config file named by `--config`, or the canonical one.
pub fn load(cli: &Cli) -> Result<Config, CliError> {
    let config = match cli.global.config {
        Some(ref path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge CLI flags over `config` and build the session settings.
///
/// Priority: flag > environment > config file > default.
pub fn resolve(cli: &Cli, mut config: Config) -> Result<Settings, CliError> {
    let global = &cli.global;

    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
    if let Some(policy) = global.cursor_policy {
        config.cursor_policy = policy.into();
    }
    if let Some(pause) = global.refresh_pause_ms {
        config.refresh_pause_ms = pause;
    }
    if global.insecure {
        config.insecure = true;
    }

    let given = cli.address.as_deref().or(config.address.as_deref());
    let demo = given.is_none();
    let url = normalize_address(given.unwrap_or(DEMO_HUB_ADDRESS))?;

    let hub = config.to_hub_config(url)?;
    let username = global.username.clone().or(config.username);

    Ok(Settings {
        hub,
        username,
        demo,
    })
}
