//! Clap derive structures for the `hcsync` CLI.
//!
//! Defines the positional hub address, global flags, and shared value types.
//! Only depends on clap so `build.rs` can include it for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hcsync -- mirror device state from a home-automation hub
#[derive(Debug, Parser)]
#[command(
    name = "hcsync",
    version,
    about = "Mirror device state from a home-automation hub",
    long_about = "Logs in to a hub, loads its device inventory, and keeps a local\n\
        mirror of temperature sensor readings up to date by long-polling\n\
        the hub's refreshStates endpoint.\n\n\
        Without an address the public demo hub is used."
)]
pub struct Cli {
    /// Hub address, e.g. styx.fibaro.com:7777 (http:// is assumed)
    #[arg(value_name = "ADDRESS")]
    pub address: Option<String>,

    #[command(flatten)]
    pub global: GlobalOpts,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Login name (prompted for when neither given nor configured)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Request timeout in seconds; also bounds each long-poll
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Cursor used for the next refresh after a change-set
    #[arg(long, value_name = "POLICY")]
    pub cursor_policy: Option<CursorPolicyArg>,

    /// Pause after each applied change-set, in milliseconds
    #[arg(long, value_name = "MS")]
    pub refresh_pause_ms: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k')]
    pub insecure: bool,

    /// Take a single update instead of streaming
    #[arg(long)]
    pub once: bool,

    /// Answer yes to every yes/no prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HCSYNC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for device listings and readings
    #[arg(long, short = 'o', env = "HCSYNC_OUTPUT", default_value = "table")]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto")]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CursorPolicyArg {
    /// Follow the cursor returned with each change-set
    Advance,
    /// Always reuse the cursor obtained at stream start
    Replay,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one line per device (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}
