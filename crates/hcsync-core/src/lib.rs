//! Device state synchronization engine between `hcsync-api` and the CLI.
//!
//! This crate owns the domain model, the device registry, and the refresh
//! loop that keeps the registry consistent with a remote hub:
//!
//! - **[`Session`]**: Drives setup in order:
//!   [`login()`](Session::login) authenticates,
//!   [`load_inventory()`](Session::load_inventory) builds the registry from
//!   the full device list, and [`start_streaming()`](Session::start_streaming)
//!   obtains the initial cursor. [`refresh_once()`](Session::refresh_once)
//!   applies one incremental change-set.
//!
//! - **[`SyncHandle`]**: Returned by
//!   [`Session::spawn_refresh_loop`]. The background task owns the session
//!   and reports each call as a [`SyncEvent`]; failures are retried
//!   immediately and never end the loop.
//!
//! - **[`DeviceRegistry`]**: Id-indexed device storage with a
//!   `tokio::sync::watch` snapshot, observed through [`DeviceStream`].
//!
//! - **Domain model** ([`model`]): [`Device`] with a closed [`DeviceKind`];
//!   temperature sensors keep a bounded [`ReadingHistory`].

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CursorPolicy, DEMO_HUB_ADDRESS, HubConfig, TlsVerification};
pub use error::CoreError;
pub use session::{RefreshOutcome, Session, SessionState};
pub use store::{DeviceRegistry, LoadSummary, UpdateOutcome};
pub use stream::DeviceStream;
pub use sync::{EVENT_BUFFER, SyncEvent, SyncHandle};

pub use model::{Device, DeviceId, DeviceKind, ReadingHistory, StateChange, TemperatureSensor};

// The refresh status is surfaced unchanged from the API layer.
pub use hcsync_api::RefreshStatus;
