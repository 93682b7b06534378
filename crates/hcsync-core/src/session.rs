// ── Session abstraction ──
//
// Lifecycle of one hub connection: authenticate, load the inventory,
// obtain the initial cursor, then refresh incrementally. Each setup step
// is only valid in one state; a failed step leaves the session `Failed`.

use std::fmt;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use hcsync_api::{HubClient, RefreshStatus};

use crate::config::HubConfig;
use crate::convert::change_from_value;
use crate::error::CoreError;
use crate::model::DeviceId;
use crate::store::{DeviceRegistry, LoadSummary, UpdateOutcome};
use crate::stream::DeviceStream;
use crate::sync::{self, SyncHandle};

// ── SessionState ─────────────────────────────────────────────────

/// Where a [`Session`] is in its setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    InventoryLoaded,
    Streaming,
    /// A setup step failed. Terminal.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::InventoryLoaded => "inventory-loaded",
            Self::Streaming => "streaming",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ── RefreshOutcome ───────────────────────────────────────────────

/// Result of one incremental refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Cursor supplied by the hub with this change-set, if any.
    pub next_cursor: Option<i64>,
    /// Ids whose state changed, in change-set order.
    pub applied: Vec<DeviceId>,
    /// Entries that were malformed, unmatched, or ignored by their device.
    pub ignored: usize,
}

// ── Session ──────────────────────────────────────────────────────

/// One connection to a hub and the device mirror built from it.
///
/// Owns the [`DeviceRegistry`] exclusively. Readers observe devices
/// through [`subscribe()`](Self::subscribe) snapshots; once the refresh
/// loop is spawned the session moves into the background task.
pub struct Session {
    config: HubConfig,
    client: HubClient,
    registry: DeviceRegistry,
    state: SessionState,
    status: Option<RefreshStatus>,
}

impl Session {
    /// Create an unauthenticated session. Does not touch the network.
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let client = HubClient::new(config.url.clone(), &config.transport())?;
        Ok(Self::with_client(config, client))
    }

    /// Create a session around a pre-built client.
    pub fn with_client(config: HubConfig, client: HubClient) -> Self {
        Self {
            config,
            client,
            registry: DeviceRegistry::new(),
            state: SessionState::Unauthenticated,
            status: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Refresh status captured by [`start_streaming`](Self::start_streaming).
    pub fn refresh_status(&self) -> Option<&RefreshStatus> {
        self.status.as_ref()
    }

    pub fn subscribe(&self) -> DeviceStream {
        self.registry.subscribe()
    }

    // ── Setup ────────────────────────────────────────────────────

    /// Authenticate with HTTP basic auth.
    pub async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), CoreError> {
        self.require(SessionState::Unauthenticated)?;
        debug!(url = %self.config.url, username, "logging in");

        let result = self.client.login(username, password).await;
        self.finish_step(result.map_err(CoreError::from), SessionState::Authenticated)?;

        info!(url = %self.config.url, "access granted");
        Ok(())
    }

    /// Fetch the full inventory and build the registry from it.
    pub async fn load_inventory(&mut self) -> Result<LoadSummary, CoreError> {
        self.require(SessionState::Authenticated)?;

        let result = self.client.list_devices().await.map_err(CoreError::from);
        let descriptions = self.finish_step(result, SessionState::InventoryLoaded)?;
        let summary = self.registry.load_inventory(&descriptions);

        info!(
            devices = self.registry.len(),
            skipped = summary.skipped,
            replaced = summary.replaced,
            "inventory loaded"
        );
        Ok(summary)
    }

    /// Obtain the initial refresh cursor.
    pub async fn start_streaming(&mut self) -> Result<i64, CoreError> {
        self.require(SessionState::InventoryLoaded)?;

        let result = self.client.refresh_status().await.map_err(CoreError::from);
        let status = self.finish_step(result, SessionState::Streaming)?;
        let cursor = status.last;

        info!(cursor, hub_time = ?status.hub_time(), "streaming started");
        self.status = Some(status);
        Ok(cursor)
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Long-poll once for changes since `cursor` and apply them.
    ///
    /// All changes are applied before a single snapshot is published.
    /// Failures leave the registry untouched and the session streaming.
    pub async fn refresh_once(&mut self, cursor: i64) -> Result<RefreshOutcome, CoreError> {
        self.require(SessionState::Streaming)?;

        let change_set = self.client.refresh_changes(cursor).await?;
        let mut outcome = RefreshOutcome {
            next_cursor: change_set.last,
            ..RefreshOutcome::default()
        };

        for entry in &change_set.changes {
            let Some(change) = change_from_value(entry) else {
                trace!(?entry, "skipping change entry without id/value");
                outcome.ignored += 1;
                continue;
            };
            let id = change.id;
            match self.registry.apply(change) {
                UpdateOutcome::Applied => outcome.applied.push(id),
                UpdateOutcome::Unchanged | UpdateOutcome::Unknown => outcome.ignored += 1,
            }
        }

        self.registry.publish();
        debug!(
            cursor,
            next = ?outcome.next_cursor,
            applied = outcome.applied.len(),
            ignored = outcome.ignored,
            "change-set applied"
        );
        Ok(outcome)
    }

    /// Move the session into a background refresh loop starting at `cursor`.
    ///
    /// The loop runs until `cancel` fires; [`SyncHandle::shutdown`] hands
    /// the session back.
    pub fn spawn_refresh_loop(self, cursor: i64, cancel: CancellationToken) -> SyncHandle {
        sync::spawn(self, cursor, cancel)
    }

    // ── State helpers ────────────────────────────────────────────

    fn require(&self, required: SessionState) -> Result<(), CoreError> {
        if self.state == required {
            Ok(())
        } else {
            Err(CoreError::InvalidState {
                actual: self.state,
                required,
            })
        }
    }

    /// Advance to `next` on success; enter `Failed` on error.
    fn finish_step<T>(
        &mut self,
        result: Result<T, CoreError>,
        next: SessionState,
    ) -> Result<T, CoreError> {
        match result {
            Ok(value) => {
                debug!(from = %self.state, to = %next, "session state changed");
                self.state = next;
                Ok(value)
            }
            Err(e) => {
                debug!(from = %self.state, error = %e, "session setup failed");
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }
}
