// ── Background refresh loop ──
//
// The spawned task owns the `Session` for as long as it runs. It is the
// single producer of the device snapshot and of `SyncEvent`s; consumers
// only read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Device, DeviceId};
use crate::session::Session;
use crate::stream::DeviceStream;

/// Events buffered for a slow consumer. When full, new events are dropped;
/// the device snapshot stays current through [`SyncHandle::devices`].
pub const EVENT_BUFFER: usize = 64;

/// Notification emitted by the refresh loop after each call.
#[derive(Debug)]
pub enum SyncEvent {
    /// A change-set was applied and the snapshot republished.
    ChangesApplied {
        /// Cursor the next call will use.
        cursor: i64,
        /// Ids whose state changed, in change-set order.
        changed: Vec<DeviceId>,
        /// Snapshot published after the change-set.
        devices: Arc<Vec<Device>>,
        received_at: DateTime<Utc>,
    },
    /// The refresh call failed; the loop retries immediately.
    RefreshFailed {
        /// Consecutive failures, starting at 1. Reset by a success.
        attempt: u32,
        error: CoreError,
        timed_out: bool,
    },
}

/// Handle to a running refresh loop.
pub struct SyncHandle {
    events: mpsc::Receiver<SyncEvent>,
    devices: DeviceStream,
    cancel: CancellationToken,
    join: JoinHandle<Session>,
}

impl SyncHandle {
    /// Next event from the loop. `None` once the loop has stopped and all
    /// buffered events were drained.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.events.recv().await
    }

    /// Device snapshots published by the loop.
    pub fn devices(&mut self) -> &mut DeviceStream {
        &mut self.devices
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Stop the loop and take the session back.
    ///
    /// An in-flight long-poll is abandoned. Returns `None` only if the
    /// loop task panicked.
    pub async fn shutdown(self) -> Option<Session> {
        self.cancel.cancel();
        match self.join.await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "refresh loop did not stop cleanly");
                None
            }
        }
    }
}

pub(crate) fn spawn(session: Session, cursor: i64, cancel: CancellationToken) -> SyncHandle {
    let (events_tx, events) = mpsc::channel(EVENT_BUFFER);
    let devices = session.subscribe();
    let join = tokio::spawn(refresh_task(session, cursor, events_tx, cancel.clone()));

    SyncHandle {
        events,
        devices,
        cancel,
        join,
    }
}

/// Refresh until cancelled. Failures retry at once with the same cursor;
/// successes pause for `refresh_pause` first.
async fn refresh_task(
    mut session: Session,
    mut cursor: i64,
    events: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
) -> Session {
    let policy = session.config().cursor_policy;
    let pause = session.config().refresh_pause;
    let mut attempt: u32 = 0;

    debug!(cursor, %policy, ?pause, "refresh loop started");

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = session.refresh_once(cursor) => result,
        };

        match result {
            Ok(outcome) => {
                attempt = 0;
                cursor = policy.next(cursor, outcome.next_cursor);
                emit(
                    &events,
                    SyncEvent::ChangesApplied {
                        cursor,
                        changed: outcome.applied,
                        devices: session.registry().snapshot(),
                        received_at: Utc::now(),
                    },
                );
            }
            Err(error) => {
                attempt = attempt.saturating_add(1);
                let timed_out = error.is_timeout();
                warn!(cursor, attempt, timed_out, error = %error, "refresh failed, retrying");
                emit(
                    &events,
                    SyncEvent::RefreshFailed {
                        attempt,
                        error,
                        timed_out,
                    },
                );
                continue;
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(pause) => {}
        }
    }

    debug!(cursor, "refresh loop stopped");
    session
}

/// Queue an event without waiting. A closed receiver only means nobody is
/// listening.
fn emit(events: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    match events.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(_)) => debug!("event buffer full, dropping event"),
    }
}
