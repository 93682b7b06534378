//! The interactive mirror flow: log in, load the inventory, show
//! readings, then either stream refreshes or take a single update.

use chrono::{DateTime, Local, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hcsync_core::{CoreError, Device, Session, SyncEvent, SyncHandle};

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{self, Reading};

use super::util;

/// Resolved per-run presentation options.
struct View<'a> {
    format: &'a OutputFormat,
    color: bool,
}

impl View<'_> {
    fn readings(&self, devices: &[Device]) -> Result<(), CliError> {
        let readings = Reading::collect(devices);
        if readings.is_empty() {
            println!("No temperature sensors found");
            return Ok(());
        }
        output::print_output(&output::render_readings(self.format, &readings)?);
        Ok(())
    }

    fn event(&self, event: &SyncEvent) -> Result<(), CliError> {
        match event {
            SyncEvent::ChangesApplied {
                devices,
                received_at,
                ..
            } => {
                self.separator(*received_at);
                self.readings(devices)
            }
            SyncEvent::RefreshFailed {
                attempt,
                error,
                timed_out,
            } => {
                let note = if *timed_out {
                    format!("No reply within the timeout, retrying (attempt {attempt})")
                } else {
                    format!("Refresh failed: {error}; retrying (attempt {attempt})")
                };
                eprintln!("{}", output::muted(&note, self.color));
                Ok(())
            }
        }
    }

    fn separator(&self, at: DateTime<Utc>) {
        let stamp = at.with_timezone(&Local).format("%H:%M:%S");
        println!("{}", output::muted(&format!("──────────── {stamp} ────────────"), self.color));
    }
}

pub async fn run(cli: &Cli, settings: Settings) -> Result<(), CliError> {
    let global = &cli.global;
    let view = View {
        format: &global.output,
        color: output::should_color(&global.color),
    };

    let url = settings.hub.url.to_string();
    let timeout_secs = settings.hub.timeout.as_secs();
    let core_err = |e: CoreError| CliError::from_core(e, &url, timeout_secs);

    if settings.demo {
        eprintln!("Usage: hcsync [ADDRESS]");
        eprintln!("No hub address given, using the demo hub at {url}");
    }

    let username = match settings.username {
        Some(username) => username,
        None => util::prompt_username()?,
    };
    let password = util::prompt_password()?;

    let mut session = Session::new(settings.hub).map_err(core_err)?;

    // ── Login + inventory ────────────────────────────────────────────
    let spinner = util::spinner("Logging in...");
    let result = session.login(&username, &password).await;
    spinner.finish_and_clear();
    result.map_err(core_err)?;
    println!("{}", output::success("Access granted", view.color));

    let spinner = util::spinner("Loading devices...");
    let result = session.load_inventory().await;
    spinner.finish_and_clear();
    let summary = result.map_err(core_err)?;
    debug!(?summary, "inventory summary");
    println!("Found {} devices", session.registry().len());

    if util::confirm("List them?", global.yes)? {
        let devices = session.registry().snapshot();
        output::print_output(&output::render_devices(view.format, &devices)?);
    }
    view.readings(&session.registry().snapshot())?;

    // ── Refresh ──────────────────────────────────────────────────────
    let cursor = session.start_streaming().await.map_err(core_err)?;

    if !global.once && util::confirm("Start refreshing?", global.yes)? {
        return stream(session, cursor, &view).await;
    }

    let spinner = util::spinner("Waiting for changes...");
    let result = session.refresh_once(cursor).await;
    spinner.finish_and_clear();
    let outcome = result.map_err(core_err)?;
    debug!(applied = outcome.applied.len(), ignored = outcome.ignored, "single refresh done");

    view.separator(Utc::now());
    view.readings(&session.registry().snapshot())
}

/// Run the background refresh loop until Ctrl-C.
async fn stream(session: Session, cursor: i64, view: &View<'_>) -> Result<(), CliError> {
    let handle = session.spawn_refresh_loop(cursor, CancellationToken::new());
    eprintln!("{}", output::muted("Refreshing, press Ctrl-C to stop", view.color));

    let (result, session) = follow(handle, |event| view.event(&event)).await;
    if let Some(session) = session {
        info!(devices = session.registry().len(), "refresh stopped");
    }
    result
}

/// Hand loop events to `on_event` until Ctrl-C, the loop ends, or the
/// handler fails. The loop is shut down before returning in every case.
async fn follow<F>(
    mut handle: SyncHandle,
    mut on_event: F,
) -> (Result<(), CliError>, Option<Session>)
where
    F: FnMut(SyncEvent) -> Result<(), CliError>,
{
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            biased;
            signal = &mut ctrl_c => break signal.map_err(CliError::from),
            event = handle.next_event() => {
                let Some(event) = event else { break Ok(()) };
                if let Err(e) = on_event(event) {
                    break Err(e);
                }
            }
        }
    };

    (result, handle.shutdown().await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hcsync_core::HubConfig;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn streaming_session(server: &MockServer) -> (Session, i64) {
        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Temp", "type": "com.fibaro.temperatureSensor",
                  "enabled": true, "properties": { "value": "20.5", "unit": "C" } }
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/refreshStates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "last": 100,
                "changes": [{ "id": 1, "value": 21.0 }]
            })))
            .mount(server)
            .await;

        let mut config = HubConfig::new(Url::parse(&server.uri()).unwrap());
        config.refresh_pause = Duration::from_millis(10);
        let mut session = Session::new(config).unwrap();
        session
            .login("admin", &"secret".to_string().into())
            .await
            .unwrap();
        session.load_inventory().await.unwrap();
        let cursor = session.start_streaming().await.unwrap();
        (session, cursor)
    }

    #[tokio::test]
    async fn failing_handler_stops_the_loop() {
        let server = MockServer::start().await;
        let (session, cursor) = streaming_session(&server).await;
        let handle = session.spawn_refresh_loop(cursor, CancellationToken::new());

        let mut seen = 0;
        let (result, session) = follow(handle, |_| {
            seen += 1;
            Err(CliError::Internal("display failed".into()))
        })
        .await;

        assert!(matches!(result, Err(CliError::Internal(_))));
        assert_eq!(seen, 1);
        // The task was joined, so the session came back.
        assert_eq!(session.unwrap().registry().len(), 1);
    }

    #[tokio::test]
    async fn handler_sees_applied_changes() {
        let server = MockServer::start().await;
        let (session, cursor) = streaming_session(&server).await;
        let handle = session.spawn_refresh_loop(cursor, CancellationToken::new());

        let mut applied = Vec::new();
        let (result, session) = follow(handle, |event| {
            if let SyncEvent::ChangesApplied { changed, .. } = event {
                applied.extend(changed);
            }
            Err(CliError::Internal("stop".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(applied, vec![hcsync_core::DeviceId::new(1)]);
        assert!(session.is_some());
    }
}
