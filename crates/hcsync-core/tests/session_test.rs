#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Integration tests for `Session` and the refresh loop using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use hcsync_core::{
    CoreError, CursorPolicy, DeviceId, DeviceKind, EVENT_BUFFER, HubConfig, Session, SessionState,
    SyncEvent,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Matches `refreshStates` calls that carry no `last` cursor.
struct WithoutCursor;

impl Match for WithoutCursor {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "last")
    }
}

/// Matches `refreshStates` calls that carry any `last` cursor.
struct WithCursor;

impl Match for WithCursor {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, _)| key == "last")
    }
}

fn secret(value: &str) -> SecretString {
    value.to_string().into()
}

fn inventory() -> Value {
    json!([
        {
            "id": 1, "name": "Temp", "type": "com.fibaro.temperatureSensor",
            "enabled": true, "properties": { "value": "20.5", "unit": "C" }
        },
        { "id": 2, "name": "Switch", "type": "com.other.switch", "enabled": true }
    ])
}

fn config_for(server: &MockServer) -> HubConfig {
    let mut config = HubConfig::new(Url::parse(&server.uri()).unwrap());
    config.timeout = Duration::from_secs(5);
    config.refresh_pause = Duration::from_millis(10);
    config
}

async fn mount_inventory(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, last: i64) {
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithoutCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "last": last,
            "status": "IDLE",
            "timestamp": 1_511_189_425
        })))
        .mount(server)
        .await;
}

/// Session logged in, inventory loaded, streaming from cursor 100.
async fn streaming_session(config: HubConfig) -> (Session, i64) {
    let mut session = Session::new(config).unwrap();
    session
        .login("admin", &secret("secret"))
        .await
        .unwrap();
    session.load_inventory().await.unwrap();
    let cursor = session.start_streaming().await.unwrap();
    (session, cursor)
}

fn cursors_requested(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(key, _)| key == "last")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

// ── Setup sequence ──────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_sequence_walks_states() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;

    let mut session = Session::new(config_for(&server)).unwrap();
    assert_eq!(session.state(), SessionState::Unauthenticated);

    session
        .login("admin", &secret("secret"))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);

    let summary = session.load_inventory().await.unwrap();
    assert_eq!(summary.loaded, 2);
    assert_eq!(session.state(), SessionState::InventoryLoaded);

    let cursor = session.start_streaming().await.unwrap();
    assert_eq!(cursor, 100);
    assert_eq!(session.state(), SessionState::Streaming);

    let status = session.refresh_status().unwrap();
    assert_eq!(status.status.as_deref(), Some("IDLE"));
    assert!(status.hub_time().is_some());
}

#[tokio::test]
async fn test_login_rejected_fails_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let mut session = Session::new(config_for(&server)).unwrap();
    let err = session
        .login("admin", &secret("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Authentication { .. }), "got: {err:?}");
    assert_eq!(session.state(), SessionState::Failed);

    let err = session.load_inventory().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidState {
            actual: SessionState::Failed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_non_array_inventory_is_protocol_error() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!({ "error": "not a list" })).await;

    let mut session = Session::new(config_for(&server)).unwrap();
    session
        .login("admin", &secret("secret"))
        .await
        .unwrap();

    let err = session.load_inventory().await.unwrap_err();
    assert!(matches!(err, CoreError::Protocol { .. }), "got: {err:?}");
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.registry().is_empty());
}

#[tokio::test]
async fn test_refresh_before_streaming_is_invalid_state() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;

    let mut session = Session::new(config_for(&server)).unwrap();
    session
        .login("admin", &secret("secret"))
        .await
        .unwrap();

    let err = session.refresh_once(1).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidState {
            actual: SessionState::Authenticated,
            required: SessionState::Streaming,
        }
    ));
}

// ── Incremental refresh ─────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_once_applies_change_set() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(query_param("last", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [{ "id": 1, "value": 21.0 }],
            "last": 101
        })))
        .mount(&server)
        .await;

    let (mut session, cursor) = streaming_session(config_for(&server)).await;
    let sensor = session
        .registry()
        .find(DeviceId::new(1))
        .unwrap()
        .as_temperature_sensor()
        .unwrap()
        .clone();
    assert_eq!(sensor.current(), Some(20.5));
    assert_eq!(sensor.average(), Some(20.5));

    let outcome = session.refresh_once(cursor).await.unwrap();
    assert_eq!(outcome.next_cursor, Some(101));
    assert_eq!(outcome.applied, vec![DeviceId::new(1)]);
    assert_eq!(outcome.ignored, 0);

    let registry = session.registry();
    let sensor = registry
        .find(DeviceId::new(1))
        .unwrap()
        .as_temperature_sensor()
        .unwrap();
    assert_eq!(sensor.current(), Some(21.0));
    assert_eq!(sensor.average(), Some(20.75));

    let switch = registry.find(DeviceId::new(2)).unwrap();
    assert_eq!(switch.kind(), &DeviceKind::Generic);
    assert_eq!(switch.name(), "Switch");

    // Snapshot reflects the whole change-set.
    let snapshot = registry.snapshot();
    assert_eq!(
        snapshot[0].as_temperature_sensor().unwrap().current(),
        Some(21.0)
    );
}

#[tokio::test]
async fn test_refresh_once_ignores_unknown_and_malformed_entries() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [
                { "id": 99, "value": 1.0 },
                { "id": 1, "log": "transfer ok" },
                { "id": 2, "value": "1" },
                { "id": 1, "value": "19.5" }
            ]
        })))
        .mount(&server)
        .await;

    let (mut session, cursor) = streaming_session(config_for(&server)).await;
    let outcome = session.refresh_once(cursor).await.unwrap();

    assert_eq!(outcome.next_cursor, None);
    assert_eq!(outcome.applied, vec![DeviceId::new(1)]);
    assert_eq!(outcome.ignored, 3);

    let sensor = session
        .registry()
        .find(DeviceId::new(1))
        .unwrap()
        .as_temperature_sensor()
        .unwrap();
    assert_eq!(sensor.current(), Some(19.5));
}

#[tokio::test]
async fn test_mistyped_informational_fields_do_not_break_streaming() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithoutCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "last": 100,
            "status": 0,
            "timestamp": "yesterday",
            "logs": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [
                { "id": 1, "value": 21.0 },
                { "id": 1, "value": "NaN" }
            ],
            "last": 101.0,
            "timestamp": 1_511_189_425.5
        })))
        .mount(&server)
        .await;

    let (mut session, cursor) = streaming_session(config_for(&server)).await;
    assert_eq!(cursor, 100);
    assert!(session.refresh_status().unwrap().status.is_none());

    let outcome = session.refresh_once(cursor).await.unwrap();
    assert_eq!(outcome.next_cursor, Some(101));
    assert_eq!(outcome.applied, vec![DeviceId::new(1)]);
    assert_eq!(outcome.ignored, 1);

    let sensor = session
        .registry()
        .find(DeviceId::new(1))
        .unwrap()
        .as_temperature_sensor()
        .unwrap();
    assert_eq!(sensor.current(), Some(21.0));
    assert_eq!(sensor.average(), Some(20.75));
}

#[tokio::test]
async fn test_refresh_without_changes_is_protocol_error() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last": 101 })))
        .mount(&server)
        .await;

    let (mut session, cursor) = streaming_session(config_for(&server)).await;
    let err = session.refresh_once(cursor).await.unwrap_err();

    assert!(matches!(err, CoreError::Protocol { .. }), "got: {err:?}");
    // Refresh failures do not end streaming.
    assert_eq!(session.state(), SessionState::Streaming);
}

#[tokio::test]
async fn test_refresh_timeout_is_reported() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "changes": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(200);
    let (mut session, cursor) = streaming_session(config).await;

    let err = session.refresh_once(cursor).await.unwrap_err();
    assert!(err.is_timeout(), "got: {err:?}");
}

// ── Refresh loop ────────────────────────────────────────────────────

#[tokio::test]
async fn test_loop_retries_after_failure_and_keeps_running() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [{ "id": 1, "value": 21.0 }],
            "last": 101
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.refresh_pause = Duration::from_secs(3600);
    let (session, cursor) = streaming_session(config).await;
    let mut handle = session.spawn_refresh_loop(cursor, CancellationToken::new());

    match handle.next_event().await.unwrap() {
        SyncEvent::RefreshFailed {
            attempt,
            error,
            timed_out,
        } => {
            assert_eq!(attempt, 1);
            assert!(!timed_out);
            assert!(matches!(
                error,
                CoreError::Transport {
                    status: Some(500),
                    ..
                }
            ));
        }
        other => panic!("expected RefreshFailed, got: {other:?}"),
    }

    match handle.next_event().await.unwrap() {
        SyncEvent::ChangesApplied {
            cursor,
            changed,
            devices,
            ..
        } => {
            assert_eq!(cursor, 101);
            assert_eq!(changed, vec![DeviceId::new(1)]);
            let sensor = devices[0].as_temperature_sensor().unwrap();
            assert_eq!(sensor.current(), Some(21.0));
            assert_eq!(sensor.average(), Some(20.75));
        }
        other => panic!("expected ChangesApplied, got: {other:?}"),
    }

    assert!(handle.is_running());
    let latest = handle.devices().latest();
    assert_eq!(
        latest[0].as_temperature_sensor().unwrap().current(),
        Some(21.0)
    );

    let session = handle.shutdown().await.unwrap();
    assert_eq!(session.state(), SessionState::Streaming);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(cursors_requested(&requests), vec!["100", "100"]);
}

#[tokio::test]
async fn test_unread_failures_stay_within_event_buffer() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .mount(&server)
        .await;

    let (session, cursor) = streaming_session(config_for(&server)).await;
    let cancel = CancellationToken::new();
    let mut handle = session.spawn_refresh_loop(cursor, cancel.clone());

    // Nobody reads while the loop retries.
    while server.received_requests().await.unwrap().len() < EVENT_BUFFER + 10 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    while handle.is_running() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut buffered = 0;
    while let Some(event) = handle.next_event().await {
        assert!(matches!(event, SyncEvent::RefreshFailed { .. }));
        buffered += 1;
    }
    assert_eq!(buffered, EVENT_BUFFER);
}

async fn run_two_refreshes(policy: CursorPolicy) -> Vec<String> {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [{ "id": 1, "value": 22.0 }],
            "last": 101
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.cursor_policy = policy;
    let (session, cursor) = streaming_session(config).await;
    let mut handle = session.spawn_refresh_loop(cursor, CancellationToken::new());

    for _ in 0..2 {
        match handle.next_event().await.unwrap() {
            SyncEvent::ChangesApplied { .. } => {}
            other => panic!("expected ChangesApplied, got: {other:?}"),
        }
    }
    handle.shutdown().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    cursors_requested(&requests).into_iter().take(2).collect()
}

#[tokio::test]
async fn test_advance_policy_follows_returned_cursor() {
    assert_eq!(run_two_refreshes(CursorPolicy::Advance).await, vec!["100", "101"]);
}

#[tokio::test]
async fn test_replay_policy_reuses_initial_cursor() {
    assert_eq!(run_two_refreshes(CursorPolicy::Replay).await, vec!["100", "100"]);
}

#[tokio::test]
async fn test_cancelled_loop_stops_and_returns_session() {
    let server = MockServer::start().await;
    mount_inventory(&server, inventory()).await;
    mount_status(&server, 100).await;
    Mock::given(method("GET"))
        .and(path("/api/refreshStates"))
        .and(WithCursor)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "changes": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (session, cursor) = streaming_session(config_for(&server)).await;
    let cancel = CancellationToken::new();
    let handle = session.spawn_refresh_loop(cursor, cancel.clone());

    // Cancel mid long-poll.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let session = tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.registry().len(), 2);
}
