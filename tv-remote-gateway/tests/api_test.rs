//! Integration tests for the gateway HTTP API against an in-process mock TV.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tower::ServiceExt;

use tv_remote_common::{APP_ACTIONS, KEY_ACTIONS};
use tv_remote_gateway::connection::LifecycleState;
use tv_remote_gateway::test_util::{test_config, MockDevice, MockSession};
use tv_remote_gateway::{app, AppState, ConnectionHandle, ConnectionManager};

fn setup_with(
    device: Arc<MockDevice>,
) -> (Router, ConnectionHandle) {
    let config = test_config();
    let handle = ConnectionManager::spawn(config.device.clone(), device);
    let state = Arc::new(AppState::new(config, handle.clone()));
    (app(state), handle)
}

fn setup() -> (Router, ConnectionHandle, mpsc::UnboundedReceiver<MockSession>) {
    let (device, sessions) = MockDevice::new();
    let (app, handle) = setup_with(device);
    (app, handle, sessions)
}

/// Accept the first connection and complete authorization.
async fn ready_session(
    handle: &ConnectionHandle,
    sessions: &mut mpsc::UnboundedReceiver<MockSession>,
) -> MockSession {
    let session = timeout(Duration::from_secs(5), sessions.recv())
        .await
        .unwrap()
        .unwrap();
    session.authorize(Some("13374242"));

    let mut status = handle.subscribe();
    timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.lifecycle == LifecycleState::Ready),
    )
    .await
    .unwrap()
    .unwrap();

    session
}

async fn send_request(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut req_builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        req_builder = req_builder.header("Content-Type", "application/json");
    }

    let req = req_builder
        .body(match body {
            Some(b) => Body::from(b.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _handle, _sessions) = setup();

    let (status, body) = send_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_key_command_when_ready() {
    let (app, handle, mut sessions) = setup();
    let mut session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":"volup"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["action"], "volup");
    assert_eq!(body["key"], "KEY_VOLUP");

    let frame = timeout(Duration::from_secs(5), session.next_frame())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        frame,
        json!({
            "method": "ms.remote.control",
            "params": {
                "Cmd": "Click",
                "DataOfCmd": "KEY_VOLUP",
                "Option": "false",
                "TypeOfRemote": "SendRemoteKey"
            }
        })
    );
    assert!(session.try_next_frame().is_none());
}

#[tokio::test]
async fn test_app_launch_when_ready() {
    let (app, handle, mut sessions) = setup();
    let mut session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":"netflix"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["action"], "netflix");
    assert_eq!(body["appId"], "org.tizen.netflix-1.0");

    let frame = timeout(Duration::from_secs(5), session.next_frame())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame["method"], "ms.channel.emit");
    assert_eq!(frame["params"]["data"]["operation"], "execute");
    assert_eq!(frame["params"]["data"]["id"], "org.tizen.netflix-1.0");
}

#[tokio::test]
async fn test_missing_action() {
    let (app, handle, mut sessions) = setup();
    let mut session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::POST, "/tv", Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Action is required" }));

    let (status, _) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_request(&app, Method::POST, "/tv", Some("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Action is required");

    let (status, _) = send_request(&app, Method::POST, "/tv", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    tokio::task::yield_now().await;
    assert!(session.try_next_frame().is_none());
}

#[tokio::test]
async fn test_unknown_action() {
    let (app, handle, mut sessions) = setup();
    let mut session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":"bogus"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action");

    let valid: Vec<&str> = body["validActions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    for (name, _) in KEY_ACTIONS.iter().chain(APP_ACTIONS.iter()) {
        assert!(valid.contains(name), "missing {}", name);
    }
    assert_eq!(valid.len(), KEY_ACTIONS.len() + APP_ACTIONS.len());

    tokio::task::yield_now().await;
    assert!(session.try_next_frame().is_none());
}

#[tokio::test]
async fn test_non_string_action() {
    let (app, handle, mut sessions) = setup();
    let mut session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action");
    assert_eq!(
        body["validActions"].as_array().unwrap().len(),
        KEY_ACTIONS.len() + APP_ACTIONS.len()
    );

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":null}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Action is required" }));

    tokio::task::yield_now().await;
    assert!(session.try_next_frame().is_none());
}

#[tokio::test]
async fn test_command_when_not_connected() {
    let (device, _sessions) = MockDevice::refusing();
    let (app, _handle) = setup_with(device);

    let (status, body) = send_request(&app, Method::POST, "/tv", Some(r#"{"action":"home"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "TV not connected");
    assert_eq!(body["hint"], "Check TV is connected and authorized");
}

#[tokio::test]
async fn test_status_when_disconnected() {
    let (device, _sessions) = MockDevice::refusing();
    let (app, handle) = setup_with(device);

    let mut status = handle.subscribe();
    timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.attempts == 1 && s.lifecycle == LifecycleState::Disconnected),
    )
    .await
    .unwrap()
    .unwrap();

    let (status, body) = send_request(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "connected": false,
            "wsState": null,
            "tvIp": "192.168.1.50",
            "hasToken": false
        })
    );
}

#[tokio::test]
async fn test_status_when_ready() {
    let (app, handle, mut sessions) = setup();
    let _session = ready_session(&handle, &mut sessions).await;

    let (status, body) = send_request(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "connected": true,
            "wsState": 1,
            "tvIp": "192.168.1.50",
            "hasToken": true
        })
    );
}

#[tokio::test]
async fn test_first_connection_omits_token() {
    let (device, mut sessions) = MockDevice::new();
    let mut config = test_config();
    config.device.token = Some("seeded".to_string());
    let _handle = ConnectionManager::spawn(config.device, device);

    let session = timeout(Duration::from_secs(5), sessions.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!session.url.contains("token="));
    assert!(session.url.starts_with("wss://192.168.1.50:8002/api/v2/channels/samsung.remote.control?name="));
}

#[tokio::test]
async fn test_actions_endpoint() {
    let (app, _handle, _sessions) = setup();

    let (status, body) = send_request(&app, Method::GET, "/actions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"].as_array().unwrap().len(), KEY_ACTIONS.len());
    assert_eq!(body["keys"][0], json!({ "action": "volup", "key": "KEY_VOLUP" }));
    assert_eq!(
        body["apps"][0],
        json!({ "action": "netflix", "appId": "org.tizen.netflix-1.0" })
    );
}
