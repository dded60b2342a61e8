//! Connection status endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Build the status router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(status))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    connected: bool,
    ws_state: Option<u8>,
    tv_ip: String,
    has_token: bool,
}

/// GET /status - Current connection state. Never waits on the connection manager.
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let status = state.connection.status();

    Json(StatusResponse {
        connected: status.connected,
        ws_state: status.ws_state,
        tv_ip: state.config.device.host.clone(),
        has_token: status.has_token,
    })
}
