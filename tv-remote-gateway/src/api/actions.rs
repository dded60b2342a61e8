//! Action catalogue endpoint.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tv_remote_common::{APP_ACTIONS, KEY_ACTIONS};

use crate::state::AppState;

/// Build the actions router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/actions", get(list_actions))
}

#[derive(Debug, Serialize)]
struct ActionsResponse {
    keys: Vec<KeyAction>,
    apps: Vec<AppAction>,
}

#[derive(Debug, Serialize)]
struct KeyAction {
    action: &'static str,
    key: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppAction {
    action: &'static str,
    app_id: &'static str,
}

/// GET /actions - Every action accepted by `POST /tv`.
async fn list_actions() -> Json<ActionsResponse> {
    Json(ActionsResponse {
        keys: KEY_ACTIONS
            .iter()
            .map(|&(action, key)| KeyAction { action, key })
            .collect(),
        apps: APP_ACTIONS
            .iter()
            .map(|&(action, app_id)| AppAction { action, app_id })
            .collect(),
    })
}
