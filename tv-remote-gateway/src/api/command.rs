//! Remote command endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tv_remote_common::Command;

use crate::error::{Error, Result};
use crate::state::AppState;

/// Build the command router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tv", post(send_command))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub action: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    success: bool,
    message: &'static str,
    action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_id: Option<String>,
}

/// POST /tv - Resolve an action name and deliver it to the TV.
async fn send_command(
    State(state): State<Arc<AppState>>,
    request: std::result::Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>> {
    let action = match request {
        Ok(Json(request)) => request.action,
        Err(rejection) => {
            tracing::debug!("Unreadable command body: {}", rejection);
            None
        }
    };
    let action = action_name(action)?;

    let command = Command::from_action(&action).ok_or_else(unknown_action)?;

    let response = match command {
        Command::Key(key) => {
            state.connection.send_key(&key).await?;
            CommandResponse {
                success: true,
                message: "command sent",
                action,
                key: Some(key),
                app_id: None,
            }
        }
        Command::LaunchApp(app_id) => {
            state.connection.launch_app(&app_id).await?;
            CommandResponse {
                success: true,
                message: "app launch sent",
                action,
                key: None,
                app_id: Some(app_id),
            }
        }
    };

    Ok(Json(response))
}

/// Accept a non-empty string. Other falsy values count as missing, anything
/// else can never name an action.
fn action_name(action: Option<Value>) -> Result<String> {
    match action {
        Some(Value::String(action)) if !action.is_empty() => Ok(action),
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Bool(false)) => {
            Err(Error::ActionRequired)
        }
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(Error::ActionRequired),
        Some(_) => Err(unknown_action()),
    }
}

fn unknown_action() -> Error {
    Error::UnknownAction {
        valid_actions: Command::valid_actions(),
    }
}
