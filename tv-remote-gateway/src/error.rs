//! Error types for the command gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::connection::ConnectionError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Action is required")]
    ActionRequired,

    #[error("Unknown action")]
    UnknownAction { valid_actions: Vec<String> },

    #[error(transparent)]
    Device(#[from] ConnectionError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::ActionRequired => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            Error::UnknownAction { valid_actions } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": self.to_string(),
                    "validActions": valid_actions
                }),
            ),
            Error::Device(e) => {
                tracing::error!("Error sending command: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": e.to_string(),
                        "hint": "Check TV is connected and authorized"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
