//! HTTP control surface.

pub mod actions;
pub mod command;
pub mod health;
pub mod status;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(command::router())
        .merge(status::router())
        .merge(actions::router())
}
