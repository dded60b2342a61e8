//! TV Remote Gateway - HTTP control surface for a TV's remote-control channel.

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod state;
pub mod test_util;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

pub use config::Config;
pub use connection::{ConnectionHandle, ConnectionManager, DeviceConnector};
pub use state::AppState;

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::router())
        .route("/health", get(api::health::health))
        .layer(middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
