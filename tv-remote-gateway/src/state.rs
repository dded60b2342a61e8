//! Shared application state.

use crate::config::Config;
use crate::connection::ConnectionHandle;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub connection: ConnectionHandle,
}

impl AppState {
    pub fn new(config: Config, connection: ConnectionHandle) -> Self {
        Self { config, connection }
    }
}
