//! Connection to the TV's remote-control channel.
//!
//! A single [`ConnectionManager`] task owns the WebSocket session, the auth
//! token and the reconnect timer. Everything else talks to it through a
//! cloneable [`ConnectionHandle`]: commands go over the manager's event
//! channel, status is read from a watch channel and never waits on the manager.

mod manager;
mod session;
mod transport;

use std::fmt;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tv_remote_common::Command;

pub use manager::{connection_url, ConnectionManager, ManagerEvent};
pub use transport::{Connector, DeviceConnector, FrameSink, FrameStream, Transport, TransportError};

/// Application-level lifecycle of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Connected,
    Authorizing,
    Ready,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Disconnected => write!(f, "disconnected"),
            LifecycleState::Connecting => write!(f, "connecting"),
            LifecycleState::Connected => write!(f, "connected"),
            LifecycleState::Authorizing => write!(f, "authorizing"),
            LifecycleState::Ready => write!(f, "ready"),
        }
    }
}

/// Transport state of a live session, numbered like WebSocket `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
}

impl TransportState {
    pub fn code(self) -> u8 {
        match self {
            TransportState::Connecting => 0,
            TransportState::Open => 1,
        }
    }
}

/// Snapshot of the connection, republished after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStatus {
    /// Transport is open and accepts writes.
    pub connected: bool,
    /// `readyState` code of the current session, if any.
    pub ws_state: Option<u8>,
    pub has_token: bool,
    pub lifecycle: LifecycleState,
    pub attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("TV not connected")]
    NotConnected { state: Option<TransportState> },

    #[error("Connection manager stopped")]
    ManagerStopped,

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Cloneable handle to a running [`ConnectionManager`].
#[derive(Clone)]
pub struct ConnectionHandle {
    events: mpsc::UnboundedSender<ManagerEvent>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    /// Latest published status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub async fn send_key(&self, key_code: &str) -> Result<(), ConnectionError> {
        self.send(Command::Key(key_code.to_string())).await
    }

    pub async fn launch_app(&self, app_id: &str) -> Result<(), ConnectionError> {
        self.send(Command::LaunchApp(app_id.to_string())).await
    }

    /// Deliver a command on the current session.
    ///
    /// Fails with `NotConnected` unless the transport is open; nothing is queued.
    pub async fn send(&self, command: Command) -> Result<(), ConnectionError> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(ManagerEvent::Command { command, reply })
            .map_err(|_| ConnectionError::ManagerStopped)?;
        response.await.map_err(|_| ConnectionError::ManagerStopped)?
    }
}
