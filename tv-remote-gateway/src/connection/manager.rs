//! Connection lifecycle actor.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tv_remote_common::{Command, DeviceEvent, REMOTE_CONTROL_CHANNEL};

use crate::config::DeviceConfig;

use super::session;
use super::transport::Connector;
use super::{ConnectionError, ConnectionHandle, ConnectionStatus, LifecycleState, TransportState};

/// Everything the manager reacts to, processed one at a time.
#[derive(Debug)]
pub enum ManagerEvent {
    /// Transport open.
    Opened { session: u64 },
    /// Text frame from the device.
    Message { session: u64, text: String },
    /// Connect failure or socket error. Always followed by `Closed`.
    TransportError { session: u64, message: String },
    /// Socket gone.
    Closed {
        session: u64,
        code: Option<u16>,
        reason: String,
    },
    /// Reconnect timer fired.
    ReconnectDue { timer: u64 },
    /// Command from the HTTP layer.
    Command {
        command: Command,
        reply: oneshot::Sender<Result<(), ConnectionError>>,
    },
}

/// Build the device URL for a connection attempt.
///
/// The first attempt of the process never carries a token: a stale pre-seeded
/// token would make the TV reject the handshake instead of prompting.
pub fn connection_url(config: &DeviceConfig, token: Option<&str>, attempt: u32) -> String {
    let name = BASE64.encode(config.app_name.as_bytes());
    let mut url = format!(
        "wss://{}/api/v2/channels/{}?name={}",
        config.address(),
        REMOTE_CONTROL_CHANNEL,
        name
    );
    if let Some(token) = token.filter(|_| attempt > 1) {
        url.push_str("&token=");
        url.push_str(token);
    }
    url
}

struct Session {
    id: u64,
    state: TransportState,
    outbound: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ReconnectTimer {
    id: u64,
    task: JoinHandle<()>,
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns the device session, the auth token and the reconnect timer.
pub struct ConnectionManager {
    config: DeviceConfig,
    connector: Arc<dyn Connector>,
    events_tx: mpsc::UnboundedSender<ManagerEvent>,
    events_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    status_tx: watch::Sender<ConnectionStatus>,
    lifecycle: LifecycleState,
    auth_token: Option<String>,
    attempts: u32,
    session: Option<Session>,
    /// Id of the most recently started session, live or not.
    current_session: u64,
    reconnect: Option<ReconnectTimer>,
    next_timer: u64,
}

impl ConnectionManager {
    pub fn new(config: DeviceConfig, connector: Arc<dyn Connector>) -> (Self, ConnectionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let auth_token = config.seeded_token();
        let initial = ConnectionStatus {
            connected: false,
            ws_state: None,
            has_token: auth_token.is_some(),
            lifecycle: LifecycleState::Disconnected,
            attempts: 0,
        };
        let (status_tx, status_rx) = watch::channel(initial);

        let handle = ConnectionHandle {
            events: events_tx.clone(),
            status: status_rx,
        };

        let manager = Self {
            config,
            connector,
            events_tx,
            events_rx,
            status_tx,
            lifecycle: LifecycleState::Disconnected,
            auth_token,
            attempts: 0,
            session: None,
            current_session: 0,
            reconnect: None,
            next_timer: 0,
        };

        (manager, handle)
    }

    /// Create a manager and run it on a background task.
    pub fn spawn(config: DeviceConfig, connector: Arc<dyn Connector>) -> ConnectionHandle {
        let (manager, handle) = Self::new(config, connector);
        tokio::spawn(manager.run());
        handle
    }

    /// Connect immediately, then process events for the life of the process.
    pub async fn run(mut self) {
        self.connect();
        while let Some(event) = self.events_rx.recv().await {
            self.handle_event(event);
        }
    }

    /// Start a new connection attempt, superseding any existing session.
    pub fn connect(&mut self) {
        self.reconnect = None;
        self.attempts += 1;

        let token = self.auth_token.as_deref();
        let url = connection_url(&self.config, token, self.attempts);
        tracing::info!(
            attempt = self.attempts,
            "Connecting to TV at {}",
            self.config.address()
        );
        tracing::debug!(
            "Connection URL: {}",
            connection_url(&self.config, token.map(|_| "<redacted>"), self.attempts)
        );

        self.current_session += 1;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(session::run(
            self.connector.clone(),
            url,
            self.current_session,
            self.events_tx.clone(),
            outbound_rx,
        ));

        self.session = Some(Session {
            id: self.current_session,
            state: TransportState::Connecting,
            outbound: outbound_tx,
            task,
        });
        self.lifecycle = LifecycleState::Connecting;
        self.publish();
    }

    pub fn handle_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::Opened { session } => {
                if let Some(live) = self.session.as_mut().filter(|s| s.id == session) {
                    live.state = TransportState::Open;
                    self.lifecycle = LifecycleState::Connected;
                    tracing::info!("WebSocket connection established, waiting for authorization");
                    self.publish();
                }
            }

            ManagerEvent::Message { session, text } => {
                if self.is_live(session) {
                    self.handle_message(&text);
                }
            }

            ManagerEvent::TransportError { session, message } => {
                if session == self.current_session {
                    tracing::error!("WebSocket error: {}", message);
                    self.transport_lost();
                }
            }

            ManagerEvent::Closed {
                session,
                code,
                reason,
            } => {
                if session == self.current_session {
                    tracing::info!(
                        "WebSocket connection closed. Code: {}, Reason: {}",
                        code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
                        if reason.is_empty() { "None" } else { reason.as_str() }
                    );
                    self.transport_lost();
                }
            }

            ManagerEvent::ReconnectDue { timer } => {
                if self.reconnect.as_ref().is_some_and(|t| t.id == timer) {
                    self.connect();
                } else {
                    tracing::debug!("Ignoring stale reconnect timer {}", timer);
                }
            }

            ManagerEvent::Command { command, reply } => {
                let _ = reply.send(self.deliver(&command));
            }
        }
    }

    fn is_live(&self, session: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == session)
    }

    fn handle_message(&mut self, text: &str) {
        let event = match DeviceEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Ignoring unparseable frame from TV: {}", e);
                return;
            }
        };

        if self.lifecycle == LifecycleState::Connected {
            self.lifecycle = LifecycleState::Authorizing;
        }

        match event {
            DeviceEvent::Authorized { token } => {
                tracing::info!("Authorization succeeded");
                if let Some(token) = token {
                    tracing::info!("Received auth token from TV");
                    self.auth_token = Some(token);
                }
                self.lifecycle = LifecycleState::Ready;
            }
            DeviceEvent::Unauthorized => {
                tracing::warn!(
                    "TV denied authorization. Check that external device control is enabled \
                     (Settings > General > External Device Manager) and accept the prompt on screen"
                );
                self.lifecycle = LifecycleState::Disconnected;
            }
            DeviceEvent::Ready => {
                if self.lifecycle == LifecycleState::Authorizing {
                    self.lifecycle = LifecycleState::Ready;
                }
                tracing::info!("TV is ready");
            }
            DeviceEvent::Other(name) => {
                tracing::debug!("Ignoring TV event {}", name);
            }
        }

        self.publish();
    }

    /// Drop the session and arm exactly one reconnect timer.
    fn transport_lost(&mut self) {
        self.session = None;
        self.lifecycle = LifecycleState::Disconnected;
        self.schedule_reconnect();
        self.publish();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.take().is_some() {
            tracing::debug!("Cancelled pending reconnect");
        }

        let delay = self.config.reconnect_delay();
        self.next_timer += 1;
        let id = self.next_timer;
        let events = self.events_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ManagerEvent::ReconnectDue { timer: id });
        });

        self.reconnect = Some(ReconnectTimer { id, task });
        tracing::info!("Reconnecting in {} seconds", delay.as_secs());
    }

    fn deliver(&self, command: &Command) -> Result<(), ConnectionError> {
        let session = match &self.session {
            Some(session) if session.state == TransportState::Open => session,
            other => {
                let state = other.as_ref().map(|s| s.state);
                tracing::warn!(
                    "Cannot send {}: TV not connected (state: {})",
                    command,
                    state.map(|s| s.code().to_string()).unwrap_or_else(|| "null".to_string())
                );
                return Err(ConnectionError::NotConnected { state });
            }
        };

        let json = command.to_request().to_json()?;
        session
            .outbound
            .send(Message::Text(json))
            .map_err(|_| ConnectionError::NotConnected {
                state: Some(session.state),
            })?;

        tracing::info!("Sent command: {}", command);
        Ok(())
    }

    fn snapshot(&self) -> ConnectionStatus {
        let state = self.session.as_ref().map(|s| s.state);
        ConnectionStatus {
            connected: state == Some(TransportState::Open),
            ws_state: state.map(TransportState::code),
            has_token: self.auth_token.is_some(),
            lifecycle: self.lifecycle,
            attempts: self.attempts,
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.snapshot());
    }
}
