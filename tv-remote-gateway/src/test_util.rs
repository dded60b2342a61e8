//! In-process fake TV for tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{sink, stream};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::config::{ApiConfig, Config, DeviceConfig};
use crate::connection::{Connector, Transport, TransportError};

pub fn test_device_config() -> DeviceConfig {
    DeviceConfig {
        host: "192.168.1.50".to_string(),
        port: 8002,
        token: None,
        app_name: "tv-remote-gateway".to_string(),
        reconnect_delay_secs: 10,
    }
}

pub fn test_config() -> Config {
    Config {
        device: test_device_config(),
        api: ApiConfig::default(),
    }
}

/// Connector that hands every accepted connection to the test as a [`MockSession`].
pub struct MockDevice {
    sessions: mpsc::UnboundedSender<MockSession>,
    refuse: bool,
}

impl MockDevice {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockSession>) {
        Self::build(false)
    }

    /// A device whose every connection attempt fails.
    pub fn refusing() -> (Arc<Self>, mpsc::UnboundedReceiver<MockSession>) {
        Self::build(true)
    }

    fn build(refuse: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<MockSession>) {
        let (sessions, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { sessions, refuse }), rx)
    }
}

#[async_trait]
impl Connector for MockDevice {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        if self.refuse {
            return Err(tungstenite::Error::ConnectionClosed.into());
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Result<Message, tungstenite::Error>>();

        let _ = self.sessions.send(MockSession {
            url: url.to_string(),
            outbound: outbound_rx,
            inbound: inbound_tx,
        });

        let sink = sink::unfold(outbound_tx, |tx, msg: Message| async move {
            tx.send(msg).map_err(|_| tungstenite::Error::ConnectionClosed)?;
            Ok::<_, tungstenite::Error>(tx)
        });
        let stream = stream::unfold(inbound_rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        });

        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

/// The device side of one accepted connection.
pub struct MockSession {
    pub url: String,
    outbound: mpsc::UnboundedReceiver<Message>,
    inbound: mpsc::UnboundedSender<Result<Message, tungstenite::Error>>,
}

impl MockSession {
    pub fn send_text(&self, text: &str) {
        let _ = self.inbound.send(Ok(Message::Text(text.to_string())));
    }

    /// Send `ms.channel.connect`, optionally issuing a token.
    pub fn authorize(&self, token: Option<&str>) {
        let data = match token {
            Some(token) => serde_json::json!({ "id": "mock", "token": token }),
            None => serde_json::json!({ "id": "mock" }),
        };
        let event = serde_json::json!({ "event": "ms.channel.connect", "data": data });
        self.send_text(&event.to_string());
    }

    pub fn close(&self, code: Option<u16>) {
        let frame = code.map(|code| CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        });
        let _ = self.inbound.send(Ok(Message::Close(frame)));
    }

    /// Wait for the next frame written by the gateway, parsed as JSON.
    pub async fn next_frame(&mut self) -> Option<Value> {
        match self.outbound.recv().await? {
            Message::Text(text) => serde_json::from_str(&text).ok(),
            _ => None,
        }
    }

    /// A frame already written by the gateway, if any.
    pub fn try_next_frame(&mut self) -> Option<Value> {
        match self.outbound.try_recv() {
            Ok(Message::Text(text)) => serde_json::from_str(&text).ok(),
            _ => None,
        }
    }
}
