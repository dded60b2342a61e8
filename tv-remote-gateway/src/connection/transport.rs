//! Transport seam between the connection manager and the network.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector as TungsteniteConnector};

pub type FrameSink = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// An open WebSocket, split into its write and read halves.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Transport {
    pub fn new<S>(socket: S) -> Self
    where
        S: Sink<Message, Error = tungstenite::Error>
            + Stream<Item = Result<Message, tungstenite::Error>>
            + Send
            + 'static,
    {
        let (sink, stream) = socket.split();
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Opens WebSocket connections to the device.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError>;
}

/// Production connector: `wss://` over native-tls.
///
/// TVs present a self-signed certificate issued for a vendor hostname, so both
/// certificate and hostname verification are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceConnector;

#[async_trait]
impl Connector for DeviceConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;

        let (socket, _response) =
            connect_async_tls_with_config(url, None, false, Some(TungsteniteConnector::NativeTls(tls)))
                .await?;

        Ok(Transport::new(socket))
    }
}
