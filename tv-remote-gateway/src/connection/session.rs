//! Per-session task: owns the socket and feeds transport events to the manager.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::manager::ManagerEvent;
use super::transport::{Connector, FrameSink, FrameStream, Transport, TransportError};

/// Close code and reason, when the device sent a close frame.
type CloseInfo = (Option<u16>, String);

/// Open the socket and pump frames until it closes.
///
/// Always finishes by emitting exactly one `Closed` event, preceded by a
/// `TransportError` when the connection failed.
pub(super) async fn run(
    connector: Arc<dyn Connector>,
    url: String,
    session: u64,
    events: mpsc::UnboundedSender<ManagerEvent>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let (code, reason) = match connector.connect(&url).await {
        Ok(Transport { mut sink, mut stream }) => {
            let _ = events.send(ManagerEvent::Opened { session });

            match message_loop(&mut sink, &mut stream, &mut outbound, &events, session).await {
                Ok(close) => close,
                Err(e) => {
                    let _ = events.send(ManagerEvent::TransportError {
                        session,
                        message: e.to_string(),
                    });
                    (None, String::new())
                }
            }
        }
        Err(e) => {
            let _ = events.send(ManagerEvent::TransportError {
                session,
                message: e.to_string(),
            });
            (None, String::new())
        }
    };

    let _ = events.send(ManagerEvent::Closed {
        session,
        code,
        reason,
    });
}

async fn message_loop(
    sink: &mut FrameSink,
    stream: &mut FrameStream,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
    events: &mpsc::UnboundedSender<ManagerEvent>,
    session: u64,
) -> Result<CloseInfo, TransportError> {
    loop {
        tokio::select! {
            // Handle outbound frames
            msg = outbound.recv() => match msg {
                Some(msg) => sink.send(msg).await?,
                None => {
                    // Manager dropped this session
                    let _ = sink.close().await;
                    return Ok((None, "superseded".to_string()));
                }
            },

            // Handle inbound frames
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("From TV: {}", text);
                    let _ = events.send(ManagerEvent::Message { session, text });
                }
                Some(Ok(Message::Ping(data))) => {
                    sink.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    return Ok(match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::new()),
                    });
                }
                Some(Ok(_)) => {} // Ignore binary and pong frames
                Some(Err(e)) => return Err(e.into()),
                None => return Ok((None, String::new())),
            },
        }
    }
}
