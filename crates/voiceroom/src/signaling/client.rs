//! WebSocket signaling client
//!
//! Thin transport wrapper: frames [`ClientMessage`]s out and surfaces
//! decoded [`ServerMessage`]s on a channel. Negotiation logic lives in
//! the room session controller, which owns the receive loop.

use super::protocol::{ClientMessage, ServerMessage};
use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket signaling client
pub struct SignalingClient {
    /// Outgoing message queue, drained by the sender task
    tx: mpsc::UnboundedSender<ClientMessage>,

    /// Decoded server messages, fed by the receiver task
    events: mpsc::UnboundedReceiver<ServerMessage>,
}

impl SignalingClient {
    /// Connect to the signaling server
    ///
    /// Establishes the WebSocket connection and spawns background tasks
    /// for sending and receiving frames.
    ///
    /// # Arguments
    ///
    /// * `url` - WebSocket signaling server URL (ws:// or wss://)
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to signaling server: {}", url);

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(format!("Failed to connect: {}", e)))?;

        info!("Connected to signaling server");

        let (write, read) = ws_stream.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();

        tokio::spawn(Self::sender_task(write, rx));
        tokio::spawn(Self::receiver_task(read, event_tx));

        Ok(Self { tx, events })
    }

    /// Sender task: frames queued messages onto the WebSocket
    async fn sender_task(
        mut write: futures_util::stream::SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<ClientMessage>,
    ) {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!("Dropping unserializable frame: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json)).await {
                error!("Failed to send WebSocket frame: {}", e);
                break;
            }
        }

        debug!("Sender task terminated");
    }

    /// Receiver task: decodes incoming frames and forwards them
    async fn receiver_task(
        mut read: futures_util::stream::SplitStream<WsStream>,
        event_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match ServerMessage::from_json(&text) {
                    Ok(msg) => {
                        if event_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed server frame: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("Signaling connection closed by server");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        debug!("Receiver task terminated");
    }

    /// Queue a message for sending
    pub fn send(&self, msg: ClientMessage) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| Error::ConnectionClosed("signaling sender task gone".to_string()))
    }

    /// Clone the outgoing message queue handle
    ///
    /// The controller holds one of these so sessions can emit offers and
    /// candidates without owning the client.
    pub fn sender(&self) -> mpsc::UnboundedSender<ClientMessage> {
        self.tx.clone()
    }

    /// Receive the next decoded server message
    ///
    /// Returns `None` once the connection is closed and drained.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.events.recv().await
    }
}
