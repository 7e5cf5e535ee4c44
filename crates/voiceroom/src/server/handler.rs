//! Per-connection handling and shared relay state
//!
//! Every event (frame or disconnect) locks the state once, runs the
//! registry mutation and snapshot to completion, and queues outbound
//! frames onto per-connection channels. The lock is never held across an
//! actual socket send; dedicated writer tasks drain the queues, which
//! preserves per-link FIFO order.

use crate::server::registry::RoomRegistry;
use crate::signaling::{ClientMessage, ServerMessage};
use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Registry plus the outbound queue of every live connection
///
/// Kept behind a single mutex so each event runs to completion before
/// the next is processed, which is what makes registry operations atomic.
#[derive(Default)]
struct Inner {
    registry: RoomRegistry,
    peers: HashMap<String, mpsc::UnboundedSender<ServerMessage>>,
}

/// State shared by all connection handlers
#[derive(Default)]
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    /// Create empty shared state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live connections (for tests and introspection)
    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.peers.len()
    }

    /// Whether a room currently exists
    pub async fn room_exists(&self, room_id: &str) -> bool {
        self.inner.lock().await.registry.room_exists(room_id)
    }

    async fn register(&self, conn_id: &str, sender: mpsc::UnboundedSender<ServerMessage>) {
        let mut inner = self.inner.lock().await;
        inner.peers.insert(conn_id.to_string(), sender);
    }

    /// Handle a decoded frame from a connection
    async fn handle_message(&self, conn_id: &str, msg: ClientMessage) {
        let mut inner = self.inner.lock().await;

        match msg {
            ClientMessage::JoinRoom { room_id, user_name } => {
                let outcome = inner.registry.join(&room_id, conn_id, &user_name);

                // Implicit leave of the previous room is a presence
                // mutation like any other and gets broadcast there
                if let Some(prev) = outcome.previous_room {
                    let others = inner.registry.other_members(&prev, conn_id);
                    Inner::broadcast(&inner, &others, ServerMessage::UserLeft(conn_id.to_string()));
                }

                let joined = crate::signaling::Participant {
                    id: conn_id.to_string(),
                    name: user_name.clone(),
                    is_muted: false,
                };

                let others = inner.registry.other_members(&room_id, conn_id);
                Inner::broadcast(&inner, &others, ServerMessage::UserJoined(joined));

                Inner::send_to(
                    &inner,
                    conn_id,
                    ServerMessage::RoomParticipants(outcome.roster.clone()),
                );
                Inner::send_to(
                    &inner,
                    conn_id,
                    ServerMessage::JoinedRoom {
                        room_id: room_id.clone(),
                        participants: outcome.roster,
                    },
                );

                info!("{} joined room {}", conn_id, room_id);
            }

            ClientMessage::ToggleMute(is_muted) => {
                if let Some(room_id) = inner.registry.set_muted(conn_id, is_muted) {
                    let others = inner.registry.other_members(&room_id, conn_id);
                    Inner::broadcast(
                        &inner,
                        &others,
                        ServerMessage::UserMuted {
                            id: conn_id.to_string(),
                            is_muted,
                        },
                    );
                }
            }

            ClientMessage::Offer { target, sdp } => {
                Inner::relay(
                    &inner,
                    conn_id,
                    &target,
                    ServerMessage::Offer {
                        sender: conn_id.to_string(),
                        sdp,
                    },
                );
            }

            ClientMessage::Answer { target, sdp } => {
                Inner::relay(
                    &inner,
                    conn_id,
                    &target,
                    ServerMessage::Answer {
                        sender: conn_id.to_string(),
                        sdp,
                    },
                );
            }

            ClientMessage::IceCandidate { target, candidate } => {
                Inner::relay(
                    &inner,
                    conn_id,
                    &target,
                    ServerMessage::IceCandidate {
                        sender: conn_id.to_string(),
                        candidate,
                    },
                );
            }

            ClientMessage::LeaveRoom => {
                Inner::leave(&mut inner, conn_id);
            }
        }
    }

    /// Handle a connection going away: same presence effect as an
    /// explicit leave, plus releasing the outbound queue
    async fn disconnect(&self, conn_id: &str) {
        let mut inner = self.inner.lock().await;
        Inner::leave(&mut inner, conn_id);
        inner.peers.remove(conn_id);
        info!("Connection closed: {}", conn_id);
    }
}

impl Inner {
    /// Queue a frame for one connection; a missing or closed peer is not
    /// an error, it just left
    fn send_to(&self, conn_id: &str, msg: ServerMessage) {
        if let Some(sender) = self.peers.get(conn_id) {
            let _ = sender.send(msg);
        }
    }

    /// Queue a frame for a set of connections
    fn broadcast(&self, conn_ids: &[String], msg: ServerMessage) {
        for conn_id in conn_ids {
            self.send_to(conn_id, msg.clone());
        }
    }

    /// Forward a negotiation payload if sender and target share a room,
    /// else drop it silently (the target may have just left)
    fn relay(&self, sender: &str, target: &str, msg: ServerMessage) {
        if self.registry.share_room(sender, target) {
            self.send_to(target, msg);
        } else {
            debug!("Dropping stale frame from {} to {}", sender, target);
        }
    }

    fn leave(&mut self, conn_id: &str) {
        if let Some(room_id) = self.registry.leave(conn_id) {
            let others = self.registry.other_members(&room_id, conn_id);
            Self::broadcast(self, &others, ServerMessage::UserLeft(conn_id.to_string()));
        }
    }
}

/// Handle one WebSocket connection for its whole lifetime
pub async fn handle_connection(stream: TcpStream, state: Arc<SharedState>) -> Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| Error::WebSocket(format!("WebSocket handshake failed: {}", e)))?;

    let conn_id = uuid::Uuid::new_v4().to_string();
    info!("Connection established: {}", conn_id);

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    state.register(&conn_id, tx.clone()).await;

    // Writer task: drains this connection's queue in FIFO order
    let writer_conn_id = conn_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!("Dropping unserializable frame for {}: {}", writer_conn_id, e);
                    continue;
                }
            };
            if write.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // The first frame a client sees is its own connection id
    let _ = tx.send(ServerMessage::Welcome {
        id: conn_id.clone(),
    });

    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(msg) => state.handle_message(&conn_id, msg).await,
                Err(e) => warn!("Ignoring malformed frame from {}: {}", conn_id, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket error on {}: {}", conn_id, e);
                break;
            }
        }
    }

    state.disconnect(&conn_id).await;
    writer.abort();

    Ok(())
}
