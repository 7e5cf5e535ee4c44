//! Room session controller
//!
//! Owns the client's view of one room: the roster, the local identity,
//! and one negotiation session per remote participant. Server messages
//! are funneled through [`RoomSession::handle_server_message`]; the
//! controller routes them and surfaces the results as [`RoomEvent`]s.
//!
//! The joiner always initiates: entering a room starts an offer toward
//! every participant already present, while a `user-joined` for someone
//! else only updates the roster and waits for their offer.

use crate::client::connector::PeerConnector;
use crate::client::negotiation::{NegotiationSession, Role};
use crate::signaling::{ClientMessage, Participant, ServerMessage};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Shared connector source; each session gets its own factory handle
pub type SharedConnectorFactory = Arc<dyn Fn() -> Box<dyn PeerConnector> + Send + Sync>;

/// What the room session reports upward to the application
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Room membership or a mute flag changed
    RosterChanged(Vec<Participant>),
    /// Offer/answer exchange with a participant completed
    SessionEstablished(String),
    /// Session with a participant was torn down
    SessionClosed(String),
    /// A negotiation attempt failed locally; the session is retryable
    NegotiationFailed { remote_id: String, reason: String },
}

/// Operation to apply to one negotiation session
enum SessionOp {
    Start,
    Offer(String),
    Answer(String),
    Candidate(crate::signaling::CandidateInit),
}

/// Client-side controller for one room membership
pub struct RoomSession {
    user_name: String,
    local_id: Option<String>,
    room_id: Option<String>,
    roster: HashMap<String, Participant>,
    sessions: HashMap<String, NegotiationSession>,
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    factory: SharedConnectorFactory,
    events: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomSession {
    /// Create a controller and the event stream it reports on
    pub fn new(
        user_name: impl Into<String>,
        outgoing: mpsc::UnboundedSender<ClientMessage>,
        factory: SharedConnectorFactory,
    ) -> (Self, mpsc::UnboundedReceiver<RoomEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                user_name: user_name.into(),
                local_id: None,
                room_id: None,
                roster: HashMap::new(),
                sessions: HashMap::new(),
                outgoing,
                factory,
                events,
            },
            event_rx,
        )
    }

    /// Connect to a signaling server and build a controller around the
    /// link
    ///
    /// Returns the transport alongside the controller: the caller owns
    /// the receive loop and feeds frames into
    /// [`RoomSession::handle_server_message`].
    pub async fn connect(
        config: &crate::config::ClientConfig,
        factory: SharedConnectorFactory,
    ) -> Result<(
        crate::signaling::SignalingClient,
        Self,
        mpsc::UnboundedReceiver<RoomEvent>,
    )> {
        config.validate()?;
        let client = crate::signaling::SignalingClient::connect(&config.signaling_url).await?;
        let (session, events) = Self::new(config.user_name.clone(), client.sender(), factory);
        Ok((client, session, events))
    }

    /// Connection id assigned by the server, once known
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    /// Room currently joined, if any
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Current roster snapshot
    pub fn roster(&self) -> Vec<Participant> {
        self.roster.values().cloned().collect()
    }

    /// Remote ids with an established session
    pub fn established_peers(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.is_established())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Ask the server to join a room
    pub fn join_room(&self, room_id: &str) -> Result<()> {
        self.send(ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            user_name: self.user_name.clone(),
        })
    }

    /// Flip the local mute flag; the server broadcasts the result
    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.send(ClientMessage::ToggleMute(muted))
    }

    /// Leave the room: tear down every session, then tell the server
    pub async fn leave_room(&mut self) -> Result<()> {
        let sessions: Vec<(String, NegotiationSession)> = self.sessions.drain().collect();
        for (remote_id, mut session) in sessions {
            session.close().await;
            self.emit(RoomEvent::SessionClosed(remote_id));
        }
        self.roster.clear();
        self.room_id = None;
        self.send(ClientMessage::LeaveRoom)
    }

    /// Route one server message
    pub async fn handle_server_message(&mut self, msg: ServerMessage) -> Result<()> {
        match msg {
            ServerMessage::Welcome { id } => {
                info!("Assigned connection id {}", id);
                self.local_id = Some(id);
            }

            ServerMessage::RoomParticipants(participants) => {
                self.roster = participants.into_iter().map(|p| (p.id.clone(), p)).collect();
                self.emit_roster();
            }

            ServerMessage::JoinedRoom {
                room_id,
                participants,
            } => {
                info!("Joined room {} ({} members)", room_id, participants.len());
                self.room_id = Some(room_id);
                self.roster = participants.into_iter().map(|p| (p.id.clone(), p)).collect();
                self.emit_roster();
                self.initiate_toward_existing().await;
            }

            ServerMessage::UserJoined(participant) => {
                debug!("{} joined; waiting for their offer", participant.id);
                self.roster.insert(participant.id.clone(), participant);
                self.emit_roster();
            }

            ServerMessage::UserLeft(id) => {
                self.roster.remove(&id);
                if let Some(mut session) = self.sessions.remove(&id) {
                    session.close().await;
                    self.emit(RoomEvent::SessionClosed(id));
                }
                self.emit_roster();
            }

            ServerMessage::UserMuted { id, is_muted } => {
                if let Some(p) = self.roster.get_mut(&id) {
                    p.is_muted = is_muted;
                    self.emit_roster();
                }
            }

            ServerMessage::Offer { sender, sdp } => {
                if self.room_id.is_none() {
                    debug!("Dropping offer from {} outside any room", sender);
                    return Ok(());
                }
                self.ensure_session(&sender, Role::Responder)?;
                self.drive(&sender, SessionOp::Offer(sdp)).await;
            }

            ServerMessage::Answer { sender, sdp } => {
                if !self.sessions.contains_key(&sender) {
                    warn!("Discarding answer from {} with no session", sender);
                    return Ok(());
                }
                self.drive(&sender, SessionOp::Answer(sdp)).await;
            }

            ServerMessage::IceCandidate { sender, candidate } => {
                if self.room_id.is_none() {
                    debug!("Dropping candidate from {} outside any room", sender);
                    return Ok(());
                }
                // Candidates may outrun the offer across links; a fresh
                // responder session buffers them until it arrives
                self.ensure_session(&sender, Role::Responder)?;
                self.drive(&sender, SessionOp::Candidate(candidate)).await;
            }
        }

        Ok(())
    }

    /// Offer toward every participant already in the room
    async fn initiate_toward_existing(&mut self) {
        let local_id = match self.local_id.clone() {
            Some(id) => id,
            None => {
                warn!("Joined a room before receiving a connection id");
                return;
            }
        };

        let remotes: Vec<String> = self
            .roster
            .keys()
            .filter(|id| **id != local_id)
            .cloned()
            .collect();

        for remote_id in remotes {
            if self.ensure_session(&remote_id, Role::Initiator).is_err() {
                continue;
            }
            self.drive(&remote_id, SessionOp::Start).await;
        }
    }

    /// Create a session toward a remote if none exists yet
    fn ensure_session(&mut self, remote_id: &str, role: Role) -> Result<()> {
        if self.sessions.contains_key(remote_id) {
            return Ok(());
        }
        let local_id = self
            .local_id
            .clone()
            .ok_or_else(|| Error::Signaling("no connection id assigned yet".to_string()))?;

        let factory = Arc::clone(&self.factory);
        let session = NegotiationSession::new(
            local_id,
            remote_id,
            role,
            Box::new(move || factory()),
            self.outgoing.clone(),
        );
        self.sessions.insert(remote_id.to_string(), session);
        Ok(())
    }

    /// Run one operation on a session, reporting failures and
    /// establishment transitions as events
    async fn drive(&mut self, remote_id: &str, op: SessionOp) {
        let session = match self.sessions.get_mut(remote_id) {
            Some(session) => session,
            None => return,
        };
        let was_established = session.is_established();

        let result = match op {
            SessionOp::Start => session.start().await,
            SessionOp::Offer(sdp) => session.handle_offer(sdp).await,
            SessionOp::Answer(sdp) => session.handle_answer(sdp).await,
            SessionOp::Candidate(candidate) => session.handle_candidate(candidate).await,
        };
        let now_established = session.is_established();

        if let Err(e) = result {
            warn!("Negotiation with {} failed: {}", remote_id, e);
            self.emit(RoomEvent::NegotiationFailed {
                remote_id: remote_id.to_string(),
                reason: e.to_string(),
            });
        } else if now_established && !was_established {
            self.emit(RoomEvent::SessionEstablished(remote_id.to_string()));
        }
    }

    fn emit_roster(&self) {
        self.emit(RoomEvent::RosterChanged(self.roster()));
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.events.send(event);
    }

    fn send(&self, msg: ClientMessage) -> Result<()> {
        self.outgoing
            .send(msg)
            .map_err(|_| Error::ConnectionClosed("signaling channel gone".to_string()))
    }
}
