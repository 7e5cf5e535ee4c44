//! Per-peer negotiation state machine
//!
//! One session per remote participant. The session decides how each
//! signaling payload advances the exchange, buffers candidates that
//! arrive early, and resolves simultaneous offers deterministically.
//!
//! Two failure classes are kept apart on purpose: protocol-ordering
//! anomalies (a stale answer, a duplicate offer) are logged and
//! discarded without touching the session, while local connector
//! failures tear the attempt down and return the session to `Idle` so
//! it can be retried.

use crate::client::connector::{PeerConnector, SdpKind};
use crate::signaling::{CandidateInit, ClientMessage};
use crate::{Error, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where a session currently stands in the offer/answer exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// No exchange in progress
    Idle,
    /// Local offer creation in progress
    LocalOfferPending,
    /// Local offer sent, waiting for the answer
    LocalOfferSent,
    /// Remote offer applied, answer creation in progress
    RemoteOfferReceived,
    /// Offer/answer exchange complete
    Stable,
    /// Torn down; terminal
    Closed,
}

/// Which side of the exchange this session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Builds a fresh connector when a session needs to restart its attempt
pub type ConnectorFactory = Box<dyn Fn() -> Box<dyn PeerConnector> + Send>;

/// Negotiation session with one remote participant
pub struct NegotiationSession {
    local_id: String,
    remote_id: String,
    role: Role,
    state: NegotiationState,
    connector: Box<dyn PeerConnector>,
    factory: ConnectorFactory,

    /// Candidates received before the remote description was applied
    pending_remote_candidates: Vec<CandidateInit>,
    remote_description_set: bool,

    outgoing: mpsc::UnboundedSender<ClientMessage>,
}

impl NegotiationSession {
    pub fn new(
        local_id: impl Into<String>,
        remote_id: impl Into<String>,
        role: Role,
        factory: ConnectorFactory,
        outgoing: mpsc::UnboundedSender<ClientMessage>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            remote_id: remote_id.into(),
            role,
            state: NegotiationState::Idle,
            connector: factory(),
            factory,
            pending_remote_candidates: Vec::new(),
            remote_description_set: false,
            outgoing,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn is_established(&self) -> bool {
        self.state == NegotiationState::Stable
    }

    /// Begin the exchange as initiator: create and send the offer
    pub async fn start(&mut self) -> Result<()> {
        if self.state != NegotiationState::Idle {
            warn!(
                "Ignoring start for {} in state {:?}",
                self.remote_id, self.state
            );
            return Ok(());
        }

        self.state = NegotiationState::LocalOfferPending;
        let sdp = match self.connector.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.reset_attempt().await;
                return Err(e);
            }
        };

        self.send(ClientMessage::Offer {
            target: self.remote_id.clone(),
            sdp,
        })?;
        self.state = NegotiationState::LocalOfferSent;
        debug!("Offer sent to {}", self.remote_id);
        Ok(())
    }

    /// Handle a remote offer
    pub async fn handle_offer(&mut self, sdp: String) -> Result<()> {
        match self.state {
            NegotiationState::Idle => self.accept_offer(sdp).await,

            NegotiationState::LocalOfferSent => {
                // Simultaneous offers: the lexicographically smaller id
                // keeps its offer, the other side switches to responding
                if self.local_id < self.remote_id {
                    info!(
                        "Offer collision with {}, keeping local offer",
                        self.remote_id
                    );
                    Ok(())
                } else {
                    info!(
                        "Offer collision with {}, yielding to remote offer",
                        self.remote_id
                    );
                    self.connector.close().await;
                    self.connector = (self.factory)();
                    self.remote_description_set = false;
                    self.role = Role::Responder;
                    self.state = NegotiationState::Idle;
                    self.accept_offer(sdp).await
                }
            }

            NegotiationState::Closed => Ok(()),

            state => {
                warn!(
                    "Discarding offer from {} in state {:?}",
                    self.remote_id, state
                );
                Ok(())
            }
        }
    }

    /// Handle a remote answer
    pub async fn handle_answer(&mut self, sdp: String) -> Result<()> {
        if self.state != NegotiationState::LocalOfferSent {
            warn!(
                "Discarding answer from {} in state {:?}",
                self.remote_id, self.state
            );
            return Ok(());
        }

        if let Err(e) = self
            .connector
            .set_remote_description(SdpKind::Answer, &sdp)
            .await
        {
            self.reset_attempt().await;
            return Err(e);
        }

        self.remote_description_set = true;
        self.state = NegotiationState::Stable;
        info!("Negotiation with {} established", self.remote_id);
        self.drain_pending_candidates().await;
        Ok(())
    }

    /// Handle a remote transport candidate
    ///
    /// Buffered until the remote description is applied; application
    /// failures skip the candidate rather than failing the session.
    pub async fn handle_candidate(&mut self, candidate: CandidateInit) -> Result<()> {
        if self.state == NegotiationState::Closed {
            return Ok(());
        }

        if !self.remote_description_set {
            debug!(
                "Buffering candidate from {} ({} pending)",
                self.remote_id,
                self.pending_remote_candidates.len() + 1
            );
            self.pending_remote_candidates.push(candidate);
            return Ok(());
        }

        if let Err(e) = self.connector.add_ice_candidate(&candidate).await {
            warn!("Skipping candidate from {}: {}", self.remote_id, e);
        }
        Ok(())
    }

    /// Tear the session down; terminal
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.connector.close().await;
        self.pending_remote_candidates.clear();
        self.state = NegotiationState::Closed;
        debug!("Session with {} closed", self.remote_id);
    }

    /// Respond to an offer: apply it, answer it, drain buffered candidates
    async fn accept_offer(&mut self, sdp: String) -> Result<()> {
        if let Err(e) = self
            .connector
            .set_remote_description(SdpKind::Offer, &sdp)
            .await
        {
            self.reset_attempt().await;
            return Err(e);
        }
        self.remote_description_set = true;
        self.state = NegotiationState::RemoteOfferReceived;

        let answer = match self.connector.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                self.reset_attempt().await;
                return Err(e);
            }
        };

        self.send(ClientMessage::Answer {
            target: self.remote_id.clone(),
            sdp: answer,
        })?;
        self.state = NegotiationState::Stable;
        info!("Negotiation with {} established", self.remote_id);
        self.drain_pending_candidates().await;
        Ok(())
    }

    async fn drain_pending_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_remote_candidates) {
            if let Err(e) = self.connector.add_ice_candidate(&candidate).await {
                warn!("Skipping buffered candidate from {}: {}", self.remote_id, e);
            }
        }
    }

    /// Local failure: discard the attempt so it can be retried
    async fn reset_attempt(&mut self) {
        self.connector.close().await;
        self.connector = (self.factory)();
        self.remote_description_set = false;
        self.state = NegotiationState::Idle;
    }

    fn send(&self, msg: ClientMessage) -> Result<()> {
        self.outgoing
            .send(msg)
            .map_err(|_| Error::ConnectionClosed("signaling channel gone".to_string()))
    }
}
