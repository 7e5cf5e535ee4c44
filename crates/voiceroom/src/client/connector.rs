//! Media connector seam
//!
//! Negotiation treats session descriptions and candidates as opaque
//! payloads produced and consumed by a [`PeerConnector`]. The trait is
//! the boundary to whatever media engine sits below; the in-process
//! implementation here gives the state machine something real to drive
//! in tests and loopback setups.

use crate::signaling::CandidateInit;
use crate::{Error, Result};
use async_trait::async_trait;

/// Which half of the exchange a remote description is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Produces and consumes session descriptions for one remote peer
///
/// One connector per negotiation session; a connector is never reused
/// after `close`.
#[async_trait]
pub trait PeerConnector: Send {
    /// Create a local offer description
    async fn create_offer(&mut self) -> Result<String>;

    /// Create a local answer description
    ///
    /// Requires a remote offer to have been applied first.
    async fn create_answer(&mut self) -> Result<String>;

    /// Apply the remote peer's description
    async fn set_remote_description(&mut self, kind: SdpKind, sdp: &str) -> Result<()>;

    /// Apply a remote transport candidate
    ///
    /// Callers must only invoke this after `set_remote_description`
    /// succeeded; candidates that arrive earlier are buffered upstream.
    async fn add_ice_candidate(&mut self, candidate: &CandidateInit) -> Result<()>;

    /// Tear the connector down; all later calls fail
    async fn close(&mut self);
}

/// In-process connector holding descriptions as plain state
///
/// Enforces the same ordering rules a real media engine would (answer
/// requires a remote offer, candidates require a remote description) so
/// the negotiation layer can be exercised without one.
#[derive(Debug, Default)]
pub struct LocalPeerConnection {
    local_description: Option<String>,
    remote_description: Option<String>,
    remote_candidates: Vec<CandidateInit>,
    closed: bool,
}

impl LocalPeerConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote candidates applied so far, in arrival order
    pub fn remote_candidates(&self) -> &[CandidateInit] {
        &self.remote_candidates
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.remote_description.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed("connector is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerConnector for LocalPeerConnection {
    async fn create_offer(&mut self) -> Result<String> {
        self.ensure_open()?;
        let sdp = format!("v=0 offer {}", uuid::Uuid::new_v4());
        self.local_description = Some(sdp.clone());
        Ok(sdp)
    }

    async fn create_answer(&mut self) -> Result<String> {
        self.ensure_open()?;
        if self.remote_description.is_none() {
            return Err(Error::Negotiation(
                "cannot answer before a remote offer is applied".to_string(),
            ));
        }
        let sdp = format!("v=0 answer {}", uuid::Uuid::new_v4());
        self.local_description = Some(sdp.clone());
        Ok(sdp)
    }

    async fn set_remote_description(&mut self, _kind: SdpKind, sdp: &str) -> Result<()> {
        self.ensure_open()?;
        self.remote_description = Some(sdp.to_string());
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: &CandidateInit) -> Result<()> {
        self.ensure_open()?;
        if self.remote_description.is_none() {
            return Err(Error::Negotiation(
                "candidate applied before remote description".to_string(),
            ));
        }
        self.remote_candidates.push(candidate.clone());
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offer_then_remote_answer() {
        let mut conn = LocalPeerConnection::new();
        let offer = conn.create_offer().await.unwrap();
        assert!(offer.starts_with("v=0 offer"));

        conn.set_remote_description(SdpKind::Answer, "v=0 answer x")
            .await
            .unwrap();
        assert_eq!(conn.remote_description(), Some("v=0 answer x"));
    }

    #[tokio::test]
    async fn test_answer_requires_remote_offer() {
        let mut conn = LocalPeerConnection::new();
        assert!(conn.create_answer().await.is_err());

        conn.set_remote_description(SdpKind::Offer, "v=0 offer x")
            .await
            .unwrap();
        let answer = conn.create_answer().await.unwrap();
        assert!(answer.starts_with("v=0 answer"));
    }

    #[tokio::test]
    async fn test_candidate_requires_remote_description() {
        let mut conn = LocalPeerConnection::new();
        let candidate = CandidateInit {
            candidate: "candidate:1".to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        };

        assert!(conn.add_ice_candidate(&candidate).await.is_err());

        conn.set_remote_description(SdpKind::Offer, "v=0 offer x")
            .await
            .unwrap();
        conn.add_ice_candidate(&candidate).await.unwrap();
        assert_eq!(conn.remote_candidates().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_connector_rejects_everything() {
        let mut conn = LocalPeerConnection::new();
        conn.close().await;
        assert!(conn.is_closed());
        assert!(conn.create_offer().await.is_err());
        assert!(conn
            .set_remote_description(SdpKind::Offer, "v=0")
            .await
            .is_err());
    }
}
