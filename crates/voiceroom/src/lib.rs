//! Room-based audio conferencing signaling
//!
//! Connects clients that want to exchange media into named rooms and
//! carries the offer/answer negotiation between them. The server is a
//! presence registry plus a relay; all negotiation state lives in the
//! clients.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   WebSocket   ┌──────────────────────────┐
//! │  RoomSession │◄─────────────►│     SignalingServer      │
//! │  controller  │               │  RoomRegistry + relay    │
//! └──────┬───────┘               └────────────▲─────────────┘
//!        │ one per remote peer                │ WebSocket
//! ┌──────▼──────────────┐          ┌──────────┴───────┐
//! │ NegotiationSession  │          │   RoomSession    │
//! │ offer/answer + ICE  │          │  (other client)  │
//! └──────┬──────────────┘          └──────────────────┘
//!        │
//! ┌──────▼──────────────┐
//! │   PeerConnector     │  media engine seam
//! └─────────────────────┘
//! ```
//!
//! The joiner always initiates: a client entering a room sends an offer
//! to every participant already present, and participants never offer
//! toward a newcomer. Simultaneous offers are resolved by comparing
//! connection ids.

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod signaling;

pub use client::{NegotiationSession, NegotiationState, PeerConnector, Role, RoomEvent, RoomSession};
pub use config::{ClientConfig, ServerConfig};
pub use error::{Error, Result};
pub use server::{RoomRegistry, SignalingServer};
pub use signaling::{CandidateInit, ClientMessage, Participant, ServerMessage, SignalingClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
