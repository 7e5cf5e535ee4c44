//! Signaling protocol and WebSocket client
//!
//! The wire protocol is shared between the relay server and clients;
//! the client here handles framing and transport only, all negotiation
//! decisions live in [`crate::client`].

pub mod client;
pub mod protocol;

pub use client::SignalingClient;
pub use protocol::{CandidateInit, ClientMessage, Participant, ServerMessage};
