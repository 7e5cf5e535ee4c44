//! Room signaling server
//!
//! Stateless with respect to negotiation: the server tracks rooms and
//! presence, annotates relayed payloads with their sender, and never
//! inspects SDP or candidate contents.

pub mod handler;
pub mod registry;
pub mod server;

pub use handler::SharedState;
pub use registry::{JoinOutcome, RoomRegistry};
pub use server::{ServerHandle, SignalingServer};
