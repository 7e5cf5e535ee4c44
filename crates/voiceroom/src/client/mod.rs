//! Client-side negotiation
//!
//! Layered bottom-up: [`connector`] is the media seam, [`negotiation`]
//! runs the offer/answer exchange with one peer, and [`controller`]
//! maps room membership onto a set of negotiation sessions.

pub mod connector;
pub mod controller;
pub mod negotiation;

pub use connector::{LocalPeerConnection, PeerConnector, SdpKind};
pub use controller::{RoomEvent, RoomSession, SharedConnectorFactory};
pub use negotiation::{NegotiationSession, NegotiationState, Role};
