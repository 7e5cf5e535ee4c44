//! Wire protocol for room signaling
//!
//! Frames are JSON objects of the form `{"event": "...", "data": ...}`.
//! Session descriptions and connectivity candidates are opaque at this
//! layer: the relay forwards them unmodified and never inspects them.

use serde::{Deserialize, Serialize};

/// A room participant as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Connection identifier assigned by the server
    pub id: String,

    /// Display name chosen at join time
    pub name: String,

    /// Whether the participant has muted their microphone
    pub is_muted: bool,
}

/// Opaque connectivity candidate payload
///
/// Mirrors the browser's candidate init shape; none of the fields are
/// interpreted by the relay or the negotiation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    /// Candidate string
    pub candidate: String,

    /// SDP media stream identification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    /// SDP media line index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// Messages sent from a client to the signaling server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Join a room, leaving the current one first if any
    JoinRoom {
        /// Room identifier (created on first join)
        room_id: String,
        /// Display name for the roster
        user_name: String,
    },

    /// Update the local mute flag
    ToggleMute(bool),

    /// Session-description offer for a specific room member
    Offer {
        /// Target participant id
        target: String,
        /// Opaque session description
        sdp: String,
    },

    /// Session-description answer for a specific room member
    Answer {
        /// Target participant id
        target: String,
        /// Opaque session description
        sdp: String,
    },

    /// Connectivity candidate for a specific room member
    IceCandidate {
        /// Target participant id
        target: String,
        /// Opaque candidate payload
        candidate: CandidateInit,
    },

    /// Leave the current room
    LeaveRoom,
}

/// Messages sent from the signaling server to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// First frame after the WebSocket upgrade: the connection's id
    Welcome {
        /// Connection identifier for this client
        id: String,
    },

    /// Direct reply to a successful join
    JoinedRoom {
        /// Room that was joined
        room_id: String,
        /// Roster snapshot including the joiner exactly once
        participants: Vec<Participant>,
    },

    /// Roster refresh sent alongside the join reply
    RoomParticipants(Vec<Participant>),

    /// Broadcast to existing members when someone joins
    UserJoined(Participant),

    /// Broadcast when a member leaves or disconnects
    UserLeft(String),

    /// Broadcast when a member toggles their microphone
    UserMuted {
        /// Participant whose flag changed
        id: String,
        /// New mute state
        is_muted: bool,
    },

    /// Relayed session-description offer
    Offer {
        /// Originating participant id (added by the relay)
        sender: String,
        /// Opaque session description
        sdp: String,
    },

    /// Relayed session-description answer
    Answer {
        /// Originating participant id (added by the relay)
        sender: String,
        /// Opaque session description
        sdp: String,
    },

    /// Relayed connectivity candidate
    IceCandidate {
        /// Originating participant id (added by the relay)
        sender: String,
        /// Opaque candidate payload
        candidate: CandidateInit,
    },
}

impl ClientMessage {
    /// Convert message to JSON string
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::Error::Serialization(format!("Failed to serialize frame: {}", e)))
    }

    /// Parse message from JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::Serialization(format!("Failed to deserialize frame: {}", e)))
    }
}

impl ServerMessage {
    /// Convert message to JSON string
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::Error::Serialization(format!("Failed to serialize frame: {}", e)))
    }

    /// Parse message from JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::Serialization(format!("Failed to deserialize frame: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidateInit {
        CandidateInit {
            candidate: "candidate:1 1 UDP 2122252543 192.0.2.1 54321 typ host".to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        }
    }

    #[test]
    fn test_join_room_wire_shape() {
        let msg = ClientMessage::JoinRoom {
            room_id: "R1".to_string(),
            user_name: "alice".to_string(),
        };

        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "join-room");
        assert_eq!(value["data"]["roomId"], "R1");
        assert_eq!(value["data"]["userName"], "alice");
    }

    #[test]
    fn test_leave_room_has_no_payload() {
        let msg = ClientMessage::LeaveRoom;
        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "leave-room");
        assert!(value.get("data").is_none());

        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, ClientMessage::LeaveRoom);
    }

    #[test]
    fn test_toggle_mute_bare_bool_payload() {
        let msg = ClientMessage::ToggleMute(true);
        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "toggle-mute");
        assert_eq!(value["data"], true);
    }

    #[test]
    fn test_participant_wire_shape() {
        let p = Participant {
            id: "conn-1".to_string(),
            name: "bob".to_string(),
            is_muted: false,
        };
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["id"], "conn-1");
        assert_eq!(value["name"], "bob");
        assert_eq!(value["isMuted"], false);
    }

    #[test]
    fn test_user_left_bare_id_payload() {
        let msg = ServerMessage::UserLeft("conn-2".to_string());
        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "user-left");
        assert_eq!(value["data"], "conn-2");
    }

    #[test]
    fn test_user_muted_wire_shape() {
        let msg = ServerMessage::UserMuted {
            id: "conn-3".to_string(),
            is_muted: true,
        };
        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "user-muted");
        assert_eq!(value["data"]["isMuted"], true);
    }

    #[test]
    fn test_offer_round_trip() {
        let msg = ClientMessage::Offer {
            target: "conn-9".to_string(),
            sdp: "v=0\r\no=- ...".to_string(),
        };
        let parsed = ClientMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn test_relayed_candidate_round_trip() {
        let msg = ServerMessage::IceCandidate {
            sender: "conn-4".to_string(),
            candidate: candidate(),
        };
        let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn test_candidate_optional_fields_omitted() {
        let c = CandidateInit {
            candidate: "candidate:...".to_string(),
            sdp_mid: None,
            sdp_m_line_index: None,
        };
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("sdpMid"));
        assert!(!json.contains("sdpMLineIndex"));
    }

    #[test]
    fn test_invalid_frame_is_serialization_error() {
        let err = ServerMessage::from_json("{\"event\":\"no-such-event\"}").unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }
}
