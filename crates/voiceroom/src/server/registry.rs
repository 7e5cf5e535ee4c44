//! In-memory room and presence registry
//!
//! Synchronous single-writer type: the server owns one instance behind a
//! mutex and every handler event runs a mutation to completion before the
//! next is processed, so no operation ever observes a half-updated room.

use crate::signaling::Participant;
use std::collections::HashMap;
use tracing::debug;

/// Result of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Roster snapshot taken after the join, joiner included exactly once
    pub roster: Vec<Participant>,

    /// Room the connection was implicitly removed from, if it was
    /// somewhere else before this join
    pub previous_room: Option<String>,
}

/// Registry of rooms and their participants
///
/// A connection belongs to at most one room at a time; rooms exist only
/// while they have at least one participant.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room id to participant map
    rooms: HashMap<String, HashMap<String, Participant>>,

    /// Reverse index: connection id to room id
    membership: HashMap<String, String>,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room if absent
    ///
    /// If the connection already belongs to a room (the same one
    /// included), it is removed from that room first, so the one-room
    /// invariant holds across rejoins.
    pub fn join(&mut self, room_id: &str, participant_id: &str, name: &str) -> JoinOutcome {
        let previous_room = self.leave(participant_id);

        let room = self.rooms.entry(room_id.to_string()).or_default();
        room.insert(
            participant_id.to_string(),
            Participant {
                id: participant_id.to_string(),
                name: name.to_string(),
                is_muted: false,
            },
        );
        self.membership
            .insert(participant_id.to_string(), room_id.to_string());

        debug!("{} joined room {} ({} members)", participant_id, room_id, room.len());

        JoinOutcome {
            roster: room.values().cloned().collect(),
            previous_room: previous_room.filter(|prev| prev != room_id),
        }
    }

    /// Remove a connection from its room, if it is in one
    ///
    /// Deletes the room once its last participant is gone. Returns the
    /// room the connection was removed from. No-op when the connection is
    /// not in any room: disconnects may race with explicit leaves.
    pub fn leave(&mut self, participant_id: &str) -> Option<String> {
        let room_id = self.membership.remove(participant_id)?;

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.remove(participant_id);
            if room.is_empty() {
                self.rooms.remove(&room_id);
                debug!("Room {} is empty, deleted", room_id);
            }
        }

        debug!("{} left room {}", participant_id, room_id);
        Some(room_id)
    }

    /// Update a participant's mute flag
    ///
    /// Returns the participant's room when the flag was updated; no-op if
    /// the connection is not in any room.
    pub fn set_muted(&mut self, participant_id: &str, muted: bool) -> Option<String> {
        let room_id = self.membership.get(participant_id)?.clone();
        let participant = self.rooms.get_mut(&room_id)?.get_mut(participant_id)?;
        participant.is_muted = muted;
        Some(room_id)
    }

    /// Current roster of a room (empty if the room does not exist)
    pub fn roster(&self, room_id: &str) -> Vec<Participant> {
        self.rooms
            .get(room_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Room a connection currently belongs to
    pub fn room_of(&self, participant_id: &str) -> Option<&str> {
        self.membership.get(participant_id).map(String::as_str)
    }

    /// Whether a room currently exists
    pub fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Ids of all members of a room except the given one
    ///
    /// This is the broadcast recipient set for presence events: everyone
    /// in the affected room but the actor.
    pub fn other_members(&self, room_id: &str, except: &str) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|room| {
                room.keys()
                    .filter(|id| id.as_str() != except)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether two connections are members of the same room
    ///
    /// The relay's authorization check for forwarding negotiation
    /// payloads.
    pub fn share_room(&self, a: &str, b: &str) -> bool {
        match (self.membership.get(a), self.membership.get(b)) {
            (Some(room_a), Some(room_b)) => room_a == room_b,
            _ => false,
        }
    }
}
