//! Room registry for the negotiation chat.
//!
//! Maintains the in-memory membership of per-product chat rooms, the
//! [`Participant`] records attached to connections, and the bookkeeping
//! that keeps deal finalization single-shot: a per-room `finalized` flag
//! plus the [`AbortHandle`]s of scheduled (not yet fired) supplier
//! replies.
//!
//! Rooms are created implicitly on first join and removed when their
//! membership count reaches zero; removal aborts any replies still
//! pending for the room. All state is ephemeral — nothing survives a
//! server restart.

use std::collections::HashMap;

use axum::extract::ws::Message;
use mandi_proto::codec;
use mandi_proto::event::{Role, ServerEvent};
use tokio::sync::{RwLock, mpsc};
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Unique identifier for one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new time-ordered connection identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant record, created on join and removed on disconnect.
///
/// Authoritative for a connection's role and contact: once a join has been
/// recorded, message payloads cannot claim a different identity.
#[derive(Debug, Clone)]
pub struct Participant {
    /// The connection this participant is attached to.
    pub connection_id: ConnectionId,
    /// Negotiating role declared at join time.
    pub role: Role,
    /// Mobile number, revealed to the counterparty on deal finalization.
    pub mobile: String,
}

/// One per-product chat room.
struct Room {
    /// Member connections and the sender half of their outbound channels.
    members: HashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    /// Set once a deal has been finalized; no further replies are
    /// scheduled or fired for this room afterwards.
    finalized: bool,
    /// Scheduled supplier replies that have not fired yet.
    pending: HashMap<Uuid, AbortHandle>,
}

impl Room {
    fn new() -> Self {
        Self {
            members: HashMap::new(),
            finalized: false,
            pending: HashMap::new(),
        }
    }

    fn abort_pending(&mut self) {
        for handle in self.pending.values() {
            handle.abort();
        }
        self.pending.clear();
    }
}

/// In-memory directory of rooms and participants.
///
/// Thread-safe via [`RwLock`]; the registry owns the room lifecycle so the
/// session handlers and scheduled reply tasks never share mutable state
/// directly.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Room>>,
    participants: RwLock<HashMap<ConnectionId, Participant>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            participants: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a connection to a room, creating the room on first join, and
    /// records the participant. Returns the room's member count.
    pub async fn join(
        &self,
        room_id: &str,
        participant: Participant,
        sender: mpsc::UnboundedSender<Message>,
    ) -> usize {
        let connection_id = participant.connection_id;
        {
            let mut participants = self.participants.write().await;
            participants.insert(connection_id, participant);
        }
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(room_id.to_string())
            .or_insert_with(Room::new);
        room.members.insert(connection_id, sender);
        room.members.len()
    }

    /// Removes a connection from every room and drops its participant
    /// record. Rooms whose membership reaches zero are removed and their
    /// pending replies aborted.
    pub async fn leave(&self, connection_id: ConnectionId) {
        {
            let mut participants = self.participants.write().await;
            participants.remove(&connection_id);
        }
        let mut rooms = self.rooms.write().await;
        rooms.retain(|room_id, room| {
            room.members.remove(&connection_id);
            if room.members.is_empty() {
                tracing::debug!(room_id = %room_id, "room empty, dropping");
                room.abort_pending();
                false
            } else {
                true
            }
        });
    }

    /// Returns a copy of the participant record for a connection.
    pub async fn participant(&self, connection_id: ConnectionId) -> Option<Participant> {
        let participants = self.participants.read().await;
        participants.get(&connection_id).cloned()
    }

    /// Returns the member count of a room (0 if the room does not exist).
    pub async fn member_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map_or(0, |r| r.members.len())
    }

    /// Broadcasts an event to every member of a room, sender included.
    ///
    /// Broadcasting to an unknown or empty room is a no-op. Returns the
    /// number of members the event was handed to.
    pub async fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        let text = match codec::encode_server(event) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(room_id = %room_id, error = %e, "failed to encode broadcast");
                return 0;
            }
        };
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(room_id) else {
            return 0;
        };
        let mut delivered = 0;
        for sender in room.members.values() {
            if sender.send(Message::Text(text.clone().into())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Returns whether a room has already finalized a deal.
    pub async fn is_finalized(&self, room_id: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).is_some_and(|r| r.finalized)
    }

    /// Registers a scheduled reply's abort handle against a room.
    ///
    /// Returns `false` if the room no longer exists or has already
    /// finalized a deal — the caller must abort the task itself.
    pub async fn register_reply(
        &self,
        room_id: &str,
        task_id: Uuid,
        handle: AbortHandle,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) if !room.finalized => {
                room.pending.insert(task_id, handle);
                true
            }
            _ => false,
        }
    }

    /// Removes a fired reply's handle from a room's pending set.
    pub async fn complete_reply(&self, room_id: &str, task_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(room_id) {
            room.pending.remove(&task_id);
        }
    }

    /// Marks a room finalized, aborting every other pending reply.
    ///
    /// Returns `true` only for the first caller per room lifetime; the
    /// calling task's own handle (identified by `task_id`) is removed
    /// without being aborted.
    pub async fn finalize(&self, room_id: &str, task_id: Uuid) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };
        if room.finalized {
            return false;
        }
        room.finalized = true;
        room.pending.remove(&task_id);
        room.abort_pending();
        true
    }

    /// Number of pending scheduled replies for a room.
    #[cfg(test)]
    pub async fn pending_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map_or(0, |r| r.pending.len())
    }
}
