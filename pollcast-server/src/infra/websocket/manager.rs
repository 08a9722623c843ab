use dashmap::DashMap;
use pollcast_core::{
    broadcast::{RoomRegistry, SubscriberId, TallyUpdate},
    domain::PollId,
};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::{connection::Connection, messages::ServerMessage};

/// Session broadcast hub: live connections plus the per-poll room roster.
///
/// Rooms live only as long as the process. `publish` holds the room's map
/// entry exclusively while it queues frames, so two publishes for the same
/// poll reach every member in call order; queueing never waits on a socket.
pub struct ConnectionManager {
    /// Active WebSocket connections mapped by connection ID
    connections: DashMap<SubscriberId, Arc<Connection>>,
    /// Poll rooms - maps poll id to member connection IDs
    rooms: DashMap<PollId, Vec<SubscriberId>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connection_count", &self.connections.len())
            .field("room_count", &self.rooms.len())
            .finish()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register a new connection
    pub fn add_connection(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id, connection);
    }

    /// Remove a connection and clean up room membership
    pub fn remove_connection(&self, conn_id: SubscriberId) {
        self.connections.remove(&conn_id);
        self.leave_all_rooms(conn_id);
    }

    pub fn get_connection(&self, conn_id: &SubscriberId) -> Option<Arc<Connection>> {
        self.connections.get(conn_id).map(|c| Arc::clone(c.value()))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Member ids of a poll's room, in join order.
    pub fn room_members(&self, poll_id: &PollId) -> Vec<SubscriberId> {
        self.rooms
            .get(poll_id)
            .map(|room| room.value().clone())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn leave_all_rooms(&self, conn_id: SubscriberId) {
        for mut room in self.rooms.iter_mut() {
            room.value_mut().retain(|id| *id != conn_id);
        }

        // Clean up empty rooms
        self.rooms.retain(|_, members| !members.is_empty());
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry for ConnectionManager {
    fn admit_to_room(&self, poll_id: &PollId, subscriber: SubscriberId) -> bool {
        let mut room = self.rooms.entry(poll_id.clone()).or_default();
        if room.contains(&subscriber) {
            return false;
        }
        room.push(subscriber);
        true
    }

    fn remove_from_room(&self, subscriber: SubscriberId) {
        self.leave_all_rooms(subscriber);
    }

    fn publish(&self, update: &TallyUpdate) -> usize {
        let Some(room) = self.rooms.get_mut(&update.poll_id) else {
            return 0;
        };

        let message = ServerMessage::SessionUpdated {
            session_id: update.poll_id.to_string(),
            votes: update.tally.clone(),
        };

        let mut delivered = 0;
        for conn_id in room.iter() {
            let Some(connection) = self.get_connection(conn_id) else {
                continue;
            };

            match connection.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        poll_id = %update.poll_id,
                        conn_id = %conn_id,
                        "subscriber queue full; dropping tally update"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(conn_id = %conn_id, "subscriber gone before tally update");
                }
            }
        }

        delivered
    }
}
