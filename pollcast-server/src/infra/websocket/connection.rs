use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pollcast_core::broadcast::SubscriberId;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::messages::ServerMessage;

/// One WebSocket subscriber. Outbound frames go through a bounded queue
/// drained by the socket's writer task.
pub struct Connection {
    pub id: SubscriberId,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<ServerMessage>,
    last_seen: RwLock<DateTime<Utc>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("last_seen", &*self.last_seen.read())
            .field("channel_closed", &self.sender.is_closed())
            .field("queue_capacity", &self.sender.capacity())
            .finish()
    }
}

impl Connection {
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            connected_at: now,
            sender,
            last_seen: RwLock::new(now),
        }
    }

    /// Queue a direct reply, waiting for room in the queue.
    pub async fn send_message(&self, message: ServerMessage) -> anyhow::Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send message: channel closed"))
    }

    /// Queue a broadcast frame without waiting.
    pub fn try_send(&self, message: ServerMessage) -> Result<(), TrySendError<ServerMessage>> {
        self.sender.try_send(message)
    }

    /// Record inbound activity.
    pub fn touch(&self) {
        *self.last_seen.write() = Utc::now();
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read()
    }
}
