//! Ports between the core services and the real-time broadcast hub.
//!
//! The hub owns the per-poll room roster; the core only admits subscribers
//! (after the catalog confirms the poll) and hands it fresh tallies to fan
//! out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{PollId, Tally};

/// Handle identifying one real-time subscriber (one connection).
pub type SubscriberId = Uuid;

/// Tally snapshot addressed to a poll's room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyUpdate {
    pub poll_id: PollId,
    pub tally: Tally,
}

/// Room roster plus best-effort fan-out.
///
/// Implementations must tolerate concurrent admit/remove/publish; a
/// subscriber removed mid-publish simply misses that update. Successive
/// `publish` calls for one poll reach each subscriber in call order.
#[cfg_attr(test, mockall::automock)]
pub trait RoomRegistry: Send + Sync {
    /// Add `subscriber` to the poll's room. Returns `false` when it was
    /// already a member.
    fn admit_to_room(&self, poll_id: &PollId, subscriber: SubscriberId) -> bool;

    /// Drop `subscriber` from every room it belongs to.
    fn remove_from_room(&self, subscriber: SubscriberId);

    /// Queue `update` for every current member of the poll's room without
    /// waiting on any of them. Returns how many subscribers accepted it.
    fn publish(&self, update: &TallyUpdate) -> usize;
}

/// Registry with no rooms, for callers that never broadcast.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRoomRegistry;

impl RoomRegistry for NoopRoomRegistry {
    fn admit_to_room(&self, _poll_id: &PollId, _subscriber: SubscriberId) -> bool {
        true
    }

    fn remove_from_room(&self, _subscriber: SubscriberId) {}

    fn publish(&self, _update: &TallyUpdate) -> usize {
        0
    }
}
