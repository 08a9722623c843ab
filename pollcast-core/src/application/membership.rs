use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::unit_of_work::PollUnitOfWork;
use crate::{
    broadcast::{RoomRegistry, SubscriberId},
    domain::PollId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
}

/// The only failures a real-time subscriber ever observes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Server error")]
    Storage(String),
}

/// Gates entry into a poll's broadcast room.
#[derive(Clone)]
pub struct SessionMembership {
    uow: PollUnitOfWork,
    rooms: Arc<dyn RoomRegistry>,
}

impl std::fmt::Debug for SessionMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMembership")
            .field("uow", &self.uow)
            .finish_non_exhaustive()
    }
}

impl SessionMembership {
    pub fn new(uow: PollUnitOfWork, rooms: Arc<dyn RoomRegistry>) -> Self {
        Self { uow, rooms }
    }

    /// Admit `subscriber` to the poll's room once the catalog confirms the
    /// poll exists. On any error the subscriber is left out of every room it
    /// was not already in.
    pub async fn admit(
        &self,
        poll_id: &PollId,
        subscriber: SubscriberId,
    ) -> Result<Admission, AdmissionError> {
        match self.uow.polls.get_poll(poll_id).await {
            Ok(Some(_)) => {
                let added = self.rooms.admit_to_room(poll_id, subscriber);
                debug!(poll_id = %poll_id, %subscriber, added, "subscriber admitted");
                Ok(Admission::Admitted)
            }
            Ok(None) => {
                debug!(poll_id = %poll_id, %subscriber, "join refused: unknown poll");
                Err(AdmissionError::SessionNotFound)
            }
            Err(err) => {
                warn!(poll_id = %poll_id, %subscriber, error = %err, "join failed");
                Err(AdmissionError::Storage(err.to_string()))
            }
        }
    }

    /// Forget the subscriber everywhere; used when its connection ends.
    pub fn release(&self, subscriber: SubscriberId) {
        self.rooms.remove_from_room(subscriber);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        broadcast::MockRoomRegistry,
        database::{InMemoryPollStore, ports::polls::MockPollsRepository},
        domain::{NewPoll, Poll},
        error::PollError,
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn existing_poll_admits_subscriber() {
        let store = Arc::new(InMemoryPollStore::new());
        let uow = PollUnitOfWork::in_memory(store);
        let poll = Poll::create(NewPoll::new("Lunch", ["A", "B"])).unwrap();
        uow.polls.create_poll(&poll).await.unwrap();

        let subscriber = Uuid::now_v7();
        let expected_poll = poll.id.clone();
        let mut rooms = MockRoomRegistry::new();
        rooms
            .expect_admit_to_room()
            .withf(move |poll_id, id| *poll_id == expected_poll && *id == subscriber)
            .times(1)
            .return_const(true);

        let membership = SessionMembership::new(uow, Arc::new(rooms));
        assert_eq!(
            membership.admit(&poll.id, subscriber).await,
            Ok(Admission::Admitted)
        );
    }

    #[tokio::test]
    async fn unknown_poll_is_not_admitted() {
        let uow = PollUnitOfWork::in_memory(Arc::new(InMemoryPollStore::new()));
        let mut rooms = MockRoomRegistry::new();
        rooms.expect_admit_to_room().never();

        let membership = SessionMembership::new(uow, Arc::new(rooms));
        let result = membership
            .admit(&PollId::parse("nope").unwrap(), Uuid::now_v7())
            .await;
        assert_eq!(result, Err(AdmissionError::SessionNotFound));
    }

    #[tokio::test]
    async fn lookup_failure_is_storage_error() {
        let mut polls = MockPollsRepository::new();
        polls
            .expect_get_poll()
            .returning(|_| Err(PollError::Storage("pool timed out".into())));
        let store = Arc::new(InMemoryPollStore::new());
        let uow = PollUnitOfWork::new(Arc::new(polls), store);

        let mut rooms = MockRoomRegistry::new();
        rooms.expect_admit_to_room().never();

        let membership = SessionMembership::new(uow, Arc::new(rooms));
        let err = membership
            .admit(&PollId::generate(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::Storage(_)));
        assert_eq!(err.to_string(), "Server error");
    }

    #[tokio::test]
    async fn release_clears_every_room() {
        let subscriber = Uuid::now_v7();
        let mut rooms = MockRoomRegistry::new();
        rooms
            .expect_remove_from_room()
            .withf(move |id| *id == subscriber)
            .times(1)
            .return_const(());

        let uow = PollUnitOfWork::in_memory(Arc::new(InMemoryPollStore::new()));
        SessionMembership::new(uow, Arc::new(rooms)).release(subscriber);
    }
}
