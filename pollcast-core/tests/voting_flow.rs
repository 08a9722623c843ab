use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use futures::future::join_all;
use pollcast_core::{
    PollError,
    application::{AdmissionError, PollServices, unit_of_work::PollUnitOfWork},
    broadcast::{RoomRegistry, SubscriberId, TallyUpdate},
    database::InMemoryPollStore,
    domain::{NewPoll, PollId, Tally},
};
use uuid::Uuid;

/// Registry that remembers every call so tests can assert on fan-out.
#[derive(Debug, Default)]
struct RecordingRooms {
    members: Mutex<Vec<(PollId, SubscriberId)>>,
    published: Mutex<Vec<TallyUpdate>>,
}

impl RecordingRooms {
    fn members_of(&self, poll_id: &PollId) -> Vec<SubscriberId> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == poll_id)
            .map(|(_, subscriber)| *subscriber)
            .collect()
    }

    fn published(&self) -> Vec<TallyUpdate> {
        self.published.lock().unwrap().clone()
    }
}

impl RoomRegistry for RecordingRooms {
    fn admit_to_room(&self, poll_id: &PollId, subscriber: SubscriberId) -> bool {
        let mut members = self.members.lock().unwrap();
        let entry = (poll_id.clone(), subscriber);
        if members.contains(&entry) {
            return false;
        }
        members.push(entry);
        true
    }

    fn remove_from_room(&self, subscriber: SubscriberId) {
        self.members
            .lock()
            .unwrap()
            .retain(|(_, member)| *member != subscriber);
    }

    fn publish(&self, update: &TallyUpdate) -> usize {
        self.published.lock().unwrap().push(update.clone());
        self.members_of(&update.poll_id).len()
    }
}

fn services() -> (PollServices, Arc<InMemoryPollStore>, Arc<RecordingRooms>) {
    let store = Arc::new(InMemoryPollStore::new());
    let rooms = Arc::new(RecordingRooms::default());
    let services = PollServices::new(PollUnitOfWork::in_memory(store.clone()), rooms.clone());
    (services, store, rooms)
}

#[tokio::test]
async fn lunch_poll_end_to_end() -> Result<()> {
    let (services, _store, rooms) = services();

    let poll = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["A", "B"]))
        .await?;

    let snapshot = services.tally.snapshot(&poll.id).await?;
    assert_eq!(snapshot.title, "Lunch");
    assert_eq!(snapshot.votes, Tally::from_pairs([("A", 0), ("B", 0)]));

    let watcher = Uuid::now_v7();
    services.membership.admit(&poll.id, watcher).await?;
    assert_eq!(rooms.members_of(&poll.id), vec![watcher]);

    let t1 = services.catalog.issue_voter_token();
    let t2 = services.catalog.issue_voter_token();
    assert_ne!(t1, t2);

    services
        .ledger
        .record_vote(&poll.id, "A", Some(t1.as_str()))
        .await?;
    services
        .ledger
        .record_vote(&poll.id, "B", Some(t2.as_str()))
        .await?;

    let duplicate = services
        .ledger
        .record_vote(&poll.id, "A", Some(t1.as_str()))
        .await;
    assert_eq!(duplicate.unwrap_err(), PollError::DuplicateVote);

    let tallies: Vec<Tally> = rooms.published().into_iter().map(|u| u.tally).collect();
    assert_eq!(
        tallies,
        vec![
            Tally::from_pairs([("A", 1), ("B", 0)]),
            Tally::from_pairs([("A", 1), ("B", 1)]),
        ]
    );
    assert_eq!(
        services.tally.compute_tally(&poll.id).await?,
        Tally::from_pairs([("A", 1), ("B", 1)])
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_with_one_token_commit_once() -> Result<()> {
    let (services, store, rooms) = services();
    let poll = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["A", "B"]))
        .await?;

    let attempts = (0..16).map(|i| {
        let services = services.clone();
        let poll_id = poll.id.clone();
        tokio::spawn(async move {
            let label = if i % 2 == 0 { "A" } else { "B" };
            services
                .ledger
                .record_vote(&poll_id, label, Some("shared-token"))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("vote task panicked"))
        .collect();

    let committed = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(PollError::DuplicateVote)))
        .count();
    assert_eq!(committed, 1);
    assert_eq!(duplicates, 15);

    assert_eq!(store.vote_count(&poll.id), 1);
    assert_eq!(services.tally.compute_tally(&poll.id).await?.total(), 1);
    assert_eq!(rooms.published().len(), 1);
    Ok(())
}

#[tokio::test]
async fn tally_sum_matches_committed_votes() -> Result<()> {
    let (services, store, _rooms) = services();
    let poll = services
        .catalog
        .create_poll(NewPoll::new("Colour", ["Red", "Green", "Blue"]))
        .await?;

    let labels = ["Red", "Blue", "Blue", "Green", "Blue"];
    for label in labels {
        let token = services.catalog.issue_voter_token();
        services
            .ledger
            .record_vote(&poll.id, label, Some(token.as_str()))
            .await?;
    }

    let rejected = [
        services.ledger.record_vote(&poll.id, "Purple", Some("x")).await,
        services.ledger.record_vote(&poll.id, "Red", None).await,
        services.ledger.record_vote(&poll.id, "red", Some("y")).await,
    ];
    assert!(rejected.iter().all(|r| r.is_err()));

    let tally = services.tally.compute_tally(&poll.id).await?;
    assert_eq!(tally, Tally::from_pairs([("Red", 1), ("Green", 1), ("Blue", 3)]));
    assert_eq!(tally.total() as usize, store.vote_count(&poll.id));
    Ok(())
}

#[tokio::test]
async fn votes_are_scoped_to_their_poll() -> Result<()> {
    let (services, _store, _rooms) = services();
    let lunch = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["A", "B"]))
        .await?;
    let dinner = services
        .catalog
        .create_poll(NewPoll::new("Dinner", ["A", "B"]))
        .await?;

    services.ledger.record_vote(&lunch.id, "A", Some("T1")).await?;
    services.ledger.record_vote(&dinner.id, "B", Some("T1")).await?;

    assert_eq!(
        services.tally.compute_tally(&lunch.id).await?,
        Tally::from_pairs([("A", 1), ("B", 0)])
    );
    assert_eq!(
        services.tally.compute_tally(&dinner.id).await?,
        Tally::from_pairs([("A", 0), ("B", 1)])
    );
    Ok(())
}

#[tokio::test]
async fn unknown_poll_is_not_found_everywhere() {
    let (services, _store, rooms) = services();
    let missing = PollId::parse("no-such-poll").unwrap();

    assert!(matches!(
        services.catalog.get_poll(&missing).await,
        Err(PollError::NotFound(_))
    ));
    assert!(matches!(
        services.tally.snapshot(&missing).await,
        Err(PollError::NotFound(_))
    ));

    let subscriber = Uuid::now_v7();
    assert_eq!(
        services.membership.admit(&missing, subscriber).await,
        Err(AdmissionError::SessionNotFound)
    );
    assert!(rooms.members_of(&missing).is_empty());
}

#[tokio::test]
async fn released_subscriber_leaves_every_room() -> Result<()> {
    let (services, _store, rooms) = services();
    let first = services
        .catalog
        .create_poll(NewPoll::new("First", ["A"]))
        .await?;
    let second = services
        .catalog
        .create_poll(NewPoll::new("Second", ["A"]))
        .await?;

    let subscriber = Uuid::now_v7();
    services.membership.admit(&first.id, subscriber).await?;
    services.membership.admit(&second.id, subscriber).await?;
    // Joining twice is harmless.
    services.membership.admit(&first.id, subscriber).await?;
    assert_eq!(rooms.members_of(&first.id), vec![subscriber]);

    services.membership.release(subscriber);
    assert!(rooms.members_of(&first.id).is_empty());
    assert!(rooms.members_of(&second.id).is_empty());
    Ok(())
}

#[tokio::test]
async fn created_polls_get_distinct_ids() -> Result<()> {
    let (services, _store, _rooms) = services();
    let mut ids = HashSet::new();
    for _ in 0..50 {
        let poll = services
            .catalog
            .create_poll(NewPoll::new("Same title", ["A", "B"]))
            .await?;
        assert!(ids.insert(poll.id));
    }
    Ok(())
}

#[tokio::test]
async fn invalid_polls_are_rejected_before_storage() {
    let (services, _store, _rooms) = services();

    for new_poll in [
        NewPoll::new("", ["A"]),
        NewPoll::new("No options", Vec::<String>::new()),
        NewPoll::new("Dupes", ["A", "A"]),
        NewPoll::new("Blank label", ["A", ""]),
    ] {
        let err = services.catalog.create_poll(new_poll).await.unwrap_err();
        assert!(matches!(err, PollError::InvalidRequest(_)), "{err}");
    }
}
