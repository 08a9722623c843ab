//! Requires a reachable PostgreSQL instance via `DATABASE_URL`:
//! `cargo test -p pollcast-core --test postgres_ledger -- --ignored`

use anyhow::Result;
use futures::future::join_all;
use pollcast_core::{
    PollError,
    application::{PollServices, unit_of_work::PollUnitOfWork},
    broadcast::NoopRoomRegistry,
    database::PostgresDatabase,
    domain::{NewPoll, PollId, Tally},
};
use sqlx::PgPool;
use std::sync::Arc;

fn services(pool: PgPool) -> PollServices {
    let db = PostgresDatabase::from_pool(pool);
    PollServices::new(PollUnitOfWork::from_postgres(&db), Arc::new(NoopRoomRegistry))
}

#[sqlx::test(migrator = "pollcast_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn poll_round_trips_with_ordered_options(pool: PgPool) -> Result<()> {
    let services = services(pool);
    let created = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["Tacos", "Pho", "Salad"]))
        .await?;

    let stored = services.catalog.get_poll(&created.id).await?;
    assert_eq!(stored.title, "Lunch");
    let labels: Vec<_> = stored.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["Tacos", "Pho", "Salad"]);

    assert_eq!(
        services.tally.compute_tally(&created.id).await?,
        Tally::from_pairs([("Tacos", 0), ("Pho", 0), ("Salad", 0)])
    );
    Ok(())
}

#[sqlx::test(migrator = "pollcast_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn unique_constraint_rejects_second_vote(pool: PgPool) -> Result<()> {
    let services = services(pool);
    let poll = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["A", "B"]))
        .await?;

    services.ledger.record_vote(&poll.id, "A", Some("T1")).await?;
    let err = services
        .ledger
        .record_vote(&poll.id, "B", Some("T1"))
        .await
        .unwrap_err();
    assert_eq!(err, PollError::DuplicateVote);

    assert_eq!(
        services.tally.compute_tally(&poll.id).await?,
        Tally::from_pairs([("A", 1), ("B", 0)])
    );
    Ok(())
}

#[sqlx::test(migrator = "pollcast_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_duplicates_commit_once(pool: PgPool) -> Result<()> {
    let services = services(pool);
    let poll = services
        .catalog
        .create_poll(NewPoll::new("Lunch", ["A", "B"]))
        .await?;

    let attempts = (0..8).map(|_| services.ledger.record_vote(&poll.id, "A", Some("racer")));
    let results = join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(PollError::DuplicateVote)))
    );
    assert_eq!(services.tally.compute_tally(&poll.id).await?.total(), 1);
    Ok(())
}

#[sqlx::test(migrator = "pollcast_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn missing_poll_reads_as_absent(pool: PgPool) -> Result<()> {
    let services = services(pool);
    let missing = PollId::parse("nothing-here").unwrap();
    assert!(matches!(
        services.catalog.get_poll(&missing).await,
        Err(PollError::NotFound(_))
    ));
    services.catalog.ping().await?;
    Ok(())
}
