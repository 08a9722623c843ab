//! # Pollcast Core
//!
//! Core library for the Pollcast live polling service: the poll catalog
//! model, the idempotent vote ledger, tally aggregation and the membership
//! gate that admits real-time subscribers into a poll's broadcast room.
//!
//! ## Overview
//!
//! - **Poll Catalog**: polls are created once, atomically with their options,
//!   and never edited afterwards.
//! - **Vote Ledger**: at most one vote per `(poll, voter token)`; the storage
//!   layer's uniqueness constraint is the only concurrency control.
//! - **Tally Aggregator**: per-option counts recomputed from the ledger on
//!   demand, zero-vote options included.
//! - **Session Membership**: subscribers join a poll's room only once the
//!   catalog confirms the poll exists.
//!
//! ## Feature Flags
//!
//! - `database` (default): PostgreSQL storage via SQLx and the embedded
//!   [`MIGRATOR`].
//!
//! ## Architecture
//!
//! - [`domain`]: polls, options, voter tokens, vote outcomes and tallies
//! - [`database`]: storage ports plus PostgreSQL and in-memory adapters
//! - [`broadcast`]: ports implemented by the real-time broadcast hub
//! - [`application`]: the services tying storage and broadcast together
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pollcast_core::{
//!     application::{PollServices, unit_of_work::PollUnitOfWork},
//!     broadcast::NoopRoomRegistry,
//!     database::InMemoryPollStore,
//!     domain::NewPoll,
//! };
//!
//! async fn lunch_poll() -> pollcast_core::Result<()> {
//!     let store = Arc::new(InMemoryPollStore::new());
//!     let services = PollServices::new(
//!         PollUnitOfWork::in_memory(store),
//!         Arc::new(NoopRoomRegistry),
//!     );
//!
//!     let poll = services
//!         .catalog
//!         .create_poll(NewPoll::new("Lunch", ["A", "B"]))
//!         .await?;
//!     let token = services.catalog.issue_voter_token();
//!     services
//!         .ledger
//!         .record_vote(&poll.id, "A", Some(token.as_str()))
//!         .await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Application services: vote ledger, tally aggregator, membership gate
pub mod application;

/// Ports implemented by the real-time broadcast hub
pub mod broadcast;

/// Storage ports and adapters
pub mod database;

/// Poll, option, vote and tally types
pub mod domain;

/// Error types shared across the crate
pub mod error;

pub use error::{ErrorKind, PollError, Result};

/// Embedded schema migrations for the PostgreSQL backend.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
