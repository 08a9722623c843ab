use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::{
    InMemoryPollStore,
    ports::{PollsRepository, VotesRepository},
};
#[cfg(feature = "database")]
use crate::database::postgres::PostgresDatabase;

/// Aggregates the storage ports used by the application services.
#[derive(Clone)]
pub struct PollUnitOfWork {
    pub polls: Arc<dyn PollsRepository>,
    pub votes: Arc<dyn VotesRepository>,
}

impl fmt::Debug for PollUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollUnitOfWork")
            .field("polls", &type_name_of_val(self.polls.as_ref()))
            .field("votes", &type_name_of_val(self.votes.as_ref()))
            .finish()
    }
}

impl PollUnitOfWork {
    pub fn new(polls: Arc<dyn PollsRepository>, votes: Arc<dyn VotesRepository>) -> Self {
        Self { polls, votes }
    }

    pub fn in_memory(store: Arc<InMemoryPollStore>) -> Self {
        Self {
            polls: store.clone(),
            votes: store,
        }
    }

    #[cfg(feature = "database")]
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        Self {
            polls: db.polls_repository(),
            votes: db.votes_repository(),
        }
    }
}
