use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::ports::{PollsRepository, VotesRepository};
use crate::{
    Result,
    domain::{NewVote, OptionId, Poll, PollId, VoteOutcome, VoterToken},
    error::PollError,
};

/// Process-local storage backend for development runs and tests.
///
/// All state sits behind one lock; holding the write guard is this store's
/// transaction, so the duplicate-vote check and the insert happen atomically
/// exactly as a database uniqueness constraint would enforce them.
#[derive(Default)]
pub struct InMemoryPollStore {
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    polls: HashMap<PollId, PollRecord>,
}

struct PollRecord {
    poll: Poll,
    /// Keyed by voter token: the uniqueness constraint of this backend.
    votes: HashMap<VoterToken, OptionId>,
}

impl fmt::Debug for InMemoryPollStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("InMemoryPollStore");

        match self.state.try_read() {
            Some(state) => {
                let votes: usize = state.polls.values().map(|r| r.votes.len()).sum();
                debug
                    .field("polls", &state.polls.len())
                    .field("votes", &votes);
            }
            None => {
                debug.field("state", &"<locked>");
            }
        }

        debug.finish()
    }
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed votes for a poll.
    pub fn vote_count(&self, poll_id: &PollId) -> usize {
        self.state
            .read()
            .polls
            .get(poll_id)
            .map(|record| record.votes.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl PollsRepository for InMemoryPollStore {
    async fn create_poll(&self, poll: &Poll) -> Result<()> {
        let mut state = self.state.write();
        if state.polls.contains_key(&poll.id) {
            return Err(PollError::Storage(format!(
                "Poll id {} already exists",
                poll.id
            )));
        }

        state.polls.insert(
            poll.id.clone(),
            PollRecord {
                poll: poll.clone(),
                votes: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn get_poll(&self, id: &PollId) -> Result<Option<Poll>> {
        Ok(self
            .state
            .read()
            .polls
            .get(id)
            .map(|record| record.poll.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl VotesRepository for InMemoryPollStore {
    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteOutcome> {
        use std::collections::hash_map::Entry;

        let mut state = self.state.write();
        let record = state.polls.get_mut(&vote.poll_id).ok_or_else(|| {
            PollError::Storage(format!("Vote references unknown poll {}", vote.poll_id))
        })?;

        if !record.poll.options.iter().any(|o| o.id == vote.option_id) {
            return Err(PollError::Storage(format!(
                "Vote references option {} outside poll {}",
                vote.option_id, vote.poll_id
            )));
        }

        match record.votes.entry(vote.voter_token.clone()) {
            Entry::Occupied(_) => Ok(VoteOutcome::DuplicateVote),
            Entry::Vacant(slot) => {
                slot.insert(vote.option_id);
                Ok(VoteOutcome::Committed)
            }
        }
    }

    async fn count_votes(&self, poll_id: &PollId) -> Result<HashMap<OptionId, u64>> {
        let state = self.state.read();
        let mut counts = HashMap::new();
        if let Some(record) = state.polls.get(poll_id) {
            for option_id in record.votes.values() {
                *counts.entry(*option_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
