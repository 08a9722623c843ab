use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    Result,
    domain::{NewVote, OptionId, PollId, VoteOutcome},
};

/// Append-only vote storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotesRepository: Send + Sync {
    /// Atomically insert the vote unless one already exists for the same
    /// `(poll, voter token)`. The uniqueness check must be enforced by the
    /// store itself; callers take no lock around this call.
    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteOutcome>;

    /// Committed vote counts grouped by option, read as a single snapshot.
    /// Options without votes may be absent from the map.
    async fn count_votes(&self, poll_id: &PollId) -> Result<HashMap<OptionId, u64>>;
}
