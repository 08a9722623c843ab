use super::unit_of_work::PollUnitOfWork;
use crate::{
    Result,
    domain::{Poll, PollId, PollSnapshot, Tally},
    error::PollError,
};

/// Derives current per-option counts from the ledger. Never caches.
#[derive(Debug, Clone)]
pub struct TallyAggregator {
    uow: PollUnitOfWork,
}

impl TallyAggregator {
    pub fn new(uow: PollUnitOfWork) -> Self {
        Self { uow }
    }

    pub async fn compute_tally(&self, poll_id: &PollId) -> Result<Tally> {
        let poll = self.load_poll(poll_id).await?;
        self.tally_for(&poll).await
    }

    /// Title plus current tally for the read endpoint.
    pub async fn snapshot(&self, poll_id: &PollId) -> Result<PollSnapshot> {
        let poll = self.load_poll(poll_id).await?;
        let votes = self.tally_for(&poll).await?;
        Ok(PollSnapshot {
            title: poll.title,
            votes,
        })
    }

    /// Tally for an already loaded poll; options are immutable so only the
    /// counts need re-reading.
    pub(crate) async fn tally_for(&self, poll: &Poll) -> Result<Tally> {
        let counts = self.uow.votes.count_votes(&poll.id).await?;
        Ok(Tally::from_counts(&poll.options, &counts))
    }

    async fn load_poll(&self, poll_id: &PollId) -> Result<Poll> {
        self.uow
            .polls
            .get_poll(poll_id)
            .await?
            .ok_or_else(|| PollError::NotFound(poll_id.to_string()))
    }
}
