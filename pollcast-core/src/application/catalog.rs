use tracing::info;

use super::unit_of_work::PollUnitOfWork;
use crate::{
    Result,
    domain::{NewPoll, Poll, PollId, VoterToken},
    error::PollError,
};

/// Poll creation, lookup and voter-token issuance.
#[derive(Debug, Clone)]
pub struct PollCatalog {
    uow: PollUnitOfWork,
}

impl PollCatalog {
    pub fn new(uow: PollUnitOfWork) -> Self {
        Self { uow }
    }

    /// Validate and persist a poll with all of its options in one write.
    pub async fn create_poll(&self, new_poll: NewPoll) -> Result<Poll> {
        let poll = Poll::create(new_poll)?;
        self.uow.polls.create_poll(&poll).await?;

        info!(poll_id = %poll.id, options = poll.options.len(), "poll created");
        Ok(poll)
    }

    pub async fn get_poll(&self, id: &PollId) -> Result<Poll> {
        self.uow
            .polls
            .get_poll(id)
            .await?
            .ok_or_else(|| PollError::NotFound(id.to_string()))
    }

    /// Hand out a fresh, unrelated token. Nothing is stored.
    pub fn issue_voter_token(&self) -> VoterToken {
        VoterToken::issue()
    }

    pub async fn ping(&self) -> Result<()> {
        self.uow.polls.ping().await
    }
}
