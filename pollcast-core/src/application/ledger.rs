use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{tally::TallyAggregator, unit_of_work::PollUnitOfWork};
use crate::{
    Result,
    broadcast::{RoomRegistry, TallyUpdate},
    domain::{NewVote, Poll, PollId, Tally, VoteOutcome, VoteState, VoterToken},
    error::PollError,
};

/// A vote that made it into the ledger.
#[derive(Debug, Clone)]
pub struct CommittedVote {
    pub vote_id: Uuid,
    pub poll_id: PollId,
    /// Tally computed right after the commit; `None` if recomputation failed.
    pub tally: Option<Tally>,
}

/// Records at most one vote per `(poll, voter token)` and announces commits.
#[derive(Clone)]
pub struct VoteLedger {
    uow: PollUnitOfWork,
    tally: TallyAggregator,
    rooms: Arc<dyn RoomRegistry>,
}

impl std::fmt::Debug for VoteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteLedger")
            .field("uow", &self.uow)
            .finish_non_exhaustive()
    }
}

impl VoteLedger {
    pub fn new(
        uow: PollUnitOfWork,
        tally: TallyAggregator,
        rooms: Arc<dyn RoomRegistry>,
    ) -> Self {
        Self { uow, tally, rooms }
    }

    /// Validate, insert, then recompute and publish the tally.
    ///
    /// Errors: `InvalidRequest` for a missing token, `InvalidOption` when the
    /// label is not an option of the poll (an unknown poll has no options),
    /// `DuplicateVote` when this token already voted here, `Storage` when the
    /// store fails. Only a successful insert touches the ledger.
    pub async fn record_vote(
        &self,
        poll_id: &PollId,
        option_label: &str,
        voter_token: Option<&str>,
    ) -> Result<CommittedVote> {
        let state = VoteState::Received;

        let (poll, vote) = match self.validate(poll_id, option_label, voter_token).await {
            Ok(validated) => validated,
            Err(err @ PollError::Storage(_)) => return Err(err),
            Err(err) => {
                debug!(
                    poll_id = %poll_id,
                    state = ?state.validated(false),
                    error = %err,
                    "vote rejected"
                );
                return Err(err);
            }
        };
        let state = state.validated(true);

        let outcome = self.uow.votes.insert_vote(&vote).await?;
        let state = state.inserted(outcome);

        if outcome == VoteOutcome::DuplicateVote {
            debug!(poll_id = %poll_id, state = ?state, "duplicate vote rejected");
            return Err(PollError::DuplicateVote);
        }

        info!(poll_id = %poll_id, vote_id = %vote.id, state = ?state, "vote committed");

        let tally = self.announce(&poll).await;
        Ok(CommittedVote {
            vote_id: vote.id,
            poll_id: poll.id,
            tally,
        })
    }

    async fn validate(
        &self,
        poll_id: &PollId,
        option_label: &str,
        voter_token: Option<&str>,
    ) -> Result<(Poll, NewVote)> {
        let voter_token = VoterToken::parse(voter_token)?;

        let poll = self
            .uow
            .polls
            .get_poll(poll_id)
            .await?
            .ok_or_else(|| PollError::InvalidOption(option_label.to_string()))?;

        let option_id = poll
            .option_by_label(option_label)
            .map(|option| option.id)
            .ok_or_else(|| PollError::InvalidOption(option_label.to_string()))?;

        let vote = NewVote::new(poll.id.clone(), option_id, voter_token);
        Ok((poll, vote))
    }

    /// Best effort: the vote is already committed, so failures here are only
    /// logged.
    async fn announce(&self, poll: &Poll) -> Option<Tally> {
        match self.tally.tally_for(poll).await {
            Ok(tally) => {
                let delivered = self.rooms.publish(&TallyUpdate {
                    poll_id: poll.id.clone(),
                    tally: tally.clone(),
                });
                debug!(poll_id = %poll.id, delivered, "tally published");
                Some(tally)
            }
            Err(err) => {
                warn!(
                    poll_id = %poll.id,
                    error = %err,
                    "failed to recompute tally after commit; skipping broadcast"
                );
                None
            }
        }
    }
}
