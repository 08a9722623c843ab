use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::ports::votes::VotesRepository;
use crate::{
    domain::{NewVote, OptionId, PollId, VoteOutcome},
    error::{PollError, Result},
};

#[derive(Clone, Debug)]
pub struct PostgresVotesRepository {
    pool: PgPool,
}

impl PostgresVotesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VotesRepository for PostgresVotesRepository {
    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteOutcome> {
        // A conflicting row yields no RETURNING row instead of an error.
        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (id, poll_id, option_id, voter_token, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT votes_poll_voter_key DO NOTHING
            RETURNING id
            "#,
        )
        .bind(vote.id)
        .bind(vote.poll_id.as_str())
        .bind(vote.option_id.0)
        .bind(vote.voter_token.as_str())
        .bind(vote.cast_at)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| PollError::Storage(format!("Failed to record vote: {e}")))?;

        Ok(match inserted {
            Some(_) => VoteOutcome::Committed,
            None => VoteOutcome::DuplicateVote,
        })
    }

    async fn count_votes(&self, poll_id: &PollId) -> Result<HashMap<OptionId, u64>> {
        let rows = sqlx::query(
            r#"
            SELECT option_id, COUNT(*) AS votes
            FROM votes
            WHERE poll_id = $1
            GROUP BY option_id
            "#,
        )
        .bind(poll_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(|e| PollError::Storage(format!("Failed to count votes: {e}")))?;

        rows.iter()
            .map(|row| {
                let option_id: Uuid = row.try_get("option_id").map_err(|e| {
                    PollError::Storage(format!("Failed to read option_id: {e}"))
                })?;
                let votes: i64 = row.try_get("votes").map_err(|e| {
                    PollError::Storage(format!("Failed to read vote count: {e}"))
                })?;
                Ok((OptionId(option_id), votes.max(0) as u64))
            })
            .collect()
    }
}
