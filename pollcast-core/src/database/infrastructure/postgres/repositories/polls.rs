use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::polls::PollsRepository;
use crate::{
    domain::{OptionId, Poll, PollId, PollOption},
    error::{PollError, Result},
};

#[derive(Clone, Debug)]
pub struct PostgresPollsRepository {
    pool: PgPool,
}

impl PostgresPollsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_option(row: &PgRow) -> Result<PollOption> {
        let id: Uuid = row.try_get("id").map_err(|e| {
            PollError::Storage(format!("Failed to read option id: {e}"))
        })?;
        let label: String = row.try_get("label").map_err(|e| {
            PollError::Storage(format!("Failed to read option label: {e}"))
        })?;
        let position: i32 = row.try_get("position").map_err(|e| {
            PollError::Storage(format!("Failed to read option position: {e}"))
        })?;

        Ok(PollOption {
            id: OptionId(id),
            label,
            position,
        })
    }
}

#[async_trait]
impl PollsRepository for PostgresPollsRepository {
    async fn create_poll(&self, poll: &Poll) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            PollError::Storage(format!("Failed to start transaction: {e}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, title, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(poll.id.as_str())
        .bind(&poll.title)
        .bind(poll.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PollError::Storage(format!("Failed to create poll: {e}")))?;

        for option in &poll.options {
            sqlx::query(
                r#"
                INSERT INTO poll_options (id, poll_id, label, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(option.id.0)
            .bind(poll.id.as_str())
            .bind(&option.label)
            .bind(option.position)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                PollError::Storage(format!("Failed to add poll option: {e}"))
            })?;
        }

        tx.commit().await.map_err(|e| {
            PollError::Storage(format!("Failed to commit transaction: {e}"))
        })?;

        info!(
            poll_id = %poll.id,
            options = poll.options.len(),
            "Created poll"
        );
        Ok(())
    }

    async fn get_poll(&self, id: &PollId) -> Result<Option<Poll>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, title, created_at
            FROM polls
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| PollError::Storage(format!("Failed to load poll: {e}")))?
        else {
            return Ok(None);
        };

        let title: String = row
            .try_get("title")
            .map_err(|e| PollError::Storage(format!("Failed to read title: {e}")))?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| {
            PollError::Storage(format!("Failed to read created_at: {e}"))
        })?;

        let options = sqlx::query(
            r#"
            SELECT id, label, position
            FROM poll_options
            WHERE poll_id = $1
            ORDER BY position
            "#,
        )
        .bind(id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(|e| PollError::Storage(format!("Failed to load options: {e}")))?
        .iter()
        .map(Self::map_option)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(Poll {
            id: id.clone(),
            title,
            options,
            created_at,
        }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(|e| PollError::Storage(format!("Database ping failed: {e}")))?;
        Ok(())
    }
}
