use std::{fmt, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::infrastructure::postgres::{PostgresPollsRepository, PostgresVotesRepository};
use crate::error::{PollError, Result};

/// Connection pool sizing for [`PostgresDatabase::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
        }
    }
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    settings: PoolSettings,
    polls: Arc<PostgresPollsRepository>,
    votes: Arc<PostgresVotesRepository>,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .field("max_connections", &self.settings.max_connections)
            .field("min_connections", &self.settings.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn new(connection_string: &str, settings: PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .connect(connection_string)
            .await
            .map_err(|e| {
                PollError::Storage(format!("Failed to connect to PostgreSQL: {e}"))
            })?;

        info!(
            "Database pool initialized with max_connections={}, min_connections={}",
            settings.max_connections, settings.min_connections
        );

        Ok(Self::with_settings(pool, settings))
    }

    /// Create a PostgresDatabase from an existing pool (mainly for testing)
    pub fn from_pool(pool: PgPool) -> Self {
        Self::with_settings(pool, PoolSettings::default())
    }

    fn with_settings(pool: PgPool, settings: PoolSettings) -> Self {
        Self {
            polls: Arc::new(PostgresPollsRepository::new(pool.clone())),
            votes: Arc::new(PostgresVotesRepository::new(pool.clone())),
            pool,
            settings,
        }
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn polls_repository(&self) -> Arc<PostgresPollsRepository> {
        Arc::clone(&self.polls)
    }

    pub fn votes_repository(&self) -> Arc<PostgresVotesRepository> {
        Arc::clone(&self.votes)
    }
}
