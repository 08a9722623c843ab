use std::sync::Arc;

use anyhow::{Context, anyhow};
use pollcast_core::{application::unit_of_work::PollUnitOfWork, database::PostgresDatabase};
use tracing::{error, info, warn};

use crate::infra::{
    app_state::AppState,
    config::{Config, DatabaseConfig, StorageBackend},
};

/// Connect the configured storage backend and build the shared state.
/// The postgres backend is migrated before anything is served.
pub async fn build_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; polls and votes are lost on restart");
            Ok(AppState::in_memory(config))
        }
        StorageBackend::Postgres => {
            let db = connect_postgres(&config.database).await?;
            db.migrate().await.context("database migration failed")?;
            info!("database schema is up to date");
            Ok(AppState::new(config, PollUnitOfWork::from_postgres(&db)))
        }
    }
}

pub async fn connect_postgres(database: &DatabaseConfig) -> anyhow::Result<PostgresDatabase> {
    let url = database
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL is required for the postgres backend"))?;

    PostgresDatabase::new(url, database.pool_settings())
        .await
        .context("failed to connect to PostgreSQL")
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(err) => {
                error!(error = %err, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
