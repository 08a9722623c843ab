use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use pollcast_server::{
    infra::{
        config::{Config, ConfigLoad, ConfigLoader, ConfigOverrides, StorageBackend},
        startup,
    },
    routes,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "pollcast-server")]
#[command(about = "Live polling server with real-time tally broadcasts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a pollcast.toml configuration file
    #[arg(long, env = "POLLCAST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Keep polls and votes in process memory instead of PostgreSQL
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } = config_loader(&cli.serve)
        .load()
        .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(message = %warning.message, hint = %hint, "configuration warning"),
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => {
            let db = startup::connect_postgres(&config.database).await?;
            db.migrate().await.context("database migration failed")?;
            info!("Database migrations applied successfully");
            Ok(())
        }
        None => run_server(Arc::new(config)).await,
    }
}

fn config_loader(args: &ServeArgs) -> ConfigLoader {
    let mut loader = ConfigLoader::new().with_overrides(ConfigOverrides {
        host: args.host.clone(),
        port: args.port,
        storage_backend: args.in_memory.then_some(StorageBackend::Memory),
    });
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    loader
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = startup::build_state(Arc::clone(&config)).await?;
    let app = routes::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, storage = %config.storage.backend, "Pollcast server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(startup::shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}
