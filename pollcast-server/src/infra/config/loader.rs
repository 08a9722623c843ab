use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};
use thiserror::Error;
use url::Url;

use super::{
    models::{
        Config, ConfigMetadata, ConfigWarnings, CorsConfig, DatabaseConfig, RealtimeConfig,
        ServerConfig, StorageBackend, StorageConfig,
    },
    sources::{EnvConfig, EnvVarError, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("pollcast.toml"),
        PathBuf::from("config/pollcast.toml"),
    ]
});

/// Values from the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub storage_backend: Option<StorageBackend>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

/// Composes [`Config`] from CLI overrides, the environment (after `.env`),
/// an optional TOML file and built-in defaults, in that order of precedence.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }

    /// Load `.env`, read the process environment and compose.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let env_config = EnvConfig::gather()?;
        self.load_from(env_config, env_file_loaded)
    }

    /// Compose from an already gathered environment. Does not touch `.env`
    /// or the process environment.
    pub fn load_with_env(&self, env_config: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        self.load_from(env_config, false)
    }

    fn load_from(
        &self,
        env_config: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let (config, warnings) =
            self.compose_config(file_config, env_config, config_path, env_file_loaded)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        // An explicitly named file must exist; defaults are optional.
        let (path, explicit) = if let Some(path) = &self.options.config_path {
            (path.clone(), true)
        } else if let Some(path) = &env_config.config_path {
            (path.clone(), true)
        } else if let Some(path) = DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|candidate| candidate.exists())
        {
            (path.clone(), false)
        } else {
            return Ok((None, None));
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No pollcast.toml detected; using environment variables and defaults",
                "Pass --config or set POLLCAST_CONFIG to load a configuration file",
            );
        }

        let FileConfig {
            server: file_server,
            storage: file_storage,
            database: file_database,
            cors: file_cors,
            realtime: file_realtime,
            dev_mode: file_dev_mode,
        } = file_config.unwrap_or_default();
        let overrides = &self.options.overrides;

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: overrides
                .host
                .clone()
                .or(env.server_host)
                .or(file_server.host)
                .unwrap_or(server_defaults.host),
            port: overrides
                .port
                .or(env.server_port)
                .or(file_server.port)
                .unwrap_or(server_defaults.port),
        };

        let storage = StorageConfig {
            backend: overrides
                .storage_backend
                .or(env.storage_backend)
                .or(file_storage.backend)
                .unwrap_or_default(),
        };

        let database_defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: env
                .database_url
                .or(file_database.url)
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(database_defaults.max_connections),
            min_connections: env
                .database_min_connections
                .or(file_database.min_connections)
                .unwrap_or(database_defaults.min_connections),
        };

        let cors = CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .or(file_cors.allowed_origins)
                .unwrap_or_default(),
        };

        let realtime = RealtimeConfig {
            subscriber_buffer: env
                .subscriber_buffer
                .or(file_realtime.subscriber_buffer)
                .unwrap_or(RealtimeConfig::default().subscriber_buffer),
        };

        let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

        let config = Config {
            server,
            storage,
            database,
            cors,
            realtime,
            dev_mode,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        validate(&config, &mut warnings)?;
        Ok((config, warnings))
    }
}

fn validate(config: &Config, warnings: &mut ConfigWarnings) -> Result<(), ConfigLoadError> {
    match (config.storage.backend, config.database.url.as_deref()) {
        (StorageBackend::Postgres, None) => {
            return Err(ConfigLoadError::Invalid(
                "database.url (DATABASE_URL) is required when storage.backend is \"postgres\""
                    .to_string(),
            ));
        }
        (StorageBackend::Postgres, Some(url)) => validate_database_url(url)?,
        (StorageBackend::Memory, _) => warnings.push_with_hint(
            "In-memory storage selected; polls and votes are lost on restart",
            "Set STORAGE_BACKEND=postgres and DATABASE_URL for durable storage",
        ),
    }

    let database = &config.database;
    if database.max_connections == 0 {
        return Err(ConfigLoadError::Invalid(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    if database.min_connections > database.max_connections {
        return Err(ConfigLoadError::Invalid(format!(
            "database.min_connections ({}) exceeds database.max_connections ({})",
            database.min_connections, database.max_connections
        )));
    }

    if config.realtime.subscriber_buffer == 0 {
        return Err(ConfigLoadError::Invalid(
            "realtime.subscriber_buffer must be at least 1".to_string(),
        ));
    }

    if config.cors.allowed_origins.is_empty() && !config.dev_mode {
        warnings.push("No CORS origins configured; any origin may call the API");
    }

    Ok(())
}

fn validate_database_url(raw: &str) -> Result<(), ConfigLoadError> {
    let url = Url::parse(raw)
        .map_err(|err| ConfigLoadError::Invalid(format!("invalid database URL: {err}")))?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConfigLoadError::Invalid(format!(
            "database URL scheme must be postgres:// or postgresql://, got {other}://"
        ))),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
    #[error("invalid value for {}: {}", .0.name, .0.message)]
    Env(EnvVarError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<EnvVarError> for ConfigLoadError {
    fn from(err: EnvVarError) -> Self {
        ConfigLoadError::Env(err)
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
