use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::models::StorageBackend;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub realtime: FileRealtimeConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<StorageBackend>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRealtimeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_buffer: Option<usize>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub storage_backend: Option<StorageBackend>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub database_min_connections: Option<u32>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub subscriber_buffer: Option<usize>,
    pub dev_mode: Option<bool>,
}

/// A variable that was set but could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarError {
    pub name: &'static str,
    pub message: String,
}

impl EnvConfig {
    pub fn gather() -> Result<Self, EnvVarError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; `gather` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvVarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut env_config = Self::default();

        env_config.config_path = var("POLLCAST_CONFIG").map(PathBuf::from);
        env_config.server_host = var("SERVER_HOST");
        env_config.server_port = match parse_var(&var, "SERVER_PORT")? {
            Some(port) => Some(port),
            None => parse_var(&var, "PORT")?,
        };
        env_config.storage_backend = var("STORAGE_BACKEND")
            .map(|raw| {
                raw.parse::<StorageBackend>().map_err(|message| EnvVarError {
                    name: "STORAGE_BACKEND",
                    message,
                })
            })
            .transpose()?;
        env_config.database_url = var("DATABASE_URL");
        env_config.database_max_connections = parse_var(&var, "DB_MAX_CONNECTIONS")?;
        env_config.database_min_connections = parse_var(&var, "DB_MIN_CONNECTIONS")?;

        env_config.cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_csv(&raw))
            .or_else(|| var("FRONTEND_URL").map(|url| vec![url.trim().to_string()]));

        env_config.subscriber_buffer = parse_var(&var, "WS_SUBSCRIBER_BUFFER")?;
        env_config.dev_mode = parse_bool_var(&var, "DEV_MODE")?;

        Ok(env_config)
    }
}

fn parse_var<T, F>(var: &F, name: &'static str) -> Result<Option<T>, EnvVarError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|err| EnvVarError {
                name,
                message: err.to_string(),
            })
        })
        .transpose()
}

fn parse_bool_var<F>(var: &F, name: &'static str) -> Result<Option<bool>, EnvVarError>
where
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(EnvVarError {
                name,
                message: format!("'{other}' is not a boolean"),
            }),
        })
        .transpose()
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Result<EnvConfig, EnvVarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn port_falls_back_to_plain_port_variable() {
        assert_eq!(env(&[("PORT", "8080")]).unwrap().server_port, Some(8080));
        assert_eq!(
            env(&[("PORT", "8080"), ("SERVER_PORT", "9000")])
                .unwrap()
                .server_port,
            Some(9000)
        );
    }

    #[test]
    fn frontend_url_becomes_single_origin() {
        let config = env(&[("FRONTEND_URL", "https://polls.example")]).unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["https://polls.example".to_string()])
        );

        let config = env(&[
            ("FRONTEND_URL", "https://polls.example"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, ,http://b.test"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = env(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert_eq!(err.name, "SERVER_PORT");

        let err = env(&[("DEV_MODE", "maybe")]).unwrap_err();
        assert_eq!(err.name, "DEV_MODE");

        let err = env(&[("STORAGE_BACKEND", "redis")]).unwrap_err();
        assert_eq!(err.name, "STORAGE_BACKEND");
    }

    #[test]
    fn blank_values_are_unset() {
        let config = env(&[("DATABASE_URL", "  "), ("SERVER_HOST", "")]).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.server_host.is_none());
    }
}
