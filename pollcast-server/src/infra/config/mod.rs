pub mod loader;
pub mod models;
pub mod sources;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions, ConfigOverrides};
pub use models::{
    Config, ConfigMetadata, ConfigWarning, ConfigWarnings, CorsConfig, DatabaseConfig,
    RealtimeConfig, ServerConfig, StorageBackend, StorageConfig,
};
