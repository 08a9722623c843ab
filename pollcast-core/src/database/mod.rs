#[cfg(feature = "database")]
pub mod infrastructure;
pub mod memory;
pub mod ports;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryPollStore;
#[cfg(feature = "database")]
pub use postgres::{PoolSettings, PostgresDatabase};
