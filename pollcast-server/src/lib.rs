//! # Pollcast Server
//!
//! HTTP and WebSocket front end for [`pollcast_core`]: poll creation, voter
//! token issuance, voting, tally reads and live tally broadcasts to every
//! subscriber in a poll's room.
//!
//! - [`routes::create_app`] builds the axum router.
//! - [`infra::app_state::AppState`] wires the core services to the
//!   broadcast hub ([`infra::websocket::ConnectionManager`]).
//! - [`infra::config::ConfigLoader`] resolves configuration from CLI flags,
//!   environment, `.env` and an optional TOML file.

pub mod handlers;
pub mod infra;
pub mod routes;
