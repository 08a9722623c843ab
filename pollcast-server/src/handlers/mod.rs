pub mod handle_health;
pub mod handle_polls;
pub mod handle_votes;
pub mod handle_websocket;
