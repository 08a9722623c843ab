use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    handlers::{handle_health, handle_polls, handle_votes, handle_websocket},
    infra::{app_state::AppState, config::Config},
};

pub fn create_app(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config);

    Router::new()
        .route("/create-session", post(handle_polls::create_session))
        .route("/join-session", post(handle_polls::join_session))
        .route("/session/{id}", get(handle_polls::get_session))
        .route("/session/{id}/vote", post(handle_votes::cast_vote))
        .route("/health", get(handle_health::health_handler))
        .route("/ws", get(handle_websocket::websocket_handler))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive in dev mode; otherwise the configured origins, or any origin
/// when none are configured.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
