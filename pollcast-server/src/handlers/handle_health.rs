use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use super::handle_votes::OkResponse;
use crate::infra::app_state::AppState;

/// `GET /health`: 200 when storage answers, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<OkResponse>) {
    match state.services.catalog.ping().await {
        Ok(()) => (StatusCode::OK, Json(OkResponse { ok: true })),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(OkResponse { ok: false }))
        }
    }
}
