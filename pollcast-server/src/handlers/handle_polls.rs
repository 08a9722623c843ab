use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use pollcast_core::domain::{NewPoll, PollId, PollSnapshot};
use serde::{Deserialize, Serialize};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub voter_token: String,
}

/// `POST /create-session`
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateSessionResponse>)> {
    let Json(request) = payload?;

    let poll = state
        .services
        .catalog
        .create_poll(NewPoll::new(request.title, request.options))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: poll.id.into(),
        }),
    ))
}

/// `POST /join-session`: hands out an unauthenticated voter token.
pub async fn join_session(State(state): State<AppState>) -> Json<JoinSessionResponse> {
    let token = state.services.catalog.issue_voter_token();
    Json(JoinSessionResponse {
        voter_token: token.as_str().to_string(),
    })
}

/// `GET /session/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PollSnapshot>> {
    let poll_id = PollId::parse(&id).ok_or_else(|| AppError::not_found("Session not found"))?;
    let snapshot = state.services.tally.snapshot(&poll_id).await?;
    Ok(Json(snapshot))
}
