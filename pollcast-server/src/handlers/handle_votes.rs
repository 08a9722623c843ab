use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use pollcast_core::{
    PollError,
    domain::{PollId, VoterToken},
};
use serde::{Deserialize, Serialize};

use crate::infra::{app_state::AppState, errors::AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[serde(default)]
    pub option: Option<String>,
    #[serde(default)]
    pub voter_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// `POST /session/{id}/vote`
///
/// 400 for a missing token or an option the poll does not have (an unknown
/// poll has none), 409 when the token already voted on this poll.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CastVoteRequest>, JsonRejection>,
) -> AppResult<Json<OkResponse>> {
    let Json(request) = payload?;
    let option = request.option.unwrap_or_default();

    let Some(poll_id) = PollId::parse(&id) else {
        // Keep token validation ahead of option validation.
        VoterToken::parse(request.voter_token.as_deref())?;
        return Err(PollError::InvalidOption(option).into());
    };

    state
        .services
        .ledger
        .record_vote(&poll_id, &option, request.voter_token.as_deref())
        .await?;

    Ok(Json(OkResponse { ok: true }))
}
