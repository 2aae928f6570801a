use axum::{
    extract::{Path, State},
    Json,
};
use kv_common::api::decision::{DecisionRequest, DecisionResponse, MatchSummary};
use kv_common::db::{fetch_matches_for_project, fetch_open_matches_for_user, record_decision};
use kv_common::lifecycle::Actor;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn owner_decision(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(match_id): Path<i64>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(state, match_id, Actor::Owner, payload).await
}

pub async fn user_decision(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(match_id): Path<i64>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(state, match_id, Actor::User, payload).await
}

async fn decide(
    state: SharedState,
    match_id: i64,
    actor: Actor,
    payload: DecisionRequest,
) -> Result<Json<DecisionResponse>, ApiError> {
    let outcome = record_decision(
        &state.pool,
        &state.commitment_policy,
        match_id,
        actor,
        payload.decision,
        payload.reason.as_deref(),
    )
    .await?;

    Ok(Json(outcome.into_response()))
}

/// Owner view: every match recorded for a pitched project.
pub async fn list_for_project(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<MatchSummary>>, ApiError> {
    let matches = fetch_matches_for_project(&state.pool, project_id).await?;
    Ok(Json(matches))
}

/// Candidate inbox: matches still open where this user is the candidate.
pub async fn list_for_user(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<MatchSummary>>, ApiError> {
    let matches = fetch_open_matches_for_user(&state.pool, user_id).await?;
    Ok(Json(matches))
}
