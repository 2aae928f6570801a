use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use kv_common::api::rating::{PendingRating, SubmitRatingRequest, SubmittedRating};
use kv_common::db::{list_pending_ratings, submit_rating};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    pub user_id: i64,
}

pub async fn pending(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(params): Query<PendingParams>,
) -> Result<Json<Vec<PendingRating>>, ApiError> {
    let ratings = list_pending_ratings(&state.pool, params.user_id).await?;
    Ok(Json(ratings))
}

pub async fn submit(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(rating_id): Path<i64>,
    Json(payload): Json<SubmitRatingRequest>,
) -> Result<Json<SubmittedRating>, ApiError> {
    let submitted = submit_rating(
        &state.pool,
        &state.rating_policy,
        rating_id,
        payload.rater_id,
        payload.score,
        payload.feedback.as_deref(),
    )
    .await?;

    Ok(Json(submitted))
}
