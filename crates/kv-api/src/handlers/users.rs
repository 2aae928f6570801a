use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use kv_common::api::collaboration::CollaborationStatus;
use kv_common::db::{fetch_collaboration_status, freeze_inactive_users, unfreeze_user};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

/// The capacity-gate snapshot the GUI polls before offering new matches.
pub async fn collaboration_status(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<CollaborationStatus>, ApiError> {
    let status = fetch_collaboration_status(&state.pool, &state.commitment_policy, user_id).await?;
    Ok(Json(status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeRequest {
    pub inactive_days: Option<i32>,
}

/// Maintenance endpoint: freeze accounts idle past the configured window.
pub async fn freeze_inactive(
    State(state): State<SharedState>,
    _auth: AuthUser,
    payload: Option<Json<FreezeRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let inactive_days = payload
        .and_then(|Json(body)| body.inactive_days)
        .unwrap_or(state.config.inactivity_days);

    if inactive_days < 1 {
        return Err(ApiError::BadRequest(
            "inactiveDays must be at least 1".into(),
        ));
    }

    let frozen = freeze_inactive_users(&state.pool, inactive_days).await?;
    Ok(Json(json!({ "frozen": frozen, "inactiveDays": inactive_days })))
}

pub async fn unfreeze(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    unfreeze_user(&state.pool, user_id).await?;
    Ok(Json(
        json!({ "userId": user_id, "accountStatus": "active" }),
    ))
}
