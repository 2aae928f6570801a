use axum::{extract::State, Json};

use kv_common::api::collaboration::{FinishCollaborationRequest, FinishCollaborationResponse};
use kv_common::db::finish_collaboration;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn finish(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(payload): Json<FinishCollaborationRequest>,
) -> Result<Json<FinishCollaborationResponse>, ApiError> {
    let outcome = finish_collaboration(
        &state.pool,
        &state.commitment_policy,
        payload.project_id,
        payload.user_id,
    )
    .await?;

    Ok(Json(FinishCollaborationResponse {
        message: "collaboration completed".to_string(),
        active_collaborations: outcome.active_collaborations,
        can_join_new_projects: outcome.can_join_new_projects,
        ratings_created: outcome.ratings_created as i64,
    }))
}
