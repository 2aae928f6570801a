use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use kv_common::api::project::{CreateProjectRequest, CreateProjectResponse};
use kv_common::db::{create_project, delete_project, ProjectInsert};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

const MAX_TITLE_LEN: usize = 200;

pub async fn create(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<CreateProjectResponse>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    if payload.title.len() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if payload.roles_available < 1 {
        return Err(ApiError::BadRequest(
            "rolesAvailable must be at least 1".into(),
        ));
    }

    let insert = ProjectInsert {
        owner_id: payload.owner_id,
        title: payload.title.trim().to_string(),
        description: payload.description,
        required_skills: payload.required_skills,
        roles_available: payload.roles_available,
    };

    let (project, matches_created) =
        create_project(&state.pool, &state.match_policy, insert).await?;

    Ok(Json(CreateProjectResponse {
        project_id: project.project_id,
        status: project.status,
        required_skills: project.required_skills,
        matches_created,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProjectParams {
    pub owner_id: i64,
}

pub async fn delete(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(project_id): Path<i64>,
    Query(params): Query<DeleteProjectParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete_project(&state.pool, project_id, params.owner_id).await?;
    Ok(Json(json!({ "success": true })))
}
