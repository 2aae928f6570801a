//! Project rows. A pitch inserts the project and immediately runs the
//! recommender, so the owner sees their candidate matches in the same
//! request.

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;
use crate::matching::{recommend_for_project, RecommendError};
use crate::policy::MatchPolicy;
use crate::skill_normalizer::normalize_skills_vec;
use crate::ProjectRecord;

#[derive(Debug, Error)]
pub enum ProjectStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("owner not found: {0}")]
    OwnerNotFound(i64),
    #[error("project not found: {0}")]
    ProjectNotFound(i64),
    #[error("user {owner_id} does not own project {project_id}")]
    NotOwner { project_id: i64, owner_id: i64 },
    #[error("project {project_id} has {count} active collaborators")]
    ActiveCollaborators { project_id: i64, count: i64 },
    #[error("no usable required skills after normalization")]
    NoRequiredSkills,
    #[error(transparent)]
    Recommend(#[from] RecommendError),
}

/// A project pitch ready to insert.
#[derive(Debug, Clone)]
pub struct ProjectInsert {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub roles_available: i32,
}

/// Insert a pitched project and run the recommender for it. Returns the
/// stored record plus the number of pending matches created.
#[instrument(skip(pool, policy, insert), fields(owner_id = insert.owner_id))]
pub async fn create_project(
    pool: &PgPool,
    policy: &MatchPolicy,
    insert: ProjectInsert,
) -> Result<(ProjectRecord, u64), ProjectStorageError> {
    let required_skills = normalize_skills_vec(&insert.required_skills);
    if required_skills.is_empty() {
        return Err(ProjectStorageError::NoRequiredSkills);
    }

    let client = pool.get().await?;

    let owner_exists: bool = client
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM konverge.users WHERE user_id = $1)",
            &[&insert.owner_id],
        )
        .await?
        .get(0);
    if !owner_exists {
        return Err(ProjectStorageError::OwnerNotFound(insert.owner_id));
    }

    let row = client
        .query_one(
            "INSERT INTO konverge.projects
                (owner_id, title, description, required_skills, status, roles_available)
             VALUES ($1, $2, $3, $4, 'Open', $5)
             RETURNING project_id, created_at",
            &[
                &insert.owner_id,
                &insert.title,
                &insert.description,
                &required_skills,
                &insert.roles_available,
            ],
        )
        .await?;

    let project = ProjectRecord {
        project_id: row.get("project_id"),
        owner_id: insert.owner_id,
        title: insert.title,
        description: insert.description,
        required_skills,
        status: "Open".to_string(),
        roles_available: insert.roles_available,
        created_at: Some(row.get::<_, DateTime<Utc>>("created_at")),
    };

    let matches_created = recommend_for_project(pool, policy, &project).await?;
    info!(
        project_id = project.project_id,
        matches_created, "project pitched"
    );

    Ok((project, matches_created))
}

/// Owner-checked delete. Matches cascade with the project; an active
/// collaboration blocks the delete entirely.
#[instrument(skip(pool))]
pub async fn delete_project(
    pool: &PgPool,
    project_id: i64,
    owner_id: i64,
) -> Result<(), ProjectStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt(
            "SELECT owner_id FROM konverge.projects WHERE project_id = $1 FOR UPDATE",
            &[&project_id],
        )
        .await?
        .ok_or(ProjectStorageError::ProjectNotFound(project_id))?;
    let actual_owner: i64 = row.get("owner_id");
    if actual_owner != owner_id {
        return Err(ProjectStorageError::NotOwner {
            project_id,
            owner_id,
        });
    }

    let active: i64 = tx
        .query_one(
            "SELECT COUNT(*) FROM konverge.project_collaborators
             WHERE project_id = $1 AND status = 'active'",
            &[&project_id],
        )
        .await?
        .get(0);
    if active > 0 {
        return Err(ProjectStorageError::ActiveCollaborators {
            project_id,
            count: active,
        });
    }

    tx.execute(
        "DELETE FROM konverge.projects WHERE project_id = $1",
        &[&project_id],
    )
    .await?;
    tx.commit().await?;

    info!(project_id, "project deleted");
    Ok(())
}
