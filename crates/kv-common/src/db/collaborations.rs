//! Collaboration rows: created when a match confirms, completed when the
//! work finishes. Completion fans out the pending ratings for both sides.

use deadpool_postgres::{GenericClient, PoolError};
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::capacity::count_commitments;
use crate::db::PgPool;
use crate::policy::CommitmentPolicy;

#[derive(Debug, Error)]
pub enum CollaborationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("no active collaboration for user {user_id} on project {project_id}")]
    ActiveCollaborationNotFound { project_id: i64, user_id: i64 },
    #[error("project not found: {0}")]
    ProjectNotFound(i64),
}

/// What `finish_collaboration` reports back to the caller.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub project_id: i64,
    pub user_id: i64,
    pub active_collaborations: i64,
    pub can_join_new_projects: bool,
    pub ratings_created: u64,
}

/// Create the active collaboration for a confirmed match, on the caller's
/// transaction. A pair that already has an active collaboration keeps it;
/// the existing id is returned instead.
pub async fn create_collaboration(
    client: &impl GenericClient,
    project_id: i64,
    user_id: i64,
    required_skill: &str,
) -> Result<i64, PgError> {
    let inserted = client
        .query_opt(
            "INSERT INTO konverge.project_collaborators
                (project_id, user_id, required_skill, status)
             VALUES ($1, $2, $3, 'active')
             ON CONFLICT (project_id, user_id) WHERE status = 'active'
             DO NOTHING
             RETURNING collaboration_id",
            &[&project_id, &user_id, &required_skill],
        )
        .await?;

    if let Some(row) = inserted {
        return Ok(row.get("collaboration_id"));
    }

    let existing = client
        .query_one(
            "SELECT collaboration_id FROM konverge.project_collaborators
             WHERE project_id = $1 AND user_id = $2 AND status = 'active'",
            &[&project_id, &user_id],
        )
        .await?;
    Ok(existing.get("collaboration_id"))
}

/// Mark a collaboration completed and queue the mutual ratings.
///
/// The update is keyed on `status = 'active'`, so a repeat call (or a finish
/// for a pair that never collaborated) hits zero rows and reports not-found
/// instead of queuing a second round of ratings.
#[instrument(skip(pool, policy))]
pub async fn finish_collaboration(
    pool: &PgPool,
    policy: &CommitmentPolicy,
    project_id: i64,
    user_id: i64,
) -> Result<FinishOutcome, CollaborationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let completed = tx
        .execute(
            "UPDATE konverge.project_collaborators
             SET status = 'completed', completed_at = NOW()
             WHERE project_id = $1 AND user_id = $2 AND status = 'active'",
            &[&project_id, &user_id],
        )
        .await?;
    if completed == 0 {
        return Err(CollaborationStorageError::ActiveCollaborationNotFound {
            project_id,
            user_id,
        });
    }

    let owner_id: i64 = tx
        .query_opt(
            "SELECT owner_id FROM konverge.projects WHERE project_id = $1",
            &[&project_id],
        )
        .await?
        .ok_or(CollaborationStorageError::ProjectNotFound(project_id))?
        .get("owner_id");

    // Both directions: the collaborator rates the owner, the owner rates the
    // collaborator.
    let mut ratings_created = 0;
    for (rater, ratee) in [(user_id, owner_id), (owner_id, user_id)] {
        ratings_created += tx
            .execute(
                "INSERT INTO konverge.user_ratings (rater_id, ratee_id, project_id, status)
                 VALUES ($1, $2, $3, 'pending')",
                &[&rater, &ratee, &project_id],
            )
            .await?;
    }

    let commitments = count_commitments(&tx, user_id).await?;
    let active_collaborations: i64 = tx
        .query_one(
            "SELECT COUNT(*) FROM konverge.project_collaborators
             WHERE user_id = $1 AND status = 'active'",
            &[&user_id],
        )
        .await?
        .get(0);

    tx.commit().await?;

    info!(
        project_id,
        user_id, ratings_created, "collaboration completed"
    );

    Ok(FinishOutcome {
        project_id,
        user_id,
        active_collaborations,
        can_join_new_projects: policy.can_accept(commitments),
        ratings_created,
    })
}
