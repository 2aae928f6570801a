//! Commitment counting for the capacity gate. Counts always come from the
//! authoritative collaboration/project tables; nothing here maintains a
//! cached counter that could drift.

use deadpool_postgres::{GenericClient, PoolError};
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::api::collaboration::CollaborationStatus;
use crate::db::PgPool;
use crate::policy::CommitmentPolicy;

#[derive(Debug, thiserror::Error)]
pub enum CapacityFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("user not found: {0}")]
    UserNotFound(i64),
}

/// Count a user's commitments: active collaborations as collaborator plus
/// owned projects still Open. Runs on whatever client the caller holds so
/// it can share the decision transaction.
pub async fn count_commitments(
    client: &impl GenericClient,
    user_id: i64,
) -> Result<i64, PgError> {
    let row = client
        .query_one(
            "SELECT
                (SELECT COUNT(*) FROM konverge.project_collaborators
                  WHERE user_id = $1 AND status = 'active')
              + (SELECT COUNT(*) FROM konverge.projects
                  WHERE owner_id = $1 AND status = 'Open') AS commitments",
            &[&user_id],
        )
        .await?;
    Ok(row.get::<_, i64>("commitments"))
}

/// Capacity-gate snapshot for one user.
#[instrument(skip(pool, policy))]
pub async fn fetch_collaboration_status(
    pool: &PgPool,
    policy: &CommitmentPolicy,
    user_id: i64,
) -> Result<CollaborationStatus, CapacityFetchError> {
    let client = pool.get().await?;

    let user_row = client
        .query_opt(
            "SELECT account_status FROM konverge.users WHERE user_id = $1",
            &[&user_id],
        )
        .await?
        .ok_or(CapacityFetchError::UserNotFound(user_id))?;
    let account_status: String = user_row.get("account_status");

    let row = client
        .query_one(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'active') AS active_collaborations,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_collaborations
             FROM konverge.project_collaborators
             WHERE user_id = $1",
            &[&user_id],
        )
        .await?;
    let active_collaborations: i64 = row.get("active_collaborations");
    let completed_collaborations: i64 = row.get("completed_collaborations");

    let pitched_projects: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM konverge.projects WHERE owner_id = $1 AND status = 'Open'",
            &[&user_id],
        )
        .await?
        .get(0);

    let total_commitments = active_collaborations + pitched_projects;

    Ok(CollaborationStatus {
        user_id,
        active_collaborations,
        completed_collaborations,
        pitched_projects,
        total_commitments,
        account_status,
        can_join_new_projects: policy.can_accept(total_commitments),
    })
}
