//! User rows: the candidate pool for recommendation and the
//! freeze/unfreeze maintenance pass.

use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;
use crate::CandidateProfile;

#[derive(Debug, Error)]
pub enum UserStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("user not found: {0}")]
    UserNotFound(i64),
}

/// Active users eligible for recommendation, excluding the project owner.
/// Frozen accounts never enter the pool.
#[instrument(skip(pool))]
pub async fn fetch_candidate_pool(
    pool: &PgPool,
    owner_id: i64,
) -> Result<Vec<CandidateProfile>, UserStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT user_id, skills, rating, engagement_score
             FROM konverge.users
             WHERE account_status = 'active' AND user_id <> $1",
            &[&owner_id],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| CandidateProfile {
            user_id: row.get("user_id"),
            skills: row.get("skills"),
            rating: row.get("rating"),
            engagement_score: row.get("engagement_score"),
        })
        .collect())
}

/// Freeze active accounts idle longer than `inactive_days`. Users carrying
/// an active collaboration are left alone; freezing them would strand a
/// running project.
#[instrument(skip(pool))]
pub async fn freeze_inactive_users(
    pool: &PgPool,
    inactive_days: i32,
) -> Result<u64, UserStorageError> {
    let client = pool.get().await?;
    let frozen = client
        .execute(
            "UPDATE konverge.users u
             SET account_status = 'frozen'
             WHERE u.account_status = 'active'
               AND u.last_active_at < NOW() - ($1 * INTERVAL '1 day')
               AND NOT EXISTS (
                   SELECT 1 FROM konverge.project_collaborators c
                   WHERE c.user_id = u.user_id AND c.status = 'active'
               )",
            &[&inactive_days],
        )
        .await?;

    if frozen > 0 {
        info!(frozen, inactive_days, "froze inactive accounts");
    }
    Ok(frozen)
}

/// Reactivate a frozen account. Unknown users and accounts that are not
/// frozen both report not-found.
#[instrument(skip(pool))]
pub async fn unfreeze_user(pool: &PgPool, user_id: i64) -> Result<(), UserStorageError> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            "UPDATE konverge.users
             SET account_status = 'active', last_active_at = NOW()
             WHERE user_id = $1 AND account_status = 'frozen'",
            &[&user_id],
        )
        .await?;

    if updated == 0 {
        return Err(UserStorageError::UserNotFound(user_id));
    }
    info!(user_id, "account unfrozen");
    Ok(())
}
