//! Rating rows queued at collaboration completion, and the aggregate score
//! rolled up onto the ratee's user row.

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::api::rating::{PendingRating, SubmittedRating};
use crate::db::PgPool;
use crate::policy::{rating_score_valid, RatingPolicy};

#[derive(Debug, Error)]
pub enum RatingStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("rating not found: {0}")]
    RatingNotFound(i64),
    #[error("rating {0} has already been submitted")]
    AlreadySubmitted(i64),
    #[error("user {rater_id} is not the rater for rating {rating_id}")]
    WrongRater { rating_id: i64, rater_id: i64 },
    #[error("score {0} is outside the 0.0 to 5.0 range")]
    InvalidScore(f64),
}

/// Ratings still awaiting the given rater's score, oldest first.
#[instrument(skip(pool))]
pub async fn list_pending_ratings(
    pool: &PgPool,
    rater_id: i64,
) -> Result<Vec<PendingRating>, RatingStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT r.rating_id, r.project_id, p.title AS project_title,
                    r.ratee_id, u.name AS ratee_name, r.created_at
             FROM konverge.user_ratings r
             JOIN konverge.users u ON u.user_id = r.ratee_id
             LEFT JOIN konverge.projects p ON p.project_id = r.project_id
             WHERE r.rater_id = $1 AND r.status = 'pending'
             ORDER BY r.created_at ASC",
            &[&rater_id],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| PendingRating {
            rating_id: row.get("rating_id"),
            project_id: row.get("project_id"),
            project_title: row.get("project_title"),
            ratee_id: row.get("ratee_id"),
            ratee_name: row.get("ratee_name"),
            created_at: row.get::<_, DateTime<Utc>>("created_at"),
        })
        .collect())
}

/// Submit a pending rating and fold the score into the ratee's aggregate.
///
/// Submissions are one-shot: a rating row moves from pending to completed
/// exactly once, and only at the hands of its designated rater.
#[instrument(skip(pool, policy, feedback))]
pub async fn submit_rating(
    pool: &PgPool,
    policy: &RatingPolicy,
    rating_id: i64,
    rater_id: i64,
    score: f64,
    feedback: Option<&str>,
) -> Result<SubmittedRating, RatingStorageError> {
    if !rating_score_valid(score) {
        return Err(RatingStorageError::InvalidScore(score));
    }

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt(
            "SELECT rater_id, ratee_id, status
             FROM konverge.user_ratings
             WHERE rating_id = $1
             FOR UPDATE",
            &[&rating_id],
        )
        .await?
        .ok_or(RatingStorageError::RatingNotFound(rating_id))?;

    let expected_rater: i64 = row.get("rater_id");
    let ratee_id: i64 = row.get("ratee_id");
    let status: String = row.get("status");

    if expected_rater != rater_id {
        return Err(RatingStorageError::WrongRater { rating_id, rater_id });
    }
    if status != "pending" {
        return Err(RatingStorageError::AlreadySubmitted(rating_id));
    }

    tx.execute(
        "UPDATE konverge.user_ratings
         SET score = $2, feedback = $3, status = 'completed', submitted_at = NOW()
         WHERE rating_id = $1",
        &[&rating_id, &score, &feedback],
    )
    .await?;

    // Aggregate over completed ratings only; the row just written is part of
    // the average.
    let completed_mean: f64 = tx
        .query_one(
            "SELECT AVG(score)::DOUBLE PRECISION AS mean
             FROM konverge.user_ratings
             WHERE ratee_id = $1 AND status = 'completed'",
            &[&ratee_id],
        )
        .await?
        .get("mean");

    let current: Option<f64> = tx
        .query_one(
            "SELECT rating FROM konverge.users WHERE user_id = $1 FOR UPDATE",
            &[&ratee_id],
        )
        .await?
        .get("rating");

    let ratee_rating = policy.next_rating(current, completed_mean, score);

    tx.execute(
        "UPDATE konverge.users SET rating = $2 WHERE user_id = $1",
        &[&ratee_id, &ratee_rating],
    )
    .await?;

    tx.commit().await?;

    info!(rating_id, ratee_id, ratee_rating, "rating submitted");

    Ok(SubmittedRating {
        rating_id,
        ratee_id,
        score,
        status: "completed".to_string(),
        ratee_rating,
    })
}
