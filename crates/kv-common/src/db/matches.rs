//! Match rows and the decision transaction.
//!
//! `record_decision` is the only writer of `owner_decision` / `user_decision`
//! and of the match `state` column, so every state change goes through the
//! same lifecycle check under a row lock.

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument, warn};

use crate::api::decision::{DecisionResponse, MatchSummary};
use crate::db::capacity::count_commitments;
use crate::db::collaborations::create_collaboration;
use crate::db::PgPool;
use crate::lifecycle::{Actor, Decision, DecisionState, LifecycleError, MatchLifecycle, Transition};
use crate::matching::RecommendedMatch;
use crate::policy::CommitmentPolicy;

#[derive(Debug, Error)]
pub enum MatchStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("match not found: {0}")]
    MatchNotFound(i64),
    #[error("{actor} already decided on match {match_id}")]
    AlreadyDecided { match_id: i64, actor: Actor },
    #[error("match {match_id} is {state} and accepts no further decisions")]
    Terminal { match_id: i64, state: String },
    #[error("user {user_id} is at capacity ({commitments} of {cap} commitments)")]
    CapacityExceeded {
        user_id: i64,
        cap: i64,
        commitments: i64,
    },
    #[error("stored decision value is invalid: {0}")]
    Decision(String),
}

/// Result of a recorded decision, including the collaboration created when
/// the decision confirmed the match.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub match_id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub owner_decision: DecisionState,
    pub user_decision: DecisionState,
    pub state: MatchLifecycle,
    pub collaboration_id: Option<i64>,
}

impl DecisionOutcome {
    pub fn into_response(self) -> DecisionResponse {
        DecisionResponse {
            match_id: self.match_id,
            owner_decision: self.owner_decision.as_str().to_string(),
            user_decision: self.user_decision.as_str().to_string(),
            state: self.state.state_str().to_string(),
            collaboration_id: self.collaboration_id,
        }
    }
}

fn decision_column(actor: Actor) -> &'static str {
    match actor {
        Actor::Owner => "owner_decision",
        Actor::User => "user_decision",
    }
}

fn parse_decisions(
    owner: &str,
    user: &str,
) -> Result<(DecisionState, DecisionState), MatchStorageError> {
    let owner = DecisionState::parse(owner)
        .ok_or_else(|| MatchStorageError::Decision(owner.to_string()))?;
    let user =
        DecisionState::parse(user).ok_or_else(|| MatchStorageError::Decision(user.to_string()))?;
    Ok((owner, user))
}

/// Record one side's accept/reject on a match, in a single transaction.
///
/// The match row is locked first so concurrent decisions serialize. When the
/// decision would confirm the match, the candidate's user row is locked and
/// their commitments recounted before anything is written; a candidate at
/// capacity rolls the whole decision back.
#[instrument(skip(pool, policy, reason))]
pub async fn record_decision(
    pool: &PgPool,
    policy: &CommitmentPolicy,
    match_id: i64,
    actor: Actor,
    decision: Decision,
    reason: Option<&str>,
) -> Result<DecisionOutcome, MatchStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt(
            "SELECT project_id, recommended_user_id, required_skill,
                    owner_decision, user_decision, state
             FROM konverge.project_matches
             WHERE match_id = $1
             FOR UPDATE",
            &[&match_id],
        )
        .await?
        .ok_or(MatchStorageError::MatchNotFound(match_id))?;

    let project_id: i64 = row.get("project_id");
    let user_id: i64 = row.get("recommended_user_id");
    let required_skill: String = row.get("required_skill");
    let (owner_state, user_state) =
        parse_decisions(row.get("owner_decision"), row.get("user_decision"))?;

    let lifecycle = MatchLifecycle::from_decisions(owner_state, user_state);
    let transition = lifecycle.apply(actor, decision).map_err(|e| match e {
        LifecycleError::AlreadyDecided { actor } => {
            MatchStorageError::AlreadyDecided { match_id, actor }
        }
        LifecycleError::Terminal { state } => MatchStorageError::Terminal {
            match_id,
            state: state.to_string(),
        },
    })?;

    let column = decision_column(actor);
    let decided: DecisionState = decision.into();
    let mut collaboration_id = None;

    match transition {
        Transition::Record => {
            let sql = format!(
                "UPDATE konverge.project_matches
                 SET {column} = $2, decision_reason = COALESCE($3, decision_reason)
                 WHERE match_id = $1"
            );
            tx.execute(sql.as_str(), &[&match_id, &decided.as_str(), &reason])
                .await?;
        }
        Transition::Close => {
            let sql = format!(
                "UPDATE konverge.project_matches
                 SET {column} = $2,
                     state = 'closed',
                     decided_at = NOW(),
                     decision_reason = COALESCE($3, decision_reason)
                 WHERE match_id = $1"
            );
            tx.execute(sql.as_str(), &[&match_id, &decided.as_str(), &reason])
                .await?;
        }
        Transition::Confirm => {
            // Lock the candidate row so two confirming decisions for the same
            // user cannot both pass the capacity count.
            tx.query_opt(
                "SELECT user_id FROM konverge.users WHERE user_id = $1 FOR UPDATE",
                &[&user_id],
            )
            .await?;

            let commitments = count_commitments(&tx, user_id).await?;
            if !policy.can_accept(commitments) {
                warn!(match_id, user_id, commitments, "candidate at capacity");
                return Err(MatchStorageError::CapacityExceeded {
                    user_id,
                    cap: policy.cap,
                    commitments,
                });
            }

            let sql = format!(
                "UPDATE konverge.project_matches
                 SET {column} = $2,
                     state = 'confirmed',
                     decided_at = NOW(),
                     decision_reason = COALESCE($3, decision_reason)
                 WHERE match_id = $1"
            );
            tx.execute(sql.as_str(), &[&match_id, &decided.as_str(), &reason])
                .await?;

            collaboration_id =
                Some(create_collaboration(&tx, project_id, user_id, &required_skill).await?);
        }
    }

    tx.commit().await?;

    let (owner_decision, user_decision) = match actor {
        Actor::Owner => (decided, user_state),
        Actor::User => (owner_state, decided),
    };
    let state = MatchLifecycle::from_decisions(owner_decision, user_decision);

    info!(
        match_id,
        actor = actor.as_str(),
        decision = ?decision,
        state = state.state_str(),
        "decision recorded"
    );

    Ok(DecisionOutcome {
        match_id,
        project_id,
        user_id,
        owner_decision,
        user_decision,
        state,
        collaboration_id,
    })
}

/// Persist recommender output for a project. Pairs already recommended are
/// skipped, so re-running the recommender never duplicates a match.
#[instrument(skip(pool, recommendations), fields(count = recommendations.len()))]
pub async fn insert_recommendations(
    pool: &PgPool,
    project_id: i64,
    recommendations: &[RecommendedMatch],
) -> Result<u64, MatchStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let mut created = 0;
    for rec in recommendations {
        created += tx
            .execute(
                "INSERT INTO konverge.project_matches
                    (project_id, recommended_user_id, required_skill,
                     skill_match_score, engagement_snapshot, rating_snapshot)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (project_id, recommended_user_id) DO NOTHING",
                &[
                    &project_id,
                    &rec.user_id,
                    &rec.required_skill,
                    &rec.score,
                    &rec.engagement_snapshot,
                    &rec.rating_snapshot,
                ],
            )
            .await?;
    }

    tx.commit().await?;
    Ok(created)
}

fn summary_from_row(row: &tokio_postgres::Row) -> MatchSummary {
    MatchSummary {
        match_id: row.get("match_id"),
        project_id: row.get("project_id"),
        user_id: row.get("recommended_user_id"),
        required_skill: row.get("required_skill"),
        skill_match_score: row.get("skill_match_score"),
        engagement_snapshot: row.get("engagement_snapshot"),
        rating_snapshot: row.get("rating_snapshot"),
        owner_decision: row.get("owner_decision"),
        user_decision: row.get("user_decision"),
        state: row.get("state"),
        created_at: row.get::<_, DateTime<Utc>>("created_at"),
    }
}

/// All matches for a project, newest first.
#[instrument(skip(pool))]
pub async fn fetch_matches_for_project(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<MatchSummary>, MatchStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT match_id, project_id, recommended_user_id, required_skill,
                    skill_match_score, engagement_snapshot, rating_snapshot,
                    owner_decision, user_decision, state, created_at
             FROM konverge.project_matches
             WHERE project_id = $1
             ORDER BY skill_match_score DESC, created_at DESC",
            &[&project_id],
        )
        .await?;
    Ok(rows.iter().map(summary_from_row).collect())
}

/// Open matches where the given user is the recommended candidate.
#[instrument(skip(pool))]
pub async fn fetch_open_matches_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<MatchSummary>, MatchStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT match_id, project_id, recommended_user_id, required_skill,
                    skill_match_score, engagement_snapshot, rating_snapshot,
                    owner_decision, user_decision, state, created_at
             FROM konverge.project_matches
             WHERE recommended_user_id = $1 AND state = 'open'
             ORDER BY created_at DESC",
            &[&user_id],
        )
        .await?;
    Ok(rows.iter().map(summary_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_column_is_actor_specific() {
        assert_eq!(decision_column(Actor::Owner), "owner_decision");
        assert_eq!(decision_column(Actor::User), "user_decision");
    }

    #[test]
    fn parse_decisions_rejects_unknown_values() {
        assert!(parse_decisions("pending", "accepted").is_ok());
        assert!(matches!(
            parse_decisions("maybe", "pending"),
            Err(MatchStorageError::Decision(_))
        ));
    }
}
