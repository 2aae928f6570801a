//! Builds pending match recommendations for a freshly pitched project:
//! scores the active user pool by skill overlap, keeps the candidates above
//! the threshold, and records a match per candidate with a snapshot of
//! their engagement and rating at recommendation time.

use thiserror::Error;
use tracing::{info, instrument};

use crate::db::matches::{insert_recommendations, MatchStorageError};
use crate::db::users::{fetch_candidate_pool, UserStorageError};
use crate::db::PgPool;
use crate::matching::skills::score_skill_overlap;
use crate::policy::MatchPolicy;
use crate::{CandidateProfile, ProjectRecord};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Users(#[from] UserStorageError),
    #[error(transparent)]
    Matches(#[from] MatchStorageError),
}

/// One recommendation ready to be persisted as a pending match.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedMatch {
    pub user_id: i64,
    /// The required skill the candidate is being recommended for; the first
    /// matched requirement in canonical order.
    pub required_skill: String,
    pub score: f64,
    pub engagement_snapshot: Option<f64>,
    pub rating_snapshot: Option<f64>,
}

/// Score and rank the candidate pool for a project. Pure; the caller
/// persists the result.
pub fn rank_candidates(
    policy: &MatchPolicy,
    project: &ProjectRecord,
    candidates: &[CandidateProfile],
) -> Vec<RecommendedMatch> {
    let mut ranked: Vec<RecommendedMatch> = candidates
        .iter()
        .filter(|candidate| candidate.user_id != project.owner_id)
        .filter_map(|candidate| {
            let overlap = score_skill_overlap(&project.required_skills, &candidate.skills);
            if overlap.score < policy.score_threshold {
                return None;
            }
            let required_skill = overlap.matched_skills.first().cloned()?;
            Some(RecommendedMatch {
                user_id: candidate.user_id,
                required_skill,
                score: overlap.score,
                engagement_snapshot: candidate.engagement_score,
                rating_snapshot: candidate.rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.engagement_snapshot
                    .unwrap_or(0.0)
                    .partial_cmp(&a.engagement_snapshot.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    ranked.truncate(policy.recommendation_limit);
    ranked
}

/// Recommend collaborators for a project and persist them as pending
/// matches. Returns the number of matches actually created (existing
/// (project, user) pairs are left untouched).
#[instrument(skip(pool, policy, project), fields(project_id = project.project_id))]
pub async fn recommend_for_project(
    pool: &PgPool,
    policy: &MatchPolicy,
    project: &ProjectRecord,
) -> Result<u64, RecommendError> {
    let candidates = fetch_candidate_pool(pool, project.owner_id).await?;
    let ranked = rank_candidates(policy, project, &candidates);

    if ranked.is_empty() {
        info!(project_id = project.project_id, "no candidates above threshold");
        return Ok(0);
    }

    let created = insert_recommendations(pool, project.project_id, &ranked).await?;
    info!(
        project_id = project.project_id,
        candidates = ranked.len(),
        created,
        "recommendations stored"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(user_id: i64, skills: &[&str], engagement: f64) -> CandidateProfile {
        CandidateProfile {
            user_id,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            rating: Some(4.0),
            engagement_score: Some(engagement),
        }
    }

    fn project(owner_id: i64, required: &[&str]) -> ProjectRecord {
        ProjectRecord {
            project_id: 7,
            owner_id,
            title: "realtime board".into(),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            status: "Open".into(),
            roles_available: 2,
            ..Default::default()
        }
    }

    #[test]
    fn owner_is_never_recommended_to_their_own_project() {
        let ranked = rank_candidates(
            &MatchPolicy::default(),
            &project(1, &["rust"]),
            &[candidate(1, &["rust"], 90.0), candidate(2, &["rust"], 10.0)],
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].user_id, 2);
    }

    #[test]
    fn below_threshold_candidates_are_dropped() {
        let ranked = rank_candidates(
            &MatchPolicy::default(),
            &project(1, &["rust", "react", "postgres", "k8s"]),
            &[candidate(2, &["rust"], 50.0), candidate(3, &["css"], 99.0)],
        );
        // 25% and 0% both fall under the 30% default threshold.
        assert!(ranked.is_empty());
    }

    #[test]
    fn ranking_is_score_then_engagement() {
        let ranked = rank_candidates(
            &MatchPolicy::default(),
            &project(1, &["rust", "react"]),
            &[
                candidate(2, &["rust"], 80.0),
                candidate(3, &["rust", "react"], 10.0),
                candidate(4, &["rust"], 95.0),
            ],
        );
        let ids: Vec<i64> = ranked.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![3, 4, 2]);
    }

    #[test]
    fn limit_caps_the_recommendation_count() {
        let policy = MatchPolicy {
            recommendation_limit: 2,
            ..MatchPolicy::default()
        };
        let pool: Vec<CandidateProfile> = (2..10)
            .map(|id| candidate(id, &["rust"], id as f64))
            .collect();
        let ranked = rank_candidates(&policy, &project(1, &["rust"]), &pool);
        assert_eq!(ranked.len(), 2);
        // Highest engagement wins the tie on score.
        assert_eq!(ranked[0].user_id, 9);
    }

    #[test]
    fn snapshots_carry_candidate_state_at_recommendation_time() {
        let ranked = rank_candidates(
            &MatchPolicy::default(),
            &project(1, &["rust"]),
            &[candidate(2, &["Rust"], 42.0)],
        );
        assert_eq!(ranked[0].engagement_snapshot, Some(42.0));
        assert_eq!(ranked[0].rating_snapshot, Some(4.0));
        assert_eq!(ranked[0].required_skill, "rust");
        assert_eq!(ranked[0].score, 100.0);
    }
}
