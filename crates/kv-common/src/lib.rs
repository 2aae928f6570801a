pub mod api;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod matching;
pub mod policy;
pub mod skill_normalizer;

/// Candidate profile used by the recommender when scoring the user pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateProfile {
    pub user_id: i64,
    pub skills: Vec<String>,
    pub rating: Option<f64>,
    pub engagement_score: Option<f64>,
}

/// A pitched project as the matching code sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRecord {
    pub project_id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub status: String,
    pub roles_available: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
