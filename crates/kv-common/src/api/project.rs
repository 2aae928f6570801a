use serde::{Deserialize, Serialize};

/// Body of `POST /api/projects` (a pitch).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub owner_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    #[serde(default = "default_roles_available")]
    pub roles_available: i32,
}

const fn default_roles_available() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub project_id: i64,
    pub status: String,
    pub required_skills: Vec<String>,
    /// Pending matches created by the recommender for this pitch.
    pub matches_created: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_roles_to_one() {
        let req: CreateProjectRequest = serde_json::from_str(
            r#"{"ownerId":3,"title":"p2p sync","requiredSkills":["Rust","WebRTC"]}"#,
        )
        .unwrap();
        assert_eq!(req.roles_available, 1);
        assert_eq!(req.required_skills.len(), 2);
    }
}
