use serde::{Deserialize, Serialize};

/// Body of `POST /api/collaborations/finish`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishCollaborationRequest {
    pub user_id: i64,
    pub project_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishCollaborationResponse {
    pub message: String,
    pub active_collaborations: i64,
    pub can_join_new_projects: bool,
    /// Pending ratings opened by this completion, one per party.
    pub ratings_created: i64,
}

/// Capacity-gate snapshot for `GET /api/users/:id/collaboration-status`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationStatus {
    pub user_id: i64,
    pub active_collaborations: i64,
    pub completed_collaborations: i64,
    pub pitched_projects: i64,
    pub total_commitments: i64,
    pub account_status: String,
    pub can_join_new_projects: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_request_uses_camel_case_keys() {
        let req: FinishCollaborationRequest =
            serde_json::from_str(r#"{"userId":4,"projectId":9}"#).unwrap();
        assert_eq!(req.user_id, 4);
        assert_eq!(req.project_id, 9);
    }

    #[test]
    fn status_serializes_the_gate_fields() {
        let status = CollaborationStatus {
            user_id: 4,
            active_collaborations: 1,
            completed_collaborations: 3,
            pitched_projects: 1,
            total_commitments: 2,
            account_status: "active".into(),
            can_join_new_projects: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["totalCommitments"], 2);
        assert_eq!(json["canJoinNewProjects"], false);
    }
}
