use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Decision;

/// Body of `POST /api/matches/:id/{owner,user}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Result of recording one side's decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub match_id: i64,
    pub owner_decision: String,
    pub user_decision: String,
    /// `open` | `confirmed` | `closed`
    pub state: String,
    /// Set when this decision confirmed the match and created the
    /// collaboration (or returned the already-active one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration_id: Option<i64>,
}

/// A match as listed for the owner's pitched-project view or the
/// candidate's inbox.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub required_skill: String,
    pub skill_match_score: f64,
    pub engagement_snapshot: Option<f64>,
    pub rating_snapshot: Option<f64>,
    pub owner_decision: String,
    pub user_decision: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_request_parses_lowercase_decisions() {
        let req: DecisionRequest =
            serde_json::from_str(r#"{"decision":"accepted"}"#).unwrap();
        assert_eq!(req.decision, Decision::Accepted);
        assert!(req.reason.is_none());

        let req: DecisionRequest =
            serde_json::from_str(r#"{"decision":"rejected","reason":"no capacity"}"#).unwrap();
        assert_eq!(req.decision, Decision::Rejected);
        assert_eq!(req.reason.as_deref(), Some("no capacity"));
    }

    #[test]
    fn decision_request_rejects_unknown_decisions() {
        assert!(serde_json::from_str::<DecisionRequest>(r#"{"decision":"maybe"}"#).is_err());
    }

    #[test]
    fn response_omits_collaboration_id_when_absent() {
        let response = DecisionResponse {
            match_id: 1,
            owner_decision: "accepted".into(),
            user_decision: "pending".into(),
            state: "open".into(),
            collaboration_id: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("collaborationId").is_none());
        assert_eq!(json["ownerDecision"], "accepted");
    }
}
