use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/ratings/:id/submit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
    pub rater_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRating {
    pub rating_id: i64,
    pub ratee_id: i64,
    pub score: f64,
    pub status: String,
    /// The ratee's running average after folding in this score.
    pub ratee_rating: f64,
}

/// One open rating request awaiting the rater.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRating {
    pub rating_id: i64,
    pub project_id: Option<i64>,
    pub project_title: Option<String>,
    pub ratee_id: i64,
    pub ratee_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_parses_optional_feedback() {
        let req: SubmitRatingRequest =
            serde_json::from_str(r#"{"score":4.5,"raterId":1}"#).unwrap();
        assert_eq!(req.score, 4.5);
        assert!(req.feedback.is_none());

        let req: SubmitRatingRequest =
            serde_json::from_str(r#"{"score":3,"feedback":"great partner","raterId":1}"#).unwrap();
        assert_eq!(req.feedback.as_deref(), Some("great partner"));
    }
}
