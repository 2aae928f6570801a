use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::error;

use kv_common::db::{
    CapacityFetchError, CollaborationStorageError, MatchStorageError, ProjectStorageError,
    RatingStorageError, UserStorageError,
};
use kv_common::matching::RecommendError;

tokio::task_local! {
    static REQUEST_ID: String;
}

fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .replace(['\n', '\r'], " ");

    cleaned = cleaned
        .split_whitespace()
        .map(|token| {
            if token.contains("://") {
                "[redacted-url]".to_string()
            } else if let Some((base, _)) = token.split_once('?') {
                if base.is_empty() {
                    "[redacted-query]".to_string()
                } else {
                    format!("{base}?[redacted]")
                }
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.len() > MAX_LEN {
        cleaned.truncate(MAX_LEN);
        cleaned.push('…');
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        error!(
            code,
            status = %status,
            request_id = request_id.as_deref().unwrap_or(""),
            error = %self,
            "api_error"
        );

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::CapacityExceeded(_) => "capacity_exceeded",
            ApiError::TooManyRequests(_) => "too_many_requests",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Unauthorized(_) => Cow::Borrowed("unauthorized"),
            ApiError::Forbidden(_) => Cow::Borrowed("forbidden"),
            ApiError::NotFound(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Conflict(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::CapacityExceeded(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::TooManyRequests(_) => Cow::Borrowed("too many requests"),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::CapacityExceeded(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MatchStorageError> for ApiError {
    fn from(value: MatchStorageError) -> Self {
        match value {
            MatchStorageError::MatchNotFound(id) => {
                ApiError::NotFound(format!("match {id} not found"))
            }
            MatchStorageError::AlreadyDecided { .. } | MatchStorageError::Terminal { .. } => {
                ApiError::Conflict(value.to_string())
            }
            MatchStorageError::CapacityExceeded { .. } => {
                ApiError::CapacityExceeded(value.to_string())
            }
            MatchStorageError::Decision(_) => ApiError::Internal(value.to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<CollaborationStorageError> for ApiError {
    fn from(value: CollaborationStorageError) -> Self {
        match value {
            CollaborationStorageError::ActiveCollaborationNotFound { .. }
            | CollaborationStorageError::ProjectNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<CapacityFetchError> for ApiError {
    fn from(value: CapacityFetchError) -> Self {
        match value {
            CapacityFetchError::UserNotFound(id) => {
                ApiError::NotFound(format!("user {id} not found"))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<RatingStorageError> for ApiError {
    fn from(value: RatingStorageError) -> Self {
        match value {
            RatingStorageError::RatingNotFound(id) => {
                ApiError::NotFound(format!("rating {id} not found"))
            }
            RatingStorageError::AlreadySubmitted(_) => ApiError::Conflict(value.to_string()),
            RatingStorageError::WrongRater { .. } => ApiError::Forbidden(value.to_string()),
            RatingStorageError::InvalidScore(_) => ApiError::BadRequest(value.to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<ProjectStorageError> for ApiError {
    fn from(value: ProjectStorageError) -> Self {
        match value {
            ProjectStorageError::OwnerNotFound(_) | ProjectStorageError::ProjectNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            ProjectStorageError::NotOwner { .. } => ApiError::Forbidden(value.to_string()),
            ProjectStorageError::ActiveCollaborators { .. } => {
                ApiError::Conflict(value.to_string())
            }
            ProjectStorageError::NoRequiredSkills => ApiError::BadRequest(value.to_string()),
            ProjectStorageError::Recommend(err) => err.into(),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<UserStorageError> for ApiError {
    fn from(value: UserStorageError) -> Self {
        match value {
            UserStorageError::UserNotFound(id) => {
                ApiError::NotFound(format!("user {id} not found"))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<RecommendError> for ApiError {
    fn from(value: RecommendError) -> Self {
        match value {
            RecommendError::Matches(err) => err.into(),
            RecommendError::Users(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let err = ApiError::Internal("boom".into());
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["request_id"], "req-123");
    }

    #[tokio::test]
    async fn capacity_errors_use_a_distinct_conflict_code() {
        let err: ApiError = MatchStorageError::CapacityExceeded {
            user_id: 4,
            cap: 2,
            commitments: 2,
        }
        .into();
        let response = err.into_response();

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, axum::http::StatusCode::CONFLICT);
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "capacity_exceeded");
    }

    #[test]
    fn storage_not_found_maps_to_not_found() {
        let err: ApiError = MatchStorageError::MatchNotFound(9).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = RatingStorageError::AlreadySubmitted(3).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
