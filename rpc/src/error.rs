//! API error type and its HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ballot_engine::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) => match e {
                EngineError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
                EngineError::NotFound(_) | EngineError::CandidateNotFound => {
                    StatusCode::NOT_FOUND
                }
                EngineError::AlreadyVoted | EngineError::Conflict(_) => StatusCode::CONFLICT,
                EngineError::VotingClosed | EngineError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                EngineError::StorageTimeout => StatusCode::GATEWAY_TIMEOUT,
                EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.kind(),
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_expected_statuses() {
        let cases: Vec<(EngineError, StatusCode)> = vec![
            (
                EngineError::Unauthenticated("x".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (EngineError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (EngineError::NotFound("vote".into()), StatusCode::NOT_FOUND),
            (EngineError::CandidateNotFound, StatusCode::NOT_FOUND),
            (EngineError::AlreadyVoted, StatusCode::CONFLICT),
            (EngineError::Conflict("dup".into()), StatusCode::CONFLICT),
            (EngineError::VotingClosed, StatusCode::BAD_REQUEST),
            (
                EngineError::InvalidInput("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (EngineError::StorageTimeout, StatusCode::GATEWAY_TIMEOUT),
            (
                EngineError::StorageUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
