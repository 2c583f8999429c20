//! Foldstory — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foldstory_core::error::GameError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `GameError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            GameError::InvalidConfiguration(_) => {
                (StatusCode::BAD_REQUEST, "invalid_configuration")
            }
            GameError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            GameError::SessionFull(_) => (StatusCode::CONFLICT, "session_full"),
            GameError::SessionNotJoinable { .. } => (StatusCode::CONFLICT, "session_not_joinable"),
            GameError::SessionNotActive { .. } => (StatusCode::CONFLICT, "session_not_active"),
            GameError::NotYourTurn => (StatusCode::FORBIDDEN, "not_your_turn"),
            GameError::InvalidToken => (StatusCode::FORBIDDEN, "invalid_token"),
            GameError::WordCountOutOfRange { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "word_count_out_of_range")
            }
            GameError::VersionConflict { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "version_conflict")
            }
            GameError::IdCollision(_) | GameError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: GameError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_invalid_configuration_maps_to_400() {
        assert_eq!(
            status_of(GameError::InvalidConfiguration("bad bounds".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_session_not_found_maps_to_404() {
        assert_eq!(
            status_of(GameError::SessionNotFound("abc12345".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_roster_and_status_errors_map_to_409() {
        assert_eq!(
            status_of(GameError::SessionFull("abc12345".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(GameError::SessionNotJoinable {
                session_id: "abc12345".into(),
                reason: "status is completed".into(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(GameError::SessionNotActive {
                session_id: "abc12345".into(),
                status: "expired".into(),
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_token_and_turn_errors_map_to_403() {
        assert_eq!(status_of(GameError::NotYourTurn), StatusCode::FORBIDDEN);
        assert_eq!(status_of(GameError::InvalidToken), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_word_count_maps_to_422() {
        assert_eq!(
            status_of(GameError::WordCountOutOfRange {
                min: 10,
                max: 200,
                actual: 9,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_version_conflict_maps_to_503() {
        assert_eq!(
            status_of(GameError::VersionConflict {
                session_id: "abc12345".into(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        assert_eq!(
            status_of(GameError::IdCollision("abc12345".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(GameError::Infrastructure("store down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
