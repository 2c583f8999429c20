//! Routes for the session engine.
//!
//! Callers identify themselves with a durable anonymous token in the
//! `x-anon-token` header. When the header is absent a token is minted and
//! echoed back in the response for the client to persist; capability
//! tokens for mutations travel in request bodies, and the state query
//! accepts either capability as a query parameter.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use foldstory_core::error::GameError;
use foldstory_identity::IdentityResolution;
use foldstory_session::application::command_handlers;
use foldstory_session::application::query_handlers::{self, SessionView};
use foldstory_session::domain::commands;
use foldstory_session::domain::session::WordCountRange;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the client's durable anonymous token.
pub const ANON_TOKEN_HEADER: &str = "x-anon-token";

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Roster capacity for the new session.
    pub max_contributors: usize,
    /// Word-count bounds for every segment.
    pub word_count_range: WordCountRange,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    /// The allocated session id.
    pub session_id: String,
    /// Link granting the creator's contributor capability.
    pub contributor_link: String,
    /// Link granting read-only observation.
    pub observer_link: String,
    /// Freshly minted anonymous token, present only when the request
    /// carried none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_token: Option<String>,
}

/// Response body for POST /{session_id}/join.
#[derive(Debug, Serialize)]
pub struct JoinSessionResponse {
    /// The joiner's contributor id.
    pub contributor_id: String,
    /// Link for the joiner's contributor slot.
    pub contributor_link: String,
    /// Freshly minted anonymous token, present only when the request
    /// carried none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_token: Option<String>,
}

/// Request body for token-only commands (start, pass, leave, vote).
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// The caller's contributor token.
    pub contributor_token: String,
}

/// Request body for POST /{session_id}/submit.
#[derive(Debug, Deserialize)]
pub struct SubmitSegmentRequest {
    /// The caller's contributor token.
    pub contributor_token: String,
    /// The segment text.
    pub text: String,
}

/// Query parameters for GET /{session_id}/state.
#[derive(Debug, Deserialize)]
pub struct StateQuery {
    /// Contributor or observer capability token.
    pub token: String,
}

fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<IdentityResolution, ApiError> {
    let presented = headers
        .get(ANON_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let mut tokens = state.tokens.lock().map_err(|e| {
        ApiError(GameError::Infrastructure(format!(
            "token source mutex poisoned: {e}"
        )))
    })?;
    Ok(foldstory_identity::resolve(presented, &mut *tokens))
}

/// POST /
#[instrument(skip(state, headers, request))]
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let resolution = resolve_identity(&state, &headers)?;
    let command = commands::CreateSession {
        max_contributors: request.max_contributors,
        word_count_range: request.word_count_range,
        creator_identity: resolution.identity,
    };

    info!("handling create_session command");

    let created = command_handlers::handle_create_session(
        &command,
        state.clock.as_ref(),
        &state.tokens,
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: created.session_id,
            contributor_link: created.contributor_link,
            observer_link: created.observer_link,
            anon_token: resolution.minted_token,
        }),
    ))
}

/// POST /{session_id}/join
#[instrument(skip(state, headers), fields(session_id = %session_id))]
async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    let resolution = resolve_identity(&state, &headers)?;
    let command = commands::JoinSession {
        session_id,
        identity: resolution.identity,
    };

    info!("handling join_session command");

    let joined = command_handlers::handle_join_session(
        &command,
        state.clock.as_ref(),
        &state.tokens,
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(JoinSessionResponse {
        contributor_id: joined.contributor_id,
        contributor_link: joined.contributor_link,
        anon_token: resolution.minted_token,
    }))
}

/// POST /{session_id}/start
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::StartSession {
        session_id,
        contributor_token: request.contributor_token,
    };

    info!("handling start_session command");

    let view = command_handlers::handle_start_session(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// POST /{session_id}/submit
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn submit_segment(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitSegmentRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::SubmitSegment {
        session_id,
        contributor_token: request.contributor_token,
        text: request.text,
    };

    info!("handling submit_segment command");

    let view = command_handlers::handle_submit_segment(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// POST /{session_id}/pass
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn pass_turn(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::PassTurn {
        session_id,
        contributor_token: request.contributor_token,
    };

    info!("handling pass_turn command");

    let view = command_handlers::handle_pass_turn(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// POST /{session_id}/leave
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn leave_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::LeaveSession {
        session_id,
        contributor_token: request.contributor_token,
    };

    info!("handling leave_session command");

    let view = command_handlers::handle_leave_session(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// POST /{session_id}/vote
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn vote_to_end(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::VoteToEnd {
        session_id,
        contributor_token: request.contributor_token,
    };

    info!("handling vote_to_end command");

    let view = command_handlers::handle_vote_to_end(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// GET /{session_id}/state
#[instrument(skip(state, query), fields(session_id = %session_id))]
async fn get_session_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<StateQuery>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_state(
        &session_id,
        &query.token,
        state.clock.as_ref(),
        state.repository.as_ref(),
        &state.policy,
    )
    .await?;

    Ok(Json(view))
}

/// Returns the router for the session engine.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{session_id}/join", post(join_session))
        .route("/{session_id}/start", post(start_session))
        .route("/{session_id}/submit", post(submit_segment))
        .route("/{session_id}/pass", post(pass_turn))
        .route("/{session_id}/leave", post(leave_session))
        .route("/{session_id}/vote", post(vote_to_end))
        .route("/{session_id}/state", get(get_session_state))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::TimeZone;
    use foldstory_core::clock::Clock;
    use foldstory_core::repository::SessionRepository;
    use foldstory_core::tokens::TokenSource;
    use foldstory_session::domain::policy::EnginePolicy;
    use foldstory_store::MemorySessionRepository;
    use foldstory_test_support::{FailingSessionRepository, FixedClock, SequenceTokens};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(repository: Arc<dyn SessionRepository>) -> AppState {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(
            chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let tokens: Arc<Mutex<dyn TokenSource + Send>> =
            Arc::new(Mutex::new(SequenceTokens::default()));
        AppState::new(
            repository,
            clock,
            tokens,
            Arc::new(EnginePolicy::default()),
        )
    }

    fn test_app_state() -> AppState {
        app_state_with(Arc::new(MemorySessionRepository::new()))
    }

    fn failing_app_state() -> AppState {
        app_state_with(Arc::new(FailingSessionRepository))
    }

    fn create_request(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn valid_create_body() -> Value {
        serde_json::json!({
            "max_contributors": 4,
            "word_count_range": { "min": 10, "max": 200 }
        })
    }

    #[tokio::test]
    async fn test_create_session_returns_201_and_mints_anon_token() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let response = app.oneshot(create_request(&valid_create_body())).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();

        assert!(json["session_id"].is_string());
        assert!(json["contributor_link"].as_str().unwrap().starts_with("/session/"));
        assert!(json["observer_link"].as_str().unwrap().contains("/observer/"));
        // No x-anon-token header was sent, so one is minted and echoed.
        assert!(json["anon_token"].is_string());
    }

    #[tokio::test]
    async fn test_create_session_with_header_echoes_no_token() {
        // Arrange
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .header(ANON_TOKEN_HEADER, "durable-client-token")
            .body(Body::from(serde_json::to_vec(&valid_create_body()).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();
        assert!(json.get("anon_token").is_none());
    }

    #[tokio::test]
    async fn test_create_session_returns_422_for_missing_body() {
        // Arrange
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert — Axum returns 422 for deserialization failures.
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_session_returns_500_when_repository_fails() {
        // Arrange
        let app = router().with_state(failing_app_state());

        // Act
        let response = app.oneshot(create_request(&valid_create_body())).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(json["error"], "infrastructure_error");
    }
}
