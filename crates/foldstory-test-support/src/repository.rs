//! Test repositories — mock `SessionRepository` implementations.

use async_trait::async_trait;
use foldstory_core::error::GameError;
use foldstory_core::repository::{SessionRecord, SessionRepository};

/// A session repository that always returns an infrastructure error.
/// Useful for testing error-handling paths.
#[derive(Debug)]
pub struct FailingSessionRepository;

#[async_trait]
impl SessionRepository for FailingSessionRepository {
    async fn load(&self, _session_id: &str) -> Result<Option<SessionRecord>, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn insert(&self, _record: SessionRecord) -> Result<(), GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn update(
        &self,
        _expected_version: i64,
        _record: SessionRecord,
    ) -> Result<(), GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }
}
