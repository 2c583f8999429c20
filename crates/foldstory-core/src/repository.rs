//! Session storage abstraction.
//!
//! The engine persists whole session records keyed by session id. Any
//! backing store that can do an atomic insert and a version-checked
//! replace satisfies this trait; the engine contains no other storage
//! assumptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GameError;

/// Stored representation of one session.
///
/// The payload is opaque JSON at this layer; the session crate owns its
/// shape. `version` increments by one on every successful update.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Session identifier (the link-visible short id).
    pub session_id: String,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Serialized session state.
    pub state: serde_json::Value,
    /// Timestamp of the last successful write.
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for loading and storing session records.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load the record for a session, or `None` if the id is unknown.
    ///
    /// A load must observe a fully-applied record: implementations may not
    /// expose a session mid-update.
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, GameError>;

    /// Insert a brand-new record.
    ///
    /// Fails with `GameError::IdCollision` if the id is already taken, so
    /// the id-allocation loop can retry with a fresh id.
    async fn insert(&self, record: SessionRecord) -> Result<(), GameError>;

    /// Replace an existing record if and only if its current version equals
    /// `expected_version`.
    ///
    /// Fails with `GameError::VersionConflict` when another writer got
    /// there first, and `GameError::SessionNotFound` if the record
    /// disappeared.
    async fn update(
        &self,
        expected_version: i64,
        record: SessionRecord,
    ) -> Result<(), GameError>;
}
