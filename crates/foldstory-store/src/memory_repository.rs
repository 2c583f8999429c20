//! In-memory session repository.
//!
//! Backs the single-process deployment and every test. The map mutex is
//! held only for the synchronous map operation, never across an await, so
//! the compare-and-swap in `update` is atomic with respect to other
//! writers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use foldstory_core::error::GameError;
use foldstory_core::repository::{SessionRecord, SessionRepository};

/// `SessionRepository` over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, SessionRecord>>, GameError> {
        self.records
            .lock()
            .map_err(|e| GameError::Infrastructure(format!("session map mutex poisoned: {e}")))
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, GameError> {
        Ok(self.guard()?.get(session_id).cloned())
    }

    async fn insert(&self, record: SessionRecord) -> Result<(), GameError> {
        let mut records = self.guard()?;
        if records.contains_key(&record.session_id) {
            return Err(GameError::IdCollision(record.session_id));
        }
        records.insert(record.session_id.clone(), record);
        Ok(())
    }

    async fn update(&self, expected_version: i64, record: SessionRecord) -> Result<(), GameError> {
        let mut records = self.guard()?;
        let Some(current) = records.get(&record.session_id) else {
            return Err(GameError::SessionNotFound(record.session_id));
        };
        if current.version != expected_version {
            return Err(GameError::VersionConflict {
                session_id: record.session_id,
                expected: expected_version,
                actual: current.version,
            });
        }
        records.insert(record.session_id.clone(), record);
        Ok(())
    }
}
