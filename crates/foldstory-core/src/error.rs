//! Engine error types.

use thiserror::Error;

/// Top-level error type for the session engine.
///
/// Every variant except `VersionConflict`, `IdCollision` and
/// `Infrastructure` describes a caller error that is deterministic and
/// re-derivable from current session state; the engine never retries
/// internally on the caller's behalf.
#[derive(Debug, Error)]
pub enum GameError {
    /// Session configuration failed validation at creation time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No session exists with the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The roster already holds the session's maximum contributor count.
    #[error("session {0} is full")]
    SessionFull(String),

    /// The session is not accepting joins (or a start) in its current status.
    #[error("session {session_id} is not joinable: {reason}")]
    SessionNotJoinable {
        /// The session that rejected the join.
        session_id: String,
        /// Why the join was rejected.
        reason: String,
    },

    /// The session is not in the `active` status required for mutation.
    #[error("session {session_id} is not active (status: {status})")]
    SessionNotActive {
        /// The session that rejected the mutation.
        session_id: String,
        /// The status the session was observed in.
        status: String,
    },

    /// The token resolves to a contributor whose turn it is not.
    #[error("not your turn")]
    NotYourTurn,

    /// The token does not authorize the attempted operation.
    #[error("invalid token")]
    InvalidToken,

    /// Submitted text falls outside the session's word-count range.
    #[error("word count {actual} outside allowed range {min}..={max}")]
    WordCountOutOfRange {
        /// Minimum accepted word count.
        min: usize,
        /// Maximum accepted word count.
        max: usize,
        /// Word count of the rejected submission.
        actual: usize,
    },

    /// Optimistic concurrency conflict on a session record.
    #[error("version conflict on session {session_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The session that had the conflict.
        session_id: String,
        /// The version the writer expected.
        expected: i64,
        /// The version actually found.
        actual: i64,
    },

    /// A freshly allocated session id is already taken.
    ///
    /// Only surfaces to the id-allocation retry loop; it never crosses the
    /// HTTP boundary.
    #[error("session id collision: {0}")]
    IdCollision(String),

    /// An infrastructure/storage error. The only retryable category.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
