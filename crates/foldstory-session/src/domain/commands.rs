//! Commands accepted by the session engine.
//!
//! One struct per mutating operation; the HTTP layer builds these from
//! request bodies after resolving the caller's identity.

use super::session::WordCountRange;

/// Create a new session with the caller as first contributor.
#[derive(Debug, Clone)]
pub struct CreateSession {
    /// Roster capacity, validated against policy bounds.
    pub max_contributors: usize,
    /// Word-count bounds for every segment.
    pub word_count_range: WordCountRange,
    /// Resolved anonymous identity of the creator.
    pub creator_identity: String,
}

/// Join an existing session (idempotent per identity).
#[derive(Debug, Clone)]
pub struct JoinSession {
    /// The session to join.
    pub session_id: String,
    /// Resolved anonymous identity of the joiner.
    pub identity: String,
}

/// Explicit host start of a waiting session.
#[derive(Debug, Clone)]
pub struct StartSession {
    /// The session to start.
    pub session_id: String,
    /// The creator's contributor token.
    pub contributor_token: String,
}

/// Submit a segment for the caller's turn.
#[derive(Debug, Clone)]
pub struct SubmitSegment {
    /// The session being written.
    pub session_id: String,
    /// The caller's contributor token.
    pub contributor_token: String,
    /// The segment text.
    pub text: String,
}

/// Pass the caller's turn without writing.
#[derive(Debug, Clone)]
pub struct PassTurn {
    /// The session in play.
    pub session_id: String,
    /// The caller's contributor token.
    pub contributor_token: String,
}

/// Quit the session, retaining the rotation slot.
#[derive(Debug, Clone)]
pub struct LeaveSession {
    /// The session being left.
    pub session_id: String,
    /// The caller's contributor token.
    pub contributor_token: String,
}

/// Vote to end the session before natural completion.
#[derive(Debug, Clone)]
pub struct VoteToEnd {
    /// The session being voted on.
    pub session_id: String,
    /// The caller's contributor token.
    pub contributor_token: String,
}
