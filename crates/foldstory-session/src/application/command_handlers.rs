//! Command handlers for the session engine.
//!
//! Each handler orchestrates one mutating operation: load the session
//! record, apply the domain mutation against *current* state, and persist
//! with a version check. On a version conflict the whole cycle re-runs,
//! so a racing loser re-validates against the state that beat it and gets
//! the proper domain error — never a spurious conflict and never a
//! double-applied turn.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use foldstory_core::clock::Clock;
use foldstory_core::error::GameError;
use foldstory_core::repository::{SessionRecord, SessionRepository};
use foldstory_core::tokens::TokenSource;
use foldstory_links::{Role, build_path};

use crate::application::query_handlers::{self, SessionView};
use crate::domain::commands::{
    CreateSession, JoinSession, LeaveSession, PassTurn, StartSession, SubmitSegment, VoteToEnd,
};
use crate::domain::policy::EnginePolicy;
use crate::domain::session::{Contributor, ContributorStatus, Session};

/// Attempts at allocating a collision-free session id.
const MAX_ID_ATTEMPTS: usize = 5;

/// Attempts at winning a contended compare-and-swap before giving up.
const MAX_CAS_ATTEMPTS: usize = 5;

/// Result of a successful `CreateSession`.
#[derive(Debug)]
pub struct CreatedSession {
    /// The freshly allocated session id.
    pub session_id: String,
    /// Canonical link granting the creator's contributor capability.
    pub contributor_link: String,
    /// Canonical link granting read-only observation.
    pub observer_link: String,
}

/// Result of a successful `JoinSession`.
#[derive(Debug)]
pub struct JoinedSession {
    /// Canonical link for the joiner's contributor slot (the existing one
    /// on an idempotent re-join).
    pub contributor_link: String,
    /// The joiner's contributor id.
    pub contributor_id: String,
}

fn lock_tokens<'a>(
    tokens: &'a Mutex<dyn TokenSource + Send>,
) -> Result<MutexGuard<'a, dyn TokenSource + Send + 'static>, GameError> {
    tokens
        .lock()
        .map_err(|e| GameError::Infrastructure(format!("token source mutex poisoned: {e}")))
}

/// Deserializes a stored record back into the session aggregate.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if the payload does not decode.
pub(crate) fn decode(record: &SessionRecord) -> Result<Session, GameError> {
    serde_json::from_value(record.state.clone())
        .map_err(|e| GameError::Infrastructure(format!("session deserialization failed: {e}")))
}

fn to_record(
    session: &Session,
    version: i64,
    now: DateTime<Utc>,
) -> Result<SessionRecord, GameError> {
    Ok(SessionRecord {
        session_id: session.id.clone(),
        version,
        state: serde_json::to_value(session)
            .map_err(|e| GameError::Infrastructure(format!("session serialization failed: {e}")))?,
        updated_at: now,
    })
}

/// Load–mutate–CAS cycle for one session.
///
/// The mutation closure always sees freshly loaded state, so turn and
/// status checks re-validate under contention instead of acting on a
/// snapshot captured before the race.
async fn mutate_session<F>(
    repo: &dyn SessionRepository,
    session_id: &str,
    now: DateTime<Utc>,
    mut mutate: F,
) -> Result<Session, GameError>
where
    F: FnMut(&mut Session) -> Result<(), GameError>,
{
    for _ in 0..MAX_CAS_ATTEMPTS {
        let record = repo
            .load(session_id)
            .await?
            .ok_or_else(|| GameError::SessionNotFound(session_id.to_owned()))?;
        let mut session = decode(&record)?;
        mutate(&mut session)?;
        let updated = to_record(&session, record.version + 1, now)?;
        match repo.update(record.version, updated).await {
            Ok(()) => return Ok(session),
            Err(GameError::VersionConflict { .. }) => {
                debug!(session_id, "version conflict, re-validating");
            }
            Err(other) => return Err(other),
        }
    }
    Err(GameError::Infrastructure(format!(
        "session {session_id} contended beyond {MAX_CAS_ATTEMPTS} attempts"
    )))
}

fn acted_view(
    session: &Session,
    token: &str,
    now: DateTime<Utc>,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let slot = session.contributor_by_token(token)?;
    Ok(query_handlers::contributor_view(session, slot, now, policy))
}

/// Handles `CreateSession`: allocates a collision-free id, registers the
/// creator as slot 0, and persists the new session.
///
/// # Errors
///
/// Returns `GameError::InvalidConfiguration` for bad bounds, and
/// `GameError::Infrastructure` when the store fails or the id space keeps
/// colliding.
pub async fn handle_create_session(
    command: &CreateSession,
    clock: &dyn Clock,
    tokens: &Mutex<dyn TokenSource + Send>,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<CreatedSession, GameError> {
    policy.validate_session_config(command.max_contributors, command.word_count_range)?;
    let now = clock.now();

    let (contributor_token, observer_token) = {
        let mut guard = lock_tokens(tokens)?;
        (guard.capability_token(), guard.capability_token())
    };

    for _ in 0..MAX_ID_ATTEMPTS {
        // Lock only for the draw — never across an await.
        let candidate = lock_tokens(tokens)?.session_id();
        let creator_id = foldstory_identity::contributor_id(&candidate, &command.creator_identity);
        let creator = Contributor {
            id: creator_id,
            display_order: 0,
            status: ContributorStatus::Active,
            token: contributor_token.clone(),
            joined_at: now,
        };
        let session = Session::create(
            candidate,
            command.max_contributors,
            command.word_count_range,
            creator,
            observer_token.clone(),
            now,
            policy,
        )?;
        let record = to_record(&session, 1, now)?;
        match repo.insert(record).await {
            Ok(()) => {
                return Ok(CreatedSession {
                    contributor_link: build_path(&session.id, Role::Contributor, &contributor_token),
                    observer_link: build_path(&session.id, Role::Observer, &observer_token),
                    session_id: session.id,
                });
            }
            Err(GameError::IdCollision(id)) => {
                debug!(session_id = %id, "session id collision, retrying");
            }
            Err(other) => return Err(other),
        }
    }
    Err(GameError::Infrastructure(format!(
        "could not allocate a session id after {MAX_ID_ATTEMPTS} attempts"
    )))
}

/// Handles `JoinSession`: adds the identity to the roster, or returns the
/// existing slot's link on an idempotent re-join.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound`, `GameError::SessionFull`, or
/// `GameError::SessionNotJoinable`.
pub async fn handle_join_session(
    command: &JoinSession,
    clock: &dyn Clock,
    tokens: &Mutex<dyn TokenSource + Send>,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<JoinedSession, GameError> {
    let now = clock.now();
    let contributor_id = foldstory_identity::contributor_id(&command.session_id, &command.identity);
    // Drawn up front; goes unused when the identity already holds a slot.
    let fresh_token = lock_tokens(tokens)?.capability_token();

    let session = mutate_session(repo, &command.session_id, now, |session| {
        session
            .join(contributor_id.clone(), fresh_token.clone(), now, policy)
            .map(|_| ())
    })
    .await?;

    let contributor = session.contributor_by_id(&contributor_id).ok_or_else(|| {
        GameError::Infrastructure("joined contributor missing from roster".to_owned())
    })?;
    Ok(JoinedSession {
        contributor_link: build_path(&session.id, Role::Contributor, &contributor.token),
        contributor_id,
    })
}

/// Handles `StartSession`: explicit host start of a waiting session.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound`, `GameError::InvalidToken`, or
/// `GameError::SessionNotJoinable`.
pub async fn handle_start_session(
    command: &StartSession,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let now = clock.now();
    let session = mutate_session(repo, &command.session_id, now, |session| {
        session.start(&command.contributor_token, now, policy)
    })
    .await?;
    acted_view(&session, &command.contributor_token, now, policy)
}

/// Handles `SubmitSegment`: appends a segment for the caller's turn and
/// advances the rotation.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound`, `GameError::SessionNotActive`,
/// `GameError::InvalidToken`, `GameError::NotYourTurn`, or
/// `GameError::WordCountOutOfRange`.
pub async fn handle_submit_segment(
    command: &SubmitSegment,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let now = clock.now();
    let session = mutate_session(repo, &command.session_id, now, |session| {
        session.submit(&command.contributor_token, &command.text, now, policy)
    })
    .await?;
    acted_view(&session, &command.contributor_token, now, policy)
}

/// Handles `PassTurn`: advances the rotation without a segment.
///
/// # Errors
///
/// Returns the same errors as submit, minus the word-count check.
pub async fn handle_pass_turn(
    command: &PassTurn,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let now = clock.now();
    let session = mutate_session(repo, &command.session_id, now, |session| {
        session.pass(&command.contributor_token, now, policy)
    })
    .await?;
    acted_view(&session, &command.contributor_token, now, policy)
}

/// Handles `LeaveSession`: marks the caller `left`, retaining their slot.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound`, `GameError::InvalidToken`, or
/// `GameError::SessionNotActive`.
pub async fn handle_leave_session(
    command: &LeaveSession,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let now = clock.now();
    let session = mutate_session(repo, &command.session_id, now, |session| {
        session.leave(&command.contributor_token, now, policy)
    })
    .await?;
    acted_view(&session, &command.contributor_token, now, policy)
}

/// Handles `VoteToEnd`: records an idempotent early-termination vote and
/// applies the threshold rule.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound`, `GameError::InvalidToken`, or
/// `GameError::SessionNotActive`.
pub async fn handle_vote_to_end(
    command: &VoteToEnd,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let now = clock.now();
    let session = mutate_session(repo, &command.session_id, now, |session| {
        session.vote_to_end(&command.contributor_token, now, policy)
    })
    .await?;
    acted_view(&session, &command.contributor_token, now, policy)
}
