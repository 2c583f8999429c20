//! Query handlers for the session engine.
//!
//! Views are shaped by the viewer's role: observers see the full segment
//! history, while contributors see only the segment immediately preceding
//! the current turn. Once a session is over the full story is revealed to
//! contributors too — the reveal is the payoff of the game.

use chrono::{DateTime, Utc};
use serde::Serialize;

use foldstory_core::clock::Clock;
use foldstory_core::error::GameError;
use foldstory_core::repository::SessionRepository;

use crate::application::command_handlers;
use crate::domain::policy::EnginePolicy;
use crate::domain::session::{
    ContributorStatus, Segment, Session, SessionStatus, WordCountRange,
};

/// Read-only view of one session, shaped for a specific viewer.
///
/// Note: contributor tokens and the observer token are intentionally
/// absent — capability secrets never travel inside a view.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: String,
    /// Status as observed at read time (expiry derived, never written).
    pub status: SessionStatus,
    /// Roster capacity.
    pub max_contributors: usize,
    /// Word-count bounds for segments.
    pub word_count_range: WordCountRange,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last accepted mutation timestamp.
    pub last_activity_at: DateTime<Utc>,
    /// The rotation, in slot order.
    pub contributors: Vec<ContributorView>,
    /// Index of the slot whose turn is active.
    pub current_turn_index: usize,
    /// Contributor id of the active slot, while the session is active.
    pub current_contributor_id: Option<String>,
    /// Number of distinct early-termination votes.
    pub votes_to_end: usize,
    /// Total segments written so far.
    pub segment_count: usize,
    /// Visible segments per the viewer's role and the visibility rule.
    pub segments: Vec<SegmentView>,
}

/// One rotation slot as exposed in a view.
#[derive(Debug, Serialize)]
pub struct ContributorView {
    /// Stable contributor id.
    pub id: String,
    /// Rotation position.
    pub display_order: usize,
    /// Participation status.
    pub status: ContributorStatus,
    /// True for the viewing contributor's own slot.
    pub is_you: bool,
}

/// One segment as exposed in a view.
///
/// Note: `visible_preceding_segment_id` is intentionally omitted; which
/// segment an author was shown is internal bookkeeping.
#[derive(Debug, Serialize)]
pub struct SegmentView {
    /// Segment identifier.
    pub id: String,
    /// The contributor who wrote it.
    pub author_contributor_id: String,
    /// The turn pointer value at submission.
    pub turn_index_at_submission: usize,
    /// The text itself.
    pub text: String,
    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,
}

fn segment_view(segment: &Segment) -> SegmentView {
    SegmentView {
        id: segment.id.clone(),
        author_contributor_id: segment.author_contributor_id.clone(),
        turn_index_at_submission: segment.turn_index_at_submission,
        text: segment.text.clone(),
        submitted_at: segment.submitted_at,
    }
}

fn build_view(
    session: &Session,
    viewer_slot: Option<usize>,
    segments: Vec<SegmentView>,
    now: DateTime<Utc>,
    policy: &EnginePolicy,
) -> SessionView {
    let status = session.effective_status(now, policy);
    let current_contributor_id = if status == SessionStatus::Active {
        session
            .contributor_order
            .get(session.current_turn_index)
            .map(|c| c.id.clone())
    } else {
        None
    };

    SessionView {
        session_id: session.id.clone(),
        status,
        max_contributors: session.max_contributors,
        word_count_range: session.word_count_range,
        created_at: session.created_at,
        last_activity_at: session.last_activity_at,
        contributors: session
            .contributor_order
            .iter()
            .enumerate()
            .map(|(slot, c)| ContributorView {
                id: c.id.clone(),
                display_order: c.display_order,
                status: c.status,
                is_you: viewer_slot == Some(slot),
            })
            .collect(),
        current_turn_index: session.current_turn_index,
        current_contributor_id,
        votes_to_end: session.votes_to_end.len(),
        segment_count: session.segments.len(),
        segments,
    }
}

/// Builds the view a contributor is allowed to see.
///
/// While the session runs, only the immediately preceding segment is
/// visible (unless policy reveals history). Terminal sessions reveal the
/// whole story.
#[must_use]
pub fn contributor_view(
    session: &Session,
    viewer_slot: usize,
    now: DateTime<Utc>,
    policy: &EnginePolicy,
) -> SessionView {
    let status = session.effective_status(now, policy);
    let segments: Vec<SegmentView> =
        if policy.reveal_history_to_contributors || status.is_terminal() {
            session.segments.iter().map(segment_view).collect()
        } else {
            session.segments.last().map(segment_view).into_iter().collect()
        };
    build_view(session, Some(viewer_slot), segments, now, policy)
}

/// Builds the full-history view for an observer.
#[must_use]
pub fn observer_view(session: &Session, now: DateTime<Utc>, policy: &EnginePolicy) -> SessionView {
    let segments = session.segments.iter().map(segment_view).collect();
    build_view(session, None, segments, now, policy)
}

/// Retrieves the state of a session, shaped for the presented token.
///
/// # Errors
///
/// Returns `GameError::SessionNotFound` for an unknown id and
/// `GameError::InvalidToken` when the token is neither the observer token
/// nor any contributor's.
pub async fn get_session_state(
    session_id: &str,
    viewer_token: &str,
    clock: &dyn Clock,
    repo: &dyn SessionRepository,
    policy: &EnginePolicy,
) -> Result<SessionView, GameError> {
    let record = repo
        .load(session_id)
        .await?
        .ok_or_else(|| GameError::SessionNotFound(session_id.to_owned()))?;
    let session = command_handlers::decode(&record)?;
    let now = clock.now();

    if viewer_token == session.observer_token {
        return Ok(observer_view(&session, now, policy));
    }
    let slot = session.contributor_by_token(viewer_token)?;
    Ok(contributor_view(&session, slot, now, policy))
}
