//! The session aggregate — one writing game instance.
//!
//! All mutations validate against current state before touching anything,
//! so a caller holding a stale picture of the session gets a deterministic
//! domain error instead of corrupting the rotation.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use foldstory_core::error::GameError;

use super::policy::EnginePolicy;
use super::turns;
use super::votes;

/// Inclusive word-count bounds for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCountRange {
    /// Minimum accepted word count.
    pub min: usize,
    /// Maximum accepted word count.
    pub max: usize,
}

/// Session lifecycle status.
///
/// Transitions are monotonic: `waiting → active → {voting-closed-early |
/// completed | expired}`. The terminal statuses admit no further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Roster assembling; the game has not started.
    Waiting,
    /// Turns are being taken. The only status accepting submit/pass/vote.
    Active,
    /// Ended early by vote. Terminal.
    VotingClosedEarly,
    /// Ended naturally. Terminal.
    Completed,
    /// Idle past the TTL. Derived at read time, never written by a sweep.
    Expired,
}

impl SessionStatus {
    /// Returns the kebab-case wire literal for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::VotingClosedEarly => "voting-closed-early",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// True for statuses that admit no further mutation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::VotingClosedEarly | Self::Completed | Self::Expired)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participation status of one rotation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorStatus {
    /// Participating normally.
    Active,
    /// Passed their most recent turn; still in rotation.
    Passed,
    /// Quit the session; slot retained and auto-passed.
    Left,
}

/// A participant bound to one rotation slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    /// Stable id derived from the anonymous identity and session.
    pub id: String,
    /// Position in the rotation. Never changes after assignment.
    pub display_order: usize,
    /// Participation status.
    pub status: ContributorStatus,
    /// Capability secret authorizing submit/pass/leave/vote for this slot.
    pub token: String,
    /// When the contributor joined.
    pub joined_at: DateTime<Utc>,
}

/// One submitted block of text. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identifier, unique within the session.
    pub id: String,
    /// The session this segment belongs to.
    pub session_id: String,
    /// The contributor who wrote it.
    pub author_contributor_id: String,
    /// The turn pointer value at submission.
    pub turn_index_at_submission: usize,
    /// The text itself.
    pub text: String,
    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,
    /// The one segment the author was shown before writing, if any.
    pub visible_preceding_segment_id: Option<String>,
}

/// The session aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque short identifier, collision-checked at allocation.
    pub id: String,
    /// Lifecycle status as last written. Expiry is derived on top of this
    /// at read time; see [`Session::effective_status`].
    pub status: SessionStatus,
    /// Roster capacity chosen at creation.
    pub max_contributors: usize,
    /// Word-count bounds for every segment.
    pub word_count_range: WordCountRange,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last accepted mutation; drives expiry.
    pub last_activity_at: DateTime<Utc>,
    /// The rotation. Slots are never removed or reordered, even after a
    /// contributor leaves.
    pub contributor_order: Vec<Contributor>,
    /// Index into `contributor_order` of the slot whose turn is active.
    pub current_turn_index: usize,
    /// Full rounds the rotation has completed.
    pub rounds_completed: usize,
    /// Submitted segments in turn order.
    pub segments: Vec<Segment>,
    /// Contributor ids that voted to end early.
    pub votes_to_end: BTreeSet<String>,
    /// Read-only capability token for the whole session.
    pub observer_token: String,
    /// Contributor id of the creator (slot 0).
    pub created_by: String,
}

/// Counts whitespace-delimited tokens, not characters.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl Session {
    /// Creates a new session in `waiting` with the creator as slot 0.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidConfiguration` when the configuration
    /// violates the policy bounds.
    pub fn create(
        id: String,
        max_contributors: usize,
        word_count_range: WordCountRange,
        creator: Contributor,
        observer_token: String,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<Self, GameError> {
        policy.validate_session_config(max_contributors, word_count_range)?;
        let created_by = creator.id.clone();
        Ok(Self {
            id,
            status: SessionStatus::Waiting,
            max_contributors,
            word_count_range,
            created_at: now,
            last_activity_at: now,
            contributor_order: vec![creator],
            current_turn_index: 0,
            rounds_completed: 0,
            segments: Vec::new(),
            votes_to_end: BTreeSet::new(),
            observer_token,
            created_by,
        })
    }

    /// Status as observed at `now`: a non-terminal session idle past the
    /// TTL reads as `expired` without any write having happened.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>, policy: &EnginePolicy) -> SessionStatus {
        match self.status {
            SessionStatus::Waiting | SessionStatus::Active
                if now - self.last_activity_at > Duration::hours(policy.session_ttl_hours) =>
            {
                SessionStatus::Expired
            }
            status => status,
        }
    }

    /// Resolves a contributor token to its rotation slot.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidToken` when no slot holds the token.
    pub fn contributor_by_token(&self, token: &str) -> Result<usize, GameError> {
        self.contributor_order
            .iter()
            .position(|c| c.token == token)
            .ok_or(GameError::InvalidToken)
    }

    /// Looks up a contributor by id.
    #[must_use]
    pub fn contributor_by_id(&self, contributor_id: &str) -> Option<&Contributor> {
        self.contributor_order
            .iter()
            .find(|c| c.id == contributor_id)
    }

    /// Adds a contributor, or returns the existing slot for an identity
    /// that already joined (idempotent — page reloads must not create
    /// duplicate slots).
    ///
    /// Filling the roster to capacity starts the game without waiting for
    /// the host.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SessionNotJoinable` when the status does not
    /// accept joins, or `GameError::SessionFull` at capacity.
    pub fn join(
        &mut self,
        contributor_id: String,
        token: String,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<&Contributor, GameError> {
        if let Some(pos) = self
            .contributor_order
            .iter()
            .position(|c| c.id == contributor_id)
        {
            return Ok(&self.contributor_order[pos]);
        }

        match self.effective_status(now, policy) {
            SessionStatus::Waiting => {}
            SessionStatus::Active if policy.allow_late_join => {}
            status => {
                return Err(GameError::SessionNotJoinable {
                    session_id: self.id.clone(),
                    reason: format!("status is {status}"),
                });
            }
        }
        if self.contributor_order.len() >= self.max_contributors {
            return Err(GameError::SessionFull(self.id.clone()));
        }

        let display_order = self.contributor_order.len();
        self.contributor_order.push(Contributor {
            id: contributor_id,
            display_order,
            status: ContributorStatus::Active,
            token,
            joined_at: now,
        });
        self.last_activity_at = now;

        if self.status == SessionStatus::Waiting
            && self.contributor_order.len() == self.max_contributors
        {
            self.begin(now);
        }

        Ok(&self.contributor_order[display_order])
    }

    /// Explicit host start: only the creator's token, only while
    /// `waiting`, and only with enough present contributors.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SessionNotJoinable` for a wrong status or an
    /// undersized roster, `GameError::InvalidToken` for a token that is
    /// not the creator's.
    pub fn start(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<(), GameError> {
        match self.effective_status(now, policy) {
            SessionStatus::Waiting => {}
            status => {
                return Err(GameError::SessionNotJoinable {
                    session_id: self.id.clone(),
                    reason: format!("cannot start while {status}"),
                });
            }
        }

        let slot = self.contributor_by_token(token)?;
        if self.contributor_order[slot].id != self.created_by {
            return Err(GameError::InvalidToken);
        }

        let present = self
            .contributor_order
            .iter()
            .filter(|c| c.status != ContributorStatus::Left)
            .count();
        if present < policy.min_contributors_to_start {
            return Err(GameError::SessionNotJoinable {
                session_id: self.id.clone(),
                reason: format!(
                    "{present} contributors present, {} required to start",
                    policy.min_contributors_to_start
                ),
            });
        }

        self.begin(now);
        Ok(())
    }

    /// Appends a segment for the current turn and advances the rotation.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SessionNotActive`, `GameError::InvalidToken`,
    /// `GameError::NotYourTurn`, or `GameError::WordCountOutOfRange`.
    pub fn submit(
        &mut self,
        token: &str,
        text: &str,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<(), GameError> {
        self.ensure_active(now, policy)?;
        let slot = self.contributor_by_token(token)?;
        if slot != self.current_turn_index {
            return Err(GameError::NotYourTurn);
        }

        let words = word_count(text);
        let range = self.word_count_range;
        if words < range.min || words > range.max {
            return Err(GameError::WordCountOutOfRange {
                min: range.min,
                max: range.max,
                actual: words,
            });
        }

        let visible_preceding_segment_id = self.segments.last().map(|s| s.id.clone());
        let segment_id = format!("{}-seg-{}", self.id, self.segments.len() + 1);
        let author_contributor_id = self.contributor_order[slot].id.clone();
        self.segments.push(Segment {
            id: segment_id,
            session_id: self.id.clone(),
            author_contributor_id,
            turn_index_at_submission: self.current_turn_index,
            text: text.to_owned(),
            submitted_at: now,
            visible_preceding_segment_id,
        });
        self.contributor_order[slot].status = ContributorStatus::Active;
        self.last_activity_at = now;
        self.advance_turn(policy);
        Ok(())
    }

    /// Passes the current turn without recording a segment. The passing
    /// contributor stays in rotation and is offered their next turn
    /// normally.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SessionNotActive`, `GameError::InvalidToken`,
    /// or `GameError::NotYourTurn`.
    pub fn pass(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<(), GameError> {
        self.ensure_active(now, policy)?;
        let slot = self.contributor_by_token(token)?;
        if slot != self.current_turn_index {
            return Err(GameError::NotYourTurn);
        }

        self.contributor_order[slot].status = ContributorStatus::Passed;
        self.last_activity_at = now;
        self.advance_turn(policy);
        Ok(())
    }

    /// Marks a contributor `left`. The slot is retained and auto-passed
    /// when the pointer reaches it; indices and the vote denominator do
    /// not move. Idempotent for an already-left contributor.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidToken` or `GameError::SessionNotActive`
    /// in terminal states.
    pub fn leave(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<(), GameError> {
        let slot = self.contributor_by_token(token)?;
        match self.effective_status(now, policy) {
            SessionStatus::Waiting | SessionStatus::Active => {}
            status => {
                return Err(GameError::SessionNotActive {
                    session_id: self.id.clone(),
                    status: status.as_str().to_owned(),
                });
            }
        }
        if self.contributor_order[slot].status == ContributorStatus::Left {
            return Ok(());
        }

        self.contributor_order[slot].status = ContributorStatus::Left;
        self.last_activity_at = now;

        if self.status == SessionStatus::Active {
            if self
                .contributor_order
                .iter()
                .all(|c| c.status == ContributorStatus::Left)
            {
                self.status = SessionStatus::Completed;
            } else if slot == self.current_turn_index {
                self.advance_turn(policy);
            }
        }
        Ok(())
    }

    /// Records an early-termination vote. Voting twice has no additional
    /// effect. Transitions to `voting-closed-early` once the threshold
    /// rule is met.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SessionNotActive` or `GameError::InvalidToken`.
    pub fn vote_to_end(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> Result<(), GameError> {
        self.ensure_active(now, policy)?;
        let slot = self.contributor_by_token(token)?;

        let contributor_id = self.contributor_order[slot].id.clone();
        self.votes_to_end.insert(contributor_id);
        self.last_activity_at = now;

        if votes::threshold_met(
            self.votes_to_end.len(),
            self.contributor_order.len(),
            policy,
        ) {
            self.status = SessionStatus::VotingClosedEarly;
        }
        Ok(())
    }

    fn ensure_active(&self, now: DateTime<Utc>, policy: &EnginePolicy) -> Result<(), GameError> {
        let status = self.effective_status(now, policy);
        if status == SessionStatus::Active {
            Ok(())
        } else {
            Err(GameError::SessionNotActive {
                session_id: self.id.clone(),
                status: status.as_str().to_owned(),
            })
        }
    }

    fn begin(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Active;
        self.current_turn_index = turns::first_active_slot(&self.statuses()).unwrap_or(0);
        self.last_activity_at = now;
    }

    fn advance_turn(&mut self, policy: &EnginePolicy) {
        match turns::advance_pointer(&self.statuses(), self.current_turn_index) {
            Some(advance) => {
                self.current_turn_index = advance.next_index;
                self.rounds_completed += advance.wraps;
                if self.rounds_completed >= policy.rounds_per_session {
                    self.status = SessionStatus::Completed;
                }
            }
            None => self.status = SessionStatus::Completed,
        }
    }

    fn statuses(&self) -> Vec<ContributorStatus> {
        self.contributor_order.iter().map(|c| c.status).collect()
    }
}
