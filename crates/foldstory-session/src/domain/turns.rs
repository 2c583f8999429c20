//! Turn rotation.
//!
//! The turn pointer walks rotation slots modulo roster size. Slots are
//! never removed or reordered: a contributor who left still occupies their
//! slot and is passed over automatically, keeping slot indices and the
//! vote denominator stable for the life of the session.

use super::session::ContributorStatus;

/// Outcome of advancing the pointer past a completed turn.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Advance {
    /// The slot whose turn is next.
    pub next_index: usize,
    /// Number of times the pointer passed slot 0, i.e. completed rounds.
    pub wraps: usize,
    /// Slots passed over because their contributor left.
    pub auto_passed: Vec<usize>,
}

/// Advances the pointer one slot, then keeps walking past `left` slots,
/// synthesizing a pass for each.
///
/// Returns `None` when no slot can take a turn (every contributor left).
pub(crate) fn advance_pointer(statuses: &[ContributorStatus], from: usize) -> Option<Advance> {
    let len = statuses.len();
    if len == 0 {
        return None;
    }

    let mut wraps = 0;
    let mut auto_passed = Vec::new();
    for step in 1..=len {
        let idx = (from + step) % len;
        if idx == 0 {
            wraps += 1;
        }
        if statuses[idx] == ContributorStatus::Left {
            auto_passed.push(idx);
            continue;
        }
        return Some(Advance {
            next_index: idx,
            wraps,
            auto_passed,
        });
    }
    None
}

/// The first slot able to take a turn when a session starts.
pub(crate) fn first_active_slot(statuses: &[ContributorStatus]) -> Option<usize> {
    statuses.iter().position(|s| *s != ContributorStatus::Left)
}
