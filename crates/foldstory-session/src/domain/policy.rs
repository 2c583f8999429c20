//! Engine policy configuration.
//!
//! Every rule the product left tunable is an explicit knob here rather
//! than a hard-coded constant: termination, late join, voting thresholds,
//! visibility, and expiry.

use serde::Deserialize;

use foldstory_core::error::GameError;

use super::session::WordCountRange;

/// Tunable game policy, injected wherever lifecycle decisions are made.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Smallest `max_contributors` a session may be created with.
    pub max_contributors_floor: usize,
    /// Largest `max_contributors` a session may be created with.
    pub max_contributors_ceiling: usize,
    /// Roster floor for an explicit host start.
    pub min_contributors_to_start: usize,
    /// Whether contributors may join a session that is already active.
    pub allow_late_join: bool,
    /// Full rounds of the rotation before natural completion.
    pub rounds_per_session: usize,
    /// Percentage of the rotation whose votes end a session early.
    pub vote_threshold_percent: usize,
    /// Roster floor below which early-end voting is disabled.
    pub min_contributors_for_vote: usize,
    /// Show contributors the full history instead of only the segment
    /// immediately preceding their turn.
    pub reveal_history_to_contributors: bool,
    /// Idle hours after which a session is considered expired.
    pub session_ttl_hours: i64,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            max_contributors_floor: 2,
            max_contributors_ceiling: 20,
            min_contributors_to_start: 2,
            allow_late_join: false,
            rounds_per_session: 1,
            vote_threshold_percent: 50,
            min_contributors_for_vote: 3,
            reveal_history_to_contributors: false,
            session_ttl_hours: 72,
        }
    }
}

impl EnginePolicy {
    /// Validates a session-creation configuration against this policy.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidConfiguration` when `max_contributors`
    /// falls outside the allowed range or the word-count range is
    /// degenerate.
    pub fn validate_session_config(
        &self,
        max_contributors: usize,
        word_count_range: WordCountRange,
    ) -> Result<(), GameError> {
        if max_contributors < self.max_contributors_floor
            || max_contributors > self.max_contributors_ceiling
        {
            return Err(GameError::InvalidConfiguration(format!(
                "max_contributors must be between {} and {}",
                self.max_contributors_floor, self.max_contributors_ceiling
            )));
        }
        if word_count_range.min == 0 || word_count_range.min > word_count_range.max {
            return Err(GameError::InvalidConfiguration(
                "word count range must satisfy 0 < min <= max".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_accepts_reasonable_config() {
        let policy = EnginePolicy::default();
        assert!(
            policy
                .validate_session_config(4, WordCountRange { min: 10, max: 200 })
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_max_contributors_outside_bounds() {
        let policy = EnginePolicy::default();
        for bad in [0, 1, 21, 100] {
            let result = policy.validate_session_config(bad, WordCountRange { min: 10, max: 200 });
            assert!(matches!(result, Err(GameError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_rejects_degenerate_word_count_range() {
        let policy = EnginePolicy::default();
        for range in [
            WordCountRange { min: 0, max: 10 },
            WordCountRange { min: 20, max: 10 },
        ] {
            let result = policy.validate_session_config(4, range);
            assert!(matches!(result, Err(GameError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_boundary_values_accepted() {
        let policy = EnginePolicy::default();
        assert!(
            policy
                .validate_session_config(2, WordCountRange { min: 1, max: 1 })
                .is_ok()
        );
        assert!(
            policy
                .validate_session_config(20, WordCountRange { min: 10, max: 10 })
                .is_ok()
        );
    }
}
