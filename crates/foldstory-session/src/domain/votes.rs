//! Early-termination vote tally.

use super::policy::EnginePolicy;

/// Applies the early-termination threshold rule.
///
/// The denominator is the full rotation, left contributors included, so a
/// slot can never be compacted away to swing a tally. Voting is disabled
/// entirely below the configured roster floor.
pub(crate) fn threshold_met(votes: usize, roster: usize, policy: &EnginePolicy) -> bool {
    roster >= policy.min_contributors_for_vote
        && votes * 100 >= roster * policy.vote_threshold_percent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(threshold: usize, floor: usize) -> EnginePolicy {
        EnginePolicy {
            vote_threshold_percent: threshold,
            min_contributors_for_vote: floor,
            ..EnginePolicy::default()
        }
    }

    #[test]
    fn test_four_contributors_at_fifty_percent_need_two_votes() {
        let policy = policy(50, 3);

        assert!(!threshold_met(1, 4, &policy));
        assert!(threshold_met(2, 4, &policy));
        assert!(threshold_met(3, 4, &policy));
    }

    #[test]
    fn test_odd_roster_rounds_up() {
        let policy = policy(50, 3);

        // 1/3 is below 50%, 2/3 is above.
        assert!(!threshold_met(1, 3, &policy));
        assert!(threshold_met(2, 3, &policy));
    }

    #[test]
    fn test_roster_below_floor_cannot_vote_to_end() {
        let policy = policy(50, 3);

        assert!(!threshold_met(1, 2, &policy));
        assert!(!threshold_met(2, 2, &policy));
    }

    #[test]
    fn test_floor_of_two_allows_small_session_voting() {
        let policy = policy(50, 2);

        assert!(threshold_met(1, 2, &policy));
    }

    #[test]
    fn test_hundred_percent_requires_everyone() {
        let policy = policy(100, 3);

        assert!(!threshold_met(3, 4, &policy));
        assert!(threshold_met(4, 4, &policy));
    }
}
