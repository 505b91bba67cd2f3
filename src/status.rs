//! Retry session state and per-step decision values.
//!
//! Everything in this module is pure data. A [`RetryStatus`] tracks how far a
//! retry session has progressed; a [`PolicyDecision`] is one step's verdict;
//! a [`RetryDetails`] is the read-only snapshot handed to handlers for
//! logging and inspection. Fresh values are produced on every transition —
//! nothing here is mutated in place.

use std::time::Duration;

/// Progress of one retry session.
///
/// Starts at zero retries and zero cumulative delay; every retry transition
/// produces a new value with the retry count bumped and the applied delay
/// added to the running total.
///
/// # Examples
///
/// ```rust
/// use eddy::RetryStatus;
/// use std::time::Duration;
///
/// let status = RetryStatus::initial()
///     .add_retry(Duration::from_millis(100))
///     .add_retry(Duration::from_millis(200));
///
/// assert_eq!(status.retries_so_far, 2);
/// assert_eq!(status.cumulative_delay, Duration::from_millis(300));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryStatus {
    /// Number of retries performed so far (the initial attempt is not a retry).
    pub retries_so_far: u32,
    /// Total time spent waiting between attempts so far.
    pub cumulative_delay: Duration,
}

impl RetryStatus {
    /// The status at the start of a session: zero retries, zero delay.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Record one more retry with the given applied delay.
    ///
    /// Returns a fresh status; the receiver is unchanged.
    pub fn add_retry(self, delay: Duration) -> Self {
        Self {
            retries_so_far: self.retries_so_far.saturating_add(1),
            cumulative_delay: self.cumulative_delay.saturating_add(delay),
        }
    }
}

/// The raw verdict a schedule or policy produces for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Stop retrying; the session ends with the last attempt's outcome.
    GiveUp,
    /// Wait this long, then attempt again.
    DelayAndRetry(Duration),
}

impl PolicyDecision {
    /// Returns true if this decision gives up.
    pub fn is_give_up(&self) -> bool {
        matches!(self, PolicyDecision::GiveUp)
    }

    /// The delay carried by a `DelayAndRetry`, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            PolicyDecision::GiveUp => None,
            PolicyDecision::DelayAndRetry(d) => Some(*d),
        }
    }
}

/// Read-only snapshot of a retry session, built fresh for each handler call.
///
/// Tells the handler where the session stands and what the engine will do
/// next if the handler lets it continue. Handlers use this for logging and
/// metrics; the engine never reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDetails {
    /// Retries performed before the attempt being inspected.
    pub retries_so_far: u32,
    /// Total delay applied before the attempt being inspected.
    pub cumulative_delay: Duration,
    /// What the schedule has in store if the handler continues.
    pub next_step_if_unsuccessful: PolicyDecision,
}

impl RetryDetails {
    pub(crate) fn new(status: RetryStatus, next_step_if_unsuccessful: PolicyDecision) -> Self {
        Self {
            retries_so_far: status.retries_so_far,
            cumulative_delay: status.cumulative_delay,
            next_step_if_unsuccessful,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_is_zero() {
        let status = RetryStatus::initial();
        assert_eq!(status.retries_so_far, 0);
        assert_eq!(status.cumulative_delay, Duration::ZERO);
    }

    #[test]
    fn test_add_retry_accumulates() {
        let status = RetryStatus::initial()
            .add_retry(Duration::from_millis(10))
            .add_retry(Duration::from_millis(20))
            .add_retry(Duration::from_millis(40));

        assert_eq!(status.retries_so_far, 3);
        assert_eq!(status.cumulative_delay, Duration::from_millis(70));
    }

    #[test]
    fn test_add_retry_does_not_mutate_receiver() {
        let initial = RetryStatus::initial();
        let _ = initial.add_retry(Duration::from_secs(1));
        assert_eq!(initial, RetryStatus::initial());
    }

    #[test]
    fn test_cumulative_delay_saturates() {
        let status = RetryStatus::initial()
            .add_retry(Duration::MAX)
            .add_retry(Duration::from_secs(1));
        assert_eq!(status.cumulative_delay, Duration::MAX);
        assert_eq!(status.retries_so_far, 2);
    }

    #[test]
    fn test_decision_accessors() {
        assert!(PolicyDecision::GiveUp.is_give_up());
        assert_eq!(PolicyDecision::GiveUp.delay(), None);

        let delay = PolicyDecision::DelayAndRetry(Duration::from_millis(5));
        assert!(!delay.is_give_up());
        assert_eq!(delay.delay(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_details_snapshot_from_status() {
        let status = RetryStatus::initial().add_retry(Duration::from_millis(10));
        let details =
            RetryDetails::new(status, PolicyDecision::DelayAndRetry(Duration::from_millis(20)));

        assert_eq!(details.retries_so_far, 1);
        assert_eq!(details.cumulative_delay, Duration::from_millis(10));
        assert_eq!(
            details.next_step_if_unsuccessful,
            PolicyDecision::DelayAndRetry(Duration::from_millis(20))
        );
    }

    proptest! {
        #[test]
        fn prop_status_sums_applied_delays(delays in prop::collection::vec(0u64..10_000, 0..32)) {
            let status = delays
                .iter()
                .fold(RetryStatus::initial(), |s, &ms| s.add_retry(Duration::from_millis(ms)));

            prop_assert_eq!(status.retries_so_far as usize, delays.len());
            prop_assert_eq!(
                status.cumulative_delay,
                Duration::from_millis(delays.iter().sum::<u64>())
            );
        }
    }
}
