//! Outcome-aware retry policies and their combinator algebra.
//!
//! A [`Policy`] decides one retry step from the latest outcome and the
//! session's [`RetryStatus`]. It is the outcome-aware sibling of the
//! index-based [`Schedule`]: a schedule lifted with [`Policy::from_schedule`]
//! simply ignores the outcome, which unifies the two representations behind a
//! single `decide` interface.
//!
//! Policies are pure data plus a pure decision function — composing them
//! builds richer behavior without executing anything:
//!
//! ```rust
//! use eddy::{Policy, PolicyDecision, RetryStatus, Schedule};
//! use std::time::Duration;
//!
//! // Exponential backoff, at most 5 retries, never waiting more than 1s.
//! let policy: Policy<Result<(), String>> =
//!     Policy::from_schedule(Schedule::exponential(Duration::from_millis(100)))
//!         .meet(Policy::limit_retries(5))
//!         .cap_delay(Duration::from_secs(1));
//!
//! let status = RetryStatus::initial();
//! // limit_retries contributes a zero delay, and meet takes the minimum.
//! assert_eq!(
//!     policy.decide(&Ok(()), &status),
//!     PolicyDecision::DelayAndRetry(Duration::ZERO)
//! );
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::schedule::Schedule;
use crate::status::{PolicyDecision, RetryStatus};

/// An outcome-and-status-aware retry decision function.
///
/// `Res` is the outcome type the policy inspects — for the engine this is the
/// attempt's `Result<T, E>`, but any type works. Every policy carries a
/// composable textual description for diagnostics; combinator descriptions
/// embed the descriptions of their inputs.
///
/// Cheap to clone; holds no per-session state.
pub struct Policy<Res> {
    decide: Arc<dyn Fn(&Res, &RetryStatus) -> PolicyDecision + Send + Sync>,
    description: String,
}

impl<Res> Clone for Policy<Res> {
    fn clone(&self) -> Self {
        Self {
            decide: self.decide.clone(),
            description: self.description.clone(),
        }
    }
}

impl<Res: 'static> Policy<Res> {
    /// Build a policy from an arbitrary decision function.
    pub fn new<F>(description: impl Into<String>, decide: F) -> Self
    where
        F: Fn(&Res, &RetryStatus) -> PolicyDecision + Send + Sync + 'static,
    {
        Self {
            decide: Arc::new(decide),
            description: description.into(),
        }
    }

    /// Always retry after the same delay, regardless of outcome or status.
    pub fn constant_delay(delay: Duration) -> Self {
        Self::new(format!("constant_delay({delay:?})"), move |_, _| {
            PolicyDecision::DelayAndRetry(delay)
        })
    }

    /// Give up once `max_retries` retries have been performed; until then,
    /// retry immediately (zero delay).
    ///
    /// Meant to be combined via [`Policy::meet`] with a policy that supplies
    /// the actual backoff.
    pub fn limit_retries(max_retries: u32) -> Self {
        Self::new(format!("limit_retries({max_retries})"), move |_, status| {
            if status.retries_so_far >= max_retries {
                PolicyDecision::GiveUp
            } else {
                PolicyDecision::DelayAndRetry(Duration::ZERO)
            }
        })
    }

    /// Lift an index-based [`Schedule`] into a policy that ignores the
    /// outcome: the i-th retry consumes the schedule's i-th element, and
    /// schedule exhaustion becomes `GiveUp`.
    pub fn from_schedule(schedule: Schedule) -> Self {
        let description = schedule.description().to_string();
        Self::new(description, move |_, status: &RetryStatus| {
            match schedule.delay_for(status.retries_so_far) {
                Some(delay) => PolicyDecision::DelayAndRetry(delay),
                None => PolicyDecision::GiveUp,
            }
        })
    }

    /// Decide the next step for the given outcome and session status.
    pub fn decide(&self, outcome: &Res, status: &RetryStatus) -> PolicyDecision {
        (self.decide)(outcome, status)
    }

    /// Combine two policies, keeping the more conservative verdict: if either
    /// gives up, the combination gives up; otherwise it delays by the smaller
    /// of the two delays.
    pub fn meet(self, other: Self) -> Self {
        let description = format!("meet({}, {})", self.description, other.description);
        let left = self.decide;
        let right = other.decide;
        Self {
            decide: Arc::new(move |outcome, status| {
                match (left(outcome, status), right(outcome, status)) {
                    (
                        PolicyDecision::DelayAndRetry(a),
                        PolicyDecision::DelayAndRetry(b),
                    ) => PolicyDecision::DelayAndRetry(a.min(b)),
                    _ => PolicyDecision::GiveUp,
                }
            }),
            description,
        }
    }

    /// Clamp every delay this policy produces to at most `cap`.
    ///
    /// Implemented as the meet with a constant-delay policy: the constant
    /// never gives up, so the combination preserves give-up decisions and
    /// takes `min(delay, cap)` otherwise.
    pub fn cap_delay(self, cap: Duration) -> Self {
        let description = format!("cap_delay({cap:?}, {})", self.description);
        let met = self.meet(Self::constant_delay(cap));
        Self {
            decide: met.decide,
            description,
        }
    }

    /// Give up instead of retrying whenever the wrapped policy would delay
    /// longer than `threshold`.
    pub fn limit_retries_by_delay(self, threshold: Duration) -> Self {
        let description =
            format!("limit_retries_by_delay({threshold:?}, {})", self.description);
        let inner = self.decide;
        Self {
            decide: Arc::new(move |outcome, status| match inner(outcome, status) {
                PolicyDecision::DelayAndRetry(d) if d > threshold => PolicyDecision::GiveUp,
                decision => decision,
            }),
            description,
        }
    }

    /// Select a policy from the latest outcome, then delegate the decision to
    /// it. Enables outcome-class-specific backoff, e.g. a long schedule for
    /// rate-limit errors and a short one for everything else.
    pub fn dynamic<F>(select: F) -> Self
    where
        F: Fn(&Res) -> Policy<Res> + Send + Sync + 'static,
    {
        Self::new("dynamic(<by-outcome>)", move |outcome, status| {
            select(outcome).decide(outcome, status)
        })
    }

    /// The composable textual description of this policy.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<Res> fmt::Display for Policy<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl<Res> fmt::Debug for Policy<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("description", &self.description)
            .finish()
    }
}
