//! The execution engine: runs an action under a schedule until a handler or
//! the schedule ends the session.
//!
//! The loop is an explicit state machine driven by a trampoline — each
//! iteration of the `loop` replaces a state value instead of recursing, so an
//! effectively unbounded schedule runs an unbounded number of retries in
//! constant stack.
//!
//! One action is in flight at a time per invocation; status and schedule
//! position are threaded explicitly through each transition, so independent
//! invocations share nothing and may run concurrently without
//! synchronization.
//!
//! # Cancellation
//!
//! The returned future suspends in exactly two places: awaiting an attempt
//! and sleeping out a delay. Dropping the future at either point cancels the
//! whole session — the in-flight attempt itself is cancelled (its future is
//! dropped), no further attempts occur, and nothing is reported to the
//! handler. Cancellation is a control outcome, not an error.

use std::time::Duration;

use crate::action::Action;
use crate::handler::{Handler, HandlerDecision};
use crate::policy::Policy;
use crate::schedule::Schedule;
use crate::status::{PolicyDecision, RetryDetails, RetryStatus};

/// What the schedule has in store for the step being decided, carrying the
/// already-updated status so the engine never recomputes it.
enum NextStep {
    GiveUp,
    RetryAfterDelay(Duration, RetryStatus),
}

impl NextStep {
    fn as_decision(&self) -> PolicyDecision {
        match self {
            NextStep::GiveUp => PolicyDecision::GiveUp,
            NextStep::RetryAfterDelay(delay, _) => PolicyDecision::DelayAndRetry(*delay),
        }
    }
}

/// Engine states. `Success`/`Failure` are the `return` paths of the loop.
enum State<T, E> {
    Running {
        action: Action<T, E>,
        status: RetryStatus,
    },
    Deciding {
        action: Action<T, E>,
        outcome: Result<T, E>,
        status: RetryStatus,
    },
    Delaying {
        action: Action<T, E>,
        delay: Duration,
        status: RetryStatus,
    },
}

/// Run `action` until it produces an outcome the handler stops on, or the
/// schedule is exhausted.
///
/// The i-th retry consumes the schedule's i-th element; a finite schedule of
/// length K allows at most K+1 attempts. The result is always the final
/// attempt's own outcome — the error that triggered the terminating decision
/// is surfaced verbatim, never wrapped in a synthetic "exhausted" error.
///
/// # Examples
///
/// ```rust
/// use eddy::{noop, retry_on_all_errors, run, Action, Schedule};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let attempts = Arc::new(AtomicU32::new(0));
/// let action = Action::new({
///     let attempts = attempts.clone();
///     move || {
///         let attempts = attempts.clone();
///         async move {
///             if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
///                 Err("flaky")
///             } else {
///                 Ok(42)
///             }
///         }
///     }
/// });
///
/// let schedule = Schedule::exponential(Duration::from_millis(1)).limit_retries(5);
/// let result = run(action, schedule, retry_on_all_errors(noop)).await;
///
/// assert_eq!(result, Ok(42));
/// assert_eq!(attempts.load(Ordering::SeqCst), 3);
/// # });
/// ```
pub async fn run<T, E, H>(action: Action<T, E>, schedule: Schedule, handler: H) -> Result<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    H: Handler<T, E>,
{
    run_with_policy(action, Policy::from_schedule(schedule), handler).await
}

/// Like [`run`], but driven by an outcome-aware [`Policy`] instead of an
/// index-based [`Schedule`].
///
/// The two representations share one decision interface: `run` itself is this
/// function applied to [`Policy::from_schedule`].
pub async fn run_with_policy<T, E, H>(
    action: Action<T, E>,
    policy: Policy<Result<T, E>>,
    mut handler: H,
) -> Result<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    H: Handler<T, E>,
{
    let mut state = State::Running {
        action,
        status: RetryStatus::initial(),
    };

    loop {
        state = match state {
            State::Running { action, status } => {
                let outcome = action.attempt().await;
                State::Deciding {
                    action,
                    outcome,
                    status,
                }
            }

            State::Deciding {
                action,
                outcome,
                status,
            } => {
                let next_step = match policy.decide(&outcome, &status) {
                    PolicyDecision::DelayAndRetry(delay) => {
                        NextStep::RetryAfterDelay(delay, status.add_retry(delay))
                    }
                    PolicyDecision::GiveUp => NextStep::GiveUp,
                };
                let details = RetryDetails::new(status, next_step.as_decision());

                // Stop always wins; schedule exhaustion overrides Continue/Adapt.
                match (handler.on_outcome(&outcome, &details), next_step) {
                    (HandlerDecision::Stop, _) => return outcome,
                    (_, NextStep::GiveUp) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            retries_so_far = status.retries_so_far,
                            "schedule exhausted, surfacing last outcome"
                        );
                        return outcome;
                    }
                    (HandlerDecision::Continue, NextStep::RetryAfterDelay(delay, next_status)) => {
                        State::Delaying {
                            action,
                            delay,
                            status: next_status,
                        }
                    }
                    (
                        HandlerDecision::Adapt(new_action),
                        NextStep::RetryAfterDelay(delay, next_status),
                    ) => State::Delaying {
                        action: new_action,
                        delay,
                        status: next_status,
                    },
                }
            }

            State::Delaying {
                action,
                delay,
                status,
            } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(delay = ?delay, retry = status.retries_so_far, "waiting before next attempt");
                tokio::time::sleep(delay).await;
                State::Running { action, status }
            }
        };
    }
}
