//! Outcome handlers: effectful inspection of each attempt.
//!
//! After every attempt the engine hands the outcome and a [`RetryDetails`]
//! snapshot to a [`Handler`], which logs whatever it wants and returns a
//! [`HandlerDecision`]. Handlers are where user-supplied side effects live;
//! the engine neither interprets nor requires any particular output from
//! them.
//!
//! The factories here cover the common cases — retry every error, retry a
//! class of errors, or retry until a produced *value* satisfies a predicate.
//! Each logs first, then decides. [`noop`] is the do-nothing log callback.

use crate::action::Action;
use crate::status::RetryDetails;

/// What a handler wants the engine to do after inspecting an attempt.
///
/// `Stop` always wins over any remaining schedule capacity; schedule
/// exhaustion always wins over `Continue` and `Adapt`. There is no other
/// precedence.
pub enum HandlerDecision<T, E> {
    /// End the session now with the inspected outcome.
    Stop,
    /// Keep going with the same action, if the schedule allows another retry.
    Continue,
    /// Keep going, but run this action for all further attempts.
    ///
    /// The substitution is permanent for the session: the engine never
    /// reverts to the previous action unless a later `Adapt` replaces it
    /// again.
    Adapt(Action<T, E>),
}

impl<T, E> std::fmt::Debug for HandlerDecision<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerDecision::Stop => f.write_str("Stop"),
            HandlerDecision::Continue => f.write_str("Continue"),
            HandlerDecision::Adapt(_) => f.write_str("Adapt(..)"),
        }
    }
}

/// Inspects one attempt's outcome and decides how the session proceeds.
///
/// Implemented for any `FnMut(&Result<T, E>, &RetryDetails) ->
/// HandlerDecision<T, E>` closure, so ad-hoc handlers need no explicit impl.
/// A panic inside a handler propagates immediately and aborts the session.
pub trait Handler<T, E> {
    /// Inspect the latest outcome together with the session snapshot.
    fn on_outcome(
        &mut self,
        outcome: &Result<T, E>,
        details: &RetryDetails,
    ) -> HandlerDecision<T, E>;
}

impl<T, E, F> Handler<T, E> for F
where
    F: FnMut(&Result<T, E>, &RetryDetails) -> HandlerDecision<T, E>,
{
    fn on_outcome(
        &mut self,
        outcome: &Result<T, E>,
        details: &RetryDetails,
    ) -> HandlerDecision<T, E> {
        self(outcome, details)
    }
}

/// A log callback that does nothing, usable with any of the handler
/// factories.
pub fn noop<O>(_outcome: &O, _details: &RetryDetails) {}

/// Retry every error; stop on the first success.
///
/// The log callback runs for each error before the session continues.
///
/// # Examples
///
/// ```rust
/// use eddy::{noop, retry_on_all_errors, run, Action, Schedule};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let action: Action<u32, String> = Action::fail("down".to_string());
/// let schedule = Schedule::constant(Duration::from_millis(1)).limit_retries(2);
///
/// // 1 initial attempt + 2 retries, then the original error surfaces.
/// let result = run(action, schedule, retry_on_all_errors(noop)).await;
/// assert_eq!(result, Err("down".to_string()));
/// # });
/// ```
pub fn retry_on_all_errors<T, E, L>(mut log: L) -> impl Handler<T, E>
where
    L: FnMut(&E, &RetryDetails),
{
    move |outcome: &Result<T, E>, details: &RetryDetails| match outcome {
        Ok(_) => HandlerDecision::Stop,
        Err(error) => {
            log(error, details);
            HandlerDecision::Continue
        }
    }
}

/// Retry only errors the predicate deems worth retrying; stop on the first
/// success or the first non-retryable error.
///
/// The log callback runs for every error, retryable or not.
pub fn retry_on_some_errors<T, E, P, L>(
    mut is_worth_retrying: P,
    mut log: L,
) -> impl Handler<T, E>
where
    P: FnMut(&E) -> bool,
    L: FnMut(&E, &RetryDetails),
{
    move |outcome: &Result<T, E>, details: &RetryDetails| match outcome {
        Ok(_) => HandlerDecision::Stop,
        Err(error) => {
            log(error, details);
            if is_worth_retrying(error) {
                HandlerDecision::Continue
            } else {
                HandlerDecision::Stop
            }
        }
    }
}

/// Retry until a produced *value* satisfies the predicate.
///
/// This inspects successes, not errors: an unsatisfactory value is retried
/// like a failure would be, and the session stops as soon as the predicate
/// holds. Errors are treated as unsatisfactory and retried. The log callback
/// runs for every produced value before the decision.
///
/// # Examples
///
/// ```rust
/// use eddy::{noop, retry_until_successful, run, Action, Schedule};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let readings = [3u32, 7, 10, 2];
/// let cursor = Arc::new(AtomicUsize::new(0));
/// let action = Action::new(move || {
///     let cursor = cursor.clone();
///     async move {
///         Ok::<_, String>(readings[cursor.fetch_add(1, Ordering::SeqCst)])
///     }
/// });
///
/// let schedule = Schedule::constant(Duration::from_millis(1));
/// let result = run(action, schedule, retry_until_successful(|v| *v >= 10, noop)).await;
/// assert_eq!(result, Ok(10));
/// # });
/// ```
pub fn retry_until_successful<T, E, P, L>(
    mut is_successful: P,
    mut log: L,
) -> impl Handler<T, E>
where
    P: FnMut(&T) -> bool,
    L: FnMut(&T, &RetryDetails),
{
    move |outcome: &Result<T, E>, details: &RetryDetails| match outcome {
        Ok(value) => {
            log(value, details);
            if is_successful(value) {
                HandlerDecision::Stop
            } else {
                HandlerDecision::Continue
            }
        }
        Err(_) => HandlerDecision::Continue,
    }
}

/// A log callback that emits a structured `tracing` event for each inspected
/// outcome.
///
/// Requires the `tracing` feature.
#[cfg(feature = "tracing")]
pub fn log_with_tracing<O: std::fmt::Debug>(outcome: &O, details: &RetryDetails) {
    tracing::info!(
        retries_so_far = details.retries_so_far,
        cumulative_delay = ?details.cumulative_delay,
        next_step = ?details.next_step_if_unsuccessful,
        outcome = ?outcome,
        "retry attempt inspected"
    );
}
