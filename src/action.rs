//! The repeatable computation a retry session runs.
//!
//! An [`Action`] is a capability value for a not-yet-run async computation
//! that can be attempted any number of times. Each attempt re-invokes the
//! underlying factory, so retries re-run the operation from scratch — fresh
//! connections, new request ids — rather than replaying a cached future.
//!
//! Actions are cloneable and are passed explicitly through the engine's
//! transitions, which is what makes mid-session substitution
//! ([`HandlerDecision::Adapt`](crate::HandlerDecision::Adapt)) possible: the
//! engine simply carries a different `Action` forward.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// A suspended, repeatable async computation producing `Result<T, E>`.
///
/// Attempts are boxed: the retry loop is dynamic control flow, and boxing
/// keeps the engine's state machine a plain value type.
///
/// # Examples
///
/// ```rust
/// use eddy::Action;
///
/// # tokio_test::block_on(async {
/// let action = Action::new(|| async { Ok::<_, String>(42) });
/// assert_eq!(action.attempt().await, Ok(42));
/// // A second attempt re-runs the computation.
/// assert_eq!(action.attempt().await, Ok(42));
/// # });
/// ```
pub struct Action<T, E> {
    factory: Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>,
}

impl<T, E> Clone for Action<T, E> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Action<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action")
    }
}

impl<T: Send + 'static, E: Send + 'static> Action<T, E> {
    /// Wrap an async factory as a repeatable action.
    ///
    /// The factory is called once per attempt.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || factory().boxed()),
        }
    }

    /// An action that always succeeds with a clone of `value`.
    pub fn pure(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move || std::future::ready(Ok(value.clone())))
    }

    /// An action that always fails with a clone of `error`.
    pub fn fail(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move || std::future::ready(Err(error.clone())))
    }

    /// Start one attempt of the computation.
    ///
    /// Dropping the returned future cancels the in-flight attempt.
    pub fn attempt(&self) -> BoxFuture<'static, Result<T, E>> {
        (self.factory)()
    }
}
