//! # Eddy
//!
//! > *"An eddy is where the current circles back"*
//!
//! Composable retry schedules, backoff, and decision handlers for async Rust.
//!
//! ## Philosophy
//!
//! **Eddy** keeps a strict line between the pure core and the imperative
//! shell:
//! - **Pure core**: [`Schedule`]s, [`Policy`]s, and [`RetryStatus`] are data
//!   and pure functions — inspectable, composable, trivially testable.
//! - **Imperative shell**: [`run`] is the one place where time passes. It
//!   attempts the action, asks a [`Handler`] what to do with the outcome, and
//!   sleeps out the schedule's delays.
//!
//! ## Quick Example
//!
//! ```rust
//! use eddy::{noop, retry_on_all_errors, run, Action, Schedule};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let attempts = Arc::new(AtomicU32::new(0));
//! let action = Action::new({
//!     let attempts = attempts.clone();
//!     move || {
//!         let attempts = attempts.clone();
//!         async move {
//!             if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!                 Err("connection refused")
//!             } else {
//!                 Ok("response body")
//!             }
//!         }
//!     }
//! });
//!
//! let schedule = Schedule::exponential(Duration::from_millis(1))
//!     .cap_delay(Duration::from_millis(50))
//!     .limit_retries(5);
//!
//! let result = run(action, schedule, retry_on_all_errors(noop)).await;
//! assert_eq!(result, Ok("response body"));
//! # });
//! ```
//!
//! ## Pieces
//!
//! - [`Schedule`]: lazy index-based delay sequences — constant, exponential,
//!   fibonacci, full jitter — with capping and limiting combinators.
//! - [`Policy`]: outcome-aware decisions composable via `meet`; schedules
//!   lift into policies with [`Policy::from_schedule`].
//! - [`Handler`]: effectful per-attempt inspection, including mid-session
//!   action substitution via [`HandlerDecision::Adapt`].
//! - [`run`] / [`run_with_policy`]: the cancellable execution loop.
//!
//! Cancellation is just dropping the future returned by [`run`]; both
//! suspension points cooperate.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod action;
pub mod handler;
pub mod policy;
pub mod run;
pub mod schedule;
pub mod status;

// Re-exports
pub use action::Action;
#[cfg(feature = "tracing")]
pub use handler::log_with_tracing;
pub use handler::{
    noop, retry_on_all_errors, retry_on_some_errors, retry_until_successful, Handler,
    HandlerDecision,
};
pub use policy::Policy;
pub use run::{run, run_with_policy};
pub use schedule::Schedule;
pub use status::{PolicyDecision, RetryDetails, RetryStatus};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    #[cfg(feature = "tracing")]
    pub use crate::handler::log_with_tracing;
    pub use crate::handler::{
        noop, retry_on_all_errors, retry_on_some_errors, retry_until_successful, Handler,
        HandlerDecision,
    };
    pub use crate::policy::Policy;
    pub use crate::run::{run, run_with_policy};
    pub use crate::schedule::Schedule;
    pub use crate::status::{PolicyDecision, RetryDetails, RetryStatus};
}
