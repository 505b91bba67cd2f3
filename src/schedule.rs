//! Backoff schedules: lazy, possibly infinite sequences of retry delays.
//!
//! A [`Schedule`] maps a retry index to the delay that should precede that
//! retry, or to nothing once the schedule is exhausted. Schedules are
//! evaluated on demand — an infinite schedule is just a function that never
//! returns `None`, not a materialized structure. The i-th retry of a session
//! consumes the i-th element, so a finite schedule implicitly caps the retry
//! count at its length.
//!
//! Delays are computed closed-form from the index rather than accumulated
//! iteratively, so large indices need no state. The exponential and fibonacci
//! generators multiply in 128-bit nanoseconds and saturate to the largest
//! representable [`Duration`] before narrowing; they never wrap.
//!
//! # Examples
//!
//! ```rust
//! use eddy::Schedule;
//! use std::time::Duration;
//!
//! let schedule = Schedule::exponential(Duration::from_millis(100))
//!     .cap_delay(Duration::from_secs(1))
//!     .limit_retries(5);
//!
//! assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(100)));
//! assert_eq!(schedule.delay_for(3), Some(Duration::from_millis(800)));
//! assert_eq!(schedule.delay_for(4), Some(Duration::from_secs(1))); // capped
//! assert_eq!(schedule.delay_for(5), None); // retry count exhausted
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Narrow 128-bit nanoseconds to a `Duration`, saturating at `Duration::MAX`.
fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = nanos / NANOS_PER_SEC;
    if secs > u64::MAX as u128 {
        Duration::MAX
    } else {
        Duration::new(secs as u64, (nanos % NANOS_PER_SEC) as u32)
    }
}

/// Multiply a duration by an integer factor in 128-bit nanoseconds,
/// saturating instead of overflowing.
fn mul_duration(base: Duration, factor: u128) -> Duration {
    match base.as_nanos().checked_mul(factor) {
        Some(nanos) => duration_from_nanos(nanos),
        None => Duration::MAX,
    }
}

/// `2^n` in u128, saturating for shifts that would overflow.
fn pow2(n: u32) -> u128 {
    if n > 127 {
        u128::MAX
    } else {
        1u128 << n
    }
}

/// The nth Fibonacci number with fib(0) = fib(1) = 1, saturating in u128.
fn fib(n: u32) -> u128 {
    let (mut a, mut b) = (1u128, 1u128);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
        if a == u128::MAX {
            break;
        }
    }
    a
}

/// An ordered, lazily-produced, possibly-infinite sequence of retry delays.
///
/// The delay at index `i` is the wait before the i-th retry; `None` means the
/// schedule is exhausted and the session should give up. Every schedule
/// carries a composable textual description for diagnostics, available via
/// `Display`.
///
/// Schedules are cheap to clone and safe to share across sessions; they hold
/// no per-session state.
#[derive(Clone)]
pub struct Schedule {
    delays: Arc<dyn Fn(u32) -> Option<Duration> + Send + Sync>,
    description: String,
}

impl Schedule {
    /// Build a schedule from an arbitrary index function.
    ///
    /// The description appears in `Display` output and in the descriptions of
    /// any combinators wrapping this schedule.
    pub fn from_fn<F>(description: impl Into<String>, delays: F) -> Self
    where
        F: Fn(u32) -> Option<Duration> + Send + Sync + 'static,
    {
        Self {
            delays: Arc::new(delays),
            description: description.into(),
        }
    }

    /// An infinite schedule where every retry waits the same delay.
    pub fn constant(delay: Duration) -> Self {
        Self::from_fn(format!("constant({delay:?})"), move |_| Some(delay))
    }

    /// Exponential backoff: the delay before retry `n` is `base * 2^n`.
    ///
    /// The multiplication is performed in 128-bit nanoseconds and saturated
    /// to `Duration::MAX`, so large indices cap out rather than wrapping.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eddy::Schedule;
    /// use std::time::Duration;
    ///
    /// let schedule = Schedule::exponential(Duration::from_millis(100));
    /// assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(100)));
    /// assert_eq!(schedule.delay_for(1), Some(Duration::from_millis(200)));
    /// assert_eq!(schedule.delay_for(2), Some(Duration::from_millis(400)));
    /// assert_eq!(schedule.delay_for(100), Some(Duration::MAX)); // saturated
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self::from_fn(format!("exponential({base:?})"), move |index| {
            Some(mul_duration(base, pow2(index)))
        })
    }

    /// Fibonacci backoff: the delay before retry `n` is `base * fib(n)`,
    /// with `fib(0) = fib(1) = 1`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eddy::Schedule;
    /// use std::time::Duration;
    ///
    /// let schedule = Schedule::fibonacci(Duration::from_millis(100));
    /// assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(100)));
    /// assert_eq!(schedule.delay_for(1), Some(Duration::from_millis(100)));
    /// assert_eq!(schedule.delay_for(2), Some(Duration::from_millis(200)));
    /// assert_eq!(schedule.delay_for(3), Some(Duration::from_millis(300)));
    /// assert_eq!(schedule.delay_for(4), Some(Duration::from_millis(500)));
    /// ```
    pub fn fibonacci(base: Duration) -> Self {
        Self::from_fn(format!("fibonacci({base:?})"), move |index| {
            Some(mul_duration(base, fib(index)))
        })
    }

    /// Full jitter (AWS recommended): the delay before retry `n` is drawn
    /// uniformly from `[0, base * 2^n]` at the moment the schedule is
    /// consulted.
    ///
    /// Each consultation draws fresh — draws are never cached or pre-computed
    /// for future steps, so concurrent sessions decorrelate.
    ///
    /// Requires the `jitter` feature (enabled by default).
    #[cfg(feature = "jitter")]
    pub fn full_jitter(base: Duration) -> Self {
        Self::from_fn(format!("full_jitter({base:?})"), move |index| {
            use rand::Rng;
            let cap = mul_duration(base, pow2(index));
            let nanos = rand::rng().random_range(0..=cap.as_nanos());
            Some(duration_from_nanos(nanos))
        })
    }

    /// A finite schedule consisting of exactly the given delays.
    ///
    /// The session retries at most `delays.len()` times.
    pub fn from_delays(delays: Vec<Duration>) -> Self {
        let description = format!("from_delays({delays:?})");
        Self::from_fn(description, move |index| {
            delays.get(index as usize).copied()
        })
    }

    /// The delay before the retry at `index`, or `None` once exhausted.
    ///
    /// The engine consults this positionally: the i-th retry of a session
    /// consumes index `i`.
    pub fn delay_for(&self, index: u32) -> Option<Duration> {
        (self.delays)(index)
    }

    /// Clamp every delay to at most `cap`, elementwise.
    pub fn cap_delay(self, cap: Duration) -> Self {
        let inner = self.delays;
        Self {
            delays: Arc::new(move |index| inner(index).map(|d| d.min(cap))),
            description: format!("cap_delay({cap:?}, {})", self.description),
        }
    }

    /// Cut the schedule off after `max_retries` elements.
    pub fn limit_retries(self, max_retries: u32) -> Self {
        let inner = self.delays;
        Self {
            delays: Arc::new(move |index| {
                if index < max_retries {
                    inner(index)
                } else {
                    None
                }
            }),
            description: format!("limit_retries({max_retries}, {})", self.description),
        }
    }

    /// Keep only the leading elements whose running delay total stays within
    /// `threshold`; everything from the first element that pushes the total
    /// past the threshold is dropped.
    ///
    /// The result is finite even when the input is infinite, because delays
    /// are non-negative and the running total only grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use eddy::Schedule;
    /// use std::time::Duration;
    ///
    /// let schedule = Schedule::from_delays(vec![Duration::from_secs(1); 3])
    ///     .limit_retries_by_cumulative_delay(Duration::from_millis(2500));
    ///
    /// assert_eq!(schedule.delay_for(0), Some(Duration::from_secs(1)));
    /// assert_eq!(schedule.delay_for(1), Some(Duration::from_secs(1)));
    /// assert_eq!(schedule.delay_for(2), None); // total would reach 3s
    /// ```
    pub fn limit_retries_by_cumulative_delay(self, threshold: Duration) -> Self {
        let inner = self.delays;
        Self {
            delays: Arc::new(move |index| {
                let mut total = Duration::ZERO;
                for earlier in 0..index {
                    total = total.saturating_add(inner(earlier)?);
                }
                let delay = inner(index)?;
                if total.saturating_add(delay) > threshold {
                    None
                } else {
                    Some(delay)
                }
            }),
            description: format!(
                "limit_retries_by_cumulative_delay({threshold:?}, {})",
                self.description
            ),
        }
    }

    /// The composable textual description of this schedule.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_constant_is_constant() {
        let schedule = Schedule::constant(Duration::from_millis(500));
        for index in [0, 1, 7, 1000] {
            assert_eq!(schedule.delay_for(index), Some(Duration::from_millis(500)));
        }
    }

    #[test]
    fn test_exponential_doubles() {
        let schedule = Schedule::exponential(Duration::from_millis(100));
        assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(100)));
        assert_eq!(schedule.delay_for(1), Some(Duration::from_millis(200)));
        assert_eq!(schedule.delay_for(2), Some(Duration::from_millis(400)));
        assert_eq!(schedule.delay_for(3), Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_exponential_saturates_instead_of_wrapping() {
        let schedule = Schedule::exponential(Duration::from_secs(1));
        assert_eq!(schedule.delay_for(100), Some(Duration::MAX));
        assert_eq!(schedule.delay_for(u32::MAX), Some(Duration::MAX));
    }

    #[test]
    fn test_fibonacci_sequence() {
        let schedule = Schedule::fibonacci(Duration::from_millis(100));
        let expected = [100u64, 100, 200, 300, 500, 800, 1300];
        for (index, ms) in expected.iter().enumerate() {
            assert_eq!(
                schedule.delay_for(index as u32),
                Some(Duration::from_millis(*ms)),
                "index {index}"
            );
        }
    }

    #[test]
    fn test_fibonacci_saturates() {
        let schedule = Schedule::fibonacci(Duration::from_secs(1));
        assert_eq!(schedule.delay_for(500), Some(Duration::MAX));
    }

    #[test]
    fn test_cap_delay_clamps_elementwise() {
        let schedule =
            Schedule::exponential(Duration::from_millis(100)).cap_delay(Duration::from_millis(500));
        assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(100)));
        assert_eq!(schedule.delay_for(2), Some(Duration::from_millis(400)));
        assert_eq!(schedule.delay_for(3), Some(Duration::from_millis(500)));
        assert_eq!(schedule.delay_for(10), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_limit_retries_cuts_off() {
        let schedule = Schedule::constant(Duration::from_millis(10)).limit_retries(2);
        assert!(schedule.delay_for(0).is_some());
        assert!(schedule.delay_for(1).is_some());
        assert_eq!(schedule.delay_for(2), None);
    }

    #[test]
    fn test_cumulative_delay_limit_keeps_leading_elements() {
        let schedule = Schedule::from_delays(vec![Duration::from_secs(1); 3])
            .limit_retries_by_cumulative_delay(Duration::from_millis(2500));

        assert_eq!(schedule.delay_for(0), Some(Duration::from_secs(1)));
        assert_eq!(schedule.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(schedule.delay_for(2), None);
    }

    #[test]
    fn test_cumulative_delay_limit_makes_infinite_schedule_finite() {
        let schedule = Schedule::constant(Duration::from_secs(1))
            .limit_retries_by_cumulative_delay(Duration::from_secs(5));

        assert_eq!(schedule.delay_for(4), Some(Duration::from_secs(1)));
        assert_eq!(schedule.delay_for(5), None);
        assert_eq!(schedule.delay_for(50), None);
    }

    #[test]
    fn test_from_delays_is_finite() {
        let schedule = Schedule::from_delays(vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
        ]);
        assert_eq!(schedule.delay_for(0), Some(Duration::from_millis(10)));
        assert_eq!(schedule.delay_for(1), Some(Duration::from_millis(20)));
        assert_eq!(schedule.delay_for(2), None);
    }

    #[test]
    fn test_descriptions_compose() {
        let schedule = Schedule::exponential(Duration::from_millis(100))
            .cap_delay(Duration::from_secs(1))
            .limit_retries(5);

        assert_eq!(
            schedule.to_string(),
            "limit_retries(5, cap_delay(1s, exponential(100ms)))"
        );
    }

    #[cfg(feature = "jitter")]
    #[test]
    fn test_full_jitter_stays_within_exponential_envelope() {
        let schedule = Schedule::full_jitter(Duration::from_millis(100));
        for _ in 0..100 {
            let delay = schedule.delay_for(3).unwrap();
            assert!(delay <= Duration::from_millis(800), "got {delay:?}");
        }
    }

    #[cfg(feature = "jitter")]
    #[test]
    fn test_full_jitter_draws_fresh_each_consultation() {
        let schedule = Schedule::full_jitter(Duration::from_secs(100));
        let first = schedule.delay_for(10).unwrap();
        let varied = (0..100).any(|_| schedule.delay_for(10).unwrap() != first);
        assert!(varied, "100 consultations all produced {first:?}");
    }

    #[test]
    fn test_fib_helper() {
        let expected = [1u128, 1, 2, 3, 5, 8, 13, 21];
        for (n, value) in expected.iter().enumerate() {
            assert_eq!(fib(n as u32), *value, "fib({n})");
        }
    }

    proptest! {
        #[test]
        fn prop_cap_delay_is_elementwise_min(base_ms in 1u64..1000, cap_ms in 1u64..1000, index in 0u32..20) {
            let base = Duration::from_millis(base_ms);
            let cap = Duration::from_millis(cap_ms);
            let uncapped = Schedule::exponential(base);
            let capped = Schedule::exponential(base).cap_delay(cap);

            prop_assert_eq!(
                capped.delay_for(index),
                uncapped.delay_for(index).map(|d| d.min(cap))
            );
        }

        #[test]
        fn prop_exponential_matches_closed_form(base_ms in 1u64..1000, index in 0u32..20) {
            let schedule = Schedule::exponential(Duration::from_millis(base_ms));
            prop_assert_eq!(
                schedule.delay_for(index),
                Some(Duration::from_millis(base_ms) * 2u32.pow(index))
            );
        }
    }
}
