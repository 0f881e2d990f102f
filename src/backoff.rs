//! Backoff calculator for retry policies.
//!
//! Computes the sleep between attempts from four parameters: a base sleep, a cap, a
//! multiplicative scale and a jitter bound. All arithmetic happens in whole seconds.
//!
//! Attempt semantics: attempts are 1-based and the delay for attempt `n` is the pause taken
//! *after* attempt `n` failed. Attempt `1` applies jitter but no scaling; every later attempt
//! multiplies the base by `scale^(n-1)` (truncated) before jitter is added. The result is clamped
//! to the cap. Attempt `0` never sleeps.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use rebound::backoff::{compute_sleep, Backoff};
//!
//! assert_eq!(compute_sleep(1, 10, 300, 2.0, 0).unwrap(), 10);
//! assert_eq!(compute_sleep(3, 10, 300, 2.0, 0).unwrap(), 40);
//! assert_eq!(compute_sleep(3, 10, 30, 2.0, 0).unwrap(), 30); // capped
//!
//! let backoff = Backoff::default()
//!     .base_sleep(Duration::from_secs(10))
//!     .scale(2.0)
//!     .jitter(Duration::ZERO);
//! assert_eq!(backoff.delay(2).unwrap(), Duration::from_secs(20));
//! ```
//!
//! Jitter: when enabled, a value drawn uniformly from `[-m, m]` with
//! `m = floor(jitter * attempt * scale)` is added to the scaled delay. A jittered delay that would
//! go negative saturates to zero. `jitter > base_sleep` is rejected up front.

use crate::error::BackoffError;
use rand::Rng;
use std::time::Duration;

/// Default unscaled delay between attempts.
pub const DEFAULT_BASE_SLEEP: Duration = Duration::from_secs(60);
/// Default upper clamp on computed delays.
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_secs(300);
/// Default growth factor per elapsed attempt.
pub const DEFAULT_SCALE: f64 = 1.5;
/// Default jitter bound.
pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);

/// Compute the sleep (in whole seconds) that follows a failed `attempt`.
///
/// Uses the thread-local RNG for jitter. See [`compute_sleep_with_rng`] for a deterministic
/// variant.
pub fn compute_sleep(
    attempt: u32,
    base_sleep: u64,
    max_sleep: u64,
    scale: f64,
    jitter: u64,
) -> Result<u64, BackoffError> {
    compute_sleep_with_rng(attempt, base_sleep, max_sleep, scale, jitter, &mut rand::rng())
}

/// Compute the sleep with a caller-supplied RNG (for testing).
pub fn compute_sleep_with_rng<R: Rng>(
    attempt: u32,
    base_sleep: u64,
    max_sleep: u64,
    scale: f64,
    jitter: u64,
    rng: &mut R,
) -> Result<u64, BackoffError> {
    check_jitter(base_sleep, jitter)?;
    Ok(scaled_delay(attempt, base_sleep, max_sleep, scale, jitter, rng))
}

fn check_jitter(base_sleep: u64, jitter: u64) -> Result<(), BackoffError> {
    if jitter > base_sleep {
        return Err(BackoffError::JitterExceedsBase { jitter, base_sleep });
    }
    Ok(())
}

fn scaled_delay<R: Rng>(
    attempt: u32,
    base_sleep: u64,
    max_sleep: u64,
    scale: f64,
    jitter: u64,
    rng: &mut R,
) -> u64 {
    let offset = match jitter_magnitude(attempt, scale, jitter) {
        0 => 0,
        magnitude => rng.random_range(-magnitude..=magnitude),
    };
    delay_with_offset(attempt, base_sleep, max_sleep, scale, offset)
}

// float -> int casts saturate, and a non-positive scale yields no spread at all
fn jitter_magnitude(attempt: u32, scale: f64, jitter: u64) -> i64 {
    if jitter == 0 {
        return 0;
    }
    (jitter as f64 * f64::from(attempt) * scale).floor().max(0.0) as i64
}

fn delay_with_offset(
    attempt: u32,
    base_sleep: u64,
    max_sleep: u64,
    scale: f64,
    offset: i64,
) -> u64 {
    if attempt == 0 {
        return 0;
    }

    let mut scaled = base_sleep as f64;
    if attempt > 1 {
        let exponent = (attempt - 1).min(i32::MAX as u32) as i32;
        scaled = (scaled * scale.powi(exponent)).trunc();
    }

    // NaN (0 * inf) maps to 0, +inf saturates to u64::MAX before the offset.
    let jittered = (i128::from(scaled as u64) + i128::from(offset)).max(0);
    u64::try_from(jittered).unwrap_or(u64::MAX).min(max_sleep)
}

/// Backoff parameter set: base sleep, cap, scale and jitter bound.
///
/// Durations are interpreted at whole-second granularity. A zero jitter disables jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base_sleep: Duration,
    max_sleep: Duration,
    scale: f64,
    jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_sleep: DEFAULT_BASE_SLEEP,
            max_sleep: DEFAULT_MAX_SLEEP,
            scale: DEFAULT_SCALE,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl Backoff {
    /// Backoff without jitter: `base_sleep * scale^(attempt-1)`, capped at `max_sleep`.
    pub fn exponential(base_sleep: Duration, max_sleep: Duration, scale: f64) -> Self {
        Self { base_sleep, max_sleep, scale, jitter: Duration::ZERO }
    }

    /// Set the unscaled delay.
    pub fn base_sleep(mut self, base_sleep: Duration) -> Self {
        self.base_sleep = base_sleep;
        self
    }

    /// Set the upper clamp.
    pub fn max_sleep(mut self, max_sleep: Duration) -> Self {
        self.max_sleep = max_sleep;
        self
    }

    /// Set the growth factor applied per elapsed attempt.
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the jitter bound; zero disables jitter.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn base_sleep_duration(&self) -> Duration {
        self.base_sleep
    }

    pub fn max_sleep_duration(&self) -> Duration {
        self.max_sleep
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    pub fn jitter_bound(&self) -> Duration {
        self.jitter
    }

    /// Check the jitter precondition without computing a delay.
    pub fn validate(&self) -> Result<(), BackoffError> {
        check_jitter(self.base_sleep.as_secs(), self.jitter.as_secs())
    }

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Result<Duration, BackoffError> {
        self.delay_with_rng(attempt, &mut rand::rng())
    }

    /// Delay with a caller-supplied RNG (for testing).
    pub fn delay_with_rng<R: Rng>(
        &self,
        attempt: u32,
        rng: &mut R,
    ) -> Result<Duration, BackoffError> {
        compute_sleep_with_rng(
            attempt,
            self.base_sleep.as_secs(),
            self.max_sleep.as_secs(),
            self.scale,
            self.jitter.as_secs(),
            rng,
        )
        .map(Duration::from_secs)
    }

    /// Delay for parameters already accepted by [`Backoff::validate`].
    pub(crate) fn delay_unchecked(&self, attempt: u32) -> Duration {
        Duration::from_secs(scaled_delay(
            attempt,
            self.base_sleep.as_secs(),
            self.max_sleep.as_secs(),
            self.scale,
            self.jitter.as_secs(),
            &mut rand::rng(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn doubles_each_attempt_without_jitter() {
        let expected = [10, 20, 40, 80];
        for (idx, want) in expected.iter().enumerate() {
            let attempt = idx as u32 + 1;
            assert_eq!(compute_sleep(attempt, 10, 300, 2.0, 0).unwrap(), *want);
        }
    }

    #[test]
    fn clamps_to_max_sleep() {
        let expected = [10, 20, 30, 30];
        for (idx, want) in expected.iter().enumerate() {
            let attempt = idx as u32 + 1;
            assert_eq!(compute_sleep(attempt, 10, 30, 2.0, 0).unwrap(), *want);
        }
    }

    #[test]
    fn first_attempt_is_unscaled() {
        assert_eq!(compute_sleep(1, 60, 300, 1.5, 0).unwrap(), 60);
        assert_eq!(compute_sleep(1, 7, 300, 100.0, 0).unwrap(), 7);
    }

    #[test]
    fn truncates_fractional_growth() {
        // 60 * 1.5 = 90, 60 * 2.25 = 135, 60 * 3.375 = 202.5 -> 202
        assert_eq!(compute_sleep(2, 60, 300, 1.5, 0).unwrap(), 90);
        assert_eq!(compute_sleep(3, 60, 300, 1.5, 0).unwrap(), 135);
        assert_eq!(compute_sleep(4, 60, 300, 1.5, 0).unwrap(), 202);
        assert_eq!(compute_sleep(5, 60, 300, 1.5, 0).unwrap(), 300);
    }

    #[test]
    fn matches_closed_form_without_jitter() {
        for attempt in 2..12u32 {
            let want = ((10.0 * 1.7f64.powi(attempt as i32 - 1)).floor() as u64).min(500);
            assert_eq!(compute_sleep(attempt, 10, 500, 1.7, 0).unwrap(), want);
        }
    }

    #[test]
    fn rejects_jitter_larger_than_base() {
        let err = compute_sleep(1, 1, 300, 1.5, 2).unwrap_err();
        assert_eq!(err, BackoffError::JitterExceedsBase { jitter: 2, base_sleep: 1 });
    }

    #[test]
    fn jitter_equal_to_base_is_accepted() {
        assert!(compute_sleep(1, 3, 300, 2.0, 3).is_ok());
    }

    #[test]
    fn jitter_offset_is_added_after_scaling() {
        // base 10, scale 2: scaled delays 10/20/40/80, offsets alternate -3/+3
        let offsets = [-3, 3, -3, 3];
        let delays: Vec<u64> = offsets
            .iter()
            .zip(1..)
            .map(|(offset, attempt)| delay_with_offset(attempt, 10, 300, 2.0, *offset))
            .collect();
        assert_eq!(delays, vec![7, 23, 37, 83]);
    }

    #[test]
    fn jitter_stays_within_scaled_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            // magnitude = floor(3 * 1 * 2) = 6
            let first = compute_sleep_with_rng(1, 10, 300, 2.0, 3, &mut rng).unwrap();
            assert!((4..=16).contains(&first), "got {}", first);

            // magnitude = floor(3 * 2 * 2) = 12, around a scaled delay of 20
            let second = compute_sleep_with_rng(2, 10, 300, 2.0, 3, &mut rng).unwrap();
            assert!((8..=32).contains(&second), "got {}", second);
        }
    }

    #[test]
    fn jitter_spreads_over_odd_and_even_seconds() {
        let seen: std::collections::HashSet<u64> = (0..2000u64)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                compute_sleep_with_rng(2, 10, 300, 2.0, 3, &mut rng).unwrap()
            })
            .collect();
        assert!(seen.contains(&23));
        assert!(seen.iter().any(|delay| delay % 2 == 1));
        assert!(!seen.contains(&0));
    }

    #[test]
    fn negative_jittered_delay_saturates_to_zero() {
        assert_eq!(delay_with_offset(1, 2, 300, 1.5, -3), 0);
    }

    #[test]
    fn jitter_is_deterministic_for_seeded_rng() {
        let a = compute_sleep_with_rng(3, 10, 300, 2.0, 3, &mut StdRng::seed_from_u64(7));
        let b = compute_sleep_with_rng(3, 10, 300, 2.0, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn sub_unit_magnitude_applies_no_spread() {
        // floor(1 * 1 * 0.5) = 0
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(compute_sleep_with_rng(1, 5, 300, 0.5, 1, &mut rng).unwrap(), 5);
    }

    #[test]
    fn jittered_result_never_exceeds_cap() {
        let mut rng = StdRng::seed_from_u64(99);
        for attempt in 1..20 {
            let delay = compute_sleep_with_rng(attempt, 10, 25, 2.0, 10, &mut rng).unwrap();
            assert!(delay <= 25);
        }
    }

    #[test]
    fn attempt_zero_never_sleeps() {
        assert_eq!(compute_sleep(0, 10, 300, 2.0, 5).unwrap(), 0);
    }

    #[test]
    fn very_large_attempt_saturates_to_cap() {
        assert_eq!(compute_sleep(u32::MAX, 1, 300, 2.0, 0).unwrap(), 300);
        assert_eq!(compute_sleep(u32::MAX, 0, 300, 2.0, 0).unwrap(), 0);
    }

    #[test]
    fn backoff_default_matches_documented_defaults() {
        let backoff = Backoff::default();
        assert_eq!(backoff.base_sleep_duration(), Duration::from_secs(60));
        assert_eq!(backoff.max_sleep_duration(), Duration::from_secs(300));
        assert_eq!(backoff.scale_factor(), 1.5);
        assert_eq!(backoff.jitter_bound(), Duration::from_secs(1));
        assert!(backoff.validate().is_ok());
    }

    #[test]
    fn backoff_delay_works_in_whole_seconds() {
        let backoff =
            Backoff::exponential(Duration::from_millis(10_900), Duration::from_secs(300), 2.0);
        assert_eq!(backoff.delay(1).unwrap(), Duration::from_secs(10));
        assert_eq!(backoff.delay(4).unwrap(), Duration::from_secs(80));
    }

    #[test]
    fn backoff_validate_reports_bad_jitter() {
        let backoff = Backoff::default().base_sleep(Duration::ZERO);
        assert!(matches!(backoff.validate(), Err(BackoffError::JitterExceedsBase { .. })));
        assert!(backoff.delay(1).is_err());
    }
}
