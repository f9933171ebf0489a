//! Retry backoff policy and tracker for the poll engine.
//!
//! Pure, testable state machine with no IO or clock access. Jitter is drawn
//! from a caller-supplied RNG so tests can pin it.

use std::time::Duration;

use rand::Rng;

// ─── Backoff Policy ──────────────────────────────────────────────

/// Exponential backoff with a ceiling and additive jitter.
///
/// `delay = min(base * 2^(failures - 1), max)`, then jitter uniformly drawn
/// from `[0, jitter_fraction * delay]` is added on top.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure, in milliseconds (default 3000).
    pub base_delay_ms: u64,
    /// Ceiling for the pre-jitter delay, in milliseconds (default 30000).
    pub max_delay_ms: u64,
    /// Upper bound of additive jitter as a fraction of the delay (default 0.20).
    pub jitter_fraction: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 3_000,
            max_delay_ms: 30_000,
            jitter_fraction: 0.20,
        }
    }
}

impl BackoffPolicy {
    /// Pre-jitter delay after `failures` consecutive failures.
    ///
    /// Zero failures and the first failure both yield the base delay.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = 2u64.saturating_pow(exponent);
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Add jitter in `[0, jitter_fraction * delay]`.
    pub fn with_jitter<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        let max_jitter = delay.as_secs_f64() * self.jitter_fraction;
        if !max_jitter.is_finite() || max_jitter <= 0.0 {
            return delay;
        }
        delay + Duration::from_secs_f64(rng.random_range(0.0..=max_jitter))
    }
}

// ─── Backoff Tracker ─────────────────────────────────────────────

/// Counts consecutive failures and turns them into retry delays.
#[derive(Debug, Clone)]
pub struct BackoffTracker {
    policy: BackoffPolicy,
    consecutive_failures: u32,
}

impl BackoffTracker {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
        }
    }

    /// Record a failed fetch and return the pre-jitter retry delay.
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.policy.delay_for(self.consecutive_failures)
    }

    /// Record a successful fetch. The next delay drops straight back to base.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Forget all history, e.g. when the backend is swapped.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    proptest! {
        /// Delay is non-decreasing in the failure count and never exceeds max.
        #[test]
        fn delay_monotone_and_capped(
            base_ms in 1u64..10_000,
            extra_ms in 0u64..120_000,
            failures in 0u32..80,
        ) {
            let policy = BackoffPolicy {
                base_delay_ms: base_ms,
                max_delay_ms: base_ms + extra_ms,
                jitter_fraction: 0.0,
            };
            let a = policy.delay_for(failures);
            let b = policy.delay_for(failures + 1);
            prop_assert!(a <= b);
            prop_assert!(b <= Duration::from_millis(policy.max_delay_ms));
        }

        /// Any success drops the next delay straight back to base.
        #[test]
        fn success_always_resets(failures in 1u32..50) {
            let mut tracker = BackoffTracker::new(BackoffPolicy::default());
            for _ in 0..failures {
                tracker.record_failure();
            }
            tracker.record_success();
            prop_assert_eq!(
                tracker.record_failure(),
                Duration::from_millis(tracker.policy().base_delay_ms)
            );
        }

        #[test]
        fn jitter_bounded(seed in any::<u64>(), secs in 1u64..60, fraction in 0.0f64..1.0) {
            let policy = BackoffPolicy { jitter_fraction: fraction, ..BackoffPolicy::default() };
            let mut rng = StdRng::seed_from_u64(seed);
            let delay = Duration::from_secs(secs);
            let jittered = policy.with_jitter(delay, &mut rng);
            prop_assert!(jittered >= delay);
            prop_assert!(jittered.as_secs_f64() <= delay.as_secs_f64() * (1.0 + fraction) + 1e-6);
        }
    }
}
