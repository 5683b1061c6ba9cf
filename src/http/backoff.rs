use std::time::Duration;

use rand::Rng;

pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(2000);

/// Jittered exponential backoff.
///
/// The wait for an attempt is drawn uniformly from `[base / 2, base]` where
/// `base = min(max_wait, min_wait * 2^attempt)`, so it never exceeds `max_wait`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    min_wait: Duration,
    max_wait: Duration,
}

impl Backoff {
    pub fn new(min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            min_wait,
            max_wait: max_wait.max(min_wait),
        }
    }

    pub fn wait(&self, attempt: u32) -> Duration {
        self.wait_with(attempt, &mut rand::rng())
    }

    pub fn wait_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base(attempt);
        let center = base / 2;

        let center_nanos = u64::try_from(center.as_nanos()).unwrap_or(u64::MAX);
        let jitter = if center_nanos == 0 {
            0
        } else {
            rng.random_range(0..=center_nanos)
        };

        center + Duration::from_nanos(jitter)
    }

    fn base(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.min_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WAIT, DEFAULT_MAX_WAIT)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_wait_never_exceeds_max() {
        let backoff = Backoff::default();
        let mut rng = StdRng::seed_from_u64(7);

        for attempt in 0..64 {
            for _ in 0..50 {
                let wait = backoff.wait_with(attempt, &mut rng);
                assert!(wait <= DEFAULT_MAX_WAIT, "attempt {attempt} waited {wait:?}");
            }
        }
    }

    #[test]
    fn test_wait_stays_within_half_and_full_base() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));
        let mut rng = StdRng::seed_from_u64(1);

        // attempt 2 => base 400ms
        for _ in 0..100 {
            let wait = backoff.wait_with(2, &mut rng);
            assert!(wait >= Duration::from_millis(200));
            assert!(wait <= Duration::from_millis(400));
        }
    }

    #[test]
    fn test_wait_grows_with_attempt_until_cap() {
        let backoff = Backoff::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mean = |attempt: u32, rng: &mut StdRng| -> f64 {
            let total: f64 = (0..500)
                .map(|_| backoff.wait_with(attempt, rng).as_secs_f64())
                .sum();
            total / 500.0
        };

        let means: Vec<f64> = (0..6).map(|attempt| mean(attempt, &mut rng)).collect();
        for pair in means.windows(2) {
            // capped attempts share the same distribution; allow sampling noise
            assert!(pair[1] >= pair[0] * 0.95, "means: {means:?}");
        }
    }

    #[test]
    fn test_zero_min_wait_yields_zero() {
        let backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.wait(5), Duration::ZERO);
    }
}
