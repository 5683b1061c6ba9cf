use std::sync::{Mutex, PoisonError};

use chrono::Utc;

/// Number of requests seen during one second.
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    /// Unix timestamp in seconds of the last write.
    timestamp: i64,
    count: i64,
}

/// Counts events over a trailing window of `window_size` seconds.
///
/// Buckets are never cleared. A bucket whose timestamp falls out of the window
/// is simply skipped by [`count`](Self::count) and overwritten by the next
/// [`increment`](Self::increment) landing on its slot. This only holds because
/// there is exactly one bucket per second of the window: a slot is always
/// rewritten before its stale value could be mistaken for a fresh one.
///
/// A window size of zero or less disables counting: the counter then always
/// reports zero.
#[derive(Debug)]
pub struct SlidingWindowCounter {
    window: Option<Window>,
}

#[derive(Debug)]
struct Window {
    size: i64,
    buckets: Mutex<Vec<Bucket>>,
}

impl SlidingWindowCounter {
    pub fn new(window_size: i64) -> Self {
        let window = (window_size > 0).then(|| Window {
            size: window_size,
            buckets: Mutex::new(vec![Bucket::default(); window_size as usize]),
        });

        Self { window }
    }

    pub fn is_enabled(&self) -> bool {
        self.window.is_some()
    }

    pub fn increment(&self) {
        self.increment_at(Utc::now().timestamp());
    }

    pub fn count(&self) -> i64 {
        self.count_at(Utc::now().timestamp())
    }

    pub(crate) fn increment_at(&self, now: i64) {
        let Some(window) = &self.window else {
            return;
        };

        let mut buckets = window.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = &mut buckets[now.rem_euclid(window.size) as usize];

        if bucket.timestamp == now {
            bucket.count += 1;
        } else {
            *bucket = Bucket {
                timestamp: now,
                count: 1,
            };
        }
    }

    pub(crate) fn count_at(&self, now: i64) -> i64 {
        let Some(window) = &self.window else {
            return 0;
        };

        let cutoff = now - window.size;
        let buckets = window.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .iter()
            .filter(|b| b.timestamp > cutoff)
            .map(|b| b.count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_counter_reports_zero() {
        for size in [0, -3] {
            let counter = SlidingWindowCounter::new(size);
            assert!(!counter.is_enabled());
            counter.increment();
            counter.increment();
            assert_eq!(counter.count(), 0);
        }
    }

    #[test]
    fn test_counts_within_same_second() {
        let counter = SlidingWindowCounter::new(2);
        for _ in 0..4 {
            counter.increment_at(1_000);
        }

        assert_eq!(counter.count_at(1_000), 4);
    }

    #[test]
    fn test_counts_across_window() {
        let counter = SlidingWindowCounter::new(3);
        counter.increment_at(100);
        counter.increment_at(101);
        counter.increment_at(101);
        counter.increment_at(102);

        assert_eq!(counter.count_at(102), 4);
        // 100 falls out of the window at 103
        assert_eq!(counter.count_at(103), 3);
        assert_eq!(counter.count_at(104), 1);
        assert_eq!(counter.count_at(105), 0);
    }

    #[test]
    fn test_stale_bucket_is_overwritten() {
        let counter = SlidingWindowCounter::new(2);
        counter.increment_at(10);
        counter.increment_at(10);

        // same slot as 10, two windows later
        counter.increment_at(12);
        assert_eq!(counter.count_at(12), 1);
    }

    #[test]
    fn test_real_clock_never_overcounts() {
        let counter = SlidingWindowCounter::new(2);
        for _ in 0..4 {
            counter.increment();
        }

        let count = counter.count();
        assert!(count <= 4);
        assert!(count > 0);
    }
}
