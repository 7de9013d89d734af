//! Per-process submission throttle.
//!
//! Fixed-window counters keyed by caller (user id, IP, ...). The key table is
//! bounded: expired windows are reclaimed first, then the oldest window is
//! evicted, so memory stays flat no matter how many distinct callers show up.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl ThrottleDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct SubmissionThrottle {
    capacity: usize,
    max_per_window: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl SubmissionThrottle {
    /// `capacity` caps the number of tracked keys (minimum 1).
    pub fn new(capacity: usize, max_per_window: u32, window: Duration) -> Self {
        Self { capacity: capacity.max(1), max_per_window, window, windows: Mutex::new(HashMap::new()) }
    }

    /// Count one submission for `key` at `now`.
    pub fn check(&self, key: &str, now: Instant) -> ThrottleDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(current) = windows.get_mut(key) {
            let age = now.saturating_duration_since(current.started);
            if age >= self.window {
                *current = Window { started: now, count: 1 };
                return ThrottleDecision::Allowed;
            }
            if current.count >= self.max_per_window {
                let retry_after = self.window - age;
                tracing::debug!(key, ?retry_after, "submission throttled");
                return ThrottleDecision::Limited { retry_after };
            }
            current.count += 1;
            return ThrottleDecision::Allowed;
        }

        if self.max_per_window == 0 {
            return ThrottleDecision::Limited { retry_after: self.window };
        }

        if windows.len() >= self.capacity {
            let window = self.window;
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }
        if windows.len() >= self.capacity {
            let oldest = windows.iter().min_by_key(|(_, w)| w.started).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(evicted = %oldest, "throttle table full");
                windows.remove(&oldest);
            }
        }

        windows.insert(key.to_string(), Window { started: now, count: 1 });
        ThrottleDecision::Allowed
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn limits_within_a_window() {
        let throttle = SubmissionThrottle::new(16, 2, MINUTE);
        let t0 = Instant::now();

        assert!(throttle.check("alice", t0).is_allowed());
        assert!(throttle.check("alice", t0 + Duration::from_secs(1)).is_allowed());
        assert_eq!(
            throttle.check("alice", t0 + Duration::from_secs(20)),
            ThrottleDecision::Limited { retry_after: Duration::from_secs(40) }
        );
        assert!(throttle.check("bob", t0 + Duration::from_secs(20)).is_allowed());
    }

    #[test]
    fn window_resets() {
        let throttle = SubmissionThrottle::new(16, 1, MINUTE);
        let t0 = Instant::now();

        assert!(throttle.check("alice", t0).is_allowed());
        assert!(!throttle.check("alice", t0 + Duration::from_secs(59)).is_allowed());
        assert!(throttle.check("alice", t0 + MINUTE).is_allowed());
    }

    #[test]
    fn zero_budget_always_limits() {
        let throttle = SubmissionThrottle::new(4, 0, MINUTE);
        assert!(!throttle.check("alice", Instant::now()).is_allowed());
        assert_eq!(throttle.tracked(), 0);
    }

    #[test]
    fn full_table_evicts_oldest_key() {
        let throttle = SubmissionThrottle::new(2, 1, MINUTE);
        let t0 = Instant::now();

        throttle.check("a", t0);
        throttle.check("b", t0 + Duration::from_secs(1));
        throttle.check("c", t0 + Duration::from_secs(2));

        assert_eq!(throttle.tracked(), 2);
        // "a" was evicted, so it starts a fresh window.
        assert!(throttle.check("a", t0 + Duration::from_secs(3)).is_allowed());
        // "c" is still counted.
        assert!(!throttle.check("c", t0 + Duration::from_secs(3)).is_allowed());
    }

    #[test]
    fn expired_windows_are_reclaimed_before_eviction() {
        let throttle = SubmissionThrottle::new(2, 1, MINUTE);
        let t0 = Instant::now();

        throttle.check("a", t0);
        throttle.check("b", t0 + Duration::from_secs(30));
        throttle.check("c", t0 + Duration::from_secs(61));

        assert!(!throttle.check("b", t0 + Duration::from_secs(62)).is_allowed());
    }

    proptest! {
        #[test]
        fn table_never_exceeds_capacity(
            capacity in 1usize..8,
            keys in prop::collection::vec(0u8..32, 1..200),
        ) {
            let throttle = SubmissionThrottle::new(capacity, 3, MINUTE);
            let t0 = Instant::now();
            for (i, key) in keys.iter().enumerate() {
                throttle.check(&key.to_string(), t0 + Duration::from_millis(i as u64));
                prop_assert!(throttle.tracked() <= capacity);
            }
        }
    }
}
