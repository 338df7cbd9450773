//! Global last-modified clock.
//!
//! Owned by the store and handed to consumers explicitly. Values are epoch
//! milliseconds, strictly increasing across bumps, so two mutations in the
//! same millisecond still compare as ordered.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Clock {
    last: AtomicU64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the last bump (0 before any mutation).
    pub fn last_modified(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }

    /// Advance the clock and return the new value.
    pub fn bump(&self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(Clock::new().last_modified(), 0);
    }

    #[test]
    fn test_bump_strictly_increases() {
        let clock = Clock::new();
        let mut previous = clock.bump();
        for _ in 0..1000 {
            let next = clock.bump();
            assert!(next > previous);
            previous = next;
        }
        assert_eq!(clock.last_modified(), previous);
    }

    #[test]
    fn test_bump_tracks_wall_clock() {
        let clock = Clock::new();
        let before = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap();
        assert!(clock.bump() >= before);
    }
}
