//! Sliding-window send limiter
//!
//! Keeps the timestamps of recent sends. A send is allowed while fewer than
//! `capacity` of them fall inside the trailing window. Stale timestamps are
//! pruned whenever the window is consulted; nothing runs in the background.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Gateway limit: 120 sends per 60 seconds
pub const DEFAULT_CAPACITY: usize = 120;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RateLimiter {
    capacity: usize,
    window: Duration,
    sent: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            sent: VecDeque::with_capacity(capacity),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.sent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.sent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Take a slot at `now`, or return how long until one frees up
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.prune(now);
        if self.sent.len() < self.capacity {
            self.sent.push_back(now);
            return Ok(());
        }

        let wait = match self.sent.front() {
            Some(&oldest) => self.window.saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        };
        Err(wait)
    }

    /// Slots available at `now`
    pub fn remaining(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.capacity.saturating_sub(self.sent.len())
    }

    /// Forget every recorded send; the server counts per socket
    pub fn reset(&mut self) {
        self.sent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_capacity_within_window() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.try_acquire(now).is_ok());
        assert!(limiter.try_acquire(now).is_ok());
        assert!(limiter.try_acquire(now).is_ok());
        assert_eq!(limiter.try_acquire(now), Err(Duration::from_secs(60)));
        assert_eq!(limiter.remaining(now), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_tracks_oldest_send() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        limiter.try_acquire(start).unwrap();
        limiter.try_acquire(start + Duration::from_secs(10)).unwrap();

        let later = start + Duration::from_secs(15);
        assert_eq!(limiter.try_acquire(later), Err(Duration::from_secs(45)));

        // The oldest send leaves the window at exactly 60s.
        let expiry = start + Duration::from_secs(60);
        assert!(limiter.try_acquire(expiry).is_ok());
        assert_eq!(limiter.try_acquire(expiry), Err(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_limits() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();

        for _ in 0..DEFAULT_CAPACITY {
            assert!(limiter.try_acquire(now).is_ok());
        }
        assert!(limiter.try_acquire(now).is_err());
        assert_eq!(limiter.remaining(now + DEFAULT_WINDOW), DEFAULT_CAPACITY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_frees_window() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.try_acquire(now).is_ok());
        assert!(limiter.try_acquire(now).is_ok());
        assert!(limiter.try_acquire(now).is_err());

        limiter.reset();
        assert_eq!(limiter.remaining(now), 2);
        assert!(limiter.try_acquire(now).is_ok());
    }
}
