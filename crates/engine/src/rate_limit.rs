//! Per-sender cooldown gate.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};

/// Senders tracked before expired entries are swept.
const SWEEP_THRESHOLD: usize = 1024;

/// Accepts at most one request per sender per cooldown window.
///
/// A rejected sender is not penalised: the window keeps counting from the
/// last *accepted* request and a retry right after it ends is admitted.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` and restarts the sender's window when the previous
    /// accepted request is at least one window old.
    pub async fn admit(&self, sender_id: &str) -> bool {
        let now = Instant::now();
        let mut last_accepted = self.last_accepted.lock().await;

        if let Some(last) = last_accepted.get(sender_id)
            && now.duration_since(*last) < self.window
        {
            tracing::debug!(sender_id, "rate limited");
            return false;
        }

        last_accepted.insert(sender_id.to_string(), now);
        if last_accepted.len() > SWEEP_THRESHOLD {
            let window = self.window;
            last_accepted.retain(|_, at| now.duration_since(*at) < window);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_request_inside_window_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u").await);
        assert!(!limiter.admit("u").await);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(limiter.admit("u").await);
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_do_not_extend_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("u").await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!limiter.admit("u").await);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.admit("u").await);
    }

    #[tokio::test]
    async fn concurrent_requests_admit_one() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let (a, b) = tokio::join!(limiter.admit("u"), limiter.admit("u"));
        assert!(a ^ b);
    }

    #[tokio::test(start_paused = true)]
    async fn senders_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        assert!(limiter.admit("a").await);
        assert!(limiter.admit("b").await);
        assert!(!limiter.admit("a").await);
    }
}
