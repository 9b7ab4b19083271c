//! Fixed-window request limiter for the generative API.
//!
//! Free-tier LLM keys are capped per minute. Rather than hitting the cap and
//! failing, the generator waits here until the current window has room.
//! The mutex is held while sleeping, so waiters queue in arrival order.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::info;

pub struct RequestLimiter {
    max_per_window: u32,
    window: Duration,
    state: Mutex<Window>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RequestLimiter {
    /// Allow `max` requests per minute.
    pub fn per_minute(max: u32) -> Self {
        Self::with_window(max, Duration::from_secs(60))
    }

    pub fn with_window(max: u32, window: Duration) -> Self {
        Self {
            max_per_window: max.max(1),
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Wait until a request may be started, then count it.
    pub async fn acquire(&self) {
        let mut w = self.state.lock().await;
        let elapsed = w.started.elapsed();
        if elapsed >= self.window {
            w.started = Instant::now();
            w.count = 0;
        } else if w.count >= self.max_per_window {
            let wait = self.window - elapsed;
            info!(
                "Rate limit of {} requests reached; waiting {:.1}s",
                self.max_per_window,
                wait.as_secs_f64()
            );
            sleep(wait).await;
            w.started = Instant::now();
            w.count = 0;
        }
        w.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requests_within_budget_do_not_wait() {
        let limiter = RequestLimiter::with_window(3, Duration::from_secs(30));
        let start = std::time::Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn request_over_budget_waits_for_next_window() {
        let limiter = RequestLimiter::with_window(2, Duration::from_millis(120));
        let start = std::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
