//! Bounded retry for reads that may lag behind a write

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Longest pause between two attempts, whatever the backoff
pub const MAX_RETRY_PAUSE: Duration = Duration::from_secs(30);

/// How often, and how far apart, an operation is re-attempted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Multiplier applied to the pause after each attempt; 1.0 keeps it fixed
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_millis(50),
            backoff: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            backoff: 1.0,
        }
    }

    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run `op` until it yields `Ok(Some(_))` or attempts run out.
    ///
    /// `Ok(None)` and `Err(_)` both count as a miss. After the last attempt
    /// the final outcome is returned as-is, so callers can tell "never
    /// appeared" from "kept failing".
    pub async fn retry_until<T, E, F, Fut>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut pause = self.interval;

        for attempt in 1..=attempts {
            let outcome = op().await;
            match outcome {
                Ok(Some(value)) => return Ok(Some(value)),
                last if attempt == attempts => return last,
                _ => {
                    debug!(attempt, max_attempts = attempts, "Retrying after miss");
                    tokio::time::sleep(pause).await;
                    pause = self.next_pause(pause);
                }
            }
        }

        Ok(None)
    }

    /// `pause` scaled by the backoff, capped at [`MAX_RETRY_PAUSE`]. A
    /// backoff below 1.0 or NaN keeps the pause fixed.
    fn next_pause(&self, pause: Duration) -> Duration {
        let factor = if self.backoff.is_nan() { 1.0 } else { self.backoff.max(1.0) };
        Duration::try_from_secs_f64(pause.as_secs_f64() * factor)
            .unwrap_or(MAX_RETRY_PAUSE)
            .min(MAX_RETRY_PAUSE)
    }
}
