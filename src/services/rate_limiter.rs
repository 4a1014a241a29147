use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::{AppError, Result};
use crate::services::context::CallContext;

/// Continuous-time token bucket.
///
/// Callers reserve a token under the lock, possibly driving the balance
/// negative, and then sleep outside the lock until their reservation matures.
/// Concurrent callers therefore queue up one refill interval apart and a token
/// is never handed out twice.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, rate: f64, capacity: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// One burst slot, refilled at `requests_per_minute / 60` tokens per second.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute.max(1) as f64 / 60.0, 1.0)
    }

    /// Rates and capacities that are not positive fall back to the slowest
    /// quota (one request per minute, one slot).
    pub fn new(refill_per_sec: f64, capacity: f64) -> Self {
        let refill_per_sec = if refill_per_sec.is_finite() && refill_per_sec > 0.0 {
            refill_per_sec
        } else {
            1.0 / 60.0
        };
        let capacity = if capacity.is_finite() && capacity >= 1.0 { capacity } else { 1.0 };
        Self {
            capacity,
            refill_per_sec,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Wait for one token.
    ///
    /// Fails with `RateLimitExceeded` without sleeping when the token cannot
    /// mature before the caller's deadline, and with `Cancelled` when the
    /// deadline has already passed.
    pub async fn acquire(&self, ctx: &CallContext) -> Result<()> {
        if ctx.is_expired() {
            return Err(AppError::Cancelled);
        }

        let ready_at = {
            let mut bucket = self.bucket.lock().await;
            let now = Instant::now();
            bucket.refill(now, self.refill_per_sec, self.capacity);

            bucket.tokens -= 1.0;
            if bucket.tokens >= 0.0 {
                return Ok(());
            }

            let wait = Duration::from_secs_f64(-bucket.tokens / self.refill_per_sec);
            let ready_at = now + wait;

            if let Some(deadline) = ctx.deadline() {
                if ready_at > deadline {
                    // give the reservation back
                    bucket.tokens += 1.0;
                    return Err(AppError::RateLimitExceeded);
                }
            }
            ready_at
        };

        let wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis() as u64;
        tracing::debug!(wait_ms, "waiting for rate limiter");
        sleep_until(ready_at).await;
        Ok(())
    }

    /// Tokens currently available (negative while reservations are pending).
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now(), self.refill_per_sec, self.capacity);
        bucket.tokens
    }
}
