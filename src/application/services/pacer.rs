use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket with a hard refill: `capacity` permits per `refill_period`.
///
/// Permits are not trickled back. Once the period since the last refill has elapsed the
/// bucket is topped up to full on the next `acquire`.
pub struct Pacer {
    capacity: u32,
    refill_period: Duration,
    budget: Mutex<RateBudget>,
}

struct RateBudget {
    tokens_remaining: u32,
    refilled_at: Instant,
}

impl Pacer {
    pub fn new(capacity: u32, refill_period: Duration) -> Self {
        Self {
            capacity,
            refill_period,
            budget: Mutex::new(RateBudget {
                tokens_remaining: capacity,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Suspends until one call may be issued. Never rejects.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut budget = self.budget.lock().await;
                let now = Instant::now();

                if now.duration_since(budget.refilled_at) >= self.refill_period {
                    budget.tokens_remaining = self.capacity;
                    budget.refilled_at = now;
                }

                if budget.tokens_remaining > 0 {
                    budget.tokens_remaining -= 1;
                    return;
                }

                self.refill_period
                    .saturating_sub(now.duration_since(budget.refilled_at))
            };

            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate budget exhausted, waiting for refill"
            );
            tokio::time::sleep(wait).await;
        }
    }

    pub async fn tokens_remaining(&self) -> u32 {
        self.budget.lock().await.tokens_remaining
    }
}
