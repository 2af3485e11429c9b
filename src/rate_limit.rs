//! Token-bucket rate limiting with an in-flight cap.
//!
//! Each [`RateLimiter`] admits at most `requests` per `per` interval (the
//! bucket refills continuously and can burst up to `requests`) and at most
//! `max_in_flight` outstanding requests. Waiters are admitted in FIFO order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimit;
use crate::errors::{BrightcoveError, Result};

#[derive(Debug)]
struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn wait_for_next(&self) -> Duration {
        let missing = (1.0 - self.tokens).max(0.0);
        Duration::from_secs_f64(missing / self.refill_per_sec)
    }
}

/// Bounds outbound requests for one API family.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    in_flight: Arc<Semaphore>,
    bucket: Mutex<Bucket>,
}

/// Held for the duration of one request attempt. Dropping it frees the
/// in-flight slot.
#[derive(Debug)]
pub(crate) struct RatePermit {
    _slot: OwnedSemaphorePermit,
}

impl RateLimiter {
    /// Returns [`BrightcoveError::Config`] for a budget that admits nothing.
    pub(crate) fn new(limit: RateLimit) -> Result<Self> {
        limit.validate()?;
        let capacity = f64::from(limit.requests);
        Ok(Self {
            in_flight: Arc::new(Semaphore::new(limit.max_in_flight)),
            bucket: Mutex::new(Bucket {
                capacity,
                tokens: capacity,
                refill_per_sec: capacity / limit.per.as_secs_f64(),
                last_refill: Instant::now(),
            }),
        })
    }

    /// Wait for a slot under both the rate budget and the in-flight cap.
    ///
    /// Cancel-safe: a future dropped while waiting consumes nothing.
    pub(crate) async fn acquire(&self) -> Result<RatePermit> {
        let slot = self
            .in_flight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BrightcoveError::Closed)?;

        let mut bucket = self.bucket.lock().await;
        loop {
            if self.in_flight.is_closed() {
                return Err(BrightcoveError::Closed);
            }
            bucket.refill(Instant::now());
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return Ok(RatePermit { _slot: slot });
            }
            let wait = bucket.wait_for_next();
            debug!(?wait, "rate limit reached, waiting for a slot");
            tokio::time::sleep(wait).await;
        }
    }

    /// Currently free in-flight slots.
    pub(crate) fn available_slots(&self) -> usize {
        self.in_flight.available_permits()
    }

    /// Reject every pending and future acquisition with [`BrightcoveError::Closed`].
    pub(crate) fn close(&self) {
        self.in_flight.close();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.in_flight.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bursts_up_to_budget_then_paces() {
        let limiter = RateLimiter::new(RateLimit::per_second(2).with_max_in_flight(10)).unwrap();
        let start = Instant::now();

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        let c = limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
        drop((a, b, c));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_slot_is_released_on_drop() {
        let limiter = RateLimiter::new(RateLimit::per_second(100).with_max_in_flight(1)).unwrap();

        let first = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available_slots(), 0);

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err(), "second acquire should wait for the slot");

        drop(first);
        assert_eq!(limiter.available_slots(), 1);
        let second = tokio::time::timeout(Duration::from_millis(50), limiter.acquire())
            .await
            .expect("slot should be free")
            .unwrap();
        drop(second);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiter_consumes_nothing() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimit::per_second(1).with_max_in_flight(5),
        )
        .unwrap());
        let _first = limiter.acquire().await.unwrap();

        // Waits on the empty bucket, then gets cancelled.
        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        waiter.abort();
        let _ = waiter.await;
        assert_eq!(limiter.available_slots(), 4);

        let start = Instant::now();
        let _next = limiter.acquire().await.unwrap();
        assert!(start.elapsed() <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn admits_waiters_in_fifo_order() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimit::per_second(1).with_max_in_flight(10),
        )
        .unwrap());
        let order = Arc::new(Mutex::new(Vec::new()));
        let _burst = limiter.acquire().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..3 {
            let limiter = limiter.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
                order.lock().await.push(i);
            }));
            // Make sure each task is queued before spawning the next.
            tokio::task::yield_now().await;
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn closed_limiter_rejects_acquire() {
        let limiter = RateLimiter::new(RateLimit::per_second(5)).unwrap();
        limiter.close();
        assert!(limiter.is_closed());
        assert!(matches!(
            limiter.acquire().await,
            Err(BrightcoveError::Closed)
        ));
    }

    #[test]
    fn budget_that_admits_nothing_is_rejected() {
        for limit in [
            RateLimit::per_second(0).with_max_in_flight(1),
            RateLimit::per_second(5).with_max_in_flight(0),
            RateLimit {
                per: Duration::ZERO,
                ..RateLimit::per_second(5)
            },
        ] {
            assert!(
                matches!(RateLimiter::new(limit), Err(BrightcoveError::Config(_))),
                "{limit:?}"
            );
        }
    }
}
