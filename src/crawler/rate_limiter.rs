//! Global request pacing
//!
//! Every outbound request passes through one [`RateLimiter`]. It bounds the
//! number of requests in flight and keeps a minimum gap between request starts.
//! Both gates are FIFO queues, so waiters are served in arrival order.

use crate::config::SpacingMode;
use crate::ShoreError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// Spacing state shared by all callers
#[derive(Debug)]
struct Pacing {
    /// Minimum gap between starts
    interval: Duration,
    /// Reference instant the next start is measured from
    last: Option<Instant>,
}

/// Bounds concurrency and spaces out request starts
#[derive(Debug)]
pub struct RateLimiter {
    permits: Semaphore,
    max_concurrent: usize,
    spacing: SpacingMode,
    pacing: Mutex<Pacing>,
}

impl RateLimiter {
    /// Creates a new limiter
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum requests in flight (clamped to at least 1)
    /// * `min_interval` - Minimum gap between request starts
    /// * `spacing` - What the gap is measured from
    pub fn new(max_concurrent: usize, min_interval: Duration, spacing: SpacingMode) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
            spacing,
            pacing: Mutex::new(Pacing {
                interval: min_interval,
                last: None,
            }),
        }
    }

    /// Runs `fut` once a concurrency slot is free and the spacing allows it
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The output of `fut`
    /// * `Err(ShoreError::LimiterClosed)` - The limiter was closed while waiting
    pub async fn schedule<F, T>(&self, fut: F) -> Result<T, ShoreError>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ShoreError::LimiterClosed)?;

        {
            // Held across the sleep so starts are released in queue order
            let mut pacing = self.pacing.lock().await;
            if let Some(last) = pacing.last {
                tokio::time::sleep_until(last + pacing.interval).await;
            }
            pacing.last = Some(Instant::now());
        }

        let output = fut.await;

        if self.spacing == SpacingMode::Completion {
            let mut pacing = self.pacing.lock().await;
            let now = Instant::now();
            if pacing.last.map_or(true, |last| now > last) {
                pacing.last = Some(now);
            }
        }

        Ok(output)
    }

    /// Raises the minimum interval to `interval` if it is longer
    ///
    /// The interval is never lowered.
    pub async fn raise_interval(&self, interval: Duration) {
        let mut pacing = self.pacing.lock().await;
        if interval > pacing.interval {
            tracing::info!(
                "Raising request interval from {:?} to {:?}",
                pacing.interval,
                interval
            );
            pacing.interval = interval;
        }
    }

    /// Returns the current minimum interval
    pub async fn interval(&self) -> Duration {
        self.pacing.lock().await.interval
    }

    /// Returns the concurrency bound
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Stops admitting work; queued and future callers get `LimiterClosed`
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TOLERANCE: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_starts_are_spaced() {
        let interval = Duration::from_millis(60);
        let limiter = Arc::new(RateLimiter::new(4, interval, SpacingMode::Start));
        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            let starts = starts.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .schedule(async {
                        starts.lock().unwrap().push(Instant::now());
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut starts = starts.lock().unwrap().clone();
        starts.sort();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] + TOLERANCE >= interval);
        }
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let limiter = Arc::new(RateLimiter::new(
            2,
            Duration::from_millis(1),
            SpacingMode::Start,
        ));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .schedule(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in-flight was {}", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_completion_spacing_waits_after_finish() {
        let interval = Duration::from_millis(40);
        let limiter = RateLimiter::new(1, interval, SpacingMode::Completion);

        let finished = limiter
            .schedule(async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Instant::now()
            })
            .await
            .unwrap();
        let started = limiter.schedule(async { Instant::now() }).await.unwrap();

        assert!(started - finished + TOLERANCE >= interval);
    }

    #[tokio::test]
    async fn test_start_spacing_ignores_completion() {
        let interval = Duration::from_millis(40);
        let limiter = RateLimiter::new(1, interval, SpacingMode::Start);

        let first = limiter
            .schedule(async {
                let start = Instant::now();
                tokio::time::sleep(Duration::from_millis(60)).await;
                start
            })
            .await
            .unwrap();
        let second = limiter.schedule(async { Instant::now() }).await.unwrap();

        // The first request outlasted the interval, so no extra wait is added
        assert!(second - first < Duration::from_millis(60) + interval);
    }

    #[tokio::test]
    async fn test_raise_interval_never_lowers() {
        let limiter = RateLimiter::new(1, Duration::from_millis(500), SpacingMode::Start);
        limiter.raise_interval(Duration::from_millis(100)).await;
        assert_eq!(limiter.interval().await, Duration::from_millis(500));
        limiter.raise_interval(Duration::from_secs(2)).await;
        assert_eq!(limiter.interval().await, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_closed_limiter_rejects() {
        let limiter = RateLimiter::new(1, Duration::from_millis(1), SpacingMode::Start);
        limiter.close();
        let result = limiter.schedule(async { 1 }).await;
        assert!(matches!(result, Err(ShoreError::LimiterClosed)));
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_millis(1), SpacingMode::Start);
        assert_eq!(limiter.max_concurrent(), 1);
    }
}
