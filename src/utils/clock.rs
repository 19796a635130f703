use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of wall clock and monotonic time. Abstracted so that the daemon loops can be driven by
/// tokio's paused clock in tests.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);

    /// Seconds elapsed since `origin`. Used as the monotonic timestamp of samples.
    fn seconds_since(&self, origin: Instant) -> f64 {
        self.instant().saturating_duration_since(origin).as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
