use std::time::Duration;

use rand::Rng;

use crate::Error;
use crate::common::poll_interval::{TimeUnit, duration_from_env};

/// Random pause between outbound requests to the same site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoliteDelay {
    min: Duration,
    max: Duration,
}

impl PoliteDelay {
    pub const DEFAULT_MIN_MS: u64 = 1000;
    pub const DEFAULT_MAX_MS: u64 = 3000;

    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max { Self { min, max } } else { Self { min: max, max: min } }
    }

    /// No pause at all. For tests.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Reads SCRAPER_MIN_DELAY_MS and SCRAPER_MAX_DELAY_MS.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(
            duration_from_env(TimeUnit::Milliseconds, "SCRAPER_MIN_DELAY_MS", Self::DEFAULT_MIN_MS)?,
            duration_from_env(TimeUnit::Milliseconds, "SCRAPER_MAX_DELAY_MS", Self::DEFAULT_MAX_MS)?,
        ))
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    pub async fn sleep(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::debug!("Sleeping {:?} before next request", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for PoliteDelay {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(Self::DEFAULT_MIN_MS),
            Duration::from_millis(Self::DEFAULT_MAX_MS),
        )
    }
}
