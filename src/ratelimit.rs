//! Inter-call spacing for rate-limited upstream sources.
//!
//! The NVD API allows one request every 6 seconds without an API key. A
//! single [`RateLimiter`] instance guards all NVD calls in the process;
//! every fetch path funnels through the same instance, so concurrent bulk
//! joins still serialize their NVD requests. EPSS and KEV are not spaced.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Minimum spacing between NVD requests without an API key.
pub const NVD_MIN_INTERVAL: Duration = Duration::from_millis(6000);

/// Enforces a minimum interval between permitted calls.
///
/// The grant timestamp is recorded at the moment of permission, before the
/// caller actually sleeps, so overlapping slow calls cannot let a burst
/// through. Constructed explicitly and injected into clients rather than
/// living in module-level state, which keeps it swappable under paused-time
/// tests.
pub struct RateLimiter {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Waits until the minimum interval since the previous grant has
    /// elapsed, then returns. The first call returns immediately.
    pub async fn acquire(&self) {
        let grant = {
            let mut last = self.last_grant.lock().unwrap();
            let now = Instant::now();
            let grant = match *last {
                Some(prev) => now.max(prev + self.min_interval),
                None => now,
            };
            *last = Some(grant);
            grant
        };
        sleep_until(grant).await;
    }
}
