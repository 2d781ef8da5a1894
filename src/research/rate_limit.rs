//! Rate limiting for documentation fetching
//!
//! Two levels: a per-host minimum inter-request interval (requests to
//! different hosts never wait on each other) and a governor-based global
//! limiter guarding the whole client.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::trace;

/// Per-host rate limiter enforcing a minimum gap between requests.
#[derive(Clone)]
pub struct HostRateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl HostRateLimiter {
    /// Create a new rate limiter for the given requests per second
    pub fn new(requests_per_second: f64) -> Self {
        let interval_ms = (1000.0 / requests_per_second) as u64;

        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                last_request: None,
                min_interval: Duration::from_millis(interval_ms),
            })),
        }
    }

    /// Wait until the next request is allowed
    pub async fn wait(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(last) = inner.last_request {
            let elapsed = last.elapsed();
            if elapsed < inner.min_interval {
                let wait_time = inner.min_interval - elapsed;
                trace!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        inner.last_request = Some(Instant::now());
    }
}

/// Global rate limiter for all requests
pub struct GlobalRateLimiter {
    limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GlobalRateLimiter {
    /// Create a new global rate limiter
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_second(rps);
        let limiter = RateLimiter::direct(quota);

        Self { limiter }
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

/// Map of hostname to its limiter; limiters are created lazily on first use.
pub struct HostRateLimiterMap {
    limiters: RwLock<HashMap<String, HostRateLimiter>>,
    requests_per_second: f64,
}

impl HostRateLimiterMap {
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            requests_per_second,
        }
    }

    /// Wait for the limiter belonging to `host`, creating it if needed.
    pub async fn wait(&self, host: &str) {
        let limiter = {
            let read = self.limiters.read().await;
            read.get(host).cloned()
        };

        let limiter = match limiter {
            Some(l) => l,
            None => {
                let mut write = self.limiters.write().await;
                write
                    .entry(host.to_string())
                    .or_insert_with(|| HostRateLimiter::new(self.requests_per_second))
                    .clone()
            }
        };

        limiter.wait().await;
    }
}
