use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use url::Url;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Enforces a minimum interval between requests to the same host.
///
/// A zero interval disables waiting entirely.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: HashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a request to `url`'s host is allowed, then records it.
    pub async fn acquire(&mut self, url: &str) {
        if self.min_interval.is_zero() {
            return;
        }

        let key = host_key(url);
        if let Some(last) = self.last_request.get(&key) {
            let ready_at = *last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(host = %key, wait_ms = (ready_at - now).as_millis() as u64, "throttle");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last_request.insert(key, Instant::now());
    }
}

/// URLs that do not parse are keyed by the raw string.
fn host_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => url.to_owned(),
        },
        Err(_) => url.to_owned(),
    }
}
