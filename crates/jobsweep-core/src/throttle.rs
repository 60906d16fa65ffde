//! Per-domain pacing for calls to the extraction service.
//!
//! Wraps any [`ExtractionService`] so that consecutive renders of pages on
//! the same target domain are spaced by at least a configured delay, plus
//! optional jitter. Calls for different domains don't wait on each other.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use jobsweep_core::throttle::{ThrottleConfig, ThrottledService};
//! # use jobsweep_core::models::{Credential, FetchRequest, Page};
//! # use jobsweep_core::traits::ExtractionService;
//! # #[derive(Clone)] struct MyService;
//! # impl ExtractionService for MyService {
//! #     async fn render(&self, _: &Credential, _: &FetchRequest) -> Result<Page, jobsweep_core::AppError> { todo!() }
//! # }
//! let config = ThrottleConfig::new(Duration::from_secs(1))
//!     .with_jitter(Duration::from_millis(500));
//! let service = ThrottledService::new(MyService, config);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;
use crate::models::{Credential, FetchRequest, Page};
use crate::traits::ExtractionService;
use crate::util::domain_key;

/// Configuration for the throttled service.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum delay between consecutive calls for the same domain.
    pub delay: Duration,

    /// Maximum random jitter added on top of `delay` (uniform [0, jitter]).
    /// `Duration::ZERO` disables it.
    pub jitter: Duration,
}

impl ThrottleConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_ms = rand_jitter_ms(self.jitter.as_millis() as u64);
        self.delay + Duration::from_millis(jitter_ms)
    }
}

impl Default for ThrottleConfig {
    /// 1 second delay, 500ms jitter.
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            jitter: Duration::from_millis(500),
        }
    }
}

/// An [`ExtractionService`] wrapper that enforces per-domain pacing.
///
/// Each call reserves the next free slot for its domain under the lock and
/// then sleeps outside it, so concurrent callers queue up in order.
#[derive(Clone)]
pub struct ThrottledService<S> {
    inner: S,
    config: ThrottleConfig,
    /// Earliest instant the next call for each domain may start.
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<S: ExtractionService> ThrottledService<S> {
    pub fn new(inner: S, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn wait_for_slot(&self, domain: &str) {
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start = slots
                .get(domain)
                .copied()
                .filter(|slot| *slot > now)
                .unwrap_or(now);
            slots.insert(domain.to_string(), start + self.config.effective_delay());
            start - now
        };

        if !wait.is_zero() {
            tracing::debug!(
                domain = %domain,
                sleep_ms = %wait.as_millis(),
                "Throttling render"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl<S: ExtractionService> ExtractionService for ThrottledService<S> {
    async fn render(&self, credential: &Credential, request: &FetchRequest) -> Result<Page, AppError> {
        if let Some(domain) = domain_key(&request.url) {
            self.wait_for_slot(&domain).await;
        }
        self.inner.render(credential, request).await
    }
}

// Xorshift seeded from the clock; jitter only, not crypto.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
