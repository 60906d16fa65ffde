//! Bounded retries with credential rotation.
//!
//! | Failure | Action |
//! |---------|--------|
//! | quota exceeded / rate limited | rotate credential, retry at once; cool down after a full cycle |
//! | transient | wait `transient_delay`, retry with the same credential |
//! | fatal | return immediately |
//!
//! Every path issues at most `max_attempts` underlying calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialPool;
use crate::error::{AppError, FailureKind};
use crate::models::{Credential, FetchRequest, Page};
use crate::traits::{ExtractionService, PageFetcher};
use crate::util::sleep_or_cancel;

/// Retry and backoff settings for [`RetryingFetcher`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Total underlying calls allowed per fetch, across rotations.
    pub max_attempts: u32,
    /// Wait before retrying a transient failure.
    pub transient_delay: Duration,
    /// Wait after every credential has been tried without success.
    pub cooldown: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transient_delay: Duration::from_secs(2),
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Fetches pages through an [`ExtractionService`], rotating credentials on
/// quota and rate-limit failures.
///
/// The credential pool is shared by every clone, so a rotation made while
/// crawling one source is seen by the next.
#[derive(Clone)]
pub struct RetryingFetcher<S> {
    service: S,
    pool: Arc<Mutex<CredentialPool>>,
    policy: FetchPolicy,
}

impl<S: ExtractionService> RetryingFetcher<S> {
    pub fn new(service: S, pool: CredentialPool, policy: FetchPolicy) -> Self {
        Self {
            service,
            pool: Arc::new(Mutex::new(pool)),
            policy,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// The credential the next call will use.
    pub fn current_credential(&self) -> Credential {
        self.lock_pool().current().clone()
    }

    fn lock_pool(&self) -> MutexGuard<'_, CredentialPool> {
        self.pool.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned credential pool mutex");
            poisoned.into_inner()
        })
    }

    /// Move off `failed` and report whether the pool has come back round to a
    /// credential already tried during this fetch.
    ///
    /// If another caller already rotated away from `failed`, the pool is left
    /// alone. `tried` restarts after a full cycle.
    fn rotate_after(&self, failed: &Credential, tried: &mut HashSet<usize>) -> bool {
        let mut pool = self.lock_pool();
        if pool.current() == failed {
            let next = pool.rotate().clone();
            if pool.len() > 1 {
                tracing::info!(
                    from = %failed,
                    to = %next,
                    credential = pool.index() + 1,
                    of = pool.len(),
                    "Rotated credential"
                );
            }
        }

        let index = pool.index();
        let cycled = !tried.insert(index);
        if cycled {
            tried.clear();
            tried.insert(index);
        }
        cycled
    }

    /// Fetch with an explicit attempt budget.
    pub async fn fetch_with_attempts(
        &self,
        request: &FetchRequest,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<Page, AppError> {
        let max_attempts = max_attempts.max(1);
        let mut tried = HashSet::from([self.lock_pool().index()]);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            attempt += 1;
            let credential = self.current_credential();
            let error = match self.service.render(&credential, request).await {
                Ok(page) => {
                    if attempt > 1 {
                        tracing::debug!(url = %request.url, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(page);
                }
                Err(e) => e,
            };

            let kind = error.kind();
            tracing::warn!(
                url = %request.url,
                attempt,
                max_attempts,
                credential = %credential,
                %kind,
                error = %error,
                "Fetch attempt failed"
            );

            let wait = match kind {
                FailureKind::Fatal => return Err(error),
                FailureKind::Transient => self.policy.transient_delay,
                FailureKind::QuotaExceeded | FailureKind::RateLimited => {
                    if self.rotate_after(&credential, &mut tried) {
                        tracing::warn!(
                            cooldown_secs = self.policy.cooldown.as_secs(),
                            "All credentials exhausted, cooling down"
                        );
                        self.policy.cooldown
                    } else {
                        Duration::ZERO
                    }
                }
            };

            if attempt >= max_attempts {
                return Err(error);
            }
            sleep_or_cancel(wait, cancel).await?;
        }
    }
}

impl<S: ExtractionService> PageFetcher for RetryingFetcher<S> {
    async fn fetch(&self, request: &FetchRequest, cancel: &CancellationToken) -> Result<Page, AppError> {
        self.fetch_with_attempts(request, self.policy.max_attempts, cancel)
            .await
    }
}
