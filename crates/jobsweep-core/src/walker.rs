use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::crawl::{CrawlEvent, CrawlReporter};
use crate::error::AppError;
use crate::models::{PageCursor, RawListing};
use crate::traits::{Extracted, PageFetcher, SourceAdapter};
use crate::util::sleep_or_cancel;

/// Why a traversal stopped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page offered no next cursor.
    Exhausted,
    /// The page cap for the source was reached.
    PageCap,
    /// The item cap for the source was reached.
    ItemCap,
    /// The next cursor pointed back to a page already visited.
    CycleDetected,
    /// A page could not be fetched after retries.
    FetchFailed,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StopReason::Exhausted => "exhausted",
            StopReason::PageCap => "page-cap",
            StopReason::ItemCap => "item-cap",
            StopReason::CycleDetected => "cycle-detected",
            StopReason::FetchFailed => "fetch-failed",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Listings gathered from one entry point of a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub listings: Vec<RawListing>,
    pub pages_visited: u32,
    pub stop: StopReason,
}

/// Drives a [`SourceAdapter`] across successive pages.
#[derive(Debug, Clone)]
pub struct PaginationWalker {
    page_delay: Duration,
}

impl PaginationWalker {
    /// `page_delay` is the minimum pause between two pages of the same traversal.
    pub fn new(page_delay: Duration) -> Self {
        Self { page_delay }
    }

    /// Walk from `start` until the adapter's page or item cap, a missing or
    /// repeated next cursor, a fetch failure, or cancellation.
    pub async fn traverse<A, F, R>(
        &self,
        adapter: &A,
        fetcher: &F,
        start: PageCursor,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Traversal
    where
        A: SourceAdapter + ?Sized,
        F: PageFetcher,
        R: CrawlReporter + ?Sized,
    {
        let item_cap = adapter.limits().max_items;
        self.traverse_within(adapter, fetcher, start, item_cap, cancel, reporter)
            .await
    }

    /// Like [`traverse`](Self::traverse), but with a tighter item budget
    /// (what is left of the source's cap after earlier entry points).
    pub async fn traverse_within<A, F, R>(
        &self,
        adapter: &A,
        fetcher: &F,
        start: PageCursor,
        item_budget: usize,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Traversal
    where
        A: SourceAdapter + ?Sized,
        F: PageFetcher,
        R: CrawlReporter + ?Sized,
    {
        let source = adapter.name();
        let page_cap = adapter.pagination().page_cap();
        let limits = adapter.limits();
        let item_cap = item_budget.min(limits.max_items);

        let mut visited = HashSet::new();
        let mut listings = Vec::new();
        let mut pages_visited = 0u32;
        let mut cursor = start;

        let stop = loop {
            if listings.len() >= item_cap {
                break StopReason::ItemCap;
            }
            let paused = if pages_visited == 0 {
                sleep_or_cancel(Duration::ZERO, cancel).await
            } else {
                sleep_or_cancel(self.page_delay, cancel).await
            };
            if paused.is_err() {
                break StopReason::Cancelled;
            }

            visited.insert(cursor.clone());
            let request = adapter.request(&cursor);
            let page = match fetcher.fetch(&request, cancel).await {
                Ok(page) => page,
                Err(AppError::Cancelled) => break StopReason::Cancelled,
                Err(e) => {
                    let error = e.to_string();
                    reporter.report(CrawlEvent::FetchFailed {
                        source,
                        url: &request.url,
                        error: &error,
                    });
                    break StopReason::FetchFailed;
                }
            };
            pages_visited += 1;

            let Extracted {
                listings: mut found,
                next,
            } = adapter.extract(&cursor, &page);
            if found.is_empty() {
                reporter.report(CrawlEvent::ExtractionMismatch {
                    source,
                    url: &request.url,
                });
            }
            found.truncate(limits.per_page);
            found.truncate(item_cap - listings.len());
            reporter.report(CrawlEvent::PageFetched {
                source,
                url: &request.url,
                page: pages_visited,
                listings: found.len(),
            });
            listings.extend(found);

            if listings.len() >= item_cap {
                break StopReason::ItemCap;
            }
            let Some(next) = next else {
                break StopReason::Exhausted;
            };
            if visited.contains(&next) {
                tracing::debug!(%source, next = %next, "Pagination cycle detected");
                break StopReason::CycleDetected;
            }
            if pages_visited >= page_cap {
                break StopReason::PageCap;
            }
            cursor = next;
        };

        Traversal {
            listings,
            pages_visited,
            stop,
        }
    }
}

impl Default for PaginationWalker {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}
