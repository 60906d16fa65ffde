use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{JobRecord, RawListing};
use crate::normalize::{ReduceStats, reduce};
use crate::traits::{PageFetcher, RecordSink, SourceAdapter};
use crate::util::sleep_or_cancel;
use crate::walker::{PaginationWalker, StopReason};

/// Pauses that keep the crawl polite toward the sources.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Between pages of one traversal, and between entry points of one source.
    pub page_delay: Duration,
    /// After a source finishes, before the next one starts.
    pub source_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(2),
            source_delay: Duration::from_secs(5),
        }
    }
}

/// Events emitted during a crawl for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    RunStarted {
        run_id: Uuid,
        sources: usize,
    },
    SourceStarted {
        source: &'a str,
        entry_points: usize,
    },
    PageFetched {
        source: &'a str,
        url: &'a str,
        page: u32,
        listings: usize,
    },
    /// A page matched nothing. A quality signal, not a failure.
    ExtractionMismatch {
        source: &'a str,
        url: &'a str,
    },
    FetchFailed {
        source: &'a str,
        url: &'a str,
        error: &'a str,
    },
    SourceFinished {
        summary: &'a SourceSummary,
    },
    Reduced {
        stats: ReduceStats,
    },
    RunFinished {
        run_id: Uuid,
        records: usize,
        cancelled: bool,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl CrawlReporter for NullReporter {}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::RunStarted { run_id, sources } => {
                tracing::info!(%run_id, %sources, "Crawl started");
            }
            CrawlEvent::SourceStarted {
                source,
                entry_points,
            } => {
                tracing::info!(%source, %entry_points, "Scraping source");
            }
            CrawlEvent::PageFetched {
                source,
                url,
                page,
                listings,
            } => {
                tracing::debug!(%source, %url, %page, %listings, "Page extracted");
            }
            CrawlEvent::ExtractionMismatch { source, url } => {
                tracing::warn!(%source, %url, "No listings matched on page");
            }
            CrawlEvent::FetchFailed { source, url, error } => {
                tracing::warn!(%source, %url, %error, "Giving up on page");
            }
            CrawlEvent::SourceFinished { summary } => {
                tracing::info!(
                    source = %summary.name,
                    listings = %summary.listings,
                    pages = %summary.pages_visited,
                    stop = %summary.stop,
                    "Collected {} listings from {}",
                    summary.listings,
                    summary.name
                );
            }
            CrawlEvent::Reduced { stats } => {
                tracing::info!(
                    raw = %stats.raw,
                    rejected = %stats.rejected,
                    duplicates = %stats.duplicates,
                    unique = %stats.unique,
                    "Removed {} duplicates",
                    stats.duplicates
                );
            }
            CrawlEvent::RunFinished {
                run_id,
                records,
                cancelled,
            } => {
                if cancelled {
                    tracing::warn!(%run_id, %records, "Crawl cancelled, kept partial results");
                } else {
                    tracing::info!(%run_id, %records, "Crawl complete");
                }
            }
        }
    }
}

/// What one source contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub pages_visited: u32,
    pub listings: usize,
    /// Why the last traversal of the source stopped.
    pub stop: StopReason,
}

/// The working accumulator of a crawl: raw listings in source order.
#[derive(Debug)]
pub struct CrawlRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    listings: Vec<RawListing>,
    summaries: Vec<SourceSummary>,
}

impl CrawlRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            listings: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Append one source's listings. Sources are absorbed in crawl order.
    pub fn absorb(&mut self, summary: SourceSummary, listings: Vec<RawListing>) {
        self.listings.extend(listings);
        self.summaries.push(summary);
    }

    pub fn listings(&self) -> &[RawListing] {
        &self.listings
    }

    pub fn summaries(&self) -> &[SourceSummary] {
        &self.summaries
    }
}

impl Default for CrawlRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceSummary>,
    pub stats: ReduceStats,
    pub records: Vec<JobRecord>,
    pub cancelled: bool,
}

/// Crawls sources one after another and reduces their listings to a
/// deduplicated record set.
///
/// A source that fails partway keeps what it gathered and never stops the
/// run. Only the sink can fail a run.
pub struct CrawlService<F: PageFetcher> {
    fetcher: F,
    walker: PaginationWalker,
    pacing: Pacing,
}

impl<F: PageFetcher> CrawlService<F> {
    pub fn new(fetcher: F, pacing: Pacing) -> Self {
        Self {
            fetcher,
            walker: PaginationWalker::new(pacing.page_delay),
            pacing,
        }
    }

    /// Crawl every source in order into a fresh [`CrawlRun`].
    pub async fn collect<R: CrawlReporter + ?Sized>(
        &self,
        sources: &[Box<dyn SourceAdapter>],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> CrawlRun {
        let mut run = CrawlRun::new();
        reporter.report(CrawlEvent::RunStarted {
            run_id: run.id,
            sources: sources.len(),
        });

        for (i, adapter) in sources.iter().enumerate() {
            if i > 0 && sleep_or_cancel(self.pacing.source_delay, cancel).await.is_err() {
                break;
            }
            if cancel.is_cancelled() {
                break;
            }

            let (summary, listings) = self.crawl_source(adapter.as_ref(), cancel, reporter).await;
            reporter.report(CrawlEvent::SourceFinished { summary: &summary });
            let stopped = summary.stop == StopReason::Cancelled;
            run.absorb(summary, listings);
            if stopped {
                break;
            }
        }

        run
    }

    async fn crawl_source<R: CrawlReporter + ?Sized>(
        &self,
        adapter: &dyn SourceAdapter,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> (SourceSummary, Vec<RawListing>) {
        let entries = adapter.entry_points();
        let max_items = adapter.limits().max_items;
        reporter.report(CrawlEvent::SourceStarted {
            source: adapter.name(),
            entry_points: entries.len(),
        });

        let mut listings = Vec::new();
        let mut pages_visited = 0;
        let mut stop = StopReason::Exhausted;

        for (i, start) in entries.into_iter().enumerate() {
            let remaining = max_items.saturating_sub(listings.len());
            if remaining == 0 {
                stop = StopReason::ItemCap;
                break;
            }
            if i > 0 && sleep_or_cancel(self.pacing.page_delay, cancel).await.is_err() {
                stop = StopReason::Cancelled;
                break;
            }

            let traversal = self
                .walker
                .traverse_within(adapter, &self.fetcher, start, remaining, cancel, reporter)
                .await;
            pages_visited += traversal.pages_visited;
            listings.extend(traversal.listings);
            stop = traversal.stop;

            // A failed entry point doesn't stop the remaining categories.
            if stop == StopReason::Cancelled {
                break;
            }
        }

        let summary = SourceSummary {
            name: adapter.name().to_string(),
            pages_visited,
            listings: listings.len(),
            stop,
        };
        (summary, listings)
    }

    /// Crawl, reduce, and hand the records to `sink` exactly once.
    ///
    /// A cancelled run still writes what was gathered before cancellation.
    pub async fn run<K, R>(
        &self,
        sources: &[Box<dyn SourceAdapter>],
        sink: &K,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<CrawlReport, AppError>
    where
        K: RecordSink + ?Sized,
        R: CrawlReporter + ?Sized,
    {
        let run = self.collect(sources, cancel, reporter).await;
        let (records, stats) = reduce(run.listings());
        reporter.report(CrawlEvent::Reduced { stats });

        sink.write(&records)?;

        let cancelled = cancel.is_cancelled();
        reporter.report(CrawlEvent::RunFinished {
            run_id: run.id,
            records: records.len(),
            cancelled,
        });

        Ok(CrawlReport {
            run_id: run.id,
            started_at: run.started_at,
            finished_at: Utc::now(),
            sources: run.summaries,
            stats,
            records,
            cancelled,
        })
    }
}
