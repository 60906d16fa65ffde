//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::crawl::{CrawlEvent, CrawlReporter};
use crate::error::{AppError, FailureKind};
use crate::models::{Credential, FetchRequest, JobRecord, Page, PageCursor, RawListing};
use crate::source::{PaginationPolicy, SourceLimits};
use crate::traits::{Extracted, ExtractionService, PageFetcher, RecordSink, SourceAdapter};

type Handler = Arc<dyn Fn(&Credential, &FetchRequest) -> Result<Page, AppError> + Send + Sync>;
type PageBuilder = Arc<dyn Fn(&str) -> Page + Send + Sync>;

// ---------------------------------------------------------------------------
// MockService
// ---------------------------------------------------------------------------

/// Mock extraction service.
///
/// Each call pops the first scripted response. Once the script is empty the
/// handler answers, or a default markup page if there is none.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<VecDeque<Result<Page, AppError>>>>,
    handler: Option<Handler>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn with_responses(responses: Vec<Result<Page, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Credential, &FetchRequest) -> Result<Page, AppError> + Send + Sync + 'static,
    {
        Self::default().falling_back_to(handler)
    }

    pub fn falling_back_to<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Credential, &FetchRequest) -> Result<Page, AppError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Raw tokens of the credentials used, in call order.
    pub fn credentials_used(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ExtractionService for MockService {
    async fn render(&self, credential: &Credential, request: &FetchRequest) -> Result<Page, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push(credential.as_str().to_string());

        let scripted = self.responses.lock().unwrap().pop_front();
        match (scripted, &self.handler) {
            (Some(response), _) => response,
            (None, Some(handler)) => handler(credential, request),
            (None, None) => Ok(markup_page(&request.url, "<html><body>default</body></html>")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher serving canned pages by URL. Unknown URLs fail with a 404.
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    pages: HashMap<String, Page>,
    failures: HashMap<String, FailureKind>,
    fallback: Option<PageBuilder>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.insert(page.url().to_string(), page);
        self
    }

    pub fn with_failure(mut self, url: &str, kind: FailureKind) -> Self {
        self.failures.insert(url.to_string(), kind);
        self
    }

    /// Builds a page for any URL without a canned page or failure.
    pub fn with_fallback<F>(mut self, build: F) -> Self
    where
        F: Fn(&str) -> Page + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(build));
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, request: &FetchRequest, _cancel: &CancellationToken) -> Result<Page, AppError> {
        self.requested.lock().unwrap().push(request.url.clone());

        if let Some(kind) = self.failures.get(&request.url) {
            return Err(error_of(*kind));
        }
        if let Some(page) = self.pages.get(&request.url) {
            return Ok(page.clone());
        }
        match &self.fallback {
            Some(build) => Ok(build(&request.url)),
            None => Err(AppError::HttpError {
                status_code: 404,
                message: format!("no page for {}", request.url),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedAdapter
// ---------------------------------------------------------------------------

/// Adapter reading pages built by [`listing_page`].
#[derive(Debug, Clone)]
pub struct ScriptedAdapter {
    name: String,
    pagination: PaginationPolicy,
    limits: SourceLimits,
    entries: Vec<String>,
}

impl ScriptedAdapter {
    pub fn new(name: &str, pagination: PaginationPolicy) -> Self {
        Self {
            name: name.to_string(),
            pagination,
            limits: SourceLimits::default(),
            entries: vec![format!("https://{}.test/jobs", name.to_lowercase())],
        }
    }

    pub fn with_limits(mut self, limits: SourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_entries(mut self, entries: Vec<String>) -> Self {
        self.entries = entries;
        self
    }
}

impl SourceAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn pagination(&self) -> PaginationPolicy {
        self.pagination
    }

    fn limits(&self) -> SourceLimits {
        self.limits
    }

    fn entry_points(&self) -> Vec<PageCursor> {
        self.entries
            .iter()
            .map(|url| self.pagination.start_cursor(url))
            .collect()
    }

    fn extract(&self, _cursor: &PageCursor, page: &Page) -> Extracted {
        let Page::Structured { data, .. } = page else {
            return Extracted::default();
        };

        let listings = data["jobs"]
            .as_array()
            .map(|jobs| {
                jobs.iter()
                    .map(|job| RawListing {
                        title: job["title"].as_str().map(String::from),
                        apply_url: job["apply_url"].as_str().map(String::from),
                        ..RawListing::new(self.name.as_str())
                    })
                    .collect()
            })
            .unwrap_or_default();
        let next = data["next_page_url"]
            .as_str()
            .map(|url| PageCursor::Link(url.to_string()));

        Extracted { listings, next }
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock sink that records every write.
#[derive(Clone, Default)]
pub struct MockSink {
    written: Arc<Mutex<Vec<Vec<JobRecord>>>>,
    error: Option<String>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn written(&self) -> Vec<Vec<JobRecord>> {
        self.written.lock().unwrap().clone()
    }
}

impl RecordSink for MockSink {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError> {
        if let Some(message) = &self.error {
            return Err(AppError::SinkError(message.clone()));
        }
        self.written.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock reporter that records event variant names.
#[derive(Clone, Default)]
pub struct MockReporter {
    labels: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl CrawlReporter for MockReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        let label = match event {
            CrawlEvent::RunStarted { .. } => "RunStarted",
            CrawlEvent::SourceStarted { .. } => "SourceStarted",
            CrawlEvent::PageFetched { .. } => "PageFetched",
            CrawlEvent::ExtractionMismatch { .. } => "ExtractionMismatch",
            CrawlEvent::FetchFailed { .. } => "FetchFailed",
            CrawlEvent::SourceFinished { .. } => "SourceFinished",
            CrawlEvent::Reduced { .. } => "Reduced",
            CrawlEvent::RunFinished { .. } => "RunFinished",
        };
        self.labels.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A representative error for each failure kind.
pub fn error_of(kind: FailureKind) -> AppError {
    match kind {
        FailureKind::QuotaExceeded => AppError::QuotaExceeded("Insufficient credits".into()),
        FailureKind::RateLimited => AppError::RateLimitExceeded,
        FailureKind::Transient => AppError::Timeout(30),
        FailureKind::Fatal => AppError::InvalidRequest("unsupported url".into()),
    }
}

pub fn markup_page(url: &str, content: &str) -> Page {
    Page::Markup {
        url: url.to_string(),
        content: content.to_string(),
    }
}

/// A structured page of `(title, apply_url)` listings, as read by
/// [`ScriptedAdapter`].
pub fn listing_page(url: &str, listings: &[(&str, &str)], next: Option<&str>) -> Page {
    let jobs: Vec<_> = listings
        .iter()
        .map(|(title, apply_url)| json!({ "title": title, "apply_url": apply_url }))
        .collect();
    Page::Structured {
        url: url.to_string(),
        data: json!({ "jobs": jobs, "next_page_url": next }),
    }
}
