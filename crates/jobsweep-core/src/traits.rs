use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{Credential, FetchRequest, JobRecord, Page, PageCursor, RawListing};
use crate::source::{PaginationPolicy, SourceLimits};

/// The third-party render/extract service, one call per request.
///
/// Implementations classify their failures through [`AppError::kind`];
/// retries and credential choice belong to the caller.
pub trait ExtractionService: Send + Sync + Clone {
    fn render(
        &self,
        credential: &Credential,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<Page, AppError>> + Send;
}

/// Fetches one page, hiding retries and credentials from the caller.
pub trait PageFetcher: Send + Sync {
    fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Page, AppError>> + Send;
}

/// Listings pulled out of one page, plus where to go next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub listings: Vec<RawListing>,
    pub next: Option<PageCursor>,
}

/// Per-source strategy for extraction and pagination discovery.
///
/// `extract` never fails: markup that doesn't match yields no listings.
pub trait SourceAdapter: Send + Sync {
    /// Source tag carried by every listing.
    fn name(&self) -> &str;

    fn pagination(&self) -> PaginationPolicy;

    fn limits(&self) -> SourceLimits;

    /// Start cursors for this source (one per category or seed URL).
    fn entry_points(&self) -> Vec<PageCursor>;

    /// The request to send for a cursor.
    fn request(&self, cursor: &PageCursor) -> FetchRequest {
        FetchRequest::markup(cursor.url())
    }

    fn extract(&self, cursor: &PageCursor, page: &Page) -> Extracted;
}

/// Persists the final, deduplicated record set.
pub trait RecordSink: Send + Sync {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError> {
        (**self).write(records)
    }
}

/// A sink that discards records, for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn write(&self, _records: &[JobRecord]) -> Result<(), AppError> {
        Ok(())
    }
}
