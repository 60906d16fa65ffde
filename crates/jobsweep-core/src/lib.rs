pub mod config;
pub mod crawl;
pub mod credentials;
pub mod error;
pub mod models;
pub mod normalize;
pub mod retry;
pub mod source;
pub mod throttle;
pub mod traits;
pub mod util;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use crawl::{CrawlReport, CrawlReporter, CrawlService, Pacing, TracingCrawlReporter};
pub use credentials::CredentialPool;
pub use error::{AppError, FailureKind};
pub use models::{Credential, FetchRequest, JobRecord, Page, PageCursor, RawListing};
pub use retry::{FetchPolicy, RetryingFetcher};
pub use source::SourceConfig;
pub use traits::{ExtractionService, PageFetcher, RecordSink, SourceAdapter};
