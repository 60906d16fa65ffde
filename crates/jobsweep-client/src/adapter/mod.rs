//! Source adapters built from [`SourceConfig`].

mod markup;
mod structured;

pub use markup::MarkupAdapter;
pub use structured::{JOB_SCHEMA_JSON, StructuredAdapter, job_schema};

use jobsweep_core::error::AppError;
use jobsweep_core::models::PageCursor;
use jobsweep_core::source::{ExtractionRules, PaginationPolicy, SourceConfig};
use jobsweep_core::traits::SourceAdapter;
use url::Url;

/// Build the adapter a source's extraction rules call for.
///
/// Fails with a config error on selectors that don't parse.
pub fn build_adapter(config: &SourceConfig) -> Result<Box<dyn SourceAdapter>, AppError> {
    let adapter: Box<dyn SourceAdapter> = match &config.extraction {
        ExtractionRules::Markup(rules) => Box::new(MarkupAdapter::new(config, rules.clone())?),
        ExtractionRules::Structured { schema } => {
            Box::new(StructuredAdapter::new(config, schema.clone()))
        }
    };
    Ok(adapter)
}

/// Build adapters for every source, in order.
pub fn build_adapters(configs: &[SourceConfig]) -> Result<Vec<Box<dyn SourceAdapter>>, AppError> {
    configs.iter().map(build_adapter).collect()
}

/// Resolve a possibly relative href against the page it was found on.
fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

/// The cursor after `current`, given the link a page offered (if any).
///
/// Numbered sources advance by index as long as the page had listings;
/// linked sources follow the discovered link.
fn next_cursor(
    pagination: PaginationPolicy,
    current: &PageCursor,
    link: Option<String>,
    found_listings: bool,
) -> Option<PageCursor> {
    match pagination {
        PaginationPolicy::NoPagination => None,
        PaginationPolicy::NumberedPages { .. } => {
            if found_listings {
                current.next_numbered()
            } else {
                None
            }
        }
        PaginationPolicy::LinkedNextPage { .. } => link.map(PageCursor::Link),
    }
}
