//! Source configuration: where a source lives, how it paginates, how much
//! to take from it, and how its pages are turned into listings.
//!
//! Sources are plain data so they can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "name": "DynamiteJobs",
//!   "base_url": "https://dynamitejobs.com/remote-jobs",
//!   "pagination": { "type": "numbered_pages", "max_pages": 50 },
//!   "limits": { "per_page": 150, "max_items": 200 },
//!   "extraction": { "strategy": "markup", "listing_selector": "h2[href*='/remote-job/']" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::PageCursor;

/// How a source exposes more than one page of listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationPolicy {
    /// One page per entry point.
    #[default]
    NoPagination,
    /// The next page URL is discovered inside each page.
    LinkedNextPage { max_pages: u32 },
    /// Pages are addressed by index, `1..=max_pages`.
    NumberedPages { max_pages: u32 },
}

impl PaginationPolicy {
    /// Maximum number of pages the walker may visit per entry point.
    pub fn page_cap(&self) -> u32 {
        match self {
            PaginationPolicy::NoPagination => 1,
            PaginationPolicy::LinkedNextPage { max_pages }
            | PaginationPolicy::NumberedPages { max_pages } => (*max_pages).max(1),
        }
    }

    /// Start cursor for an entry URL under this policy.
    pub fn start_cursor(&self, url: &str) -> PageCursor {
        match self {
            PaginationPolicy::NoPagination => PageCursor::Single(url.to_string()),
            PaginationPolicy::LinkedNextPage { .. } => PageCursor::Link(url.to_string()),
            PaginationPolicy::NumberedPages { .. } => PageCursor::Numbered {
                base: url.to_string(),
                page: 1,
            },
        }
    }
}

/// Item caps for a source. Enforced by the walker, not the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLimits {
    /// Listings kept from any single page.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    /// Listings kept from the whole source.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_per_page() -> usize {
    150
}

fn default_max_items() -> usize {
    1000
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            max_items: default_max_items(),
        }
    }
}

/// Where the company name comes from on a markup listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum CompanyHint {
    /// No signal; the normalizer applies the default.
    #[default]
    None,
    /// Every listing belongs to the same company (single-employer boards).
    Fixed { name: String },
    /// Slug after `marker` in the last URL segment, e.g. `/view/dev-at-acme-corp`.
    UrlSlug { marker: String },
    /// Text of the next sibling element with this tag.
    NextSibling { tag: String },
    /// `alt` text of the first image in the enclosing card.
    ImageAlt,
}

/// Keyword-driven metadata scan over elements inside a listing card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataRules {
    /// CSS selector, relative to the listing element.
    pub selector: String,
    /// Text containing one of these becomes the location.
    #[serde(default)]
    pub location_keywords: Vec<String>,
    /// Case-insensitive match on one of these sets the job type to that keyword.
    #[serde(default)]
    pub job_type_keywords: Vec<String>,
}

/// CSS-selector rules for pulling listings out of rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarkupRules {
    /// Selector matching one element per listing (an anchor or a card anchor).
    pub listing_selector: String,
    /// Keep only listings whose href contains this substring.
    #[serde(default)]
    pub href_contains: Option<String>,
    /// Title element inside the listing. Defaults to the listing's own text.
    #[serde(default)]
    pub title_selector: Option<String>,
    /// Badges stripped from titles (e.g. `New!`, `Today`).
    #[serde(default)]
    pub title_noise: Vec<String>,
    /// `Title • Company` style titles: split on this and take the company from the right.
    #[serde(default)]
    pub title_separator: Option<String>,
    #[serde(default)]
    pub company: CompanyHint,
    /// Fixed location for every listing.
    #[serde(default)]
    pub location: Option<String>,
    /// Fixed job type for every listing.
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<MetadataRules>,
    /// Minimum number of path segments in an apply URL (filters category links).
    #[serde(default)]
    pub min_path_segments: usize,
    /// Selector for the "next page" link, for linked pagination.
    #[serde(default)]
    pub next_page_selector: Option<String>,
}

/// How pages of a source are turned into listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ExtractionRules {
    /// Parse rendered HTML with CSS selectors.
    Markup(MarkupRules),
    /// Ask the extraction service for a schema-driven JSON extract.
    Structured {
        /// Overrides the built-in job listing schema.
        #[serde(default)]
        schema: Option<serde_json::Value>,
    },
}

/// One configured source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source tag carried by every listing (e.g. "Remotive").
    pub name: String,
    pub base_url: String,
    /// Category paths appended to `base_url`; each one is an entry point.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub pagination: PaginationPolicy,
    #[serde(default)]
    pub limits: SourceLimits,
    pub extraction: ExtractionRules,
}

impl SourceConfig {
    /// Entry URLs: the base URL, or one URL per category.
    pub fn entry_urls(&self) -> Vec<String> {
        if self.categories.is_empty() {
            return vec![self.base_url.clone()];
        }
        let base = self.base_url.trim_end_matches('/');
        self.categories
            .iter()
            .map(|c| format!("{base}/{}", c.trim_matches('/')))
            .collect()
    }

    /// Start cursors, one per entry URL.
    pub fn start_cursors(&self) -> Vec<PageCursor> {
        self.entry_urls()
            .iter()
            .map(|url| self.pagination.start_cursor(url))
            .collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ConfigError("source name must not be empty".into()));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(AppError::ConfigError(format!(
                "source '{}' has an invalid base_url '{}'",
                self.name, self.base_url
            )));
        }
        if self.limits.per_page == 0 || self.limits.max_items == 0 {
            return Err(AppError::ConfigError(format!(
                "source '{}' limits must be at least 1",
                self.name
            )));
        }
        if let ExtractionRules::Markup(rules) = &self.extraction
            && rules.listing_selector.trim().is_empty()
        {
            return Err(AppError::ConfigError(format!(
                "source '{}' needs a listing_selector",
                self.name
            )));
        }
        Ok(())
    }
}

/// Parse and validate a JSON array of sources.
pub fn parse_sources(json: &str) -> Result<Vec<SourceConfig>, AppError> {
    let sources: Vec<SourceConfig> = serde_json::from_str(json)
        .map_err(|e| AppError::ConfigError(format!("Invalid sources file: {e}")))?;
    if sources.is_empty() {
        return Err(AppError::ConfigError("No sources configured".into()));
    }
    for source in &sources {
        source.validate()?;
    }
    Ok(sources)
}

/// Load sources from a JSON file.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read sources file {}: {e}",
            path.display()
        ))
    })?;
    parse_sources(&raw)
}
