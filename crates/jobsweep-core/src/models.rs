use std::fmt;

use url::Url;

/// Company name used when a source offers no signal.
pub const DEFAULT_COMPANY: &str = "N/A";
/// Location used when a source offers no signal.
pub const DEFAULT_LOCATION: &str = "Remote";
/// Job type used when a source offers no signal.
pub const DEFAULT_JOB_TYPE: &str = "Full-time";
/// Titles shorter than this are navigation noise, not listings.
pub const MIN_TITLE_LEN: usize = 5;

/// An access token for the extraction service.
///
/// Identity is the token string. `Debug` and `Display` only show the last
/// four characters so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, log-safe identifier for this credential.
    pub fn fingerprint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("…{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.fingerprint())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// Content representation requested from the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Rendered HTML markup.
    Html,
    /// Page converted to Markdown.
    Markdown,
    /// Schema-driven structured extract.
    Structured,
}

/// A single render/extract call against the extraction service.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub format: ContentFormat,
    /// JSON schema hint for [`ContentFormat::Structured`] requests.
    pub schema: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn markup(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ContentFormat::Html,
            schema: None,
        }
    }

    pub fn structured(url: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            format: ContentFormat::Structured,
            schema: Some(schema),
        }
    }
}

/// A successfully fetched page representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// Raw markup (HTML or Markdown) as rendered for `url`.
    Markup { url: String, content: String },
    /// Structured JSON extract for `url`.
    Structured { url: String, data: serde_json::Value },
}

impl Page {
    pub fn url(&self) -> &str {
        match self {
            Page::Markup { url, .. } | Page::Structured { url, .. } => url,
        }
    }
}

/// Loosely-typed listing candidate as pulled out of a page.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawListing {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub apply_url: Option<String>,
    pub source: String,
}

impl RawListing {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// A validated, canonical job listing. `apply_url` is its identity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub apply_url: String,
    pub source: String,
}

/// Position in a source's listing sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageCursor {
    /// A fixed page with no pagination.
    Single(String),
    /// An explicit page URL, usually discovered inside the previous page.
    Link(String),
    /// A numbered page. Page 1 is `base`; later pages append `page=n`.
    Numbered { base: String, page: u32 },
}

impl PageCursor {
    /// The URL to fetch for this cursor.
    pub fn url(&self) -> String {
        match self {
            PageCursor::Single(url) | PageCursor::Link(url) => url.clone(),
            PageCursor::Numbered { base, page } => numbered_url(base, *page),
        }
    }

    /// The following numbered page, if this cursor is numbered.
    pub fn next_numbered(&self) -> Option<PageCursor> {
        match self {
            PageCursor::Numbered { base, page } => Some(PageCursor::Numbered {
                base: base.clone(),
                page: page.saturating_add(1),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

fn numbered_url(base: &str, page: u32) -> String {
    if page <= 1 {
        return base.to_string();
    }
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string());
            url.to_string()
        }
        Err(_) => {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{base}{sep}page={page}")
        }
    }
}
