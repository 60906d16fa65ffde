use std::time::Duration;

use jobsweep_core::error::AppError;
use jobsweep_core::models::{ContentFormat, Credential, FetchRequest, Page};
use jobsweep_core::traits::ExtractionService;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for the Firecrawl `/v1/scrape` endpoint.
///
/// One HTTP call per render. Failures are mapped onto [`AppError`] so that
/// [`AppError::kind`] tells the retrying fetcher what to do:
///
/// | Response | Error |
/// |----------|-------|
/// | 402, or a body mentioning insufficient credits | `QuotaExceeded` |
/// | 429 | `RateLimitExceeded` |
/// | 408, 5xx | `HttpError` (transient) |
/// | timeout / connection failure | `Timeout` / `NetworkError` |
/// | anything else | `HttpError` (fatal) |
#[derive(Clone)]
pub struct FirecrawlService {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl FirecrawlService {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AppError> {
        Self::build(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.base_url, timeout)
    }

    fn build(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("jobsweep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }
}

// ---- Firecrawl API types ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    json_options: Option<JsonOptions<'a>>,
}

#[derive(Serialize)]
struct JsonOptions<'a> {
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
struct ScrapeData {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    json: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

impl ScrapeRequest<'_> {
    fn from_fetch(request: &FetchRequest) -> ScrapeRequest<'_> {
        let format = match request.format {
            ContentFormat::Html => "html",
            ContentFormat::Markdown => "markdown",
            ContentFormat::Structured => "json",
        };
        ScrapeRequest {
            url: &request.url,
            formats: [format],
            json_options: request.schema.as_ref().map(|schema| JsonOptions { schema }),
        }
    }
}

fn is_quota_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("insufficient credits") || lower.contains("payment required")
}

fn classify_status(status: StatusCode, message: String) -> AppError {
    let status_code = status.as_u16();
    if status == StatusCode::PAYMENT_REQUIRED || is_quota_message(&message) {
        return AppError::QuotaExceeded(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::RateLimitExceeded;
    }
    AppError::HttpError {
        status_code,
        message,
    }
}

impl ExtractionService for FirecrawlService {
    async fn render(&self, credential: &Credential, request: &FetchRequest) -> Result<Page, AppError> {
        let endpoint = format!("{}/v1/scrape", self.base_url);
        let body = ScrapeRequest::from_fetch(request);

        tracing::debug!(url = %request.url, format = ?request.format, credential = %credential, "Rendering page");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(credential.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::NetworkError(format!("Failed to read response body: {e}"))
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status.as_u16(), text));
            return Err(classify_status(status, message));
        }

        let parsed: ScrapeResponse = serde_json::from_str(&text)?;
        if !parsed.success {
            let message = parsed
                .error
                .unwrap_or_else(|| "scrape reported failure".to_string());
            return Err(classify_status(status, message));
        }

        let data = parsed.data.unwrap_or_default();
        let url = request.url.clone();
        let page = match request.format {
            ContentFormat::Html => Page::Markup {
                url,
                content: data.html.unwrap_or_default(),
            },
            ContentFormat::Markdown => Page::Markup {
                url,
                content: data.markdown.unwrap_or_default(),
            },
            ContentFormat::Structured => Page::Structured {
                url,
                data: data.json.unwrap_or(serde_json::Value::Null),
            },
        };
        Ok(page)
    }
}
