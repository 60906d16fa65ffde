use std::time::Duration;

use jobsweep_core::crawl::Pacing;
use jobsweep_core::retry::FetchPolicy;
use jobsweep_core::source::{
    CompanyHint, ExtractionRules, MarkupRules, PaginationPolicy, SourceConfig, SourceLimits,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WORKABLE_URL: &str = "https://jobs.workable.com/search";
pub const REMOTIVE_URL: &str = "https://remotive.com/remote-jobs";
pub const MIRROR_URL: &str = "https://mirror.dev/jobs";

/// A successful Firecrawl scrape response carrying `html`.
pub fn scraped(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": { "html": html, "metadata": { "statusCode": 200 } }
    }))
}

/// Serve `html` for `url` to any request bearing `token`.
pub async fn mount_page(server: &MockServer, token: &str, url: &str, html: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(scraped(html))
        .mount(server)
        .await;
}

/// Answer every request bearing `token` with 402, `expected` times.
pub async fn mount_out_of_credits(server: &MockServer, token: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "success": false,
            "error": "Payment Required: Failed to scrape URL. Insufficient credits."
        })))
        .expect(expected)
        .mount(server)
        .await;
}

pub fn markup_source(name: &str, url: &str, rules: MarkupRules) -> SourceConfig {
    SourceConfig {
        name: name.into(),
        base_url: url.into(),
        categories: vec![],
        pagination: PaginationPolicy::NoPagination,
        limits: SourceLimits::default(),
        extraction: ExtractionRules::Markup(rules),
    }
}

/// Workable, Remotive, and a board mirroring one Remotive listing.
pub fn three_boards() -> Vec<SourceConfig> {
    vec![
        markup_source(
            "Workable",
            WORKABLE_URL,
            MarkupRules {
                listing_selector: "a[href*='/view/']".into(),
                company: CompanyHint::UrlSlug {
                    marker: "-at-".into(),
                },
                ..Default::default()
            },
        ),
        markup_source(
            "Remotive",
            REMOTIVE_URL,
            MarkupRules {
                listing_selector: "a[href*='/remote-jobs/']".into(),
                title_separator: Some("•".into()),
                min_path_segments: 3,
                ..Default::default()
            },
        ),
        markup_source(
            "Mirror",
            MIRROR_URL,
            MarkupRules {
                listing_selector: "a.job".into(),
                ..Default::default()
            },
        ),
    ]
}

pub const WORKABLE_HTML: &str = r#"
    <ul>
      <li><a href="/view/backend-dev-at-acme-corp">Backend Developer</a></li>
      <li><a href="/about">About</a></li>
    </ul>
"#;

pub const REMOTIVE_HTML: &str = r#"
    <nav><a href="/remote-jobs/software-dev">Software Development</a></nav>
    <a href="/remote-jobs/software-dev/rust-engineer-101">Rust Engineer • Ferris Inc</a>
    <a href="/remote-jobs/design/product-designer-202">Product Designer • Pixel Co</a>
"#;

pub const MIRROR_HTML: &str = r#"
    <a class="job" href="https://remotive.com/remote-jobs/software-dev/rust-engineer-101">Rust Engineer (mirrored)</a>
    <a class="job" href="/j/9">Dev</a>
"#;

pub fn fast_policy(max_attempts: u32) -> FetchPolicy {
    FetchPolicy {
        max_attempts,
        transient_delay: Duration::ZERO,
        cooldown: Duration::ZERO,
    }
}

pub fn no_pacing() -> Pacing {
    Pacing {
        page_delay: Duration::ZERO,
        source_delay: Duration::ZERO,
    }
}
