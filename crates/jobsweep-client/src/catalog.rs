//! Built-in job board sources.

use jobsweep_core::source::{
    CompanyHint, ExtractionRules, MarkupRules, MetadataRules, PaginationPolicy, SourceConfig,
    SourceLimits,
};

/// Remote.co category pages, each crawled as a separate entry point.
pub const REMOTE_CO_CATEGORIES: [&str; 21] = [
    "accounting",
    "customer-service",
    "design",
    "developer",
    "online-data-entry",
    "online-editing",
    "entry-level",
    "freelance",
    "healthcare",
    "human-resources",
    "insurance",
    "legal",
    "marketing",
    "medical-coding",
    "non-profit",
    "project-management",
    "recruiter",
    "sales",
    "software",
    "teaching",
    "writing",
];

const WORKABLE_URL: &str = "https://jobs.workable.com/search?location=P%C4%81tan%2C+Nepal";
const DYNAMITE_URL: &str = "https://dynamitejobs.com/remote-jobs";
const REMOTIVE_URL: &str = "https://remotive.com/remote-jobs";
const MERCOR_URL: &str = "https://work.mercor.com/explore";
const REMOTE_CO_URL: &str = "https://remote.co/remote-jobs";

fn limits(per_page: usize, max_items: usize) -> SourceLimits {
    SourceLimits {
        per_page,
        max_items,
    }
}

fn source(
    name: &str,
    base_url: &str,
    pagination: PaginationPolicy,
    limits: SourceLimits,
    rules: MarkupRules,
) -> SourceConfig {
    SourceConfig {
        name: name.into(),
        base_url: base_url.into(),
        categories: vec![],
        pagination,
        limits,
        extraction: ExtractionRules::Markup(rules),
    }
}

/// The five boards, parsed from rendered HTML, in crawl order.
///
/// Order matters: when boards mirror the same listing, the earlier one wins.
pub fn default_sources() -> Vec<SourceConfig> {
    let workable = source(
        "Workable",
        WORKABLE_URL,
        PaginationPolicy::NoPagination,
        limits(150, 150),
        MarkupRules {
            listing_selector: "a[href*='/view/']".into(),
            company: CompanyHint::UrlSlug {
                marker: "-at-".into(),
            },
            ..Default::default()
        },
    );

    let dynamite = source(
        "DynamiteJobs",
        DYNAMITE_URL,
        PaginationPolicy::NumberedPages { max_pages: 50 },
        limits(150, 200),
        MarkupRules {
            listing_selector: "h2[href*='/remote-job/']".into(),
            company: CompanyHint::NextSibling { tag: "p".into() },
            ..Default::default()
        },
    );

    let remotive = source(
        "Remotive",
        REMOTIVE_URL,
        PaginationPolicy::NoPagination,
        limits(150, 150),
        MarkupRules {
            listing_selector: "a[href*='/remote-jobs/']".into(),
            title_separator: Some("•".into()),
            min_path_segments: 3,
            ..Default::default()
        },
    );

    let mercor = source(
        "Mercor",
        MERCOR_URL,
        PaginationPolicy::NoPagination,
        limits(150, 150),
        MarkupRules {
            listing_selector: "a[href*='listingId=']".into(),
            title_selector: Some("h2".into()),
            company: CompanyHint::Fixed {
                name: "Mercor".into(),
            },
            job_type: Some("Contract".into()),
            metadata: Some(MetadataRules {
                selector: "div[class*='items-center'][class*='gap-1'][class*='text-sm']".into(),
                location_keywords: vec!["Remote".into(), "Worldwide".into()],
                job_type_keywords: vec!["Full-time".into()],
            }),
            ..Default::default()
        },
    );

    let mut remote_co = source(
        "Remote.co",
        REMOTE_CO_URL,
        PaginationPolicy::NoPagination,
        SourceLimits::default(),
        MarkupRules {
            listing_selector: "a[id^='job-name-']".into(),
            title_noise: vec!["New!".into(), "Today".into()],
            company: CompanyHint::ImageAlt,
            ..Default::default()
        },
    );
    remote_co.categories = REMOTE_CO_CATEGORIES.iter().map(|c| c.to_string()).collect();

    vec![workable, dynamite, remotive, mercor, remote_co]
}

/// The same boards read through the service's schema-driven extract, following
/// up to two linked pages each.
pub fn structured_sources() -> Vec<SourceConfig> {
    let structured = |name: &str, base_url: &str, categories: &[&str]| SourceConfig {
        name: name.into(),
        base_url: base_url.into(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        pagination: PaginationPolicy::LinkedNextPage { max_pages: 2 },
        limits: SourceLimits::default(),
        extraction: ExtractionRules::Structured { schema: None },
    };

    vec![
        structured("Workable", WORKABLE_URL, &[]),
        structured("DynamiteJobs", DYNAMITE_URL, &[]),
        structured("Remotive", REMOTIVE_URL, &[]),
        structured("Mercor", MERCOR_URL, &[]),
        structured("Remote.co", REMOTE_CO_URL, &["developer", "design", "marketing"]),
    ]
}
