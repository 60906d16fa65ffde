use std::fs;

use jobsweep_client::{CsvSink, FirecrawlService, JsonSink, MultiSink, build_adapters};
use jobsweep_core::crawl::{CrawlService, NullReporter};
use jobsweep_core::credentials::CredentialPool;
use jobsweep_core::models::JobRecord;
use jobsweep_core::retry::RetryingFetcher;
use jobsweep_core::walker::StopReason;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use crate::integration::common::{
    MIRROR_HTML, MIRROR_URL, REMOTIVE_HTML, REMOTIVE_URL, WORKABLE_HTML, WORKABLE_URL, fast_policy,
    mount_out_of_credits, mount_page, no_pacing, three_boards,
};

#[tokio::test]
async fn crawl_rotates_past_spent_key_and_exports_unique_records() {
    let server = MockServer::start().await;
    mount_out_of_credits(&server, "fc-spent", 1).await;
    mount_page(&server, "fc-fresh", WORKABLE_URL, WORKABLE_HTML).await;
    mount_page(&server, "fc-fresh", REMOTIVE_URL, REMOTIVE_HTML).await;
    mount_page(&server, "fc-fresh", MIRROR_URL, MIRROR_HTML).await;

    let service = FirecrawlService::with_base_url(&server.uri()).unwrap();
    let pool = CredentialPool::from_tokens(["fc-spent", "fc-fresh"]).unwrap();
    let fetcher = RetryingFetcher::new(service, pool, fast_policy(3));
    let adapters = build_adapters(&three_boards()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("jobs.csv");
    let json_path = dir.path().join("jobs.json");
    let sink = MultiSink::new()
        .with(JsonSink::new(&json_path))
        .with(CsvSink::new(&csv_path));

    let report = CrawlService::new(fetcher, no_pacing())
        .run(&adapters, &sink, &CancellationToken::new(), &NullReporter)
        .await
        .unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.stats.raw, 5);
    assert_eq!(report.stats.rejected, 1);
    assert_eq!(report.stats.duplicates, 1);
    assert_eq!(report.stats.unique, 3);
    assert!(report.sources.iter().all(|s| s.stop != StopReason::FetchFailed));

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "title,company,location,job_type,apply_url,source",
            "Backend Developer,Acme Corp,Remote,Full-time,https://jobs.workable.com/view/backend-dev-at-acme-corp,Workable",
            "Rust Engineer,Ferris Inc,Remote,Full-time,https://remotive.com/remote-jobs/software-dev/rust-engineer-101,Remotive",
            "Product Designer,Pixel Co,Remote,Full-time,https://remotive.com/remote-jobs/design/product-designer-202,Remotive",
        ]
    );

    let exported: Vec<JobRecord> =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(exported, report.records);
}

#[tokio::test]
async fn crawl_with_no_credits_left_still_completes() {
    let server = MockServer::start().await;
    // Two attempts for each of the three sources.
    mount_out_of_credits(&server, "fc-spent", 6).await;

    let service = FirecrawlService::with_base_url(&server.uri()).unwrap();
    let pool = CredentialPool::from_tokens(["fc-spent"]).unwrap();
    let fetcher = RetryingFetcher::new(service, pool, fast_policy(2));
    let adapters = build_adapters(&three_boards()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("jobs.csv");
    let json_path = dir.path().join("jobs.json");
    let sink = MultiSink::new()
        .with(JsonSink::new(&json_path))
        .with(CsvSink::new(&csv_path));

    let report = CrawlService::new(fetcher, no_pacing())
        .run(&adapters, &sink, &CancellationToken::new(), &NullReporter)
        .await
        .unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.sources.len(), 3);
    assert!(report.sources.iter().all(|s| s.stop == StopReason::FetchFailed));
    assert!(!csv_path.exists());
    assert_eq!(fs::read_to_string(&json_path).unwrap(), "[]");
}
