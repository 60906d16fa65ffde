use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobsweep_client::firecrawl::DEFAULT_BASE_URL;
use jobsweep_client::{
    CsvSink, FirecrawlService, JsonSink, MultiSink, build_adapters, default_sources,
    structured_sources,
};
use jobsweep_core::config::credentials_from_env;
use jobsweep_core::crawl::{CrawlReport, CrawlService, Pacing, TracingCrawlReporter};
use jobsweep_core::retry::{FetchPolicy, RetryingFetcher};
use jobsweep_core::source::{SourceConfig, load_sources};
use jobsweep_core::throttle::{ThrottleConfig, ThrottledService};
use jobsweep_core::traits::{NullSink, RecordSink};

#[derive(Parser)]
#[command(name = "jobsweep", version, about = "Multi-source job listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every source and export the deduplicated listings
    Crawl(CrawlArgs),

    /// Print the built-in source catalog as JSON (a starting point for --sources)
    Sources {
        #[arg(long, value_enum, default_value_t = Catalog::Markup)]
        catalog: Catalog,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Catalog {
    /// Parse rendered HTML with per-board CSS rules
    Markup,
    /// Ask the service for a schema-driven extract of each board
    Structured,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Both,
}

#[derive(clap::Args)]
struct CrawlArgs {
    /// JSON file with source definitions (defaults to the built-in catalog)
    #[arg(short, long, env = "JOBSWEEP_SOURCES")]
    sources: Option<PathBuf>,

    /// Built-in catalog to use when no sources file is given
    #[arg(long, value_enum, default_value_t = Catalog::Markup)]
    catalog: Catalog,

    /// Directory for jobs.csv / jobs.json
    #[arg(short, long, env = "JOBSWEEP_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Both)]
    format: OutputFormat,

    /// Crawl and report, but write nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Firecrawl API base URL
    #[arg(long, env = "FIRECRAWL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Render calls allowed per page, across credential rotations
    #[arg(long, env = "JOBSWEEP_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Wait before retrying a transient failure
    #[arg(long, env = "JOBSWEEP_TRANSIENT_DELAY_SECS", default_value_t = 2)]
    transient_delay_secs: u64,

    /// Wait after every credential has hit its quota or rate limit
    #[arg(long, env = "JOBSWEEP_COOLDOWN_SECS", default_value_t = 30)]
    cooldown_secs: u64,

    /// Pause between pages of a source
    #[arg(long, env = "JOBSWEEP_PAGE_DELAY_SECS", default_value_t = 2)]
    page_delay_secs: u64,

    /// Pause between sources
    #[arg(long, env = "JOBSWEEP_SOURCE_DELAY_SECS", default_value_t = 5)]
    source_delay_secs: u64,

    /// Minimum spacing between renders of the same domain
    #[arg(long, env = "JOBSWEEP_THROTTLE_MS", default_value_t = 1000)]
    throttle_ms: u64,

    /// Random jitter added to the per-domain spacing
    #[arg(long, env = "JOBSWEEP_JITTER_MS", default_value_t = 500)]
    jitter_ms: u64,

    /// Timeout for a single render call
    #[arg(long, env = "JOBSWEEP_TIMEOUT_SECS", default_value_t = 90)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsweep=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => cmd_crawl(args).await?,
        Commands::Sources { catalog } => {
            let json = serde_json::to_string_pretty(&catalog_sources(catalog))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn catalog_sources(catalog: Catalog) -> Vec<SourceConfig> {
    match catalog {
        Catalog::Markup => default_sources(),
        Catalog::Structured => structured_sources(),
    }
}

fn build_sink(out_dir: &Path, format: OutputFormat, dry_run: bool) -> Box<dyn RecordSink> {
    if dry_run {
        return Box::new(NullSink);
    }
    let csv = CsvSink::new(out_dir.join("jobs.csv"));
    let json = JsonSink::new(out_dir.join("jobs.json"));
    match format {
        OutputFormat::Csv => Box::new(csv),
        OutputFormat::Json => Box::new(json),
        OutputFormat::Both => Box::new(MultiSink::new().with(json).with(csv)),
    }
}

/// Cancel `token` on Ctrl-C so the run stops at the next page boundary.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            token.cancel();
        }
    });
}

async fn cmd_crawl(args: CrawlArgs) -> Result<()> {
    // 1. Sources and credentials. Either failing aborts before any request.
    let sources = match &args.sources {
        Some(path) => load_sources(path)
            .with_context(|| format!("Failed to load sources from {}", path.display()))?,
        None => catalog_sources(args.catalog),
    };
    let adapters = build_adapters(&sources).context("Invalid source configuration")?;
    let pool = credentials_from_env().context("No usable Firecrawl credentials")?;

    tracing::info!(
        "Initializing crawler with {} credential(s) and {} source(s)",
        pool.len(),
        adapters.len()
    );

    // 2. Service stack: HTTP client, per-domain throttle, retries with rotation.
    let service = FirecrawlService::with_base_url(&args.base_url)
        .and_then(|s| s.with_timeout(Duration::from_secs(args.timeout_secs)))
        .context("Failed to create Firecrawl client")?;
    let throttle = ThrottleConfig::new(Duration::from_millis(args.throttle_ms))
        .with_jitter(Duration::from_millis(args.jitter_ms));
    let policy = FetchPolicy {
        max_attempts: args.max_attempts,
        transient_delay: Duration::from_secs(args.transient_delay_secs),
        cooldown: Duration::from_secs(args.cooldown_secs),
    };
    let fetcher = RetryingFetcher::new(ThrottledService::new(service, throttle), pool, policy);

    let pacing = Pacing {
        page_delay: Duration::from_secs(args.page_delay_secs),
        source_delay: Duration::from_secs(args.source_delay_secs),
    };

    // 3. Crawl and export.
    let sink = build_sink(&args.out_dir, args.format, args.dry_run);
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let report = CrawlService::new(fetcher, pacing)
        .run(&adapters, &sink, &cancel, &TracingCrawlReporter)
        .await
        .context("Failed to export records")?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &CrawlReport) {
    for source in &report.sources {
        tracing::info!(
            "{:<14} {:>5} listings  {:>3} pages  ({})",
            source.name,
            source.listings,
            source.pages_visited,
            source.stop
        );
    }
    let elapsed = report.finished_at - report.started_at;
    tracing::info!(
        "Total collected: {}, rejected: {}, duplicates removed: {}, final unique: {} ({}s)",
        report.stats.raw,
        report.stats.rejected,
        report.stats.duplicates,
        report.stats.unique,
        elapsed.num_seconds()
    );
}
