//! SEO crawler main entry point
//!
//! This is the command-line interface for the crawl worker.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use seo_crawler::config::{load_effective_config, Config};
use seo_crawler::crawler::Coordinator;
use seo_crawler::queue::{QueueAdapter, RedisQueue};
use seo_crawler::storage::open_storage;
use seo_crawler::worker::{Worker, WorkerStep};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// SEO crawler: a polite, domain-scoped crawl worker
///
/// Waits for crawl jobs on the work queue, crawls each site breadth-first
/// within its domain and publishes the extracted page signals to the
/// analysis queue.
#[derive(Parser, Debug)]
#[command(name = "seo-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite, domain-scoped crawl worker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Process at most one job, then exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,

    /// Validate the configuration and print it without connecting anywhere
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_format);

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) = load_effective_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_worker(config, cli.once).await
}

/// Sets up the logging/tracing subscriber
fn setup_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let log_level = std::env::var("LOG_LEVEL").ok();
    let filter = EnvFilter::new(log_filter(verbose, quiet, log_level.as_deref()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Picks the filter directives for the subscriber
///
/// `-q` and `-v` take precedence over `LOG_LEVEL`. A bare level from
/// `LOG_LEVEL` applies to this crate only; dependencies stay at `warn`.
/// Anything with directive syntax is used as given.
fn log_filter(verbose: u8, quiet: bool, log_level: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }

    match (verbose, log_level.map(str::trim)) {
        (0, Some(level)) if level.contains('=') || level.contains(',') => level.to_string(),
        (0, Some(level)) if !level.is_empty() => format!("seo_crawler={},warn", level),
        (0, _) => "seo_crawler=info,warn".to_string(),
        (1, _) => "seo_crawler=debug,info".to_string(),
        (2, _) => "seo_crawler=trace,debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== SEO Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Concurrent pages per job: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!(
        "  Per-domain concurrency: {}",
        config.crawler.per_domain_concurrency
    );
    println!(
        "  Minimum time between requests: {}ms",
        config.crawler.minimum_time_on_page
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nQueue:");
    println!("  Redis: {}", config.queue.redis_url);
    println!("  Crawl queue: {}", config.queue.crawl_queue);
    println!("  Analysis queue: {}", config.queue.analysis_queue);
    println!("  Receive timeout: {}s", config.queue.receive_timeout_secs);
    println!(
        "  Publish retries: {} (every {}ms)",
        config.queue.publish_retries, config.queue.publish_retry_delay_ms
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");
}

/// Connects the collaborators and runs the worker loop
async fn handle_worker(config: Config, once: bool) -> anyhow::Result<()> {
    let store = open_storage(Path::new(&config.storage.database_path))
        .with_context(|| format!("Failed to open database {}", config.storage.database_path))?;

    let transport = RedisQueue::connect(&config.queue.redis_url)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.queue.redis_url))?;

    let queue = QueueAdapter::new(Arc::new(transport), config.queue.clone());
    let coordinator = Coordinator::new(config, queue.clone())
        .context("Failed to initialize crawl coordinator")?;
    let mut worker = Worker::new(coordinator, queue, store);

    if once {
        match worker.run_once().await {
            WorkerStep::Processed(outcome) => tracing::info!(
                run_id = outcome.run_id,
                status = outcome.status.to_db_string(),
                pages_processed = outcome.pages_processed,
                "Processed one job"
            ),
            step => tracing::info!("No job processed: {:?}", step),
        }
        return Ok(());
    }

    worker
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Worker stopped");
    Ok(())
}
