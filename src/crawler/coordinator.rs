//! Crawl job coordinator
//!
//! This module drives one crawl job through its lifecycle:
//! - Starting: resolve the start URL, derive the base domain, seed the frontier
//! - Running: keep a fixed-size pool of fetch-extract-publish pipelines busy
//! - Draining: stop dispatching and wait for in-flight pipelines
//! - Completed / Failed: report the job outcome

use crate::config::Config;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::politeness::Politeness;
use crate::queue::{CrawlJob, PageMessage, QueueAdapter};
use crate::state::JobState;
use crate::storage::{JobOutcome, JobStore};
use crate::url::{base_domain, extract_domain, resolve_start_url};
use crate::{CrawlError, UrlError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// What happened to one frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    /// Signals extracted and published
    Published,
    /// Answered without usable signals, or the publish was dropped
    Failed,
    /// No HTTP answer at all
    Skipped,
}

/// Tracks and validates the lifecycle of one job
struct JobTracker {
    run_id: i64,
    state: JobState,
}

impl JobTracker {
    fn new(run_id: i64) -> Self {
        Self {
            run_id,
            state: JobState::Starting,
        }
    }

    fn state(&self) -> JobState {
        self.state
    }

    fn advance(&mut self, next: JobState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::info!(run_id = self.run_id, "Job state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Marks a frontier entry complete when dropped
struct InFlight {
    frontier: Arc<Frontier>,
    entry: FrontierEntry,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.frontier.complete(&self.entry);
    }
}

/// Everything a pipeline needs, shared across the pipelines of one job
#[derive(Clone)]
struct PipelineContext {
    run_id: i64,
    frontier: Arc<Frontier>,
    fetcher: Arc<Fetcher>,
    queue: QueueAdapter,
}

impl PipelineContext {
    /// Publishes a page message; a message that cannot be delivered is dropped
    async fn publish(&self, message: &PageMessage) -> bool {
        match self.queue.publish_page(message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    run_id = self.run_id,
                    url = %message.url,
                    "Dropping page message: {}",
                    e
                );
                false
            }
        }
    }
}

/// Main crawler coordinator structure
///
/// One coordinator serves every job a worker processes. Per-job state (the
/// frontier and the politeness gate) is created fresh for each job.
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    queue: QueueAdapter,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `queue` - Adapter used to publish extracted pages
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: Config, queue: QueueAdapter) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            queue,
        })
    }

    /// Runs one crawl job to a terminal state
    ///
    /// Never fails: setup errors produce a `Failed` outcome, and per-page
    /// errors are absorbed by the pipelines.
    pub async fn run_job(&self, job: &CrawlJob, store: &dyn JobStore) -> JobOutcome {
        let started = Instant::now();
        let mut tracker = JobTracker::new(job.run_id);

        tracing::info!(
            run_id = job.run_id,
            project_id = job.project_id,
            start_url = %job.start_url,
            max_pages = job.max_pages,
            "Starting crawl job"
        );

        let frontier = match self.start(job, store).await {
            Ok(frontier) => frontier,
            Err(e) => {
                tracing::error!(run_id = job.run_id, "Crawl job setup failed: {}", e);
                if let Err(e) = tracker.advance(JobState::Failed) {
                    tracing::error!(run_id = job.run_id, "{}", e);
                }
                return JobOutcome::failed(job.run_id, e.to_string());
            }
        };

        match self.crawl(&mut tracker, job.run_id, frontier).await {
            Ok(pages_processed) => {
                tracing::info!(
                    run_id = job.run_id,
                    pages_processed = pages_processed,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Crawl job completed"
                );
                JobOutcome::completed(job.run_id, pages_processed)
            }
            Err(e) => {
                tracing::error!(run_id = job.run_id, "Crawl job aborted: {}", e);
                JobOutcome::failed(job.run_id, e.to_string())
            }
        }
    }

    /// Starting state: checks the queue, resolves the start URL and seeds
    /// the frontier at depth 0
    async fn start(&self, job: &CrawlJob, store: &dyn JobStore) -> Result<Frontier, CrawlError> {
        self.queue.ping().await?;

        let start_url = resolve_job_start(job, store)?;
        let domain = extract_domain(&start_url)
            .map(|host| base_domain(&host))
            .ok_or(UrlError::MissingDomain)?;

        tracing::debug!(run_id = job.run_id, "Crawl scoped to {}", domain);

        let frontier = Frontier::new(domain, self.config.crawler.max_depth, job.max_pages);
        if !frontier.offer(&start_url, 0) {
            return Err(CrawlError::Setup(format!(
                "start URL {} was not accepted by the frontier",
                start_url
            )));
        }

        Ok(frontier)
    }

    /// Running and Draining states
    ///
    /// # Returns
    ///
    /// The number of pages whose signals were extracted and published
    async fn crawl(
        &self,
        tracker: &mut JobTracker,
        run_id: i64,
        frontier: Frontier,
    ) -> Result<u32, CrawlError> {
        tracker.advance(JobState::Running)?;

        let politeness = Arc::new(Politeness::from_config(&self.config.crawler));
        let ctx = PipelineContext {
            run_id,
            frontier: Arc::new(frontier),
            fetcher: Arc::new(Fetcher::new(
                self.client.clone(),
                politeness,
                self.config.crawler.max_redirects,
            )),
            queue: self.queue.clone(),
        };

        let pool_size = self.config.crawler.max_concurrent_pages_open.max(1) as usize;
        let mut pipelines = JoinSet::new();
        let mut pages_processed = 0u32;

        loop {
            if tracker.state() == JobState::Running {
                while pipelines.len() < pool_size {
                    match ctx.frontier.next() {
                        Some(entry) => {
                            pipelines.spawn(run_pipeline(ctx.clone(), entry));
                        }
                        None => break,
                    }
                }

                if ctx.frontier.is_exhausted() || pipelines.is_empty() {
                    tracker.advance(JobState::Draining)?;
                }
            }

            match pipelines.join_next().await {
                Some(Ok(PageOutcome::Published)) => pages_processed += 1,
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!(run_id = run_id, "Page pipeline aborted: {}", e),
                None => break,
            }
        }

        tracker.advance(JobState::Completed)?;
        Ok(pages_processed)
    }
}

/// Resolves the job's start URL, consulting the project only for relative
/// start URLs
fn resolve_job_start(job: &CrawlJob, store: &dyn JobStore) -> Result<Url, CrawlError> {
    match resolve_start_url(&job.start_url, None) {
        Ok(url) => Ok(url),
        Err(UrlError::MissingDomain) => {
            let project = store.load_project(job.project_id)?;
            Ok(resolve_start_url(&job.start_url, Some(&project.domain))?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch, extract, publish and expand one frontier entry
async fn run_pipeline(ctx: PipelineContext, entry: FrontierEntry) -> PageOutcome {
    let _in_flight = InFlight {
        frontier: ctx.frontier.clone(),
        entry: entry.clone(),
    };
    let fetched = ctx
        .fetcher
        .fetch(&entry.url, |hop| ctx.frontier.claim_redirect(hop))
        .await;

    let status = match fetched.status_code {
        Some(status) => status,
        None => {
            tracing::warn!(
                url = %entry.url,
                "Fetch failed: {}",
                fetched.error.as_deref().unwrap_or("unknown error")
            );
            return PageOutcome::Skipped;
        }
    };

    if !fetched.is_success() {
        tracing::warn!(url = %entry.url, status = status, "Non-success response");
        let message = PageMessage::failed_page(
            ctx.run_id,
            entry.url.as_str(),
            status,
            fetched.elapsed_ms,
            fetched
                .error
                .clone()
                .unwrap_or_else(|| format!("HTTP {}", status)),
        );
        ctx.publish(&message).await;
        return PageOutcome::Failed;
    }

    let signals = match extract(&fetched) {
        Ok(signals) => signals,
        Err(e) => {
            tracing::warn!(url = %entry.url, "No page signals: {}", e);
            let message = PageMessage::failed_page(
                ctx.run_id,
                entry.url.as_str(),
                status,
                fetched.elapsed_ms,
                e.to_string(),
            );
            ctx.publish(&message).await;
            return PageOutcome::Failed;
        }
    };

    if entry.depth < ctx.frontier.max_depth() {
        let accepted = signals
            .all_links
            .iter()
            .filter(|href| ctx.frontier.offer_href(href, &fetched.final_url, entry.depth + 1))
            .count();
        tracing::debug!(url = %entry.url, "Queued {} new links", accepted);
    }

    if ctx.publish(&PageMessage::from_signals(ctx.run_id, &signals)).await {
        PageOutcome::Published
    } else {
        PageOutcome::Failed
    }
}
