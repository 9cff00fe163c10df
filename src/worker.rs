//! Crawl worker loop
//!
//! Pulls one job at a time from the crawl queue, runs it through the
//! coordinator and records the outcome with the job store.

use crate::crawler::Coordinator;
use crate::queue::{CrawlJob, QueueAdapter, QueueError};
use crate::storage::{JobOutcome, JobStore};
use std::future::Future;
use std::time::Duration;

/// Result of one iteration of the worker loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStep {
    /// No job arrived before the receive timeout
    Idle,
    /// A message was dequeued but could not be decoded as a job
    Discarded,
    /// The queue could not be read; the worker backed off
    ReceiveFailed,
    /// A job ran to a terminal state
    Processed(JobOutcome),
}

pub struct Worker<S: JobStore> {
    coordinator: Coordinator,
    queue: QueueAdapter,
    store: S,
    error_backoff: Duration,
}

impl<S: JobStore> Worker<S> {
    pub fn new(coordinator: Coordinator, queue: QueueAdapter, store: S) -> Self {
        let error_backoff = queue.config().error_backoff();
        Self {
            coordinator,
            queue,
            store,
            error_backoff,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receives at most one job and processes it
    pub async fn run_once(&mut self) -> WorkerStep {
        match self.queue.receive().await {
            Ok(Some(job)) => WorkerStep::Processed(self.process_job(job).await),
            Ok(None) => {
                tracing::trace!("No crawl jobs, continuing to wait");
                WorkerStep::Idle
            }
            Err(QueueError::Malformed(reason)) => {
                tracing::error!("Discarding malformed crawl job: {}", reason);
                WorkerStep::Discarded
            }
            Err(e) => {
                tracing::error!(
                    "Failed to receive crawl job, retrying in {:?}: {}",
                    self.error_backoff,
                    e
                );
                tokio::time::sleep(self.error_backoff).await;
                WorkerStep::ReceiveFailed
            }
        }
    }

    /// Runs a decoded job, bracketing it with job store updates
    ///
    /// Job store failures are logged and never change the outcome.
    pub async fn process_job(&mut self, job: CrawlJob) -> JobOutcome {
        if let Err(e) = self.store.record_job_started(job.run_id, job.project_id) {
            tracing::warn!(run_id = job.run_id, "Failed to record job start: {}", e);
        }

        let outcome = self.coordinator.run_job(&job, &self.store).await;

        if let Err(e) = self.store.record_job_outcome(&outcome) {
            tracing::error!(run_id = job.run_id, "Failed to record job outcome: {}", e);
        }

        outcome
    }

    /// Processes jobs until `shutdown` resolves
    ///
    /// A job in progress when `shutdown` fires is abandoned: its in-flight
    /// fetches are cancelled and no outcome is recorded.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);
        tracing::info!(
            "Waiting for crawl jobs on {}",
            self.queue.config().crawl_queue
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping worker");
                    break;
                }
                _ = self.run_once() => {}
            }
        }
    }
}
