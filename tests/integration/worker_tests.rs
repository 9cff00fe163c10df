//! Worker loop tests: job intake, job store updates and publish failures

use crate::common::*;
use async_trait::async_trait;
use seo_crawler::crawler::Coordinator;
use seo_crawler::queue::{MemoryQueue, MessageQueue, QueueAdapter, QueueError, QueueResult};
use seo_crawler::storage::{JobStatus, SqliteStorage};
use seo_crawler::worker::{Worker, WorkerStep};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

fn create_worker(transport: Arc<dyn MessageQueue>, store: SqliteStorage) -> Worker<SqliteStorage> {
    let config = create_test_config();
    let queue = QueueAdapter::new(transport, config.queue.clone());
    let coordinator = Coordinator::new(config, queue.clone()).expect("Failed to create coordinator");
    Worker::new(coordinator, queue, store)
}

#[tokio::test]
async fn test_project_relative_job_recorded_in_store() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html_page("Home", &["/pricing"]), 1).await;
    mount_page(&mock_server, "/pricing", html_page("Pricing", &[]), 1).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crawler.db");
    let mut store = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let project_id = store
        .insert_project("Site", &mock_server.uri(), &serde_json::json!({}))
        .expect("Failed to insert project");
    let run_id = store.create_audit_run(project_id).expect("Failed to create run");

    let transport = Arc::new(MemoryQueue::new());
    let mut worker = create_worker(transport.clone(), store);

    let adapter = QueueAdapter::new(transport.clone(), create_test_config().queue);
    let mut job = crawl_job("/", 10);
    job.run_id = run_id;
    job.project_id = project_id;
    adapter.submit_job(&job).await.expect("Failed to submit job");

    let outcome = match worker.run_once().await {
        WorkerStep::Processed(outcome) => outcome,
        other => panic!("Expected a processed job, got {:?}", other),
    };
    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 2);

    let run = worker
        .store()
        .get_audit_run(run_id)
        .expect("Failed to read run")
        .expect("Run missing");
    assert_eq!(run.status, "completed");
    assert_eq!(run.total_pages, 2);
    assert!(run.started_at.is_some());
    assert!(run.finished_at.is_some());

    let pages = published_pages(&transport);
    assert!(pages
        .iter()
        .all(|p| p.url.starts_with(&mock_server.uri()) && p.run_id == run_id));
}

#[tokio::test]
async fn test_invalid_start_url_recorded_as_failed() {
    let transport = Arc::new(MemoryQueue::new());
    let store = SqliteStorage::new_in_memory().expect("Failed to open store");
    let mut worker = create_worker(transport.clone(), store);

    transport
        .push(
            "crawl_queue",
            r#"{"run_id": 8, "project_id": 1, "start_url": "mailto:owner@example.com", "max_pages": 3}"#,
        )
        .await
        .unwrap();

    let step = worker.run_once().await;
    assert!(matches!(
        step,
        WorkerStep::Processed(ref outcome) if outcome.status == JobStatus::Failed
    ));

    let run = worker.store().get_audit_run(8).unwrap().expect("Run missing");
    assert_eq!(run.status, "failed");
    assert!(transport.is_empty("analysis_queue"));
}

#[tokio::test]
async fn test_malformed_job_does_not_stop_worker() {
    let transport = Arc::new(MemoryQueue::new());
    let mut worker = create_worker(transport.clone(), SqliteStorage::new_in_memory().unwrap());

    transport.push("crawl_queue", "{\"run_id\": \"x\"}").await.unwrap();
    transport
        .push(
            "crawl_queue",
            r#"{"run_id": 2, "project_id": 1, "start_url": "ftp://example.com/", "max_pages": 1}"#,
        )
        .await
        .unwrap();

    assert_eq!(worker.run_once().await, WorkerStep::Discarded);
    assert!(matches!(worker.run_once().await, WorkerStep::Processed(_)));
    assert_eq!(worker.run_once().await, WorkerStep::Idle);
}

/// Accepts everything except pushes to the analysis queue
struct NoAnalysisQueue {
    inner: MemoryQueue,
}

#[async_trait]
impl MessageQueue for NoAnalysisQueue {
    async fn ping(&self) -> QueueResult<()> {
        self.inner.ping().await
    }

    async fn pop(&self, channel: &str, timeout: Duration) -> QueueResult<Option<String>> {
        self.inner.pop(channel, timeout).await
    }

    async fn push(&self, channel: &str, payload: &str) -> QueueResult<()> {
        if channel == "analysis_queue" {
            return Err(QueueError::Connection("connection reset by peer".to_string()));
        }
        self.inner.push(channel, payload).await
    }
}

#[tokio::test]
async fn test_dropped_publishes_are_not_counted() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html_page("Home", &["/next"]), 1).await;
    mount_page(&mock_server, "/next", html_page("Next", &[]), 1).await;

    let transport = Arc::new(NoAnalysisQueue {
        inner: MemoryQueue::new(),
    });
    let mut worker = create_worker(transport, SqliteStorage::new_in_memory().unwrap());

    let job = crawl_job(format!("{}/", mock_server.uri()), 10);
    let outcome = worker.process_job(job).await;

    // Publishing failed, but the crawl itself still walked both pages
    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 0);
}
