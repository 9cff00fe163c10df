use seo_crawler::config::Config;
use seo_crawler::crawler::Coordinator;
use seo_crawler::queue::{CrawlJob, MemoryQueue, PageMessage, QueueAdapter};
use seo_crawler::storage::{JobOutcome, SqliteStorage};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration with short delays and timeouts for testing
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.minimum_time_on_page = 10; // Very short for testing
    config.crawler.request_timeout_secs = 5;
    config.queue.receive_timeout_secs = 1;
    config.queue.publish_retries = 1;
    config.queue.publish_retry_delay_ms = 1;
    config.queue.error_backoff_ms = 10;
    config
}

pub fn crawl_job(start_url: impl Into<String>, max_pages: u32) -> CrawlJob {
    CrawlJob {
        run_id: 1,
        project_id: 1,
        start_url: start_url.into(),
        max_pages,
    }
}

/// Builds a small HTML page with a title, one heading and the given links
pub fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, anchors
    )
}

pub fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Mounts a page that must be fetched exactly `times` times
pub async fn mount_page(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_response(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Decodes every page message waiting on the analysis queue
pub fn published_pages(transport: &MemoryQueue) -> Vec<PageMessage> {
    transport
        .drain("analysis_queue")
        .iter()
        .map(|raw| serde_json::from_str(raw).expect("Invalid page message"))
        .collect()
}

/// Runs one job against an in-process queue
///
/// # Returns
///
/// The job outcome and every page message published during the job
pub async fn run_crawl(config: Config, job: CrawlJob) -> (JobOutcome, Vec<PageMessage>) {
    let transport = Arc::new(MemoryQueue::new());
    let queue = QueueAdapter::new(transport.clone(), config.queue.clone());
    let coordinator = Coordinator::new(config, queue).expect("Failed to create coordinator");
    let store = SqliteStorage::new_in_memory().expect("Failed to open store");

    let outcome = coordinator.run_job(&job, &store).await;
    (outcome, published_pages(&transport))
}

/// Paths requested from the mock server, in arrival order
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

/// A URL on a different host than the mock server (`localhost` vs `127.0.0.1`)
pub fn external_url(other: &MockServer, route: &str) -> String {
    format!("http://localhost:{}{}", other.address().port(), route)
}
