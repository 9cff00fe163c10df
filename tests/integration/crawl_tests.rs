//! End-to-end crawl job tests

use crate::common::*;
use seo_crawler::storage::JobStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_home_page_and_internal_link() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let external = external_url(&other_server, "/");

    let home = format!(
        r#"<html><head><title>Home</title><meta name="description" content="Welcome"></head>
        <body><h1>Hi</h1><a href="/about">About</a><a href="{}">Other</a></body></html>"#,
        external
    );
    mount_page(&mock_server, "/", home, 1).await;
    mount_page(&mock_server, "/about", html_page("About", &[]), 1).await;

    // The external site must never be contacted
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other_server)
        .await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(pages.len(), 2);

    let home_page = pages
        .iter()
        .find(|p| p.url == format!("{}/", base_url))
        .expect("Home page not published");
    assert_eq!(home_page.run_id, 1);
    assert_eq!(home_page.status_code, 200);
    assert_eq!(home_page.title, "Home");
    assert_eq!(home_page.description, "Welcome");
    assert_eq!(home_page.h1_tags, vec!["Hi".to_string()]);
    assert_eq!(home_page.links, vec!["/about".to_string(), external]);
    assert!(home_page.error.is_none());
    assert_eq!(home_page.headings["h1"], vec!["Hi".to_string()]);
    assert_eq!(home_page.meta_tags["description"], "Welcome");

    assert!(pages.iter().any(|p| p.url == format!("{}/about", base_url)));
}

#[tokio::test]
async fn test_page_budget_is_never_exceeded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Home", &["/1", "/2", "/3", "/4", "/5"]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html_response(html_page("Child", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 1)).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 1);
    assert_eq!(pages.len(), 1);
    assert_eq!(requested_paths(&mock_server).await, vec!["/".to_string()]);
}

#[tokio::test]
async fn test_no_url_fetched_twice() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let absolute_b = format!("{}/b", base_url);

    mount_page(&mock_server, "/", html_page("Home", &["/a", "/b", "/a"]), 1).await;
    mount_page(
        &mock_server,
        "/a",
        html_page("A", &["/", "/b", "/a#top", absolute_b.as_str()]),
        1,
    )
    .await;
    mount_page(&mock_server, "/b", html_page("B", &["/a", "/"]), 1).await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 50)).await;

    assert_eq!(outcome.pages_processed, 3);
    assert_eq!(pages.len(), 3);

    let mut paths = requested_paths(&mock_server).await;
    paths.sort();
    assert_eq!(paths, vec!["/", "/a", "/b"]);
}

#[tokio::test]
async fn test_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let mut config = create_test_config();
    config.crawler.max_depth = 1;

    mount_page(&mock_server, "/", html_page("Root", &["/level1"]), 1).await;
    mount_page(&mock_server, "/level1", html_page("L1", &["/level2"]), 1).await;
    mount_page(&mock_server, "/level2", html_page("L2", &[]), 0).await; // Beyond max_depth

    let (outcome, pages) = run_crawl(config, crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_failing_pages_do_not_stop_the_job() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Same host, closed port: no HTTP answer at all
    let unreachable = "http://127.0.0.1:1/gone";

    mount_page(
        &mock_server,
        "/",
        html_page("Home", &["/ok", "/broken", "/missing", unreachable]),
        1,
    )
    .await;
    mount_page(&mock_server, "/ok", html_page("Fine", &[]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 2);

    let broken = pages
        .iter()
        .find(|p| p.url.ends_with("/broken"))
        .expect("Failed page not published");
    assert_eq!(broken.status_code, 500);
    assert_eq!(broken.error.as_deref(), Some("HTTP 500"));
    assert_eq!(broken.title, "");

    let missing = pages
        .iter()
        .find(|p| p.url.ends_with("/missing"))
        .expect("Missing page not published");
    assert_eq!(missing.status_code, 404);

    // Transport failures are logged and skipped, not published
    assert!(!pages.iter().any(|p| p.url.contains(":1/gone")));
    assert_eq!(pages.len(), 4);
}

#[tokio::test]
async fn test_cross_domain_redirect_not_followed() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", &["/moved"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", external_url(&other_server, "/").as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other_server)
        .await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.pages_processed, 1);
    let moved = pages
        .iter()
        .find(|p| p.url.ends_with("/moved"))
        .expect("Redirecting page not published");
    assert_eq!(moved.status_code, 301);
    assert!(moved.error.is_some());
}

/// Mounts a permanent redirect from `from` to the relative location `to`
async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", to))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_redirect_to_queued_url_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", &["/old", "/new"]), 1).await;
    mount_redirect(&mock_server, "/old", "/new").await;
    mount_page(&mock_server, "/new", html_page("New", &[]), 1).await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(pages.len(), 3);

    let old = pages
        .iter()
        .find(|p| p.url.ends_with("/old"))
        .expect("Redirecting page not published");
    assert_eq!(old.status_code, 301);
    assert!(old.error.is_some());
    assert_eq!(pages.iter().filter(|p| p.title == "New").count(), 1);

    let mut paths = requested_paths(&mock_server).await;
    paths.sort();
    assert_eq!(paths, vec!["/", "/new", "/old"]);
}

#[tokio::test]
async fn test_followed_redirect_target_not_fetched_again() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", &["/old", "/other"]), 1).await;
    mount_redirect(&mock_server, "/old", "/new").await;
    mount_page(&mock_server, "/other", html_page("Other", &["/new"]), 1).await;
    mount_page(&mock_server, "/new", html_page("New", &[]), 1).await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    // Whichever of the redirect and the link reaches /new first, it is fetched once
    assert_eq!(outcome.pages_processed, 3);
    assert_eq!(pages.iter().filter(|p| p.title == "New").count(), 1);
    assert_eq!(
        requested_paths(&mock_server)
            .await
            .iter()
            .filter(|p| p.as_str() == "/new")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_redirect_hops_respect_politeness_delay() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let mut config = create_test_config();
    config.crawler.minimum_time_on_page = 200;

    mount_redirect(&mock_server, "/old", "/new").await;
    mount_page(&mock_server, "/new", html_page("New", &[]), 1).await;

    let started = std::time::Instant::now();
    let (outcome, pages) = run_crawl(config, crawl_job(format!("{}/old", base_url), 10)).await;

    assert_eq!(outcome.pages_processed, 1);
    assert_eq!(requested_paths(&mock_server).await, vec!["/old", "/new"]);
    assert!(started.elapsed() >= std::time::Duration::from_millis(200));

    // Reported under the requested URL, with the content it redirected to
    assert_eq!(pages.len(), 1);
    assert!(pages[0].url.ends_with("/old"));
    assert_eq!(pages[0].title, "New");
}

#[tokio::test]
async fn test_non_html_page_reported_without_signals() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", &["/data.json"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"a": 1}"#, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (outcome, pages) = run_crawl(create_test_config(), crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.pages_processed, 1);
    let data = pages
        .iter()
        .find(|p| p.url.ends_with("/data.json"))
        .expect("Non-HTML page not published");
    assert_eq!(data.status_code, 200);
    assert!(data.h1_tags.is_empty());
    assert!(data
        .error
        .as_deref()
        .is_some_and(|e| e.contains("not an HTML document")));
}

#[tokio::test]
async fn test_politeness_spaces_requests() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let mut config = create_test_config();
    config.crawler.minimum_time_on_page = 100;

    mount_page(&mock_server, "/", html_page("Home", &["/a", "/b"]), 1).await;
    mount_page(&mock_server, "/a", html_page("A", &[]), 1).await;
    mount_page(&mock_server, "/b", html_page("B", &[]), 1).await;

    let started = std::time::Instant::now();
    let (outcome, _) = run_crawl(config, crawl_job(format!("{}/", base_url), 10)).await;

    assert_eq!(outcome.pages_processed, 3);
    // Three request starts on one domain need two full delays
    assert!(started.elapsed() >= std::time::Duration::from_millis(200));
}
