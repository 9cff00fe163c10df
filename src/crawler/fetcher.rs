//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Following redirects by hand, one politeness-gated request per hop
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::politeness::Politeness;
use crate::url::{base_domain, extract_domain};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Result of a fetch operation
///
/// A fetch never fails outright: transport problems are carried in `error`
/// with `status_code` left empty.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: Url,
    /// URL that produced this response, after any followed redirects
    pub final_url: Url,
    /// HTTP status code, absent on transport failure
    pub status_code: Option<u16>,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Time from sending the request to reading the full body
    pub elapsed_ms: u64,
    /// Decoded page body
    pub body: Option<String>,
    /// Resolved `Location` of a redirect response
    pub location: Option<Url>,
    /// Transport error, or why a redirect was not followed
    pub error: Option<String>,
}

impl FetchResult {
    fn transport_error(url: &Url, elapsed_ms: u64, error: String) -> Self {
        Self {
            url: url.clone(),
            final_url: url.clone(),
            status_code: None,
            content_type: None,
            elapsed_ms,
            body: None,
            location: None,
            error: Some(error),
        }
    }

    /// True for a 2xx answer
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Request timeout
/// * `user_agent` - The client identification
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = crawler.request_timeout();

    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a single GET request without following redirects
///
/// | Condition | Result |
/// |-----------|--------|
/// | 3xx with `Location` | `status_code` and `location` set, body not read |
/// | Any other HTTP answer | `status_code` set, body read when possible |
/// | Timeout | `error = "Request timeout"` |
/// | Connection refused / DNS | `error = "Connection failed: ..."` |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let started = Instant::now();
    let elapsed = |started: Instant| started.elapsed().as_millis() as u64;

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchResult::transport_error(url, elapsed(started), error);
        }
    };

    let status_code = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let location = if response.status().is_redirection() {
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| url.join(v.trim()).ok())
    } else {
        None
    };

    let (body, error) = if location.is_some() {
        (None, None)
    } else {
        match response.text().await {
            Ok(body) => (Some(body), None),
            Err(e) => (None, Some(format!("Failed to read body: {}", e))),
        }
    };

    FetchResult {
        url: url.clone(),
        final_url: url.clone(),
        status_code: Some(status_code),
        content_type,
        elapsed_ms: elapsed(started),
        body,
        location,
        error,
    }
}

fn site_of(url: &Url) -> String {
    extract_domain(url)
        .map(|host| base_domain(&host))
        .unwrap_or_default()
}

/// Rate-limited fetcher shared by the pipelines of one crawl job
pub struct Fetcher {
    client: Client,
    politeness: Arc<Politeness>,
    max_redirects: usize,
}

impl Fetcher {
    pub fn new(client: Client, politeness: Arc<Politeness>, max_redirects: usize) -> Self {
        Self {
            client,
            politeness,
            max_redirects,
        }
    }

    /// Fetches a URL, following redirects that stay on its site
    ///
    /// Every hop is a separate request that waits for its domain's
    /// politeness slot. A hop is followed only if `admit_hop` accepts the
    /// target; otherwise the redirect response itself is returned with
    /// `error` saying why. The returned `url` is always the requested URL,
    /// and `final_url` the URL that produced the response.
    ///
    /// The politeness waits are not included in `elapsed_ms`, which covers
    /// the last request only.
    pub async fn fetch<F>(&self, url: &Url, admit_hop: F) -> FetchResult
    where
        F: Fn(&Url) -> bool,
    {
        let site = site_of(url);
        let mut current = url.clone();
        let mut hops = 0;

        loop {
            let mut result = self.fetch_once(&current).await;
            result.url = url.clone();

            let target = match result.location.clone() {
                Some(target) => target,
                None => return result,
            };

            let refusal = if hops >= self.max_redirects {
                Some(format!("more than {} redirects", self.max_redirects))
            } else if site_of(&target) != site {
                Some(format!("redirect to {} leaves {}", target, site))
            } else if !admit_hop(&target) {
                Some(format!("redirect target {} already seen", target))
            } else {
                None
            };

            if let Some(reason) = refusal {
                tracing::debug!(url = %current, "Redirect not followed: {}", reason);
                result.error = Some(reason);
                return result;
            }

            tracing::debug!(url = %current, target = %target, "Following redirect");
            hops += 1;
            current = target;
        }
    }

    /// Waits for the URL's domain to admit a request, then sends it
    async fn fetch_once(&self, url: &Url) -> FetchResult {
        let _permit = match self.politeness.acquire(&site_of(url)).await {
            Ok(permit) => permit,
            Err(e) => return FetchResult::transport_error(url, 0, e.to_string()),
        };

        tracing::debug!(url = %url, "Visiting");
        fetch_url(&self.client, url).await
    }
}
