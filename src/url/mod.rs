//! URL handling module
//!
//! This module provides URL normalization (the frontier's dedup key), base
//! domain derivation, same-domain checks and link resolution.

mod domain;
mod normalize;

pub use domain::{base_domain, extract_domain, is_same_domain};
pub use normalize::{normalize_parsed, normalize_url, resolve_link};

use crate::UrlError;
use url::Url;

/// Resolves a crawl job's start URL into an absolute, normalized URL
///
/// - An absolute `http(s)` URL is normalized as-is.
/// - A path (`/pricing`, `pricing`) is resolved against `https://<project_domain>/`.
/// - A bare host (`example.com/path`) is prefixed with `https://`.
///
/// # Arguments
///
/// * `start_url` - The start URL as received in the crawl job
/// * `project_domain` - The owning project's domain, when known
///
/// # Returns
///
/// * `Ok(Url)` - The resolved start URL
/// * `Err(UrlError)` - The start URL cannot be turned into a crawlable URL
pub fn resolve_start_url(start_url: &str, project_domain: Option<&str>) -> Result<Url, UrlError> {
    let trimmed = start_url.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("start URL is empty".to_string()));
    }

    if let Ok(url) = Url::parse(trimmed) {
        if url.has_host() || (url.scheme() != "http" && url.scheme() != "https") {
            return normalize_parsed(url);
        }
    }

    if looks_like_path(trimmed) {
        let domain = project_domain
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(UrlError::MissingDomain)?;
        let root = project_root(domain)?;
        let joined = root
            .join(trimmed)
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        return normalize_parsed(joined);
    }

    normalize_url(&format!("https://{}", trimmed))
}

/// Returns true if the value is a path rather than a host-led reference
fn looks_like_path(value: &str) -> bool {
    if value.starts_with('/') || value.starts_with('.') || value.starts_with('?') {
        return true;
    }
    let first_segment = value.split(['/', '?', '#']).next().unwrap_or("");
    !first_segment.contains('.') && !first_segment.contains(':')
}

/// Builds the root URL for a project domain, which may itself carry a scheme
fn project_root(domain: &str) -> Result<Url, UrlError> {
    if domain.contains("://") {
        normalize_url(domain)
    } else {
        normalize_url(&format!("https://{}/", domain.trim_end_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_start_url() {
        let url = resolve_start_url("https://example.com/", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_absolute_start_url_ignores_project() {
        let url = resolve_start_url("http://example.com/a#b", Some("other.com")).unwrap();
        assert_eq!(url.as_str(), "http://example.com/a");
    }

    #[test]
    fn test_path_resolved_against_project_domain() {
        let url = resolve_start_url("/pricing", Some("example.com")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/pricing");
    }

    #[test]
    fn test_path_with_project_domain_carrying_scheme() {
        let url = resolve_start_url("docs", Some("http://example.com")).unwrap();
        assert_eq!(url.as_str(), "http://example.com/docs");
    }

    #[test]
    fn test_path_without_project_domain() {
        let result = resolve_start_url("/pricing", None);
        assert!(matches!(result.unwrap_err(), UrlError::MissingDomain));
    }

    #[test]
    fn test_bare_host_gets_https() {
        let url = resolve_start_url("example.com/blog", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog");
    }

    #[test]
    fn test_empty_start_url() {
        assert!(resolve_start_url("  ", Some("example.com")).is_err());
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = resolve_start_url("ftp://example.com/", None);
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }
}
