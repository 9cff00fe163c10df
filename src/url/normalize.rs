use crate::UrlError;
use url::Url;

/// Schemes that are reported as links but never offered to the frontier
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a URL into the form used as the frontier's dedup key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host (lowercased by the parser, default port dropped)
/// 4. Empty path becomes `/`; dot segments are resolved by the parser
/// 5. Remove fragment (everything after #)
/// 6. Remove an empty query string (trailing ?)
///
/// Two URLs that differ only by fragment normalize to the same value, so the
/// normalized form identifies a page as scheme + host + path + query.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/page#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already-parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Resolves a link href against the page that referenced it
///
/// Returns None if the link should not be followed:
/// - empty or fragment-only hrefs (same page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - hrefs that do not resolve to an HTTP(S) URL with a host
///
/// The returned URL is normalized.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return None;
    }

    let joined = base_url.join(href).ok()?;
    normalize_parsed(joined).ok()
}
