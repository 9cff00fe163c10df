use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Normalizes a host for domain comparison
///
/// The host is case-folded and a single leading `www.` is stripped, so
/// `WWW.Example.com` and `example.com` share the same base domain.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::base_domain;
///
/// assert_eq!(base_domain("WWW.Example.com"), "example.com");
/// assert_eq!(base_domain("blog.example.com"), "blog.example.com");
/// ```
pub fn base_domain(host: &str) -> String {
    let lowered = host.trim().trim_end_matches('.').to_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => lowered,
    }
}

/// Checks whether a URL belongs to the given base domain
///
/// A URL without a host (relative reference) is same-domain by definition.
/// Otherwise the URL's host, normalized with [`base_domain`], must equal the
/// already-normalized `base`.
pub fn is_same_domain(url: &Url, base: &str) -> bool {
    match url.host_str() {
        None => true,
        Some(host) if host.is_empty() => true,
        Some(host) => base_domain(host) == base,
    }
}
