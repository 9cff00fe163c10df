//! HTML signal extraction
//!
//! This module turns a fetched page into the signals the analysis stage
//! consumes:
//! - Title, meta description and robots directives
//! - Every `<meta>` keyed by `name` or `property` (Open Graph included)
//! - `<h1>` through `<h6>` headings
//! - Every `<a href>` target, as written in the markup
//! - The canonical URL

use crate::crawler::fetcher::FetchResult;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a fetched page produced no signals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty response body")]
    EmptyBody,

    #[error("not an HTML document (content type: {0})")]
    NotHtml(String),
}

/// Signals extracted from one successfully fetched page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSignals {
    pub url: String,
    pub status_code: u16,
    /// Text of the first `<title>`, empty if absent
    pub title: String,
    /// `content` of the first `<meta name="description">`, empty if absent
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    /// Heading texts by tag (`h1`..`h6`); levels without headings are absent
    pub headings: BTreeMap<String, Vec<String>>,
    /// `content` of every `<meta>` by its `name` or `property`
    pub meta_tags: BTreeMap<String, String>,
    /// Raw `href` values of every `<a href>`, in document order
    pub all_links: Vec<String>,
    pub canonical_url: String,
    pub has_robots_meta: bool,
    pub robots_content: String,
    pub load_time_ms: u64,
    pub extracted_at: DateTime<Utc>,
}

/// Markup-level fields of a parsed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub headings: BTreeMap<String, Vec<String>>,
    pub meta_tags: BTreeMap<String, String>,
    pub links: Vec<String>,
    pub canonical_url: String,
    pub robots: Option<String>,
}

/// Extracts page signals from a fetch result
///
/// Extraction is attempted only when a body is present and looks like HTML.
/// Broken markup is not an error: the parser recovers and extraction yields
/// whatever fields it can find.
///
/// # Returns
///
/// * `Ok(PageSignals)` - Signals for the page
/// * `Err(ParseError::EmptyBody)` - No body, or only whitespace
/// * `Err(ParseError::NotHtml)` - The body is some other kind of document
pub fn extract(fetch: &FetchResult) -> Result<PageSignals, ParseError> {
    let body = match fetch.body.as_deref() {
        Some(body) if !body.trim().is_empty() => body,
        _ => return Err(ParseError::EmptyBody),
    };

    if !looks_like_html(fetch.content_type.as_deref(), body) {
        return Err(ParseError::NotHtml(
            fetch.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    let parsed = parse_html(body);

    Ok(PageSignals {
        url: fetch.url.to_string(),
        status_code: fetch.status_code.unwrap_or_default(),
        title: parsed.title,
        meta_description: parsed.meta_description,
        h1_tags: parsed.h1_tags,
        headings: parsed.headings,
        meta_tags: parsed.meta_tags,
        all_links: parsed.links,
        canonical_url: parsed.canonical_url,
        has_robots_meta: parsed.robots.is_some(),
        robots_content: parsed.robots.unwrap_or_default(),
        load_time_ms: fetch.elapsed_ms,
        extracted_at: Utc::now(),
    })
}

/// Decides whether a body should be parsed as HTML
///
/// A declared content type wins. Without one, the body is sniffed for a
/// leading tag.
fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    match content_type {
        Some(ct) => {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "text/html" || mime == "application/xhtml+xml"
        }
        None => body.trim_start().starts_with('<'),
    }
}

/// Parses HTML content and extracts the page fields
///
/// # Example
///
/// ```
/// use seo_crawler::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let headings = extract_headings(&document);

    ParsedPage {
        title: extract_title(&document),
        meta_description: meta_content(&document, "description").unwrap_or_default(),
        h1_tags: headings.get("h1").cloned().unwrap_or_default(),
        headings,
        meta_tags: extract_meta_tags(&document),
        links: extract_links(&document),
        canonical_url: extract_canonical(&document).unwrap_or_default(),
        robots: meta_content(&document, "robots"),
    }
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn extract_title(document: &Html) -> String {
    select_all(document, "title")
        .first()
        .map(element_text)
        .unwrap_or_default()
}

fn extract_headings(document: &Html) -> BTreeMap<String, Vec<String>> {
    ["h1", "h2", "h3", "h4", "h5", "h6"]
        .into_iter()
        .filter_map(|tag| {
            let texts: Vec<String> = select_all(document, tag).iter().map(element_text).collect();
            (!texts.is_empty()).then(|| (tag.to_string(), texts))
        })
        .collect()
}

/// Maps every `<meta>` `name` and `property` to its `content`
///
/// A tag carrying both attributes is recorded under both keys. Later tags
/// overwrite earlier ones with the same key.
fn extract_meta_tags(document: &Html) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    for element in select_all(document, "meta") {
        let content = element.value().attr("content").unwrap_or("").trim();
        for attr in ["name", "property"] {
            match element.value().attr(attr).map(str::trim) {
                Some(key) if !key.is_empty() => {
                    tags.insert(key.to_string(), content.to_string());
                }
                _ => {}
            }
        }
    }

    tags
}

/// Collects every non-empty `href` of an `<a>` element
///
/// Links are kept as written. Resolution and filtering happen when they are
/// offered to the frontier.
fn extract_links(document: &Html) -> Vec<String> {
    select_all(document, "a[href]")
        .iter()
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_canonical(document: &Html) -> Option<String> {
    select_all(document, "link[rel][href]")
        .into_iter()
        .find(|element| {
            element
                .value()
                .attr("rel")
                .map(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("canonical"))
                })
                .unwrap_or(false)
        })
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
}

/// `content` of the first `<meta name=...>` matching `name`, case-insensitively
fn meta_content(document: &Html, name: &str) -> Option<String> {
    select_all(document, "meta[name][content]")
        .into_iter()
        .find(|element| {
            element
                .value()
                .attr("name")
                .map(|n| n.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
}
