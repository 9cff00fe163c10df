//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The per-job frontier (dedup, domain boundary, depth and page budget)
//! - Per-domain politeness (request spacing and in-flight caps)
//! - HTTP fetching with same-site redirect handling
//! - HTML signal extraction
//! - Overall crawl job coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod politeness;

pub use coordinator::Coordinator;
pub use extractor::{extract, parse_html, PageSignals, ParseError, ParsedPage};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use politeness::{DomainPermit, Politeness};
