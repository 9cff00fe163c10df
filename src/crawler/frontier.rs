//! Crawl frontier for one job
//!
//! The frontier owns the URLs waiting to be fetched and the set of URLs
//! already seen. It enforces the domain boundary, the depth limit and the
//! page budget, so that:
//! - No URL is fetched twice within a job
//! - No URL outside the start URL's base domain is fetched
//! - No more than `max_pages` URLs are ever handed out
//! - URLs are handed out in non-decreasing depth order
//!
//! Waiting URLs are kept in one FIFO per depth. A URL at depth `d` is only
//! handed out once no page shallower than `d - 1` is still being fetched,
//! since such a page could still discover URLs shallower than `d`.

use crate::url::{is_same_domain, normalize_parsed, resolve_link};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use url::Url;

/// A URL waiting to be fetched, with its link distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

#[derive(Debug, Default)]
struct FrontierInner {
    /// Waiting URLs by depth; empty buckets are removed
    queue: BTreeMap<u32, VecDeque<Url>>,
    visited: HashSet<String>,
    dispatched: u32,
    /// Handed-out entries not yet completed, by depth
    in_flight: BTreeMap<u32, usize>,
}

impl FrontierInner {
    fn pending(&self) -> usize {
        self.queue.values().map(VecDeque::len).sum()
    }
}

/// Thread-safe frontier shared by all pipelines of a crawl job
///
/// The base domain is fixed when the job starts, so `offer` checks every
/// URL against the same boundary.
#[derive(Debug)]
pub struct Frontier {
    base_domain: String,
    max_depth: u32,
    max_pages: u32,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new(base_domain: impl Into<String>, max_depth: u32, max_pages: u32) -> Self {
        Self {
            base_domain: base_domain.into(),
            max_depth,
            max_pages,
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Offers a URL discovered at `depth`
    ///
    /// The URL is accepted only if it is within the depth limit, on the base
    /// domain, not seen before, and the page budget is not yet exhausted.
    /// Rejection is silent.
    ///
    /// # Returns
    ///
    /// `true` if the URL was queued
    pub fn offer(&self, url: &Url, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::debug!(url = %url, depth = depth, "Rejected: beyond max depth");
            return false;
        }

        if !is_same_domain(url, &self.base_domain) {
            tracing::debug!(url = %url, "Rejected: outside {}", self.base_domain);
            return false;
        }

        let normalized = match normalize_parsed(url.clone()) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::debug!(url = %url, "Rejected: {}", e);
                return false;
            }
        };

        let mut inner = self.lock();

        if inner.dispatched >= self.max_pages {
            return false;
        }

        if !inner.visited.insert(normalized.as_str().to_string()) {
            return false;
        }

        inner.queue.entry(depth).or_default().push_back(normalized);
        true
    }

    /// Resolves a raw link against the page it appeared on and offers it
    pub fn offer_href(&self, href: &str, referrer: &Url, depth: u32) -> bool {
        match resolve_link(href, referrer) {
            Some(url) => self.offer(&url, depth),
            None => false,
        }
    }

    /// Claims the target of a redirect hop for an entry already handed out
    ///
    /// The target is marked visited so it is never fetched again. Depth and
    /// budget do not apply: the hop belongs to a fetch already counted.
    ///
    /// # Returns
    ///
    /// `false` if the target is off-domain or was already seen in this job
    pub fn claim_redirect(&self, url: &Url) -> bool {
        if !is_same_domain(url, &self.base_domain) {
            return false;
        }

        match normalize_parsed(url.clone()) {
            Ok(normalized) => self.lock().visited.insert(normalized.as_str().to_string()),
            Err(_) => false,
        }
    }

    /// Hands out the shallowest waiting URL, if the budget allows
    ///
    /// Every returned entry counts against the page budget and stays in
    /// flight until passed to [`Frontier::complete`]. Returns `None` while
    /// the shallowest waiting URL must wait for in-flight pages to finish.
    pub fn next(&self) -> Option<FrontierEntry> {
        let mut inner = self.lock();
        if inner.dispatched >= self.max_pages {
            return None;
        }

        let depth = *inner.queue.keys().next()?;
        if let Some(&shallowest) = inner.in_flight.keys().next() {
            if shallowest + 1 < depth {
                return None;
            }
        }

        let bucket = inner.queue.get_mut(&depth)?;
        let url = bucket.pop_front()?;
        if bucket.is_empty() {
            inner.queue.remove(&depth);
        }

        inner.dispatched += 1;
        *inner.in_flight.entry(depth).or_default() += 1;
        Some(FrontierEntry { url, depth })
    }

    /// Marks a handed-out entry as finished
    pub fn complete(&self, entry: &FrontierEntry) {
        let mut inner = self.lock();
        if let Some(count) = inner.in_flight.get_mut(&entry.depth) {
            *count -= 1;
            if *count == 0 {
                inner.in_flight.remove(&entry.depth);
            }
        }
    }

    /// True once `max_pages` URLs have been handed out
    pub fn is_exhausted(&self) -> bool {
        self.lock().dispatched >= self.max_pages
    }

    /// Number of URLs queued and not yet handed out
    pub fn pending(&self) -> usize {
        self.lock().pending()
    }

    /// Number of handed-out entries not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.values().sum()
    }

    pub fn dispatched(&self) -> u32 {
        self.lock().dispatched
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
