//! Per-domain rate limiting
//!
//! Every request to a domain must first acquire a `DomainPermit`:
//! - At most `per-domain-concurrency` permits per domain exist at once
//! - Consecutive request starts on a domain are spaced by the minimum delay

use crate::config::CrawlerConfig;
use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

struct DomainSlot {
    state: DomainState,
    permits: Arc<Semaphore>,
}

/// Held for the duration of one request; dropping it frees the domain slot
pub struct DomainPermit {
    domain: String,
    _permit: OwnedSemaphorePermit,
}

impl DomainPermit {
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Politeness gate shared by all pipelines of one crawl job
pub struct Politeness {
    min_delay: Duration,
    max_in_flight: usize,
    domains: Mutex<HashMap<String, DomainSlot>>,
}

impl Politeness {
    pub fn new(min_delay: Duration, max_in_flight: usize) -> Self {
        Self {
            min_delay,
            max_in_flight: max_in_flight.max(1),
            domains: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.politeness_delay(),
            config.per_domain_concurrency as usize,
        )
    }

    /// Waits until `domain` admits another request
    ///
    /// Waits first for an in-flight slot, then for the reserved start time.
    pub async fn acquire(&self, domain: &str) -> Result<DomainPermit, AcquireError> {
        let permits = {
            let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            domains
                .entry(domain.to_string())
                .or_insert_with(|| DomainSlot {
                    state: DomainState::new(),
                    permits: Arc::new(Semaphore::new(self.max_in_flight)),
                })
                .permits
                .clone()
        };

        let permit = permits.acquire_owned().await?;

        let wait = {
            let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            match domains.get_mut(domain) {
                Some(slot) => slot.state.reserve_slot(self.min_delay, Instant::now()),
                None => Duration::ZERO,
            }
        };

        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before next request to {}", wait, domain);
            tokio::time::sleep(wait).await;
        }

        Ok(DomainPermit {
            domain: domain.to_string(),
            _permit: permit,
        })
    }

    /// Number of requests started (or reserved) against `domain`
    pub fn request_count(&self, domain: &str) -> u32 {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .map_or(0, |slot| slot.state.request_count)
    }

    /// Number of permits currently held for `domain`
    pub fn in_flight(&self, domain: &str) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .map_or(0, |slot| {
                self.max_in_flight - slot.permits.available_permits()
            })
    }
}
