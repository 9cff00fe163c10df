use std::time::{Duration, Instant};

/// Tracks the politeness state of a domain during one crawl job
///
/// This structure maintains the per-domain information needed to space
/// consecutive requests to the same domain.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests started against this domain
    pub request_count: u32,

    /// Start time of the most recent (or most recently reserved) request
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + min_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// The slot is `max(now, last + min_delay)`. Reserving moves
    /// `last_request_time` forward immediately, so concurrent callers queue up
    /// behind each other instead of all waking at the same instant.
    pub fn reserve_slot(&mut self, min_delay: Duration, now: Instant) -> Duration {
        let wait = self.time_until_next_request(min_delay, now).unwrap_or(Duration::ZERO);
        self.record_request(now + wait);
        wait
    }
}
