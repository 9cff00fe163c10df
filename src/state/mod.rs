//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `JobState`: the coordinator's per-job state machine (starting, running, draining, ...)
//! - `DomainState`: per-domain request spacing used by the politeness limiter

mod domain_state;
mod job_state;

// Re-export main types
pub use domain_state::DomainState;
pub use job_state::JobState;
