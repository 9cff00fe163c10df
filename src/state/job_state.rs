/// Job state definitions for the crawl coordinator
///
/// A crawl job moves through `Starting → Running → Draining → Completed`, or
/// ends in `Failed` when setup cannot complete.
use std::fmt;

/// Represents the current state of one crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// Validating the start URL, deriving the base domain, seeding the frontier
    Starting,

    /// Fetch-extract pipelines are being dispatched from the frontier
    Running,

    /// No new pipelines are dispatched; in-flight ones are allowed to finish
    Draining,

    // ===== Terminal States =====
    /// Draining finished with zero outstanding work
    Completed,

    /// An unrecoverable setup error stopped the job
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Checks whether moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Running)
                | (Self::Starting, Self::Failed)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Completed)
        )
    }

    /// Converts the job state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
