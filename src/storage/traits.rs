//! Storage traits and error types
//!
//! This module defines the interface the crawl worker uses to talk to the
//! persistence service, and its error type.

use crate::storage::{JobOutcome, ProjectRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the persistence collaborator
///
/// The crawl engine never issues SQL itself; it only reads project settings
/// and reports audit-run progress through this interface.
pub trait JobStore: Send {
    /// Loads a project's domain and settings
    ///
    /// Used to resolve a crawl job's start URL when it is not absolute.
    ///
    /// # Returns
    ///
    /// * `Ok(ProjectRecord)` - The project
    /// * `Err(StorageError::ProjectNotFound)` - No project with this ID exists
    fn load_project(&self, project_id: i64) -> StorageResult<ProjectRecord>;

    /// Marks an audit run as running
    fn record_job_started(&mut self, run_id: i64, project_id: i64) -> StorageResult<()>;

    /// Records the terminal outcome of a crawl job on its audit run
    fn record_job_outcome(&mut self, outcome: &JobOutcome) -> StorageResult<()>;
}
