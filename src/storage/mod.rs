//! Storage module for the persistence collaborator
//!
//! This module handles the database operations the crawl worker depends on:
//! - Loading a project's domain and settings
//! - Marking an audit run as running when its crawl job starts
//! - Recording the job outcome (status, pages processed, error message)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{JobStore, StorageError, StorageResult};

use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CrawlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    Ok(SqliteStorage::new(path)?)
}

/// A project as seen by the crawl worker
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: i64,
    pub domain: String,
    pub settings: serde_json::Value,
}

/// Represents an audit run row
#[derive(Debug, Clone)]
pub struct AuditRunRecord {
    pub id: i64,
    pub project_id: i64,
    pub status: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub total_pages: u32,
    pub error_message: Option<String>,
}

/// Terminal status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

impl JobStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Produced once per crawl job when it reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub run_id: i64,
    pub pages_processed: u32,
    pub status: JobStatus,
    pub error_message: Option<String>,
}

impl JobOutcome {
    pub fn completed(run_id: i64, pages_processed: u32) -> Self {
        Self {
            run_id,
            pages_processed,
            status: JobStatus::Completed,
            error_message: None,
        }
    }

    pub fn failed(run_id: i64, error_message: impl Into<String>) -> Self {
        Self {
            run_id,
            pages_processed: 0,
            status: JobStatus::Failed,
            error_message: Some(error_message.into()),
        }
    }
}
