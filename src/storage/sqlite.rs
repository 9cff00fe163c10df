//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{AuditRunRecord, JobOutcome, ProjectRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts a project and returns its ID
    pub fn insert_project(
        &mut self,
        name: &str,
        domain: &str,
        settings: &serde_json::Value,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let settings = serde_json::to_string(settings)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO projects (name, domain, settings, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, domain, settings, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Creates a queued audit run, as the intake API does before enqueueing a job
    pub fn create_audit_run(&mut self, project_id: i64) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO audit_runs (project_id, status) VALUES (?1, 'queued')",
            params![project_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Gets an audit run by ID
    pub fn get_audit_run(&self, run_id: i64) -> StorageResult<Option<AuditRunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, project_id, status, started_at, finished_at, total_pages, error_message
                 FROM audit_runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(AuditRunRecord {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        status: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        total_pages: row.get(5)?,
                        error_message: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(run)
    }
}

impl JobStore for SqliteStorage {
    fn load_project(&self, project_id: i64) -> StorageResult<ProjectRecord> {
        let row: Option<(i64, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, domain, settings FROM projects WHERE id = ?1",
                params![project_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (id, domain, settings) = row.ok_or(StorageError::ProjectNotFound(project_id))?;

        let settings = match settings.as_deref() {
            None | Some("") => serde_json::Value::Null,
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
        };

        Ok(ProjectRecord {
            id,
            domain,
            settings,
        })
    }

    fn record_job_started(&mut self, run_id: i64, project_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO audit_runs (id, project_id, status, started_at)
             VALUES (?1, ?2, 'running', ?3)
             ON CONFLICT(id) DO UPDATE SET status = 'running', started_at = ?3,
                 finished_at = NULL, error_message = NULL",
            params![run_id, project_id, now],
        )?;
        Ok(())
    }

    fn record_job_outcome(&mut self, outcome: &JobOutcome) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE audit_runs
             SET status = ?1, total_pages = ?2, error_message = ?3, finished_at = ?4
             WHERE id = ?5",
            params![
                outcome.status.to_db_string(),
                outcome.pages_processed,
                outcome.error_message,
                now,
                outcome.run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::Database(format!(
                "audit run {} does not exist",
                outcome.run_id
            )));
        }

        Ok(())
    }
}
