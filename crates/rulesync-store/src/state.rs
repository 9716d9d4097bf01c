//! Managed-state ledger
//!
//! Records, per location, which rule names the reconciler owned after its
//! last pass, plus a history of reconcile runs. The next pass reads the
//! managed names back as its "previously managed" input so that rules
//! dropped from the desired list get deleted.

#![allow(clippy::result_large_err)]

use crate::config::StoreConfig;
use crate::db::open_with_config;
use crate::errors::{corrupt_row, from_rusqlite, lock_poisoned, Result};
use crate::migrations::apply_migrations;
use chrono::{DateTime, TimeZone, Utc};
use rulesync_core::errors::{ExError, ExErrorKind};
use rulesync_core::model::{Location, RuleName};
use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    /// Some operations were applied before a failure
    Partial,
    Failed,
    DryRun,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
            RunStatus::DryRun => "dry_run",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "succeeded" => Some(RunStatus::Succeeded),
            "partial" => Some(RunStatus::Partial),
            "failed" => Some(RunStatus::Failed),
            "dry_run" => Some(RunStatus::DryRun),
            _ => None,
        }
    }
}

/// One reconcile pass as stored in `reconcile_runs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub location: Location,
    pub status: RunStatus,
    pub ops_applied: usize,
    pub ops_total: usize,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    /// New record with a UUIDv7 id, finished now
    pub fn new(location: Location, status: RunStatus, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            location,
            status,
            ops_applied: 0,
            ops_total: 0,
            error_code: None,
            error_message: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn with_counts(mut self, applied: usize, total: usize) -> Self {
        self.ops_applied = applied;
        self.ops_total = total;
        self
    }

    pub fn with_error(mut self, err: &ExError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.error_message = Some(err.message().to_string());
        self
    }
}

pub struct ManagedStateStore {
    conn: Mutex<Connection>,
}

impl ManagedStateStore {
    /// # Errors
    ///
    /// `Persistence` or `MigrationFailed` if the database cannot be prepared.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_with_config(config)?),
        })
    }

    /// # Errors
    ///
    /// As [`ManagedStateStore::open`].
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// # Errors
    ///
    /// `MigrationFailed` or `Persistence` from the migration runner.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned("managed_state"))
    }

    /// Names managed at `location` after the last recorded pass, in the
    /// order they were desired; empty if nothing was recorded
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures or invalid stored names.
    pub fn load_managed(&self, location: &Location) -> Result<Vec<RuleName>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name FROM managed_rules WHERE location_key = ?1 ORDER BY ordinal")
            .map_err(from_rusqlite)?;
        let names = stmt
            .query_map([location.key()], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        names
            .into_iter()
            .map(|n| RuleName::new(n).map_err(|e| corrupt_row("load_managed", e)))
            .collect()
    }

    /// Replace the managed names of `location`
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures.
    pub fn save_managed(&self, location: &Location, names: &[RuleName]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        replace_managed(&tx, location, names)?;
        tx.commit().map_err(from_rusqlite)
    }

    /// # Errors
    ///
    /// `Persistence` on SQLite failures.
    pub fn record_run(&self, run: &RunRecord) -> Result<()> {
        let conn = self.lock()?;
        insert_run(&conn, run)
    }

    /// Record a run and, when `managed` is given, the new managed names,
    /// in one transaction
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures; nothing is written in that case.
    pub fn record_outcome(&self, run: &RunRecord, managed: Option<&[RuleName]>) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        if let Some(names) = managed {
            replace_managed(&tx, &run.location, names)?;
        }
        insert_run(&tx, run)?;
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(
            location = %run.location,
            run_id = %run.id,
            status = run.status.as_str(),
            "recorded reconcile outcome"
        );
        Ok(())
    }

    /// Runs for `location`, oldest first
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures or rows that no longer parse.
    pub fn runs(&self, location: &Location) -> Result<Vec<RunRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, status, ops_applied, ops_total, error_code, error_message,
                        started_at, finished_at
                 FROM reconcile_runs WHERE location_key = ?1
                 ORDER BY started_at, id",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([location.key()], |row| {
                Ok(RunRow {
                    id: row.get(0)?,
                    status: row.get(1)?,
                    ops_applied: row.get(2)?,
                    ops_total: row.get(3)?,
                    error_code: row.get(4)?,
                    error_message: row.get(5)?,
                    started_at: row.get(6)?,
                    finished_at: row.get(7)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter()
            .map(|row| row.into_record(location.clone()))
            .collect()
    }

    /// # Errors
    ///
    /// As [`ManagedStateStore::runs`].
    pub fn last_run(&self, location: &Location) -> Result<Option<RunRecord>> {
        Ok(self.runs(location)?.pop())
    }
}

struct RunRow {
    id: String,
    status: String,
    ops_applied: i64,
    ops_total: i64,
    error_code: Option<String>,
    error_message: Option<String>,
    started_at: i64,
    finished_at: i64,
}

impl RunRow {
    fn into_record(self, location: Location) -> Result<RunRecord> {
        let status = RunStatus::parse(&self.status).ok_or_else(|| {
            ExError::new(ExErrorKind::Persistence)
                .with_op("runs")
                .with_message(format!("unknown run status '{}'", self.status))
        })?;
        Ok(RunRecord {
            id: self.id,
            location,
            status,
            ops_applied: self.ops_applied.max(0) as usize,
            ops_total: self.ops_total.max(0) as usize,
            error_code: self.error_code,
            error_message: self.error_message,
            started_at: from_millis(self.started_at)?,
            finished_at: from_millis(self.finished_at)?,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        ExError::new(ExErrorKind::Persistence)
            .with_op("runs")
            .with_message(format!("timestamp {} out of range", ms))
    })
}

fn replace_managed(tx: &Transaction<'_>, location: &Location, names: &[RuleName]) -> Result<()> {
    let key = location.key();
    tx.execute("DELETE FROM managed_rules WHERE location_key = ?1", [&key])
        .map_err(from_rusqlite)?;
    let now = Utc::now().timestamp();
    let mut stmt = tx
        .prepare(
            "INSERT OR IGNORE INTO managed_rules (location_key, name, ordinal, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(from_rusqlite)?;
    for (ordinal, name) in names.iter().enumerate() {
        stmt.execute(rusqlite::params![key, name.as_str(), ordinal as i64, now])
            .map_err(from_rusqlite)?;
    }
    Ok(())
}

fn insert_run(conn: &Connection, run: &RunRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO reconcile_runs
            (id, location_key, status, ops_applied, ops_total, error_code, error_message,
             started_at, finished_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            run.id,
            run.location.key(),
            run.status.as_str(),
            run.ops_applied as i64,
            run.ops_total as i64,
            run.error_code,
            run.error_message,
            run.started_at.timestamp_millis(),
            run.finished_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}
