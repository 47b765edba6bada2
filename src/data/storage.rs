//! SQLite storage layer shared by the task and daily-metric stores.
//!
//! Database schema:
//! - `tasks` table: id, content, description, due_date, is_completed,
//!   image_ref, created_at
//! - `daily_metrics` table: date (primary key), height, weight, body_fat,
//!   train_upper, train_core, train_lower
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as fixed-width
//! RFC 3339 text, so string order equals chronological order.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, Row};
use tracing::{debug, info};

use super::metrics::DailyMetricStore;
use super::models::DATE_FORMAT;
use super::tasks::TaskStore;

/// Current schema version, tracked in `PRAGMA user_version`
const SCHEMA_VERSION: i64 = 1;

/// Timestamp layout written to `created_at`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Default time a writer waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Today's calendar date in local time, used when no due date is given
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current UTC time, rendered for the `created_at` column
pub(crate) fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Read a `YYYY-MM-DD` column
pub(crate) fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

/// Read an RFC 3339 timestamp column
pub(crate) fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Bring the schema up to date. The migration runs in one transaction that
/// rolls back when dropped, so a failed step leaves the connection usable.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to start schema migration")?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL CHECK (length(trim(content)) > 0),
            description TEXT NOT NULL DEFAULT '',
            due_date TEXT NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            image_ref TEXT,
            created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_due_date
            ON tasks(due_date, created_at);

            CREATE TABLE IF NOT EXISTS daily_metrics (
            date TEXT PRIMARY KEY,
            height REAL,
            weight REAL,
            body_fat REAL,
            train_upper INTEGER,
            train_core INTEGER,
            train_lower INTEGER
            );

            PRAGMA user_version = 1;",
        )
        .context("Failed to apply schema migration")?;
        tx.commit().context("Failed to commit schema migration")?;
        info!(from = version, to = SCHEMA_VERSION, "schema migrated");
    } else {
        debug!(version, "schema up to date");
    }

    Ok(())
}

/// An open profit-ops database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) a database file and bring its schema up to date
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {path:?}"))?;
        conn.busy_timeout(busy_timeout)
            .context("Failed to set busy timeout")?;

        let db = Database { conn };
        migrate(&db.conn)?;
        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Database { conn };
        migrate(&db.conn)?;
        Ok(db)
    }

    /// Task CRUD over this database
    pub fn tasks(&self) -> TaskStore<'_> {
        TaskStore::new(&self.conn)
    }

    /// Per-date body-stat records over this database
    pub fn metrics(&self) -> DailyMetricStore<'_> {
        DailyMetricStore::new(&self.conn)
    }
}
