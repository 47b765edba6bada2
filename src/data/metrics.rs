//! One merged body-stat/training record per calendar date.
//!
//! Writes go through a single `INSERT ... ON CONFLICT(date) DO UPDATE`
//! statement. Each column falls back to its stored value when the caller
//! did not supply it, so a training checkbox and a full body-stats form can
//! share the same write path without erasing each other's fields.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::error::StoreResult;
use super::models::{parse_date, DailyMetric, MetricFields};
use super::storage::{format_date, get_date};

const METRIC_COLUMNS: &str =
    "date, height, weight, body_fat, train_upper, train_core, train_lower";

fn metric_from_row(row: &Row) -> rusqlite::Result<DailyMetric> {
    Ok(DailyMetric {
        date: get_date(row, 0)?,
        height: row.get(1)?,
        weight: row.get(2)?,
        body_fat: row.get(3)?,
        train_upper: row.get(4)?,
        train_core: row.get(5)?,
        train_lower: row.get(6)?,
    })
}

/// Storage interface for daily metrics
pub struct DailyMetricStore<'a> {
    conn: &'a Connection,
}

impl<'a> DailyMetricStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        DailyMetricStore { conn }
    }

    /// Create the record for `date` or merge `fields` into the existing one.
    ///
    /// Supplied fields overwrite, including an explicit `false` for a
    /// training flag. Omitted fields keep their stored value, or stay NULL
    /// on a fresh record. Non-finite measurements are rejected.
    pub fn upsert(&self, date: &str, fields: &MetricFields) -> StoreResult<DailyMetric> {
        let date = parse_date(date)?;
        fields.validate()?;

        let record = self.conn.query_row(
            &format!(
                "INSERT INTO daily_metrics ({METRIC_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(date) DO UPDATE SET
                    height = COALESCE(excluded.height, daily_metrics.height),
                    weight = COALESCE(excluded.weight, daily_metrics.weight),
                    body_fat = COALESCE(excluded.body_fat, daily_metrics.body_fat),
                    train_upper = COALESCE(excluded.train_upper, daily_metrics.train_upper),
                    train_core = COALESCE(excluded.train_core, daily_metrics.train_core),
                    train_lower = COALESCE(excluded.train_lower, daily_metrics.train_lower)
                 RETURNING {METRIC_COLUMNS}"
            ),
            params![
                format_date(date),
                fields.height,
                fields.weight,
                fields.body_fat,
                fields.train_upper,
                fields.train_core,
                fields.train_lower,
            ],
            metric_from_row,
        )?;

        debug!(date = %record.date, ?fields, "daily metric upserted");
        Ok(record)
    }

    /// The record for one date, if any write has happened for it
    pub fn get(&self, date: NaiveDate) -> StoreResult<Option<DailyMetric>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {METRIC_COLUMNS} FROM daily_metrics WHERE date = ?1"),
                [format_date(date)],
                metric_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Up to `limit` records, most recent date first
    pub fn list_recent(&self, limit: usize) -> StoreResult<Vec<DailyMetric>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {METRIC_COLUMNS} FROM daily_metrics ORDER BY date DESC LIMIT ?1"
        ))?;
        let records = stmt
            .query_map([limit], metric_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Latest known stats
    pub fn latest(&self) -> StoreResult<Option<DailyMetric>> {
        Ok(self.list_recent(1)?.into_iter().next())
    }
}
