//! Data layer for tasks and daily body-stat records.
//!
//! Handles the SQLite schema, task CRUD, and the per-date merge of
//! body measurements and training flags.

mod error;
pub mod history;
mod metrics;
mod models;
mod storage;
mod tasks;

pub use error::StoreError;
pub use models::{
    parse_date, BodyField, DailyMetric, MetricFields, MetricSeries, NewTask, Task, TaskUpdate,
    TrainingCategory, TrainingSummary,
};
pub use storage::{format_date, today, Database, DEFAULT_BUSY_TIMEOUT};
