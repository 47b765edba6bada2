//! Data models for tasks and daily body-stat records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};

/// Calendar dates are exchanged as `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string, reporting malformed input as a validation error
pub fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| StoreError::Validation(format!("invalid date '{raw}': {e}. Use YYYY-MM-DD.")))
}

/// A to-do item shown on the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub content: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub is_completed: bool,
    /// Opaque reference to an image stored elsewhere
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task. Dates are raw strings so the store can
/// validate them the same way regardless of the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl NewTask {
    pub fn new(content: impl Into<String>) -> Self {
        NewTask {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Full replacement of a task's mutable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub content: String,
    pub description: String,
    pub due_date: String,
}

/// The single merged body-stat/training record for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub train_upper: Option<bool>,
    pub train_core: Option<bool>,
    pub train_lower: Option<bool>,
}

/// Partial set of fields for an upsert. `None` means "not supplied",
/// which keeps whatever is already stored for that date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricFields {
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub train_upper: Option<bool>,
    #[serde(default)]
    pub train_core: Option<bool>,
    #[serde(default)]
    pub train_lower: Option<bool>,
}

impl MetricFields {
    /// A single training checkbox
    pub fn training(category: TrainingCategory, done: bool) -> Self {
        let mut fields = MetricFields::default();
        match category {
            TrainingCategory::Upper => fields.train_upper = Some(done),
            TrainingCategory::Core => fields.train_core = Some(done),
            TrainingCategory::Lower => fields.train_lower = Some(done),
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        *self == MetricFields::default()
    }

    /// Reject NaN and infinite measurements. SQLite stores NaN as NULL,
    /// which would read as "not supplied" in the merge.
    pub fn validate(&self) -> StoreResult<()> {
        let measurements = [
            ("height", self.height),
            ("weight", self.weight),
            ("body_fat", self.body_fat),
        ];
        for (name, value) in measurements {
            if let Some(v) = value.filter(|v| !v.is_finite()) {
                return Err(StoreError::Validation(format!(
                    "{name} must be a finite number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Training session categories tracked per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TrainingCategory {
    Upper,
    Core,
    Lower,
}

/// Numeric body measurements that can be charted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BodyField {
    Height,
    Weight,
    BodyFat,
}

impl BodyField {
    pub fn name(self) -> &'static str {
        match self {
            BodyField::Height => "height",
            BodyField::Weight => "weight",
            BodyField::BodyFat => "body_fat",
        }
    }

    pub fn value_of(self, record: &DailyMetric) -> Option<f64> {
        match self {
            BodyField::Height => record.height,
            BodyField::Weight => record.weight,
            BodyField::BodyFat => record.body_fat,
        }
    }
}

/// A body measurement series, ascending by date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    pub field: BodyField,
    pub points: Vec<MetricPoint>,
}

/// A single data point in a measurement series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Training session counts over a window of daily records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub days: usize,
    pub upper: usize,
    pub core: usize,
    pub lower: usize,
    /// Days with at least one session of any category
    pub active_days: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(parse_date("2025-13-01").unwrap_err().is_validation());
        assert!(parse_date("06/01/2025").unwrap_err().is_validation());
        assert!(parse_date("").unwrap_err().is_validation());
    }

    #[test]
    fn test_training_fields_touch_one_category() {
        let fields = MetricFields::training(TrainingCategory::Core, true);
        assert_eq!(fields.train_core, Some(true));
        assert_eq!(fields.train_upper, None);
        assert_eq!(fields.weight, None);
        assert!(!fields.is_empty());
        assert!(MetricFields::default().is_empty());
    }

    #[test]
    fn test_validate_measurements() {
        let ok = MetricFields {
            weight: Some(70.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        assert!(MetricFields::default().validate().is_ok());

        let nan = MetricFields {
            body_fat: Some(f64::NAN),
            ..Default::default()
        };
        let err = nan.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("body_fat"));
    }

    #[test]
    fn test_metric_fields_deserialize_partial() {
        let fields: MetricFields = serde_json::from_str(r#"{"weight": 70.0}"#).unwrap();
        assert_eq!(fields.weight, Some(70.0));
        assert_eq!(fields.height, None);
        assert_eq!(fields.train_upper, None);
    }
}
