//! Charting helpers over recent daily metrics.
//!
//! `DailyMetricStore::list_recent` returns newest first; charts want
//! oldest first, so everything here re-sorts ascending by date.

use super::models::{BodyField, DailyMetric, MetricPoint, MetricSeries, TrainingSummary};

/// Ascending series for one body measurement, skipping days where it is unset
pub fn series(records: &[DailyMetric], field: BodyField) -> MetricSeries {
    let mut points: Vec<MetricPoint> = records
        .iter()
        .filter_map(|record| {
            field.value_of(record).map(|value| MetricPoint {
                date: record.date,
                value,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);

    MetricSeries { field, points }
}

impl MetricSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Difference between the last and first value in the window
    pub fn change(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(last.value - first.value)
    }
}

/// Count training sessions per category across the given days
pub fn training_summary(records: &[DailyMetric]) -> TrainingSummary {
    let mut summary = TrainingSummary {
        days: records.len(),
        ..Default::default()
    };

    for record in records {
        let upper = record.train_upper.unwrap_or(false);
        let core = record.train_core.unwrap_or(false);
        let lower = record.train_lower.unwrap_or(false);

        summary.upper += usize::from(upper);
        summary.core += usize::from(core);
        summary.lower += usize::from(lower);
        if upper || core || lower {
            summary.active_days += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(day: u32, weight: Option<f64>, upper: Option<bool>, core: Option<bool>) -> DailyMetric {
        DailyMetric {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            height: None,
            weight,
            body_fat: None,
            train_upper: upper,
            train_core: core,
            train_lower: None,
        }
    }

    #[test]
    fn test_series_is_ascending_and_skips_missing() {
        // Newest first, as list_recent returns them
        let records = vec![
            record(5, Some(69.0), None, None),
            record(4, None, Some(true), None),
            record(2, Some(70.5), None, None),
        ];

        let weight = series(&records, BodyField::Weight);
        let dates: Vec<u32> = weight
            .points
            .iter()
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(dates, vec![2, 5]);
        assert_eq!(weight.points[0].value, 70.5);
        assert_eq!(weight.change(), Some(-1.5));
    }

    #[test]
    fn test_series_for_unset_field_is_empty() {
        let records = vec![record(1, Some(70.0), None, None)];
        let height = series(&records, BodyField::Height);
        assert!(height.is_empty());
        assert_eq!(height.change(), None);
    }

    #[test]
    fn test_training_summary_counts_sessions() {
        let records = vec![
            record(1, None, Some(true), Some(true)),
            record(2, Some(70.0), Some(false), None),
            record(3, None, None, Some(true)),
        ];

        let summary = training_summary(&records);
        assert_eq!(
            summary,
            TrainingSummary {
                days: 3,
                upper: 1,
                core: 2,
                lower: 0,
                active_days: 2,
            }
        );
    }
}
