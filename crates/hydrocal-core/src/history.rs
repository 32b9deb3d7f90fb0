//! History aggregation for progress charts.
//!
//! Pure bucketing: snapshots are grouped by the period's granularity
//! (day, week starting Monday, month, year) and each series is summed
//! within a bucket. Rendering lives in the binary; this module only
//! shapes the data.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate};
use hydrocal_store::{HistoryPoint, Period};

/// One aggregated point in a progress chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBucket {
    /// Bucket start date (the calendar day, Monday, 1st, or Jan 1).
    pub date: NaiveDate,
    pub water: f64,
    pub calories: f64,
    pub burned: f64,
    pub water_goal: f64,
    pub calorie_goal: f64,
}

/// Date of the bucket a snapshot falls into for the given period.
fn bucket_start(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Day => date,
        Period::Week => date - chrono::Days::new(date.weekday().num_days_from_monday() as u64),
        Period::Month => date.with_day(1).unwrap_or(date),
        Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// Group snapshots into period buckets, summing every series.
///
/// Output is ascending by bucket date. Points with unrepresentable
/// timestamps are skipped.
pub fn aggregate(points: &[HistoryPoint], period: Period) -> Vec<HistoryBucket> {
    let mut buckets: BTreeMap<NaiveDate, HistoryBucket> = BTreeMap::new();

    for point in points {
        let Some(date) = DateTime::from_timestamp(point.logged_at, 0).map(|t| t.date_naive())
        else {
            continue;
        };
        let start = bucket_start(date, period);
        let bucket = buckets.entry(start).or_insert_with(|| HistoryBucket {
            date: start,
            water: 0.0,
            calories: 0.0,
            burned: 0.0,
            water_goal: 0.0,
            calorie_goal: 0.0,
        });
        bucket.water += point.logged_water;
        bucket.calories += point.logged_calories;
        bucket.burned += point.burned_calories;
        bucket.water_goal += point.water_goal;
        bucket.calorie_goal += point.calorie_goal;
    }

    buckets.into_values().collect()
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn point(logged_at: i64, water: f64, calories: f64) -> HistoryPoint {
        HistoryPoint {
            logged_at,
            logged_water: water,
            logged_calories: calories,
            water_goal: 2600.0,
            calorie_goal: 2517.0,
            burned_calories: 0.0,
        }
    }

    #[test]
    fn day_period_buckets_by_calendar_day() {
        let points = vec![
            point(ts(2025, 3, 1), 300.0, 400.0),
            point(ts(2025, 3, 1), 400.0, 200.0),
            point(ts(2025, 3, 2), 500.0, 100.0),
        ];
        let buckets = aggregate(&points, Period::Day);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].water, 700.0);
        assert_eq!(buckets[0].calories, 600.0);
        assert_eq!(buckets[1].water, 500.0);
    }

    #[test]
    fn week_buckets_start_on_monday() {
        // Mar 12 2025 is a Wednesday; Mar 17 the following Monday.
        let points = vec![
            point(ts(2025, 3, 12), 100.0, 0.0),
            point(ts(2025, 3, 14), 200.0, 0.0),
            point(ts(2025, 3, 17), 300.0, 0.0),
        ];
        let buckets = aggregate(&points, Period::Week);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(buckets[0].water, 300.0);
        assert_eq!(buckets[1].date, NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
    }

    #[test]
    fn month_and_year_buckets() {
        let points = vec![
            point(ts(2025, 1, 5), 100.0, 0.0),
            point(ts(2025, 1, 20), 200.0, 0.0),
            point(ts(2025, 2, 3), 400.0, 0.0),
        ];

        let monthly = aggregate(&points, Period::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(monthly[0].water, 300.0);

        let yearly = aggregate(&points, Period::Year);
        assert_eq!(yearly.len(), 1);
        assert_eq!(yearly[0].water, 700.0);
    }

    #[test]
    fn output_is_ascending() {
        let points = vec![
            point(ts(2025, 3, 5), 1.0, 0.0),
            point(ts(2025, 3, 1), 2.0, 0.0),
            point(ts(2025, 3, 3), 3.0, 0.0),
        ];
        let buckets = aggregate(&points, Period::Day);
        for pair in buckets.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(aggregate(&[], Period::Week).is_empty());
    }
}
