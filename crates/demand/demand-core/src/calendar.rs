//! Week arithmetic: Monday week starts and ISO year-week labels.

use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// ISO year-week label, e.g. `2026-W43`.
pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Every week start from `first` to `last` inclusive.
pub fn week_range(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut weeks = Vec::new();
    let mut current = week_start(first);
    let last = week_start(last);
    while current <= last {
        weeks.push(current);
        current += Duration::weeks(1);
    }
    weeks
}

/// Labels and start dates of the `horizon` weeks beginning with the week of `as_of`.
pub fn forecast_weeks(as_of: NaiveDate, horizon: usize) -> Vec<(String, NaiveDate)> {
    let first = week_start(as_of);
    (0..horizon)
        .map(|i| {
            let date = first + Duration::weeks(i as i64);
            (iso_week_label(date), date)
        })
        .collect()
}

/// Span between two dates in (fractional) weeks.
pub fn span_weeks(first: NaiveDate, last: NaiveDate) -> f64 {
    (last - first).num_days() as f64 / 7.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        assert_eq!(week_start(date(2026, 10, 19)), date(2026, 10, 19));
        assert_eq!(week_start(date(2026, 10, 25)), date(2026, 10, 19));
        assert_eq!(week_start(date(2026, 10, 21)), date(2026, 10, 19));
    }

    #[test]
    fn test_iso_labels() {
        assert_eq!(iso_week_label(date(2026, 10, 19)), "2026-W43");
        // ISO week 1 of 2026 starts on 2025-12-29
        assert_eq!(iso_week_label(date(2025, 12, 29)), "2026-W01");
        assert_eq!(iso_week_label(date(2026, 3, 2)), "2026-W10");
    }

    #[test]
    fn test_week_range_is_continuous() {
        let weeks = week_range(date(2026, 1, 7), date(2026, 2, 1));
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0], date(2026, 1, 5));
        assert_eq!(weeks[3], date(2026, 1, 26));
        assert!(week_range(date(2026, 2, 1), date(2026, 1, 1)).is_empty());
    }

    #[test]
    fn test_forecast_weeks() {
        let weeks = forecast_weeks(date(2026, 10, 21), 3);
        assert_eq!(weeks[0], ("2026-W43".to_string(), date(2026, 10, 19)));
        assert_eq!(weeks[2], ("2026-W45".to_string(), date(2026, 11, 2)));
        assert!(forecast_weeks(date(2026, 10, 21), 0).is_empty());
    }

    #[test]
    fn test_span_weeks() {
        assert_eq!(span_weeks(date(2026, 1, 1), date(2026, 1, 15)), 2.0);
        assert_eq!(span_weeks(date(2026, 1, 1), date(2026, 1, 1)), 0.0);
    }
}
