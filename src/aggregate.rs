//! Day-bucketed totals over the drink history. Everything here is a pure
//! function over a record slice; the store hands out unordered snapshots
//! and these do their own bucketing.

use std::collections::HashMap;

use chrono::{DateTime, Days, Local, NaiveDate};

use crate::structs::drink_point::DrinkPoint;

/// The device-local calendar day a record falls on.
fn local_day(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&Local).date_naive())
}

/// Sum of the amounts recorded on the day of `now`, corrections included.
pub fn today_total(records: &[DrinkPoint], now: DateTime<Local>) -> f64 {
    let today = now.date_naive();

    records
        .iter()
        .filter(|point| local_day(point.timestamp) == Some(today))
        .map(|point| point.amount)
        .sum()
}

/// Per-day totals for the `window_days` days leading up to and including
/// the day of `end`, oldest first. The window is walked day by day, so a
/// day without records still shows up with a 0 total; the result always
/// has `window_days + 1` entries.
pub fn daily_totals(
    records: &[DrinkPoint],
    window_days: u64,
    end: DateTime<Local>,
) -> Vec<(NaiveDate, f64)> {
    let end_day = end.date_naive();
    let start_day = end_day.checked_sub_days(Days::new(window_days)).unwrap();

    let mut totals: Vec<(NaiveDate, f64)> = Vec::with_capacity(window_days as usize + 1);
    let mut day = start_day;
    loop {
        totals.push((day, 0.0));
        if day == end_day {
            break;
        }
        day = day.succ_opt().unwrap();
    }

    for point in records {
        let Some(point_day) = local_day(point.timestamp) else {
            continue;
        };
        if point_day < start_day || point_day > end_day {
            continue;
        }

        let index = point_day.signed_duration_since(start_day).num_days() as usize;
        totals[index].1 += point.amount;
    }

    totals
}

/// One entry per day that has at least one record, newest first.
pub fn history_by_day(records: &[DrinkPoint]) -> Vec<(NaiveDate, f64)> {
    let mut grouped: HashMap<NaiveDate, f64> = HashMap::new();

    for point in records {
        if let Some(day) = local_day(point.timestamp) {
            *grouped.entry(day).or_insert(0.0) += point.amount;
        }
    }

    let mut days: Vec<(NaiveDate, f64)> = grouped.into_iter().collect();
    days.sort_by(|a, b| b.0.cmp(&a.0));
    days
}

/// Fraction of the daily goal reached, clamped to `[0, 1]`. A goal of
/// zero or less reads as no progress; the settings surface never lets the
/// goal get there, but the clamp holds regardless of how the value was
/// produced.
pub fn progress_fraction(total: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }

    (total / goal).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .unwrap()
    }

    fn point(id: u64, amount: f64, when: DateTime<Local>) -> DrinkPoint {
        DrinkPoint::new(id, amount, when.timestamp())
    }

    #[test]
    fn today_total_is_the_signed_sum_of_todays_records() {
        let now = at(2025, 3, 10, 14);
        let records = vec![
            point(1, 250.0, at(2025, 3, 10, 8)),
            point(2, 500.0, at(2025, 3, 10, 12)),
            point(3, -100.0, at(2025, 3, 10, 13)),
        ];

        let total = today_total(&records, now);
        assert!((total - 650.0).abs() < EPSILON);
        assert!((progress_fraction(total, 2000.0) - 0.325).abs() < EPSILON);
    }

    #[test]
    fn today_total_ignores_other_days() {
        let now = at(2025, 3, 10, 14);
        let records = vec![
            point(1, 999.0, at(2025, 3, 9, 23)),
            point(2, 250.0, at(2025, 3, 10, 0)),
            point(3, 999.0, at(2025, 3, 11, 1)),
        ];

        assert!((today_total(&records, now) - 250.0).abs() < EPSILON);
    }

    #[test]
    fn daily_totals_enumerates_every_day_of_the_window() {
        let end = at(2025, 3, 10, 18);
        let records = vec![
            point(1, 500.0, at(2025, 3, 4, 9)),
            point(2, 250.0, at(2025, 3, 10, 9)),
            point(3, 250.0, at(2025, 3, 10, 20)),
        ];

        let totals = daily_totals(&records, 7, end);

        assert_eq!(totals.len(), 8);
        assert_eq!(totals.first().unwrap().0, at(2025, 3, 3, 0).date_naive());
        assert_eq!(totals.last().unwrap().0, at(2025, 3, 10, 0).date_naive());

        // Ascending by day, with empty days zero-filled.
        for pair in totals.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        assert_eq!(totals[0].1, 0.0);
        assert_eq!(totals[1].1, 500.0);
        assert_eq!(totals[7].1, 500.0);
    }

    #[test]
    fn daily_totals_drops_records_outside_the_window() {
        let end = at(2025, 3, 10, 18);
        let records = vec![
            point(1, 999.0, at(2025, 2, 1, 9)),
            point(2, 999.0, at(2025, 3, 11, 9)),
        ];

        let totals = daily_totals(&records, 7, end);
        assert!(totals.iter().all(|(_, total)| *total == 0.0));
    }

    #[test]
    fn history_by_day_is_newest_first() {
        let records = vec![
            point(1, 250.0, at(2025, 3, 8, 9)),
            point(2, 500.0, at(2025, 3, 10, 9)),
            point(3, 250.0, at(2025, 3, 8, 19)),
        ];

        let history = history_by_day(&records);

        assert_eq!(
            history,
            vec![
                (at(2025, 3, 10, 0).date_naive(), 500.0),
                (at(2025, 3, 8, 0).date_naive(), 500.0),
            ]
        );
    }

    #[test]
    fn progress_fraction_stays_in_unit_range() {
        assert!((progress_fraction(650.0, 2000.0) - 0.325).abs() < EPSILON);
        assert_eq!(progress_fraction(2500.0, 2000.0), 1.0);
        assert_eq!(progress_fraction(-200.0, 2000.0), 0.0);
    }

    #[test]
    fn progress_fraction_treats_a_degenerate_goal_as_no_progress() {
        assert_eq!(progress_fraction(650.0, 0.0), 0.0);
        assert_eq!(progress_fraction(650.0, -5.0), 0.0);
    }
}
