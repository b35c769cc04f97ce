//! Whole-day date arithmetic shared by the chart math.

use chrono::{Days, NaiveDate};

/// Duration of a task in days: due minus start, clamped to a minimum of
/// one day so same-day tasks still occupy time on the schedule.
pub fn duration_days(start: NaiveDate, due: NaiveDate) -> i64 {
    (due - start).num_days().max(1)
}

/// Signed day count from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date` shifted by `days`, saturating at the calendar bounds.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duration_counts_days_between_dates() {
        assert_eq!(duration_days(date(2024, 1, 1), date(2024, 1, 5)), 4);
    }

    #[test]
    fn test_duration_clamps_to_one_day() {
        assert_eq!(duration_days(date(2024, 1, 1), date(2024, 1, 1)), 1);
    }

    #[test]
    fn test_days_between_is_signed() {
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 1, 8)), 7);
        assert_eq!(days_between(date(2024, 1, 8), date(2024, 1, 1)), -7);
    }

    #[test]
    fn test_add_days_moves_in_both_directions() {
        assert_eq!(add_days(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(add_days(date(2024, 3, 1), -1), date(2024, 2, 29));
        assert_eq!(add_days(date(2024, 1, 1), 0), date(2024, 1, 1));
    }
}
