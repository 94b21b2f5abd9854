//! Working-week arithmetic
//!
//! The journal week runs Monday through Saturday.

use chrono::{Datelike, Days, Months, NaiveDate};

pub const WORKING_DAYS: u64 = 6;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn snap_to_monday(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Monday and Saturday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = snap_to_monday(date);
    (monday, monday + Days::new(WORKING_DAYS - 1))
}

pub fn week_days(monday: NaiveDate) -> Vec<NaiveDate> {
    (0..WORKING_DAYS).map(|i| monday + Days::new(i)).collect()
}

pub fn is_in_week(date: NaiveDate, monday: NaiveDate) -> bool {
    let (start, end) = week_bounds(monday);
    date >= start && date <= end
}

/// Mondays of the `count` weeks ending with the week of `date`, oldest first.
pub fn recent_mondays(date: NaiveDate, count: u64) -> Vec<NaiveDate> {
    let monday = snap_to_monday(date);
    (0..count)
        .rev()
        .map(|i| monday - Days::new(i * 7))
        .collect()
}

/// The `count` days ending with `date`, oldest first.
pub fn recent_days(date: NaiveDate, count: u64) -> Vec<NaiveDate> {
    (0..count).rev().map(|i| date - Days::new(i)).collect()
}

/// First and last day of each of the `count` months ending with the month
/// of `date`, oldest first.
pub fn recent_months(date: NaiveDate, count: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let first_of_month = date.with_day(1).unwrap_or(date);
    (0..count)
        .rev()
        .filter_map(|i| {
            let start = first_of_month.checked_sub_months(Months::new(i))?;
            let end = start.checked_add_months(Months::new(1))? - Days::new(1);
            Some((start, end))
        })
        .collect()
}

/// Short label such as `3/9` (day/month).
pub fn day_label(date: NaiveDate) -> String {
    format!("{}/{}", date.day(), date.month())
}

pub fn month_label(date: NaiveDate) -> &'static str {
    MONTH_ABBREVIATIONS[date.month0() as usize]
}

/// Years accepted from clients; week arithmetic stays far from chrono's limits.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Parses an ISO date, naming the offending field on failure.
pub fn parse_date(field: &str, value: &str) -> crate::Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| crate::Error::invalid_input(field, "expected a date as YYYY-MM-DD"))?;
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(crate::Error::invalid_input(field, "year must be between 1900 and 9999"));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_of_a_sunday_starts_the_monday_before() {
        // 2024-09-08 is a Sunday
        let (monday, saturday) = week_bounds(date(2024, 9, 8));
        assert_eq!(monday, date(2024, 9, 2));
        assert_eq!(saturday, date(2024, 9, 7));
    }

    #[test]
    fn week_days_are_monday_to_saturday() {
        let days = week_days(date(2024, 9, 2));
        assert_eq!(days.len(), 6);
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[5].weekday(), Weekday::Sat);
    }

    #[test]
    fn sunday_is_outside_the_working_week() {
        let monday = date(2024, 9, 2);
        assert!(is_in_week(date(2024, 9, 7), monday));
        assert!(!is_in_week(date(2024, 9, 8), monday));
        assert!(!is_in_week(date(2024, 9, 1), monday));
    }

    #[test]
    fn recent_months_wrap_the_year() {
        let months = recent_months(date(2024, 2, 15), 3);
        assert_eq!(
            months,
            vec![
                (date(2023, 12, 1), date(2023, 12, 31)),
                (date(2024, 1, 1), date(2024, 1, 31)),
                (date(2024, 2, 1), date(2024, 2, 29)),
            ]
        );
        assert_eq!(month_label(months[0].0), "Dec");
    }

    #[test]
    fn recent_mondays_are_oldest_first() {
        let mondays = recent_mondays(date(2024, 9, 4), 3);
        assert_eq!(
            mondays,
            vec![date(2024, 8, 19), date(2024, 8, 26), date(2024, 9, 2)]
        );
    }

    #[test]
    fn labels_and_parsing() {
        assert_eq!(day_label(date(2024, 3, 9)), "9/3");
        assert_eq!(parse_date("date", "2024-03-09").unwrap(), date(2024, 3, 9));
        assert!(parse_date("date", "09.03.2024").is_err());
    }

    #[test]
    fn extreme_years_are_rejected() {
        for value in ["+262142-12-31", "-262144-01-01", "1899-12-31", "10000-01-01"] {
            let err = parse_date("week_start", value).unwrap_err();
            assert!(matches!(err, crate::Error::InvalidInput { .. }), "{value}");
        }
        assert!(parse_date("week_start", "9999-12-31").is_ok());
        assert!(parse_date("week_start", "1900-01-01").is_ok());
    }

    proptest! {
        #[test]
        fn snapped_day_is_a_monday_within_the_week(offset in 0i64..20_000) {
            let day = date(2000, 1, 1) + chrono::Duration::days(offset);
            let monday = snap_to_monday(day);
            prop_assert_eq!(monday.weekday(), Weekday::Mon);
            prop_assert!(monday <= day);
            prop_assert!((day - monday).num_days() < 7);
        }
    }
}
