//! Calendar arithmetic for release scheduling
//!
//! ISO-8601 week numbering, weekday selection within a month and the
//! every-Nth-week cadence filter. Month and year rollover always go through
//! chrono so December rolls into January of the next year.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// ISO-8601 week-numbering year and week of `date`.
///
/// Week 1 is the week containing the year's first Thursday, so the returned
/// year can differ from the calendar year around New Year.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date - Days::new(offset)
}

/// First day of the month following the month of `reference`.
pub fn first_of_next_month(reference: NaiveDate) -> Option<NaiveDate> {
    reference
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
}

/// Every date of `year`-`month` whose weekday is in `weekdays`, ascending.
pub fn month_matching_weekdays(year: i32, month: u32, weekdays: &[Weekday]) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|date| date.month() == month)
        .filter(|date| weekdays.contains(&date.weekday()))
        .collect()
}

/// Every date in the month after `reference` whose weekday is in `weekdays`.
pub fn next_month_matching_weekdays(reference: NaiveDate, weekdays: &[Weekday]) -> Vec<NaiveDate> {
    match first_of_next_month(reference) {
        Some(first) => month_matching_weekdays(first.year(), first.month(), weekdays),
        None => Vec::new(),
    }
}

/// Keeps the dates falling in every `frequency`-th ISO week, counting week
/// buckets from the week of the first date.
///
/// `frequency` of 0 or 1 returns the input unchanged. The first bucket is
/// always kept, so a non-empty input never yields an empty result.
pub fn apply_frequency(dates: &[NaiveDate], frequency: u32) -> Vec<NaiveDate> {
    if frequency <= 1 {
        return dates.to_vec();
    }
    let Some(first) = dates.first() else {
        return Vec::new();
    };

    let origin = week_start(*first);
    dates
        .iter()
        .copied()
        .filter(|date| {
            let bucket = (week_start(*date) - origin).num_weeks();
            bucket.rem_euclid(i64::from(frequency)) == 0
        })
        .collect()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MON_TO_THU: [Weekday; 4] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_week_new_year() {
        assert_eq!(iso_week(date(2024, 1, 1)), (2024, 1));
    }

    #[test]
    fn test_iso_week_year_end() {
        assert_eq!(iso_week(date(2020, 12, 31)), (2020, 53));
    }

    #[test]
    fn test_iso_week_belongs_to_next_year() {
        // Monday 2024-12-30 is in week 1 of 2025
        assert_eq!(iso_week(date(2024, 12, 30)), (2025, 1));
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(date(2024, 1, 4)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 1)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 7)), date(2024, 1, 1));
    }

    #[test]
    fn test_next_month_matching_weekdays_february_2024() {
        let dates = next_month_matching_weekdays(date(2024, 1, 15), &MON_TO_THU);

        assert!(dates.iter().all(|d| d.month() == 2 && d.year() == 2024));
        assert!(dates
            .iter()
            .all(|d| d.weekday().num_days_from_monday() < 4));
        // February 2024: 29 days starting on Thursday
        assert_eq!(dates.len(), 17);
        assert_eq!(dates.first(), Some(&date(2024, 2, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 2, 29)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_next_month_rolls_over_year() {
        let dates = next_month_matching_weekdays(date(2024, 12, 10), &[Weekday::Mon]);
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 6),
                date(2025, 1, 13),
                date(2025, 1, 20),
                date(2025, 1, 27)
            ]
        );
    }

    #[test]
    fn test_month_matching_weekdays_empty_set() {
        assert!(month_matching_weekdays(2024, 2, &[]).is_empty());
    }

    #[test]
    fn test_month_matching_weekdays_invalid_month() {
        assert!(month_matching_weekdays(2024, 13, &MON_TO_THU).is_empty());
    }

    #[test]
    fn test_apply_frequency_one_is_identity() {
        let dates = month_matching_weekdays(2024, 2, &MON_TO_THU);
        assert_eq!(apply_frequency(&dates, 1), dates);
    }

    #[test]
    fn test_apply_frequency_alternating_weeks() {
        let dates = month_matching_weekdays(2024, 2, &[Weekday::Mon]);
        // Mondays: 5, 12, 19, 26
        assert_eq!(
            apply_frequency(&dates, 2),
            vec![date(2024, 2, 5), date(2024, 2, 19)]
        );
    }

    #[test]
    fn test_apply_frequency_buckets_from_first_date() {
        // Starts on a Thursday: week of Jan 29 is bucket 0
        let dates = month_matching_weekdays(2024, 2, &MON_TO_THU);
        let kept = apply_frequency(&dates, 2);

        assert_eq!(kept.first(), Some(&date(2024, 2, 1)));
        assert!(kept.contains(&date(2024, 2, 12)));
        assert!(!kept.contains(&date(2024, 2, 5)));
        assert!(!kept.contains(&date(2024, 2, 19)));
        assert!(kept.contains(&date(2024, 2, 26)));
    }

    #[test]
    fn test_apply_frequency_never_empty_for_non_empty_input() {
        let dates = month_matching_weekdays(2024, 3, &[Weekday::Wed]);
        for frequency in 1..=6 {
            assert!(!apply_frequency(&dates, frequency).is_empty());
        }
    }

    #[test]
    fn test_apply_frequency_empty_input() {
        assert!(apply_frequency(&[], 3).is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-02"), Some(date(2024, 1, 2)));
        assert_eq!(parse_date(" 2024-01-02 "), Some(date(2024, 1, 2)));
        assert_eq!(parse_date("2024-13-02"), None);
        assert_eq!(parse_date("invalid-date"), None);
    }
}
