use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::America::New_York;

use crate::models::{ChartInterval, ChartRange, ChartWindow};

/// Map a chart range to its start date and sampling interval.
///
/// Dates are New York calendar dates, so `1D` stays on the current
/// session through the US evening.
pub fn resolve(range: ChartRange, now: DateTime<Utc>) -> ChartWindow {
    let today = now.with_timezone(&New_York).date_naive();

    let (period1, interval) = match range {
        ChartRange::OneDay => (today, ChartInterval::OneMinute),
        ChartRange::FiveDays => (today - Duration::days(5), ChartInterval::FifteenMinutes),
        ChartRange::TwoWeeks => (today - Duration::days(14), ChartInterval::ThirtyMinutes),
        ChartRange::OneMonth => (months_back(today, 1), ChartInterval::OneDay),
        ChartRange::ThreeMonths => (months_back(today, 3), ChartInterval::OneDay),
        ChartRange::SixMonths => (months_back(today, 6), ChartInterval::OneDay),
        ChartRange::YearToDate => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            ChartInterval::OneDay,
        ),
        ChartRange::OneYear => (months_back(today, 12), ChartInterval::OneDay),
        ChartRange::FiveYears => (months_back(today, 60), ChartInterval::OneWeek),
        ChartRange::TenYears => (months_back(today, 120), ChartInterval::OneMonth),
    };

    ChartWindow { period1, interval }
}

/// Resolve a raw query value; unknown ranges behave like `1D`.
pub fn resolve_str(raw: &str, now: DateTime<Utc>) -> ChartWindow {
    resolve(ChartRange::parse_lossy(raw), now)
}

// Month arithmetic clamps to the last valid day (Mar 31 - 1M = Feb 28/29).
fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 15, 45, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn intraday_ranges() {
        let w = resolve_str("1D", now());
        assert_eq!(w.period1, ymd(2025, 3, 31));
        assert_eq!(w.interval, ChartInterval::OneMinute);

        let w = resolve_str("5D", now());
        assert_eq!(w.period1, ymd(2025, 3, 26));
        assert_eq!(w.interval, ChartInterval::FifteenMinutes);

        let w = resolve_str("2w", now());
        assert_eq!(w.period1, ymd(2025, 3, 17));
        assert_eq!(w.interval, ChartInterval::ThirtyMinutes);
    }

    #[test]
    fn monthly_ranges_clamp_to_month_end() {
        assert_eq!(resolve_str("1M", now()).period1, ymd(2025, 2, 28));
        assert_eq!(resolve_str("3M", now()).period1, ymd(2024, 12, 31));
        assert_eq!(resolve_str("6M", now()).period1, ymd(2024, 9, 30));
        assert_eq!(resolve_str("6M", now()).interval, ChartInterval::OneDay);
    }

    #[test]
    fn long_ranges_use_coarse_buckets() {
        let w = resolve_str("5Y", now());
        assert_eq!(w.period1, ymd(2020, 3, 31));
        assert_eq!(w.interval, ChartInterval::OneWeek);

        let w = resolve_str("10Y", now());
        assert_eq!(w.period1, ymd(2015, 3, 31));
        assert_eq!(w.interval, ChartInterval::OneMonth);
    }

    #[test]
    fn year_ranges() {
        assert_eq!(resolve_str("YTD", now()).period1, ymd(2025, 1, 1));
        assert_eq!(resolve_str("1Y", now()).period1, ymd(2024, 3, 31));
    }

    #[test]
    fn unknown_range_matches_one_day() {
        assert_eq!(resolve_str("XX", now()), resolve_str("1D", now()));
        assert_eq!(resolve_str("", now()), resolve(ChartRange::OneDay, now()));
    }

    #[test]
    fn one_day_uses_new_york_date_after_utc_midnight() {
        // Wed 2025-01-29 20:00 ET is already Thursday in UTC.
        let evening = Utc.with_ymd_and_hms(2025, 1, 30, 1, 0, 0).unwrap();
        assert_eq!(resolve_str("1D", evening).period1, ymd(2025, 1, 29));
        assert_eq!(resolve_str("5D", evening).period1, ymd(2025, 1, 24));
    }
}
