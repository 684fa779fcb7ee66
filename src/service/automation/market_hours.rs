use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::America::New_York;

/// Regular US equity session: Mon–Fri, 9:30 <= t < 16:00 ET.
///
/// Exchange holidays are not modelled.
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let now_et = now.with_timezone(&New_York);
    if matches!(now_et.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let hour = now_et.hour();
    let minute = now_et.minute();
    (hour > 9 || (hour == 9 && minute >= 30)) && hour < 16
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn open_during_winter_session() {
        // 2025-01-29 is a Wednesday; ET = UTC-5.
        assert!(!is_market_open(utc(2025, 1, 29, 14, 29)));
        assert!(is_market_open(utc(2025, 1, 29, 14, 30)));
        assert!(is_market_open(utc(2025, 1, 29, 20, 59)));
        assert!(!is_market_open(utc(2025, 1, 29, 21, 0)));
    }

    #[test]
    fn follows_daylight_saving() {
        // 2025-07-16 is a Wednesday; ET = UTC-4.
        assert!(is_market_open(utc(2025, 7, 16, 13, 30)));
        assert!(!is_market_open(utc(2025, 7, 16, 20, 0)));
    }

    #[test]
    fn closed_on_weekends() {
        assert!(!is_market_open(utc(2025, 2, 1, 15, 0)));
        assert!(!is_market_open(utc(2025, 2, 2, 15, 0)));
    }
}
