//! Pure functions mapping a UNIX timestamp to the left/right edge of the
//! hour/day/week/month window containing it. All computations are done
//! against UTC broken-down time; local time is never consulted.
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

fn to_datetime(ts: u32) -> NaiveDateTime {
    NaiveDateTime::from_timestamp(ts as i64, 0)
}

fn to_ts(dt: NaiveDateTime) -> u32 {
    dt.timestamp() as u32
}

/// Greatest hour-start `<= ts`.
pub fn hourly_left(ts: u32) -> u32 {
    let dt = to_datetime(ts);
    let truncated = dt.date().and_hms(dt.hour(), 0, 0);
    to_ts(truncated)
}

/// `hourly_left(ts) + 1 hour - 1 second`.
pub fn hourly_right(ts: u32) -> u32 {
    hourly_left(ts) + (SECONDS_PER_HOUR as u32) - 1
}

/// Greatest day-start (UTC midnight) `<= ts`.
pub fn daily_left(ts: u32) -> u32 {
    let dt = to_datetime(ts);
    to_ts(dt.date().and_hms(0, 0, 0))
}

/// `daily_left(ts) + 1 day - 1 second`.
pub fn daily_right(ts: u32) -> u32 {
    daily_left(ts) + (SECONDS_PER_DAY as u32) - 1
}

/// Greatest Monday-start `<= ts`.
pub fn weekly_left(ts: u32) -> u32 {
    let day = daily_left(ts);
    let weekday = to_datetime(day).weekday();
    // Monday == 0 .. Sunday == 6
    let days_since_monday = weekday.num_days_from_monday() as i64;
    (day as i64 - days_since_monday * SECONDS_PER_DAY) as u32
}

/// `weekly_left(ts) + 7 days - 1 second`.
pub fn weekly_right(ts: u32) -> u32 {
    weekly_left(ts) + (SECONDS_PER_WEEK as u32) - 1
}

/// Greatest 1st-of-month-start `<= ts`.
pub fn monthly_left(ts: u32) -> u32 {
    let dt = to_datetime(ts);
    let first_of_month = dt.date().with_day(1).expect("day 1 is always valid");
    to_ts(first_of_month.and_hms(0, 0, 0))
}

/// `monthly_left(ts) + days_in_month(ts) - 1 second`.
///
/// Leap years are detected with `year % 4 == 0` only - the century
/// correction (divisible by 100 but not 400) is intentionally omitted to
/// stay byte-compatible with the source this store was distilled from.
pub fn monthly_right(ts: u32) -> u32 {
    let left = monthly_left(ts);
    let dt = to_datetime(left);
    let days = days_in_month(dt.year(), dt.month());
    left + (days as u32) * (SECONDS_PER_DAY as u32) - 1
}

fn days_in_month(year: i32, month: u32) -> u32 {
    const DAYS: [u32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && year % 4 == 0 {
        29
    } else {
        DAYS[month as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly() {
        assert_eq!(hourly_left(0), 0);
        assert_eq!(hourly_right(0), 3599);
        assert_eq!(hourly_left(3599), 0);
        assert_eq!(hourly_left(3600), 3600);
    }

    #[test]
    fn test_daily() {
        assert_eq!(daily_left(0), 0);
        assert_eq!(daily_right(0), 86399);
        assert_eq!(daily_left(86399), 0);
        assert_eq!(daily_left(86400), 86400);
    }

    #[test]
    fn test_weekly_thursday_rounds_back_to_monday() {
        // 1970-01-08T00:00:00Z is a Thursday; 1970-01-05 is its Monday.
        let thursday = 7 * SECONDS_PER_DAY as u32;
        let expected_left = thursday - 3 * (SECONDS_PER_DAY as u32);
        assert_eq!(weekly_left(thursday), expected_left);
        assert_eq!(weekly_right(thursday), expected_left + (SECONDS_PER_WEEK as u32) - 1);
    }

    #[test]
    fn test_weekly_monday_is_own_left() {
        let monday = 4 * SECONDS_PER_DAY as u32; // 1970-01-05, a Monday
        assert_eq!(weekly_left(monday), monday);
    }

    #[test]
    fn test_monthly_january() {
        assert_eq!(monthly_left(0), 0);
        assert_eq!(monthly_right(0), 31 * SECONDS_PER_DAY as u32 - 1);
    }

    #[test]
    fn test_monthly_february_leap_rule_no_century_correction() {
        // 2100 is divisible by 4 but not a real leap year (divisible by 100,
        // not by 400); this store treats it as one anyway, matching the
        // source's latent defect. u32 timestamps can't represent 1900, so
        // this is the nearest such year after the epoch.
        let dt = chrono::NaiveDate::from_ymd(2100, 2, 1).and_hms(0, 0, 0);
        let ts = dt.timestamp() as u32;
        assert_eq!(days_in_month(2100, 2), 29);
        assert_eq!(monthly_right(ts), monthly_left(ts) + 29 * SECONDS_PER_DAY as u32 - 1);
    }

    #[test]
    fn test_monthly_february_common_year() {
        assert_eq!(days_in_month(1970, 2), 28);
    }

    #[test]
    fn test_monthly_february_real_leap_year() {
        let dt = chrono::NaiveDate::from_ymd(1972, 2, 1).and_hms(0, 0, 0);
        let ts = dt.timestamp() as u32;
        assert_eq!(days_in_month(1972, 2), 29);
        assert_eq!(monthly_right(ts), monthly_left(ts) + 29 * SECONDS_PER_DAY as u32 - 1);
    }
}
