//! Julian day arithmetic (Fliegel–van Flandern)
//!
//! Integer division truncates toward zero, as in the published algorithm;
//! callers round-trip through day numbers so the formulas must not drift.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const MILLIS_PER_DAY: u32 = 86_400_000;

/// Gregorian calendar date to Julian day number
pub fn julian_day(year: i32, month: u32, day: u32) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;
    let a = (m - 14) / 12;

    (1461 * (y + 4800 + a)) / 4 + (367 * (m - 2 - 12 * a)) / 12
        - (3 * ((y + 4900 + a) / 100)) / 4
        + d
        - 32075
}

/// Julian day number to Gregorian (year, month, day)
pub fn calendar_date(jd: i64) -> (i32, u32, u32) {
    let mut l = jd + 68569;
    let n = (4 * l) / 146097;
    l -= (146097 * n + 3) / 4;
    let i = (4000 * (l + 1)) / 1461001;
    l = l - (1461 * i) / 4 + 31;
    let j = (80 * l) / 2447;
    let d = l - (2447 * j) / 80;
    l = j / 11;
    let m = j + 2 - 12 * l;
    let y = 100 * (n - 49) + i + l;

    (y as i32, m as u32, d as u32)
}

pub fn date_to_julian(date: NaiveDate) -> i64 {
    julian_day(date.year(), date.month(), date.day())
}

pub fn julian_to_date(jd: i64) -> Option<NaiveDate> {
    let (y, m, d) = calendar_date(jd);
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Milliseconds since midnight, leap-second nanos clamped into the second
pub fn millis_of_day(time: NaiveTime) -> u32 {
    let millis = (time.nanosecond() / 1_000_000).min(999);
    time.num_seconds_from_midnight() * 1000 + millis
}

pub fn time_from_millis(millis: u32) -> Option<NaiveTime> {
    if millis >= MILLIS_PER_DAY {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)
}

/// Split a timestamp into (julian day, millis since midnight)
pub fn datetime_to_parts(dt: NaiveDateTime) -> (i64, u32) {
    (date_to_julian(dt.date()), millis_of_day(dt.time()))
}

pub fn parts_to_datetime(jd: i64, millis: u32) -> Option<NaiveDateTime> {
    Some(julian_to_date(jd)?.and_time(time_from_millis(millis)?))
}
