//! Duration attributes found in reports, converted to milliseconds.
//!
//! Nothing in here fails: text that cannot be read as a duration is worth 0ms.

use chrono::{NaiveTime, Timelike};

const CLOCK_FORMAT: &str = "%H:%M:%S%.f";

/// Reads decimal seconds (`"2.5"`) as milliseconds, rounded to the nearest millisecond.
///
/// Only `.` is accepted as decimal separator, whatever the host locale says.
/// Negative values are kept as they are.
pub fn parse_seconds(text: Option<&str>) -> i64 {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite())
        .map(|seconds| (seconds * 1000.0).round() as i64)
        .unwrap_or(0)
}

/// Reads an `H:mm:ss.SSS` clock duration (`"1:30:00.500"`) as milliseconds.
pub fn parse_clock(text: Option<&str>) -> i64 {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| NaiveTime::parse_from_str(t, CLOCK_FORMAT).ok())
        .map(|time| {
            i64::from(time.num_seconds_from_midnight()) * 1000
                + i64::from(time.nanosecond() / 1_000_000)
        })
        .unwrap_or(0)
}

/// Clock format when the text has a `:`, decimal seconds otherwise.
pub fn parse_any(text: Option<&str>) -> i64 {
    match text {
        Some(t) if t.contains(':') => parse_clock(Some(t)),
        _ => parse_seconds(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_seconds() {
        assert_eq!(parse_seconds(Some("2.5")), 2500);
        assert_eq!(parse_seconds(Some(" 0.0004 ")), 0);
        assert_eq!(parse_seconds(Some("0.0016")), 2);
        assert_eq!(parse_seconds(Some("12")), 12_000);
        assert_eq!(parse_seconds(Some("-0.2")), -200);
    }

    #[test]
    fn malformed_seconds_are_zero() {
        assert_eq!(parse_seconds(None), 0);
        assert_eq!(parse_seconds(Some("")), 0);
        assert_eq!(parse_seconds(Some("abc")), 0);
        assert_eq!(parse_seconds(Some("2,5")), 0);
        assert_eq!(parse_seconds(Some("NaN")), 0);
        assert_eq!(parse_seconds(Some("inf")), 0);
    }

    #[test]
    fn clock_durations() {
        assert_eq!(parse_clock(Some("1:30:00.500")), 5_400_500);
        assert_eq!(parse_clock(Some("0:00:01.250")), 1_250);
        assert_eq!(parse_clock(Some("00:02:03")), 123_000);
        assert_eq!(parse_clock(Some("")), 0);
        assert_eq!(parse_clock(None), 0);
        assert_eq!(parse_clock(Some("abc")), 0);
        assert_eq!(parse_clock(Some("1:75:00.000")), 0);
    }

    #[test]
    fn picks_format_from_text() {
        assert_eq!(parse_any(Some("0:00:02.000")), 2000);
        assert_eq!(parse_any(Some("2.000")), 2000);
        assert_eq!(parse_any(None), 0);
    }
}
