//! Normalises the timestamps news sites print into `YYYY-MM-DD HH:MM:SS`.

use chrono::{Datelike, Duration, NaiveDateTime};
use data_model_twn::models::NEWS_TIME_FORMAT;

/// Formats that carry their own year.
const FULL_FORMATS: &[&str] = &[
    NEWS_TIME_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// How far ahead of `now` a year-less time may be before it's taken to be from last year.
const FUTURE_TOLERANCE_HOURS: i64 = 24;

/// Parses a site timestamp. Year-less `MM/DD HH:MM` values get the year that puts them
/// closest to (and not meaningfully after) `now`.
pub fn normalize_news_time(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    FULL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| with_inferred_year(raw, now))
}

/// `normalize_news_time` rendered in the wire format.
pub fn format_news_time(raw: &str, now: NaiveDateTime) -> Option<String> {
    normalize_news_time(raw, now).map(|t| t.format(NEWS_TIME_FORMAT).to_string())
}

fn with_inferred_year(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let parse_in = |year: i32| NaiveDateTime::parse_from_str(&format!("{}/{}", year, raw), "%Y/%m/%d %H:%M").ok();

    match parse_in(now.year()) {
        Some(t) if t <= now + Duration::hours(FUTURE_TOLERANCE_HOURS) => Some(t),
        // Too far in the future, or Feb 29 in a non-leap year.
        _ => parse_in(now.year() - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_model_twn::models::parse_news_time;

    fn now() -> NaiveDateTime {
        parse_news_time("2025-03-10 12:00:00").unwrap()
    }

    #[test]
    fn test_full_formats() {
        assert_eq!(
            format_news_time("2025.01.05 14:30", now()).as_deref(),
            Some("2025-01-05 14:30:00")
        );
        assert_eq!(
            format_news_time("2024/12/31 23:59", now()).as_deref(),
            Some("2024-12-31 23:59:00")
        );
        assert_eq!(
            format_news_time(" 2025-01-01 00:00:00 ", now()).as_deref(),
            Some("2025-01-01 00:00:00")
        );
    }

    #[test]
    fn test_year_less_time_uses_current_year() {
        assert_eq!(
            format_news_time("03/10 08:15", now()).as_deref(),
            Some("2025-03-10 08:15:00")
        );
    }

    #[test]
    fn test_year_less_time_in_the_future_is_last_year() {
        assert_eq!(
            format_news_time("12/31 23:00", now()).as_deref(),
            Some("2024-12-31 23:00:00")
        );
    }

    #[test]
    fn test_year_less_leap_day() {
        let now = parse_news_time("2024-03-01 00:00:00").unwrap();
        assert_eq!(
            format_news_time("02/29 10:00", now).as_deref(),
            Some("2024-02-29 10:00:00")
        );
        // 2025 has no Feb 29, so the nearest earlier one is used.
        let now = parse_news_time("2025-03-01 00:00:00").unwrap();
        assert_eq!(
            format_news_time("02/29 10:00", now).as_deref(),
            Some("2024-02-29 10:00:00")
        );
    }

    #[test]
    fn test_garbage() {
        assert_eq!(normalize_news_time("", now()), None);
        assert_eq!(normalize_news_time("yesterday", now()), None);
    }
}
