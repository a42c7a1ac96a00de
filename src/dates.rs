use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

static DAY_FIRST_WITH_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$")
        .expect("day-first timestamp pattern")
});

static DAY_FIRST_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("day-first date pattern")
});

static SHORT_YEAR_WITH_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})\s+(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$")
        .expect("short-year timestamp pattern")
});

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Sentinel returned by [`parse_date`] when nothing matched.
pub fn epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// Parses a survey timestamp, falling back to the Unix epoch.
///
/// Prefer [`try_parse_date`] inside the pipeline; the epoch is only a
/// boundary convention for callers that need a value no matter what.
pub fn parse_date(raw: &str) -> NaiveDateTime {
    try_parse_date(raw).unwrap_or_else(epoch)
}

/// Tries, in order: `DD/MM/YYYY HH:MM[:SS]`, `DD/MM/YYYY`,
/// `DD/MM/YY HH:MM[:SS]` (years below 50 land in the 2000s), then a set of
/// ISO and month-first layouts.
///
/// Known limitation: `04/03/2024` is always read day-first (4 March). The
/// month-first layouts only win when the day-first reading is invalid.
pub fn try_parse_date(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DAY_FIRST_WITH_TIME
        .captures(value)
        .and_then(|caps| from_captures(&caps, full_year(&caps[3])?, true))
        .or_else(|| {
            DAY_FIRST_DATE
                .captures(value)
                .and_then(|caps| from_captures(&caps, full_year(&caps[3])?, false))
        })
        .or_else(|| {
            SHORT_YEAR_WITH_TIME
                .captures(value)
                .and_then(|caps| from_captures(&caps, short_year(&caps[3])?, true))
        })
        .or_else(|| fallback(value));

    if parsed.is_none() {
        debug!(value, "unparseable timestamp");
    }
    parsed
}

fn full_year(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

fn short_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if year < 50 { 2000 + year } else { 1900 + year })
}

fn from_captures(caps: &Captures<'_>, year: i32, with_time: bool) -> Option<NaiveDateTime> {
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    if !with_time {
        return date.and_hms_opt(0, 0, 0);
    }

    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = match caps.get(6) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    date.and_hms_opt(hour, minute, second)
}

fn fallback(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_day_first_timestamp() {
        let parsed = parse_date("15/03/2024 10:30:00");
        assert_eq!(parsed.day(), 15);
        assert_eq!(parsed.month(), 3);
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn garbage_yields_epoch_sentinel() {
        assert_eq!(parse_date("garbage"), epoch());
        assert_eq!(parse_date(""), epoch());
        assert!(try_parse_date("garbage").is_none());
    }

    #[test]
    fn date_only_is_midnight() {
        let parsed = parse_date("2/7/2025");
        assert_eq!((parsed.day(), parsed.month(), parsed.year()), (2, 7, 2025));
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (0, 0, 0));
    }

    #[test]
    fn two_digit_years_pick_a_century() {
        assert_eq!(parse_date("05/03/24 09:00:00").year(), 2024);
        assert_eq!(parse_date("05/03/75 09:00:00").year(), 1975);
    }

    #[test]
    fn ambiguous_dates_are_read_day_first() {
        let parsed = parse_date("04/03/2024 08:00:00");
        assert_eq!((parsed.day(), parsed.month()), (4, 3));
    }

    #[test]
    fn month_first_only_when_day_first_is_invalid() {
        let parsed = parse_date("03/15/2024 08:00:00");
        assert_eq!((parsed.day(), parsed.month()), (15, 3));
    }

    #[test]
    fn accepts_iso_layouts() {
        let parsed = parse_date("2024-03-15T10:30:00");
        assert_eq!((parsed.day(), parsed.hour()), (15, 10));
        assert_eq!(parse_date("2024-03-15").day(), 15);
        assert_eq!(parse_date("2024-03-15T10:30:00Z").minute(), 30);
    }

    #[test]
    fn rejects_out_of_range_time() {
        assert!(try_parse_date("15/03/2024 25:00:00").is_none());
    }
}
