// ============================================================
// DATE PARSER
// ============================================================
// Permissive calendar parsing for date-column cells

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Try a ladder of common date and datetime formats.
///
/// Returns `None` for anything unrecognized; the caller treats that as a
/// null date rather than a failure.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // ISO 8601 with a T separator, with or without offset/Z.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }

    const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y"];
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    // Bare integers: unix timestamp in seconds or milliseconds.
    if let Ok(n) = s.parse::<i64>() {
        if n > 1_000_000_000_000 {
            return DateTime::from_timestamp(n / 1000, 0).map(|dt| dt.naive_utc());
        }
        if n > 1_000_000_000 {
            return DateTime::from_timestamp(n, 0).map(|dt| dt.naive_utc());
        }
    }

    None
}

/// Render a parsed date back out as its series label: date-only for
/// midnight values, full datetime otherwise.
pub fn format_label(dt: &NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date() {
        let dt = parse_date("2024-01-02").unwrap();
        assert_eq!(format_label(&dt), "2024-01-02");
    }

    #[test]
    fn test_slashed_dates() {
        assert!(parse_date("2024/01/02").is_some());
        assert!(parse_date("02/01/2024").is_some());
    }

    #[test]
    fn test_datetime_variants() {
        let dt = parse_date("2024-01-02 13:45:00").unwrap();
        assert_eq!(format_label(&dt), "2024-01-02 13:45:00");

        assert!(parse_date("2024-01-02 13:45").is_some());
        assert!(parse_date("2024-01-02T13:45:00").is_some());
        assert!(parse_date("2024-01-02T13:45:00Z").is_some());
    }

    #[test]
    fn test_unix_timestamps() {
        let secs = parse_date("1704153600").unwrap();
        assert_eq!(secs.format("%Y-%m-%d").to_string(), "2024-01-02");

        let millis = parse_date("1704153600000").unwrap();
        assert_eq!(millis, secs);
    }

    #[test]
    fn test_unparseable_yields_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("  "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("13/45/9999"), None);
    }

    #[test]
    fn test_ordering_follows_calendar() {
        let earlier = parse_date("2024-01-01").unwrap();
        let later = parse_date("2024-01-02").unwrap();
        assert!(earlier < later);
    }
}
