//! Date handling for ENVELOPE dates, INTERNALDATE, and SEARCH keys.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const DATE_FORMATS: [&str; 4] = [
    "%d-%b-%Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%d %b %Y %H:%M",
];

/// Splits a date string into the date-time part and its zone token.
///
/// The zone starts at the first `+HHMM`/`-HHMM` or `NIL` token, or at an
/// alphabetic zone name following the time. Everything from there on is the
/// zone. Without a zone token the second half is empty.
#[must_use]
pub fn split_time_zone(text: &str) -> (&str, &str) {
    let mut previous_was_time = false;

    for (start, token) in tokens(text) {
        let is_zone = is_numeric_offset(token)
            || token.eq_ignore_ascii_case("NIL")
            || (previous_was_time && token.bytes().all(|b| b.is_ascii_alphabetic()));
        if is_zone && start > 0 {
            return (text[..start].trim(), text[start..].trim());
        }
        previous_was_time = token.contains(':');
    }

    (text.trim(), "")
}

/// Parses an envelope or INTERNALDATE date, ignoring the zone.
///
/// Accepts `dd-Mon-yyyy HH:MM:SS` and RFC 2822 `dd Mon yyyy HH:MM:SS`, with
/// an optional leading day of week and trailing zone.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let (date, _zone) = split_time_zone(strip_weekday(text.trim()));
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
}

/// Parses a zone token into an offset.
///
/// Numeric offsets and the UTC names `GMT`, `UT`, `UTC`, and `Z` are
/// understood. Trailing comments such as `(CET)` are ignored.
#[must_use]
pub fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let token = zone.split_ascii_whitespace().next()?;
    if is_numeric_offset(token) {
        let sign = if token.starts_with('-') { -1 } else { 1 };
        let hours: i32 = token[1..3].parse().ok()?;
        let minutes: i32 = token[3..5].parse().ok()?;
        return FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60));
    }
    match token.to_ascii_uppercase().as_str() {
        "GMT" | "UT" | "UTC" | "Z" => FixedOffset::east_opt(0),
        _ => None,
    }
}

/// Formats a day for SEARCH keys: `01-Jan-2024`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Formats a date-time in the INTERNALDATE shape with a zero offset.
#[must_use]
pub fn format_datetime(date: &NaiveDateTime) -> String {
    date.format("%d-%b-%Y %H:%M:%S +0000").to_string()
}

fn strip_weekday(text: &str) -> &str {
    let Some((first, rest)) = text.split_once([',', ' ']) else {
        return text;
    };
    if WEEKDAYS.iter().any(|day| day.eq_ignore_ascii_case(first)) {
        rest.trim_start_matches([',', ' '])
    } else {
        text
    }
}

fn is_numeric_offset(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 5 && matches!(bytes[0], b'+' | b'-') && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(' ')
        .scan(0, |offset, token| {
            let start = *offset;
            *offset += token.len() + 1;
            Some((start, token))
        })
        .filter(|(_, token)| !token.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;

    #[test]
    fn test_split_numeric_zone() {
        assert_eq!(
            split_time_zone("01-Jan-2024 10:00:00 +0000"),
            ("01-Jan-2024 10:00:00", "+0000")
        );
        assert_eq!(
            split_time_zone("1 Jan 2024 10:00:00 -0500 (EST)"),
            ("1 Jan 2024 10:00:00", "-0500 (EST)")
        );
    }

    #[test]
    fn test_split_does_not_take_year_as_zone() {
        assert_eq!(split_time_zone("01-Jan-2024 10:00:00"), ("01-Jan-2024 10:00:00", ""));
    }

    #[test]
    fn test_split_named_and_nil_zone() {
        assert_eq!(
            split_time_zone("1 Jan 2024 10:00:00 GMT"),
            ("1 Jan 2024 10:00:00", "GMT")
        );
        assert_eq!(split_time_zone("1 Jan 2024 10:00 NIL"), ("1 Jan 2024 10:00", "NIL"));
    }

    #[test]
    fn test_parse_internaldate() {
        let date = parse_date("17-Jul-1996 02:44:25 -0700").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1996, 7, 17));
        assert_eq!((date.hour(), date.minute(), date.second()), (2, 44, 25));
    }

    #[test]
    fn test_parse_rfc2822_with_weekday() {
        let date = parse_date("Mon, 1 Jan 2024 10:30:00 +0100").unwrap();
        assert_eq!((date.day(), date.hour(), date.minute()), (1, 10, 30));
    }

    #[test]
    fn test_parse_space_padded_day() {
        assert!(parse_date(" 7-Feb-2023 08:00:00 +0000").is_some());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+0130").unwrap().local_minus_utc(), 5400);
        assert_eq!(parse_offset("-0800 (PST)").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_offset("GMT").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("NIL").is_none());
        assert!(parse_offset("").is_none());
    }

    #[test]
    fn test_format_date() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(format_date(day), "01-Jan-2024");
    }

    proptest! {
        #[test]
        fn prop_datetime_round_trip(
            year in 1970i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
        ) {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, minute, second)
                .unwrap();
            prop_assert_eq!(parse_date(&format_datetime(&date)), Some(date));
        }
    }
}
