//! Upstream timestamp formats.
//!
//! Timeline entries use `Wed Aug 27 13:08:45 +0000 2008`, search results use
//! RFC 2822 (`Wed, 27 Aug 2008 13:08:45 +0000`). The watermark file is written
//! in the timeline format.

use chrono::{DateTime, Utc};

/// Timeline wire format, also used for the persisted watermark.
pub const WIRE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse an upstream timestamp in either supported format.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, WIRE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Format a timestamp in the wire format.
pub fn format(ts: DateTime<Utc>) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timeline_format() {
        let ts = parse("Wed Aug 27 13:08:45 +0000 2008").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap());
    }

    #[test]
    fn test_parse_search_format() {
        let ts = parse("Wed, 27 Aug 2008 13:08:45 +0000").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap());
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let ts = parse("Wed Aug 27 15:08:45 +0200 2008").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_format_is_readable_by_parse() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 9, 3, 7).unwrap();
        let formatted = format(ts);
        assert_eq!(formatted, "Fri Jan 05 09:03:07 +0000 2024");
        assert_eq!(parse(&formatted), Some(ts));
    }
}
