//! Session timestamps.
//!
//! Feeds publish ISO-8601 strings, usually with an explicit UTC offset. The
//! offset is part of the value: a session's calendar day is the date in the
//! offset it was published with, and two starts only form the same time slot
//! when both the instant and the offset match.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Formats tried after RFC 3339 for strings that carry an offset.
///
/// `%#z` accepts `Z`, `+08`, `+0800` and `+08:00`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Formats for strings without an offset; these are read in the default zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A timezone-aware session instant that remembers its encoded offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionTime(DateTime<FixedOffset>);

impl SessionTime {
    /// Wraps a datetime with a fixed offset.
    pub fn new(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }

    /// Creates a session time from a datetime in any timezone, keeping the
    /// offset that applies at that instant.
    pub fn from_zoned<Z: TimeZone>(dt: DateTime<Z>) -> Self {
        Self(dt.fixed_offset())
    }

    /// Returns the underlying datetime.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Returns the instant in UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    /// Returns the offset east of UTC, in seconds.
    pub fn offset_seconds(&self) -> i32 {
        self.0.offset().local_minus_utc()
    }

    /// Returns the calendar date in the encoded offset.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Returns true if both times fall on the same calendar date, each read
    /// in its own offset.
    pub fn same_day(&self, other: &SessionTime) -> bool {
        self.date() == other.date()
    }

    /// Returns the wall-clock hour in the encoded offset.
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns the wall-clock minute in the encoded offset.
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Formats the wall-clock time as `H:MM`.
    pub fn clock(&self) -> String {
        format!("{}:{:02}", self.hour(), self.minute())
    }

    /// Formats the time as RFC 3339, keeping the offset.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Returns true if this time is at or before the given instant.
    pub fn is_at_or_before(&self, now: DateTime<Utc>) -> bool {
        self.to_utc() <= now
    }
}

impl PartialEq for SessionTime {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.offset_seconds() == other.offset_seconds()
    }
}

impl Eq for SessionTime {}

impl PartialOrd for SessionTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SessionTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .cmp(&other.0)
            .then_with(|| self.offset_seconds().cmp(&other.offset_seconds()))
    }
}

impl Hash for SessionTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.timestamp().hash(state);
        self.0.timestamp_subsec_nanos().hash(state);
        self.offset_seconds().hash(state);
    }
}

/// Parses a feed timestamp.
///
/// Strings with an offset keep it. Strings without one are read as local
/// time in `default_tz`; local times that are ambiguous or skipped by a DST
/// transition are rejected. Returns `None` if nothing matches.
pub fn parse_session_time(value: &str, default_tz: &Tz) -> Option<SessionTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(SessionTime(dt));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(SessionTime(dt));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return default_tz
                .from_local_datetime(&naive)
                .single()
                .map(SessionTime::from_zoned);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> SessionTime {
        parse_session_time(value, &Tz::UTC).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn rfc3339_keeps_offset() {
            let t = parse("2024-03-01T09:00:00+08:00");
            assert_eq!(t.offset_seconds(), 8 * 3600);
            assert_eq!(t.hour(), 9);
            assert_eq!(t.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        }

        #[test]
        fn minutes_without_seconds() {
            let t = parse("2024-03-01T09:00+08:00");
            assert_eq!(t, parse("2024-03-01T09:00:00+08:00"));
        }

        #[test]
        fn zulu_and_compact_offsets() {
            assert_eq!(parse("2024-03-01T01:00Z").offset_seconds(), 0);
            assert_eq!(parse("2024-03-01T09:00:00+0800").offset_seconds(), 8 * 3600);
            assert_eq!(parse("2024-03-01 09:00:00.500+08:00").hour(), 9);
        }

        #[test]
        fn naive_uses_default_zone() {
            let tz: Tz = "Asia/Taipei".parse().unwrap();
            let t = parse_session_time("2024-03-01T09:30:00", &tz).unwrap();
            assert_eq!(t.offset_seconds(), 8 * 3600);
            assert_eq!(t.clock(), "9:30");
        }

        #[test]
        fn explicit_offset_wins_over_default_zone() {
            let tz: Tz = "Asia/Taipei".parse().unwrap();
            let t = parse_session_time("2024-03-01T09:30:00-05:00", &tz).unwrap();
            assert_eq!(t.offset_seconds(), -5 * 3600);
        }

        #[test]
        fn skipped_local_time_is_rejected() {
            let tz: Tz = "America/New_York".parse().unwrap();
            assert!(parse_session_time("2024-03-10T02:30:00", &tz).is_none());
        }

        #[test]
        fn garbage_is_rejected() {
            assert!(parse_session_time("", &Tz::UTC).is_none());
            assert!(parse_session_time("tomorrow morning", &Tz::UTC).is_none());
            assert!(parse_session_time("2024-03-01", &Tz::UTC).is_none());
            assert!(parse_session_time("2024-13-01T09:00:00Z", &Tz::UTC).is_none());
        }
    }

    mod comparison {
        use super::*;

        #[test]
        fn equality_includes_offset() {
            let taipei = parse("2024-03-01T09:00:00+08:00");
            let utc = parse("2024-03-01T01:00:00Z");
            assert_eq!(taipei.to_utc(), utc.to_utc());
            assert_ne!(taipei, utc);
        }

        #[test]
        fn ordering_by_instant_first() {
            let early = parse("2024-03-01T10:00:00+08:00");
            let late = parse("2024-03-01T03:00:00Z");
            assert!(early < late);
        }

        #[test]
        fn day_is_read_in_encoded_offset() {
            let late_evening = parse("2024-03-01T23:30:00-02:00");
            assert_eq!(
                late_evening.date(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            );
            assert_eq!(
                late_evening.to_utc().date_naive(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
            );
            assert!(late_evening.same_day(&parse("2024-03-01T08:00:00+08:00")));
        }

        #[test]
        fn past_check() {
            let t = parse("2024-03-01T09:00:00+08:00");
            assert!(t.is_at_or_before(t.to_utc()));
            assert!(!t.is_at_or_before(t.to_utc() - chrono::Duration::minutes(1)));
        }
    }

    #[test]
    fn serde_keeps_offset() {
        let t = parse("2024-03-01T09:00:00+08:00");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2024-03-01T09:00:00+08:00\"");
        let back: SessionTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
