//! Event timestamp type shared by every input and output table.
//!
//! Wraps `chrono::NaiveDateTime` so parsing accepts the handful of layouts
//! found in exported CSVs while output is always written in one canonical form.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical output layout. `%.f` prints nothing when there are no fractional seconds.
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A naive (zone-less) event timestamp.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use watermark_etl::EventTimestamp;
///
/// let ts = EventTimestamp::from_str("2024-01-05T13:45:00").unwrap();
/// assert_eq!(ts.to_string(), "2024-01-05 13:45:00");
/// assert_eq!(ts.floor_to_date().to_string(), "2024-01-05");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTimestamp(NaiveDateTime);

impl EventTimestamp {
    /// Truncates the time of day, leaving the calendar date.
    pub fn floor_to_date(&self) -> NaiveDate {
        self.0.date()
    }
}

impl From<NaiveDateTime> for EventTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        EventTimestamp(value)
    }
}

/// Error returned when a timestamp matches none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimestampError(String);

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized timestamp {:?}", self.0)
    }
}

impl std::error::Error for ParseTimestampError {}

impl FromStr for EventTimestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(EventTimestamp(dt));
            }
        }

        // Offsets are folded into UTC; the tables themselves are zone-less.
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(EventTimestamp(dt.naive_utc()));
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(EventTimestamp)
            .ok_or_else(|| ParseTimestampError(trimmed.to_string()))
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OUTPUT_FORMAT))
    }
}

impl Serialize for EventTimestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventTimestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EventTimestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> EventTimestamp {
        EventTimestamp::from_str(s).unwrap()
    }

    #[test]
    fn test_parses_space_and_t_separated() {
        assert_eq!(ts("2024-01-01 10:15:30"), ts("2024-01-01T10:15:30"));
        assert_eq!(ts("  2024-01-01 10:15:30  ").to_string(), "2024-01-01 10:15:30");
    }

    #[test]
    fn test_fractional_seconds_survive_formatting() {
        assert_eq!(ts("2024-01-01 10:15:30.250").to_string(), "2024-01-01 10:15:30.250");
        assert_eq!(ts("2024-01-01 10:15:30").to_string(), "2024-01-01 10:15:30");
    }

    #[test]
    fn test_rfc3339_offset_is_normalized_to_utc() {
        assert_eq!(ts("2024-01-01T23:30:00-02:00").to_string(), "2024-01-02 01:30:00");
        assert_eq!(ts("2024-01-01T10:00:00Z").to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_bare_date_is_midnight() {
        assert_eq!(ts("2024-03-09").to_string(), "2024-03-09 00:00:00");
    }

    #[test]
    fn test_floor_to_date_truncates_time() {
        let date = ts("2024-01-03 23:59:59.999").floor_to_date();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(EventTimestamp::from_str("yesterday").is_err());
        assert!(EventTimestamp::from_str("").is_err());
        assert!(EventTimestamp::from_str("2024-13-01 00:00:00").is_err());
    }

    #[test]
    fn test_ordering_follows_time() {
        assert!(ts("2024-01-01 23:00:00") < ts("2024-01-02 00:00:00"));
    }
}
