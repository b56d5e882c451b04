//! Timestamp parsing module
//!
//! Flexible datetime and time-of-day parsing for catalog ingest. Accepted
//! datetime shapes: RFC 3339 with offset (normalized to naive UTC),
//! `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM` and bare `YYYY-MM-DD`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

use crate::domain::error::PlanningError;

/// Minutes in one day; "24:00" parses to this value
pub const MINUTES_PER_DAY: u32 = 1440;

/// Parses a datetime string in any of the accepted formats
///
/// Timezone-aware values are normalized to naive UTC. Bare dates resolve
/// to midnight.
///
/// # Arguments
///
/// * `raw` - The datetime string to parse
///
/// # Returns
///
/// The parsed NaiveDateTime, or a PlanningError if no format matched
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, PlanningError> {
    let trimmed = raw.trim();

    if let Ok(aware) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(aware.naive_utc());
    }
    if let Ok(aware) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(aware.naive_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Ok(naive);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(PlanningError::InvalidDateTime(raw.to_string()))
}

/// Parses an `HH:MM` time-of-day into minutes from midnight
///
/// `"24:00"` is accepted and means midnight of the next day.
///
/// # Arguments
///
/// * `raw` - The time string to parse
///
/// # Returns
///
/// Minutes from midnight in `0..=1440`, or a PlanningError
pub fn parse_hhmm(raw: &str) -> Result<u32, PlanningError> {
    let invalid = || PlanningError::InvalidTimeOfDay(raw.to_string());
    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    if minutes >= 60 {
        return Err(invalid());
    }
    let total = hours * 60 + minutes;
    if total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}

/// Converts fractional minutes into a chrono Duration, rounded to seconds
pub fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::seconds((minutes * 60.0).round() as i64)
}

/// Converts a chrono Duration into fractional minutes
pub fn duration_to_minutes(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 60.0
}

/// Anchors a minutes-from-midnight value onto a calendar day
pub fn at_minute_of_day(day: NaiveDate, minute: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minute))
}

/// Serde helper deserializing a flexible datetime string
pub fn de_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map_err(serde::de::Error::custom)
}

/// Serde helper deserializing an optional flexible datetime string
pub fn de_datetime_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_naive_seconds() {
        let dt = parse_datetime("2025-01-06T08:30:00").unwrap();
        assert_eq!(dt.to_string(), "2025-01-06 08:30:00");
    }

    #[test]
    fn test_parse_datetime_space_minutes() {
        let dt = parse_datetime("2025-01-06 08:30").unwrap();
        assert_eq!(dt.to_string(), "2025-01-06 08:30:00");
    }

    #[test]
    fn test_parse_datetime_bare_date() {
        let dt = parse_datetime("2025-01-06").unwrap();
        assert_eq!(dt.to_string(), "2025-01-06 00:00:00");
    }

    #[test]
    fn test_parse_datetime_offset_normalizes_to_utc() {
        // +0700 means the naive UTC value is seven hours earlier
        let dt = parse_datetime("2025-01-06T08:00:00+0700").unwrap();
        assert_eq!(dt.to_string(), "2025-01-06 01:00:00");

        let dt = parse_datetime("2025-01-06T08:00:00+07:00").unwrap();
        assert_eq!(dt.to_string(), "2025-01-06 01:00:00");
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("08:00").unwrap(), 480);
        assert_eq!(parse_hhmm("17:30").unwrap(), 1050);
        assert_eq!(parse_hhmm("24:00").unwrap(), 1440);
    }

    #[test]
    fn test_parse_hhmm_rejects_invalid() {
        assert!(parse_hhmm("25:00").is_err());
        assert!(parse_hhmm("08:60").is_err());
        assert!(parse_hhmm("0800").is_err());
    }

    #[test]
    fn test_minutes_duration_round_trip() {
        let d = minutes_to_duration(70.5);
        assert_eq!(d.num_seconds(), 4230);
        assert_eq!(duration_to_minutes(d), 70.5);
    }
}
