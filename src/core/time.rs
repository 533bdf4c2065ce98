use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// Unix-second values beyond this point (2100-01-01T00:00:00Z) are assumed to
/// be milliseconds.
pub const MILLIS_HEURISTIC_CUTOFF: i64 = 4_102_444_800;

/// Time value as it arrives from upstream payloads, before normalization.
///
/// Producers are inconsistent: Unix seconds, Unix milliseconds, and ISO-8601
/// strings all occur in the wild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Numeric(f64),
    Text(String),
}

impl From<i64> for TimeInput {
    fn from(value: i64) -> Self {
        Self::Numeric(value as f64)
    }
}

impl From<&str> for TimeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Normalizes any accepted time representation to integer Unix seconds.
pub fn normalize_time(input: &TimeInput) -> OverlayResult<i64> {
    match input {
        TimeInput::Numeric(raw) => normalize_unix(*raw),
        TimeInput::Text(text) => parse_datetime_text(text),
    }
}

/// Applies the seconds-vs-milliseconds magnitude heuristic to a raw Unix value.
pub fn normalize_unix(raw: f64) -> OverlayResult<i64> {
    if !raw.is_finite() {
        return Err(OverlayError::Validation(
            "time value must be finite".to_owned(),
        ));
    }
    let mut value = raw as i64;
    if value.abs() > MILLIS_HEURISTIC_CUTOFF {
        value /= 1000;
    }
    Ok(value)
}

/// Converts a strongly-typed timestamp to normalized Unix seconds.
#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

fn parse_datetime_text(text: &str) -> OverlayResult<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed.and_utc().timestamp());
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(parsed
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
            .timestamp());
    }
    // Numeric payloads occasionally arrive quoted.
    if let Ok(numeric) = text.parse::<f64>() {
        return normalize_unix(numeric);
    }
    Err(OverlayError::Validation(format!(
        "unrecognized time format: `{text}`"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_pass_through() {
        assert_eq!(normalize_unix(1_700_000_000.0).expect("seconds"), 1_700_000_000);
    }

    #[test]
    fn unix_milliseconds_are_scaled_down() {
        assert_eq!(
            normalize_unix(1_700_000_000_000.0).expect("millis"),
            1_700_000_000
        );
    }

    #[test]
    fn iso_text_parses_to_unix_seconds() {
        let normalized = normalize_time(&TimeInput::from("2023-11-14T22:13:20Z")).expect("iso");
        assert_eq!(normalized, 1_700_000_000);
    }

    #[test]
    fn date_only_text_parses_to_midnight() {
        let normalized = normalize_time(&TimeInput::from("2023-11-14")).expect("date");
        assert_eq!(normalized, 1_699_920_000);
    }

    #[test]
    fn quoted_numeric_text_uses_magnitude_heuristic() {
        let normalized = normalize_time(&TimeInput::from("1700000000000")).expect("quoted");
        assert_eq!(normalized, 1_700_000_000);
    }

    #[test]
    fn garbage_text_is_rejected() {
        assert!(normalize_time(&TimeInput::from("next tuesday")).is_err());
    }
}
