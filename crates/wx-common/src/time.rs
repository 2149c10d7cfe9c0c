//! Report expiry calculation.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("Cannot parse time '{value}': {source}")]
    InvalidFormat {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Seconds remaining until a report expires, counted from now.
///
/// The report is fresh for `window_secs` after the RFC 3339 timestamp. The
/// result is zero or negative when the report has already expired.
pub fn expire_seconds(timestamp: &str, window_secs: i64) -> Result<i64, TimeParseError> {
    expire_seconds_at(timestamp, window_secs, Utc::now())
}

/// Same as [`expire_seconds`] with an explicit reference time.
pub fn expire_seconds_at(
    timestamp: &str,
    window_secs: i64,
    now: DateTime<Utc>,
) -> Result<i64, TimeParseError> {
    let issued = DateTime::parse_from_rfc3339(timestamp).map_err(|source| {
        TimeParseError::InvalidFormat {
            value: timestamp.to_string(),
            source,
        }
    })?;
    Ok(issued.timestamp() + window_secs - now.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 12, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_metar_window() {
        // Observed 30 minutes ago, fresh for 3 hours
        let ttl = expire_seconds_at("2020-05-12T11:30:00Z", 3 * 3600, noon()).unwrap();
        assert_eq!(ttl, 9000);
    }

    #[test]
    fn test_zero_window_expires_at_timestamp() {
        let ttl = expire_seconds_at("2020-05-12T18:00:00Z", 0, noon()).unwrap();
        assert_eq!(ttl, 6 * 3600);
    }

    #[test]
    fn test_already_expired_is_negative() {
        let ttl = expire_seconds_at("2020-05-12T06:00:00Z", 0, noon()).unwrap();
        assert_eq!(ttl, -6 * 3600);
        let ttl = expire_seconds_at("2020-05-12T09:00:00Z", 3 * 3600, noon()).unwrap();
        assert_eq!(ttl, 0);
    }

    #[test]
    fn test_offset_timestamp() {
        let ttl = expire_seconds_at("2020-05-12T14:30:00+02:00", 0, noon()).unwrap();
        assert_eq!(ttl, 1800);
    }

    #[test]
    fn test_decreases_as_time_advances() {
        let ts = "2020-05-12T11:30:00Z";
        let earlier = expire_seconds_at(ts, 3600, noon()).unwrap();
        let later = expire_seconds_at(ts, 3600, noon() + Duration::seconds(90)).unwrap();
        assert_eq!(earlier - later, 90);
    }

    #[test]
    fn test_malformed_timestamp() {
        let err = expire_seconds_at("12/05/2020 11:30", 3600, noon()).unwrap_err();
        assert!(err.to_string().contains("12/05/2020 11:30"));
        assert!(expire_seconds("", 0).is_err());
    }
}
