use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Date/time inputs that failed normalization
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DateTimeError {
    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),
}

/// Parse a form date, accepting both the "MM/DD/YYYY" picker format and
/// plain ISO "YYYY-MM-DD".
pub fn parse_form_date(s: &str) -> Result<NaiveDate, DateTimeError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| DateTimeError::InvalidDate(s.to_string()))
}

/// Parse an "HH:MM" time. Exactly two colon-delimited numeric components
/// are accepted; anything else is rejected.
pub fn parse_form_time(s: &str) -> Result<NaiveTime, DateTimeError> {
    let invalid = || DateTimeError::InvalidTime(s.to_string());

    let mut parts = s.trim().split(':');
    let (hour, minute) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), None) => (h, m),
        _ => return Err(invalid()),
    };
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Epoch millis at 00:00:00 UTC for a "MM/DD/YYYY" date string.
pub fn utc_midnight_timestamp(date_str: &str) -> Result<i64, DateTimeError> {
    let date = parse_form_date(date_str)?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Combine a form date and an "HH:MM" time into one UTC instant.
pub fn combine_date_time(date_str: &str, time_str: &str) -> Result<DateTime<Utc>, DateTimeError> {
    let date = parse_form_date(date_str)?;
    let time = parse_form_time(time_str)?;
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_utc_midnight_has_zero_time_components() {
        for s in ["05/01/2025", "12/31/1999", "01/01/2030"] {
            let millis = utc_midnight_timestamp(s).unwrap();
            let instant = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
            assert_eq!(instant.hour(), 0, "{s}");
            assert_eq!(instant.minute(), 0, "{s}");
            assert_eq!(instant.second(), 0, "{s}");
        }
    }

    #[test]
    fn test_utc_midnight_known_value() {
        // 2025-05-01T00:00:00Z
        assert_eq!(utc_midnight_timestamp("05/01/2025").unwrap(), 1_746_057_600_000);
    }

    #[test]
    fn test_malformed_date_is_an_error() {
        assert!(utc_midnight_timestamp("2025/05/01").is_err());
        assert!(utc_midnight_timestamp("13/01/2025").is_err());
        assert!(utc_midnight_timestamp("not a date").is_err());
        assert!(utc_midnight_timestamp("").is_err());
    }

    #[test]
    fn test_combine_accepts_both_date_formats() {
        let a = combine_date_time("2025-06-15", "09:30").unwrap();
        let b = combine_date_time("06/15/2025", "09:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 9);
        assert_eq!(a.minute(), 30);
    }

    #[test]
    fn test_time_must_be_two_numeric_components() {
        assert!(parse_form_time("09:30:00").is_err());
        assert!(parse_form_time("09").is_err());
        assert!(parse_form_time("9:xx").is_err());
        assert!(parse_form_time("25:00").is_err());
        assert!(parse_form_time("10:75").is_err());
        assert!(parse_form_time("10:45").is_ok());
    }
}
