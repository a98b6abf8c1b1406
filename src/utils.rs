use serde::{Deserialize, Deserializer};
use time::{Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339, macros::format_description};
use uuid::Uuid;

use crate::error::ApiError;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time truncated to whole seconds, the precision timestamps are stored at.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

pub fn timestamp_to_datetime(timestamp: i64) -> Result<OffsetDateTime, ApiError> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| ApiError::internal(format!("invalid stored timestamp {}: {}", timestamp, e)))
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
/// The UTC result must fall in years 0000..=9999, the range RFC 3339 can render.
pub fn parse_date(value: &str) -> Result<OffsetDateTime, String> {
    let value = value.trim();
    let invalid = || format!("Invalid date '{}', expected YYYY-MM-DD or RFC 3339", value);

    let utc = match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(parsed) => parsed.checked_to_offset(UtcOffset::UTC).ok_or_else(invalid)?,
        Err(_) => Date::parse(value, format_description!("[year]-[month]-[day]"))
            .map(|date| date.midnight().assume_utc())
            .map_err(|_| invalid())?,
    };

    if !(0..=9999).contains(&utc.year()) {
        return Err(invalid());
    }
    Ok(utc.replace_nanosecond(0).unwrap_or(utc))
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| parse_date(&value))
        .transpose()
        .map_err(serde::de::Error::custom)
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.chars().count() > max_length {
        return Err(ApiError::validation(format!(
            "{} must be at most {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_amount(value: f64, field_name: &str) -> Result<(), ApiError> {
    if !value.is_finite() {
        return Err(ApiError::validation(format!(
            "{} must be a number",
            field_name
        )));
    }
    if value < 0.0 {
        return Err(ApiError::validation(format!(
            "{} cannot be negative",
            field_name
        )));
    }
    Ok(())
}

pub fn require_any_field(fields: &[bool]) -> Result<(), ApiError> {
    if fields.iter().any(|present| *present) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "At least one field must be provided for update",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_rfc3339_and_drops_subseconds() {
        let parsed = parse_date("2024-05-01T10:30:00.250Z").unwrap();

        assert_eq!(parsed, datetime!(2024-05-01 10:30:00 UTC));
    }

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let parsed = parse_date("2024-05-01T12:00:00+02:00").unwrap();

        assert_eq!(parsed.unix_timestamp(), datetime!(2024-05-01 10:00:00 UTC).unix_timestamp());
        assert_eq!(parsed.offset(), UtcOffset::UTC);
    }

    #[test]
    fn parses_plain_dates_as_midnight() {
        let parsed = parse_date("2024-05-01").unwrap();

        assert_eq!(parsed, datetime!(2024-05-01 00:00:00 UTC));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_date("next tuesday").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn rejects_dates_outside_four_digit_years() {
        assert!(parse_date("9999-12-31T23:30:00-01:00").is_err());
        assert!(parse_date("0000-01-01T00:00:00+01:00").is_err());
        assert!(parse_date("-0001-05-01").is_err());
        assert!(parse_date("+10000-01-01").is_err());
    }

    #[test]
    fn accepts_the_edges_of_the_year_range() {
        assert_eq!(
            parse_date("9999-12-31T22:30:00-01:00").unwrap(),
            datetime!(9999-12-31 23:30:00 UTC)
        );
        assert_eq!(parse_date("0000-01-01").unwrap(), datetime!(0000-01-01 00:00:00 UTC));
    }

    #[test]
    fn blank_strings_fail_validation() {
        let err = validate_string_length("   ", "Title", 10).unwrap_err();

        assert_eq!(err, ApiError::validation("Title cannot be empty"));
    }

    #[test]
    fn overlong_strings_fail_validation() {
        assert!(validate_string_length("abcdefghijk", "Title", 10).is_err());
        assert!(validate_string_length("abcdefghij", "Title", 10).is_ok());
    }

    #[test]
    fn negative_and_non_finite_amounts_fail_validation() {
        assert!(validate_amount(-0.01, "Amount").is_err());
        assert!(validate_amount(f64::NAN, "Amount").is_err());
        assert!(validate_amount(f64::INFINITY, "Amount").is_err());
        assert!(validate_amount(0.0, "Amount").is_ok());
        assert!(validate_amount(500.0, "Amount").is_ok());
    }

    #[test]
    fn empty_updates_are_rejected() {
        assert!(require_any_field(&[false, false]).is_err());
        assert!(require_any_field(&[false, true]).is_ok());
    }
}
