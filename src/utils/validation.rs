//! Validation helpers
//!
//! Custom `validator` functions and parsers for raw query values.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use validator::ValidationError;

use crate::models::settings::{KNOWN_SETTING_KEYS, LOW_STOCK_THRESHOLD_KEY};
use crate::utils::calendar::BusinessCalendar;
use crate::utils::errors::{validation_error, AppResult};

/// Which side of a date range a bound closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parses a `startDate`/`endDate` filter value.
///
/// Accepts RFC 3339 instants or `YYYY-MM-DD` dates. A date-only start bound is
/// the first instant of that local day; a date-only end bound is the first
/// instant of the next day, so the whole day is covered by an exclusive range.
pub fn parse_date_bound(
    raw: &str,
    bound: DateBound,
    calendar: &BusinessCalendar,
) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(match bound {
        DateBound::Start => calendar.start_of_day(date),
        DateBound::End => calendar.start_of_next_day(date),
    })
}

/// Like [`parse_date_bound`] but reports unparseable input as a validation error
pub fn require_date_bound(
    field: &'static str,
    raw: Option<&str>,
    bound: DateBound,
    calendar: &BusinessCalendar,
) -> AppResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse_date_bound(value, bound, calendar).map(Some).ok_or_else(|| {
            validation_error(field, "date", "Expected an RFC 3339 timestamp or a YYYY-MM-DD date")
        }),
    }
}

/// `validator` hook: key must be one of the known settings
pub fn validate_setting_key(key: &str) -> Result<(), ValidationError> {
    if KNOWN_SETTING_KEYS.contains(&key) {
        return Ok(());
    }
    let mut error = ValidationError::new("unknown_setting");
    error.add_param("value".into(), &key.to_string());
    Err(error)
}

/// Parses a stored or submitted value for `key`
pub fn parse_setting_value(key: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if key == LOW_STOCK_THRESHOLD_KEY {
        let threshold = parse_threshold(value).ok_or_else(|| {
            validation_error("value", "threshold", "Threshold must be a non-negative number")
        })?;
        return Ok(threshold.normalize().to_string());
    }
    Ok(value.to_string())
}

/// Non-negative decimal threshold
pub fn parse_threshold(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|value| !value.is_sign_negative())
}

/// `validator` hook: blank after trimming counts as missing
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}
