use time::Date;

use crate::api::errors::ApiError;
use crate::core::config::is_valid_school_year;
use crate::core::time::parse_date;

pub(crate) const DEFAULT_PAGE_LIMIT: i64 = 100;
pub(crate) const MAX_PAGE_LIMIT: i64 = 500;

pub(crate) fn validate_lrn(lrn: &str) -> Result<(), ApiError> {
    if lrn.len() == 12 && lrn.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("LRN must be exactly 12 digits".to_string()))
    }
}

/// Uses the configured school year when none is given.
pub(crate) fn resolve_school_year(
    requested: Option<&str>,
    default: &str,
) -> Result<String, ApiError> {
    let school_year = requested.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(default);
    if !is_valid_school_year(school_year) {
        return Err(ApiError::BadRequest(format!(
            "Invalid school year '{school_year}', expected YYYY-YYYY"
        )));
    }
    Ok(school_year.to_string())
}

pub(crate) fn parse_date_field(field: &str, value: &str) -> Result<Date, ApiError> {
    parse_date(value)
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a date in YYYY-MM-DD format")))
}

pub(crate) fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<Date>, ApiError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_date_field(field, value))
        .transpose()
}

pub(crate) fn page_bounds(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (skip, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn lrn_must_be_twelve_digits() {
        assert!(validate_lrn("123456789012").is_ok());
        assert!(validate_lrn("12345678901").is_err());
        assert!(validate_lrn("12345678901A").is_err());
    }

    #[test]
    fn school_year_defaults_and_validates() {
        assert_eq!(resolve_school_year(None, "2025-2026").unwrap(), "2025-2026");
        assert_eq!(resolve_school_year(Some(" 2024-2025 "), "2025-2026").unwrap(), "2024-2025");
        assert!(resolve_school_year(Some("2024"), "2025-2026").is_err());
    }

    #[test]
    fn optional_dates_skip_blank_values() {
        assert_eq!(parse_optional_date("target_date", Some(" ")).unwrap(), None);
        assert_eq!(
            parse_optional_date("target_date", Some("2025-10-01")).unwrap(),
            Some(Date::from_calendar_date(2025, Month::October, 1).unwrap())
        );
        assert!(parse_optional_date("target_date", Some("10/01/2025")).is_err());
    }

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(page_bounds(None, None), (0, DEFAULT_PAGE_LIMIT));
        assert_eq!(page_bounds(Some(-5), Some(10_000)), (0, MAX_PAGE_LIMIT));
        assert_eq!(page_bounds(Some(20), Some(0)), (20, 1));
    }
}
