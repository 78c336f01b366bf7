//! Monthly attendance (school form 2) totals and dropout-risk flags.

use serde::Serialize;
use thiserror::Error;
use time::{Date, Month, Weekday};

use crate::services::grading::round_to;

/// Absences at which a student is flagged at risk of dropping out.
pub(crate) const AT_RISK_ABSENCES: u32 = 5;
/// Absences at which a student is flagged as a potential dropout.
pub(crate) const DROPOUT_ABSENCES: u32 = 7;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum AttendanceError {
    #[error("unknown attendance code {code:?} on day {day}")]
    InvalidCode { day: usize, code: String },
    #[error("{actual} daily codes recorded but the month has {total_days} school days")]
    TooManyDays { actual: usize, total_days: u32 },
    #[error("invalid calendar month {year}-{month}")]
    InvalidMonth { year: i32, month: i32 },
    #[error("attendance record is finalized")]
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttendanceCode {
    Present,
    Absent,
    Excused,
    Tardy,
}

impl AttendanceCode {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" => Some(Self::Present),
            "X" => Some(Self::Absent),
            "E" => Some(Self::Excused),
            "T" => Some(Self::Tardy),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Present => "",
            Self::Absent => "X",
            Self::Excused => "E",
            Self::Tardy => "T",
        }
    }
}

/// Trims and uppercases every code, rejecting anything outside `""`, `X`, `E`, `T`.
pub(crate) fn normalize_codes(codes: Vec<String>) -> Result<Vec<String>, AttendanceError> {
    codes
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            AttendanceCode::parse(&raw)
                .map(|code| code.as_str().to_string())
                .ok_or(AttendanceError::InvalidCode { day: index + 1, code: raw })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct AttendanceTotals {
    pub(crate) total_absences: u32,
    pub(crate) total_tardies: u32,
    pub(crate) total_present: u32,
    pub(crate) is_at_risk: bool,
    pub(crate) is_dropout: bool,
}

/// Tardy days count as both present and tardy. Codes that do not parse are ignored.
pub(crate) fn tally(codes: &[String], has_valid_excuse: bool) -> AttendanceTotals {
    let mut totals = AttendanceTotals {
        total_absences: 0,
        total_tardies: 0,
        total_present: 0,
        is_at_risk: false,
        is_dropout: false,
    };

    for code in codes.iter().filter_map(|raw| AttendanceCode::parse(raw)) {
        match code {
            AttendanceCode::Absent | AttendanceCode::Excused => totals.total_absences += 1,
            AttendanceCode::Tardy => {
                totals.total_tardies += 1;
                totals.total_present += 1;
            }
            AttendanceCode::Present => totals.total_present += 1,
        }
    }

    let (is_at_risk, is_dropout) = risk_flags(totals.total_absences, has_valid_excuse);
    totals.is_at_risk = is_at_risk;
    totals.is_dropout = is_dropout;
    totals
}

/// A valid excuse suppresses both flags regardless of the absence count.
pub(crate) fn risk_flags(total_absences: u32, has_valid_excuse: bool) -> (bool, bool) {
    if has_valid_excuse {
        return (false, false);
    }

    let is_at_risk = (AT_RISK_ABSENCES..DROPOUT_ABSENCES).contains(&total_absences);
    let is_dropout = total_absences >= DROPOUT_ABSENCES;
    (is_at_risk, is_dropout)
}

pub(crate) fn warning_message(totals: &AttendanceTotals, has_valid_excuse: bool) -> Option<String> {
    if has_valid_excuse {
        return Some("Valid excuse provided".to_string());
    }
    if totals.is_dropout {
        return Some(format!(
            "Dropout risk: {} absences ({DROPOUT_ABSENCES}+ threshold)",
            totals.total_absences
        ));
    }
    if totals.is_at_risk {
        let remaining = DROPOUT_ABSENCES - totals.total_absences;
        return Some(format!(
            "Warning: {} absences ({remaining} more until dropout threshold)",
            totals.total_absences
        ));
    }
    None
}

/// Weekdays (Monday to Friday) in the given calendar month.
pub(crate) fn school_days_in_month(year: i32, month: i32) -> Result<u32, AttendanceError> {
    let invalid = || AttendanceError::InvalidMonth { year, month };
    let month_value = u8::try_from(month).map_err(|_| invalid())?;
    let calendar_month = Month::try_from(month_value).map_err(|_| invalid())?;
    let mut day = Date::from_calendar_date(year, calendar_month, 1).map_err(|_| invalid())?;

    let mut school_days = 0;
    while day.month() == calendar_month {
        if !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
            school_days += 1;
        }
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    Ok(school_days)
}

pub(crate) fn ensure_fits_month(codes: &[String], total_days: u32) -> Result<(), AttendanceError> {
    if total_days > 0 && codes.len() > total_days as usize {
        return Err(AttendanceError::TooManyDays { actual: codes.len(), total_days });
    }
    Ok(())
}

pub(crate) fn is_male(sex: &str) -> bool {
    matches!(sex.trim().to_ascii_lowercase().as_str(), "m" | "male")
}

/// One student's contribution to the section summary.
#[derive(Debug, Clone)]
pub(crate) struct AttendanceRow<'a> {
    pub(crate) sex: &'a str,
    pub(crate) total_present: u32,
    pub(crate) remarks: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub(crate) struct SexSummary {
    pub(crate) enrollment: u32,
    pub(crate) registered: u32,
    pub(crate) avg_daily_attendance: f64,
    pub(crate) attendance_percentage: f64,
    pub(crate) dropped: u32,
    pub(crate) transferred_out: u32,
    pub(crate) transferred_in: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub(crate) struct SectionSummary {
    pub(crate) male: SexSummary,
    pub(crate) female: SexSummary,
}

/// Re-aggregates the whole month from every student row.
pub(crate) fn summarize(
    rows: &[AttendanceRow<'_>],
    total_days: u32,
    late_enrollees_male: u32,
    late_enrollees_female: u32,
) -> SectionSummary {
    let (male, female): (Vec<&AttendanceRow<'_>>, Vec<&AttendanceRow<'_>>) =
        rows.iter().partition(|row| is_male(row.sex));

    SectionSummary {
        male: summarize_group(&male, total_days, late_enrollees_male),
        female: summarize_group(&female, total_days, late_enrollees_female),
    }
}

fn summarize_group(
    rows: &[&AttendanceRow<'_>],
    total_days: u32,
    late_enrollees: u32,
) -> SexSummary {
    let enrollment = rows.len() as u32;
    let present: u32 = rows.iter().map(|row| row.total_present).sum();
    let remarks_count = |needle: &str| {
        rows.iter().filter(|row| row.remarks.to_lowercase().contains(needle)).count() as u32
    };

    let avg_daily_attendance = if total_days > 0 {
        round_to(f64::from(present) / f64::from(total_days), 2)
    } else {
        0.0
    };
    let attendance_percentage = if total_days > 0 && enrollment > 0 {
        round_to(f64::from(present) / (f64::from(total_days) * f64::from(enrollment)) * 100.0, 2)
    } else {
        0.0
    };

    SexSummary {
        enrollment,
        registered: enrollment + late_enrollees,
        avg_daily_attendance,
        attendance_percentage,
        dropped: remarks_count("drop"),
        transferred_out: remarks_count("transfer out"),
        transferred_in: remarks_count("transfer in"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_with_absences(absences: usize) -> Vec<String> {
        let mut codes = vec![String::new(); 20];
        for code in codes.iter_mut().take(absences) {
            *code = "X".to_string();
        }
        codes
    }

    #[test]
    fn five_absences_is_at_risk() {
        let totals = tally(&month_with_absences(5), false);
        assert_eq!(totals.total_absences, 5);
        assert_eq!(totals.total_present, 15);
        assert!(totals.is_at_risk);
        assert!(!totals.is_dropout);
    }

    #[test]
    fn seven_absences_is_dropout() {
        let totals = tally(&month_with_absences(7), false);
        assert!(totals.is_dropout);
        assert!(!totals.is_at_risk);
    }

    #[test]
    fn valid_excuse_clears_flags() {
        for absences in [5, 7, 12] {
            let totals = tally(&month_with_absences(absences), true);
            assert!(!totals.is_at_risk, "{absences} absences");
            assert!(!totals.is_dropout, "{absences} absences");
        }
    }

    #[test]
    fn tardy_counts_as_present() {
        let codes: Vec<String> =
            ["", "t", " T ", "E", "X", "?"].iter().map(|code| code.to_string()).collect();
        let totals = tally(&codes, false);
        assert_eq!(totals.total_tardies, 2);
        assert_eq!(totals.total_present, 3);
        assert_eq!(totals.total_absences, 2);
    }

    #[test]
    fn normalize_rejects_unknown_codes() {
        let normalized =
            normalize_codes(vec![" x".to_string(), "t".to_string(), String::new()]).unwrap();
        assert_eq!(normalized, vec!["X".to_string(), "T".to_string(), String::new()]);

        let err = normalize_codes(vec![String::new(), "P".to_string()]).unwrap_err();
        assert_eq!(err, AttendanceError::InvalidCode { day: 2, code: "P".to_string() });
    }

    #[test]
    fn school_days_count_weekdays_only() {
        // June 2025 starts on a Sunday: 30 days, 21 weekdays.
        assert_eq!(school_days_in_month(2025, 6), Ok(21));
        // February 2024 is a leap month starting on a Thursday.
        assert_eq!(school_days_in_month(2024, 2), Ok(21));
        assert_eq!(
            school_days_in_month(2025, 13),
            Err(AttendanceError::InvalidMonth { year: 2025, month: 13 })
        );
    }

    #[test]
    fn codes_must_fit_the_month() {
        let codes = month_with_absences(0);
        assert!(ensure_fits_month(&codes, 20).is_ok());
        assert_eq!(
            ensure_fits_month(&codes, 19),
            Err(AttendanceError::TooManyDays { actual: 20, total_days: 19 })
        );
    }

    #[test]
    fn summary_splits_by_sex() {
        let rows = [
            AttendanceRow { sex: "Male", total_present: 18, remarks: "" },
            AttendanceRow { sex: "M", total_present: 20, remarks: "Transfer out on 06/20" },
            AttendanceRow { sex: "Female", total_present: 19, remarks: "" },
            AttendanceRow { sex: "F", total_present: 10, remarks: "Dropped" },
            AttendanceRow { sex: "female", total_present: 20, remarks: "transfer in" },
        ];

        let summary = summarize(&rows, 20, 1, 0);

        assert_eq!(summary.male.enrollment, 2);
        assert_eq!(summary.male.registered, 3);
        assert_eq!(summary.male.avg_daily_attendance, 1.9);
        assert_eq!(summary.male.attendance_percentage, 95.0);
        assert_eq!(summary.male.transferred_out, 1);

        assert_eq!(summary.female.enrollment, 3);
        assert_eq!(summary.female.registered, 3);
        assert_eq!(summary.female.avg_daily_attendance, 2.45);
        assert_eq!(summary.female.attendance_percentage, 81.67);
        assert_eq!(summary.female.dropped, 1);
        assert_eq!(summary.female.transferred_in, 1);
    }

    #[test]
    fn summary_without_school_days_is_zero() {
        let rows = [AttendanceRow { sex: "Male", total_present: 3, remarks: "" }];
        let summary = summarize(&rows, 0, 0, 0);
        assert_eq!(summary.male.avg_daily_attendance, 0.0);
        assert_eq!(summary.male.attendance_percentage, 0.0);
        assert_eq!(summary.female, SexSummary::default());
    }

    #[test]
    fn warning_messages() {
        let totals = tally(&month_with_absences(5), false);
        assert_eq!(
            warning_message(&totals, false).as_deref(),
            Some("Warning: 5 absences (2 more until dropout threshold)")
        );
        assert_eq!(warning_message(&tally(&month_with_absences(1), false), false), None);
    }
}
