use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AttendanceRecord, StudentAttendance};
use crate::db::types::Quarter;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttendanceRecordCreate {
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
    pub(crate) quarter: Quarter,
    #[validate(range(min = 1, max = 12, message = "month must be in range 1..12"))]
    pub(crate) month: i32,
    #[validate(range(min = 2000, max = 2100, message = "year must be in range 2000..2100"))]
    pub(crate) year: i32,
    #[serde(default)]
    pub(crate) grade_level: Option<String>,
    #[serde(default)]
    pub(crate) late_enrollees_male: i32,
    #[serde(default)]
    pub(crate) late_enrollees_female: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentAttendanceUpsert {
    #[serde(default)]
    #[validate(length(max = 31, message = "daily_codes accepts at most 31 entries"))]
    pub(crate) daily_codes: Vec<String>,
    #[serde(default)]
    pub(crate) remarks: String,
    #[serde(default)]
    pub(crate) has_valid_excuse: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SexTotals {
    pub(crate) late_enrollees: i32,
    pub(crate) enrollment: i32,
    pub(crate) registered: i32,
    pub(crate) avg_daily_attendance: f64,
    pub(crate) attendance_percentage: f64,
    pub(crate) dropped: i32,
    pub(crate) transferred_out: i32,
    pub(crate) transferred_in: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceRecordResponse {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) school_year: String,
    pub(crate) quarter: Quarter,
    pub(crate) month: i32,
    pub(crate) year: i32,
    pub(crate) school_name: String,
    pub(crate) school_id: String,
    pub(crate) grade_level: String,
    pub(crate) adviser_name: Option<String>,
    pub(crate) total_days: i32,
    pub(crate) male: SexTotals,
    pub(crate) female: SexTotals,
    pub(crate) is_finalized: bool,
    pub(crate) updated_at: String,
}

impl AttendanceRecordResponse {
    pub(crate) fn from_db(record: AttendanceRecord) -> Self {
        Self {
            male: SexTotals {
                late_enrollees: record.late_enrollees_male,
                enrollment: record.enrollment_male,
                registered: record.registered_male,
                avg_daily_attendance: record.avg_attendance_male,
                attendance_percentage: record.attendance_percentage_male,
                dropped: record.dropped_male,
                transferred_out: record.transferred_out_male,
                transferred_in: record.transferred_in_male,
            },
            female: SexTotals {
                late_enrollees: record.late_enrollees_female,
                enrollment: record.enrollment_female,
                registered: record.registered_female,
                avg_daily_attendance: record.avg_attendance_female,
                attendance_percentage: record.attendance_percentage_female,
                dropped: record.dropped_female,
                transferred_out: record.transferred_out_female,
                transferred_in: record.transferred_in_female,
            },
            id: record.id,
            section_id: record.section_id,
            school_year: record.school_year,
            quarter: record.quarter,
            month: record.month,
            year: record.year,
            school_name: record.school_name,
            school_id: record.school_id,
            grade_level: record.grade_level,
            adviser_name: record.adviser_name,
            total_days: record.total_days,
            is_finalized: record.is_finalized,
            updated_at: format_primitive(record.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentAttendanceResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) daily_codes: Vec<String>,
    pub(crate) total_absences: i32,
    pub(crate) total_tardies: i32,
    pub(crate) total_present: i32,
    pub(crate) remarks: String,
    pub(crate) has_valid_excuse: bool,
    pub(crate) is_at_risk: bool,
    pub(crate) is_dropout: bool,
    pub(crate) warning: Option<String>,
}

impl StudentAttendanceResponse {
    pub(crate) fn from_db(row: StudentAttendance, warning: Option<String>) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            daily_codes: row.daily_codes,
            total_absences: row.total_absences,
            total_tardies: row.total_tardies,
            total_present: row.total_present,
            remarks: row.remarks,
            has_valid_excuse: row.has_valid_excuse,
            is_at_risk: row.is_at_risk,
            is_dropout: row.is_dropout,
            warning,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceRecordDetailResponse {
    pub(crate) record: AttendanceRecordResponse,
    pub(crate) students: Vec<StudentAttendanceResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentAttendanceSaved {
    pub(crate) record: AttendanceRecordResponse,
    pub(crate) student: StudentAttendanceResponse,
}
