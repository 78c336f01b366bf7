use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::context::ActiveSection;
use crate::api::errors::ApiError;
use crate::api::validation::resolve_school_year;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{AttendanceRecord, StudentAttendance};
use crate::repositories;
use crate::schemas::attendance::{
    AttendanceRecordCreate, AttendanceRecordDetailResponse, AttendanceRecordResponse,
    StudentAttendanceResponse, StudentAttendanceSaved, StudentAttendanceUpsert,
};
use crate::services::attendance::{self, AttendanceError, AttendanceRow, AttendanceTotals};

/// Returns the section's record for the month, creating it with the month's school days.
pub(super) async fn get_or_create_record(
    active: ActiveSection,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AttendanceRecordCreate>,
) -> Result<(axum::http::StatusCode, Json<AttendanceRecordDetailResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.late_enrollees_male < 0 || payload.late_enrollees_female < 0 {
        return Err(ApiError::BadRequest("late enrollee counts must be non-negative".to_string()));
    }

    let section_id = active.require(payload.section_id)?;
    let section = repositories::sections::find_by_id(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))?;

    let school = state.settings().school();
    let school_year =
        resolve_school_year(payload.school_year.as_deref(), &school.default_school_year)?;
    let total_days = attendance::school_days_in_month(payload.year, payload.month)?;
    let grade_level = payload
        .grade_level
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(&school.default_grade_level);

    let (record, created) = repositories::attendance::get_or_create_record(
        state.db(),
        repositories::attendance::CreateRecord {
            id: &Uuid::new_v4().to_string(),
            section_id: &section.id,
            school_year: &school_year,
            quarter: payload.quarter,
            month: payload.month,
            year: payload.year,
            school_name: &school.school_name,
            school_id: &school.school_id,
            grade_level,
            adviser_name: section.adviser_name.as_deref(),
            total_days: i32::try_from(total_days).unwrap_or(i32::MAX),
            late_enrollees_male: payload.late_enrollees_male,
            late_enrollees_female: payload.late_enrollees_female,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to open attendance record"))?;

    let students = repositories::attendance::list_students(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance rows"))?;

    let status = if created {
        tracing::info!(
            record_id = %record.id,
            section_id = %record.section_id,
            month = record.month,
            year = record.year,
            total_days = record.total_days,
            "Attendance record created"
        );
        axum::http::StatusCode::CREATED
    } else {
        axum::http::StatusCode::OK
    };

    Ok((status, Json(detail(record, students))))
}

pub(super) async fn get_record(
    axum::extract::Path(record_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<AttendanceRecordDetailResponse>, ApiError> {
    let record = repositories::attendance::find_record(state.db(), &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attendance record"))?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;
    let students = repositories::attendance::list_students(state.db(), &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance rows"))?;

    Ok(Json(detail(record, students)))
}

/// Saves one student's month and re-aggregates the whole record.
pub(super) async fn save_student(
    axum::extract::Path((record_id, student_id)): axum::extract::Path<(String, String)>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<StudentAttendanceUpsert>,
) -> Result<Json<StudentAttendanceSaved>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let codes = attendance::normalize_codes(payload.daily_codes)?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let record = repositories::attendance::lock_record(&mut *tx, &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attendance record"))?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;
    if record.is_finalized {
        return Err(AttendanceError::Finalized.into());
    }
    attendance::ensure_fits_month(&codes, u32::try_from(record.total_days).unwrap_or(0))?;

    repositories::students::find_by_id(&mut *tx, &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let now = primitive_now_utc();
    let totals = attendance::tally(&codes, payload.has_valid_excuse);
    let row = repositories::attendance::upsert_student(
        &mut *tx,
        repositories::attendance::SaveStudentAttendance {
            id: &Uuid::new_v4().to_string(),
            record_id: &record_id,
            student_id: &student_id,
            daily_codes: &codes,
            totals: &totals,
            remarks: payload.remarks.trim(),
            has_valid_excuse: payload.has_valid_excuse,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save attendance"))?;

    let summary_rows = repositories::attendance::list_summary_rows(&mut *tx, &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attendance rows"))?;
    let rows: Vec<AttendanceRow<'_>> = summary_rows
        .iter()
        .map(|row| AttendanceRow {
            sex: &row.sex,
            total_present: u32::try_from(row.total_present).unwrap_or(0),
            remarks: &row.remarks,
        })
        .collect();
    let summary = attendance::summarize(
        &rows,
        u32::try_from(record.total_days).unwrap_or(0),
        u32::try_from(record.late_enrollees_male).unwrap_or(0),
        u32::try_from(record.late_enrollees_female).unwrap_or(0),
    );
    let record = repositories::attendance::save_summary(&mut *tx, &record_id, &summary, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update attendance summary"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    if totals.is_dropout || totals.is_at_risk {
        tracing::warn!(
            record_id = %record_id,
            student_id = %student_id,
            total_absences = totals.total_absences,
            is_dropout = totals.is_dropout,
            "Student attendance flagged"
        );
    }

    let warning = attendance::warning_message(&totals, payload.has_valid_excuse);
    Ok(Json(StudentAttendanceSaved {
        record: AttendanceRecordResponse::from_db(record),
        student: StudentAttendanceResponse::from_db(row, warning),
    }))
}

pub(super) async fn finalize_record(
    axum::extract::Path(record_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<AttendanceRecordResponse>, ApiError> {
    let record = repositories::attendance::finalize(state.db(), &record_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to finalize attendance record"))?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    tracing::info!(record_id = %record.id, "Attendance record finalized");
    Ok(Json(AttendanceRecordResponse::from_db(record)))
}

fn detail(
    record: AttendanceRecord,
    students: Vec<StudentAttendance>,
) -> AttendanceRecordDetailResponse {
    AttendanceRecordDetailResponse {
        record: AttendanceRecordResponse::from_db(record),
        students: students
            .into_iter()
            .map(|row| {
                let warning = stored_warning(&row);
                StudentAttendanceResponse::from_db(row, warning)
            })
            .collect(),
    }
}

fn stored_warning(row: &StudentAttendance) -> Option<String> {
    let totals = AttendanceTotals {
        total_absences: u32::try_from(row.total_absences).unwrap_or(0),
        total_tardies: u32::try_from(row.total_tardies).unwrap_or(0),
        total_present: u32::try_from(row.total_present).unwrap_or(0),
        is_at_risk: row.is_at_risk,
        is_dropout: row.is_dropout,
    };
    attendance::warning_message(&totals, row.has_valid_excuse)
}
