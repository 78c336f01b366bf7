use sqlx::PgPool;

use crate::db::models::{AttendanceRecord, StudentAttendance};
use crate::db::types::Quarter;
use crate::services::attendance::{AttendanceTotals, SectionSummary};

const RECORD_COLUMNS: &str = "\
    id, section_id, school_year, quarter, month, year, school_name, school_id, grade_level, \
    adviser_name, total_days, late_enrollees_male, late_enrollees_female, \
    enrollment_male, enrollment_female, registered_male, registered_female, \
    avg_attendance_male, avg_attendance_female, \
    attendance_percentage_male, attendance_percentage_female, \
    dropped_male, dropped_female, transferred_out_male, transferred_out_female, \
    transferred_in_male, transferred_in_female, is_finalized, created_at, updated_at";

const STUDENT_COLUMNS: &str = "\
    id, record_id, student_id, daily_codes, total_absences, total_tardies, total_present, \
    remarks, has_valid_excuse, is_at_risk, is_dropout, updated_at";

pub(crate) struct CreateRecord<'a> {
    pub id: &'a str,
    pub section_id: &'a str,
    pub school_year: &'a str,
    pub quarter: Quarter,
    pub month: i32,
    pub year: i32,
    pub school_name: &'a str,
    pub school_id: &'a str,
    pub grade_level: &'a str,
    pub adviser_name: Option<&'a str>,
    pub total_days: i32,
    pub late_enrollees_male: i32,
    pub late_enrollees_female: i32,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct SaveStudentAttendance<'a> {
    pub id: &'a str,
    pub record_id: &'a str,
    pub student_id: &'a str,
    pub daily_codes: &'a [String],
    pub totals: &'a AttendanceTotals,
    pub remarks: &'a str,
    pub has_valid_excuse: bool,
    pub updated_at: time::PrimitiveDateTime,
}

/// Student row joined with the sex column the monthly summary splits on.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub(crate) sex: String,
    pub(crate) total_present: i32,
    pub(crate) remarks: String,
}

/// Inserts the record unless one exists for the same section and month, then returns it.
pub(crate) async fn get_or_create_record(
    pool: &PgPool,
    params: CreateRecord<'_>,
) -> Result<(AttendanceRecord, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "INSERT INTO attendance_records (
            id, section_id, school_year, quarter, month, year, school_name, school_id,
            grade_level, adviser_name, total_days, late_enrollees_male, late_enrollees_female,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$14)
        ON CONFLICT (section_id, school_year, quarter, month, year) DO NOTHING
        RETURNING {RECORD_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.school_year)
    .bind(params.quarter)
    .bind(params.month)
    .bind(params.year)
    .bind(params.school_name)
    .bind(params.school_id)
    .bind(params.grade_level)
    .bind(params.adviser_name)
    .bind(params.total_days)
    .bind(params.late_enrollees_male)
    .bind(params.late_enrollees_female)
    .bind(params.created_at)
    .fetch_optional(pool)
    .await?;

    if let Some(record) = inserted {
        return Ok((record, true));
    }

    let existing = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records
         WHERE section_id = $1 AND school_year = $2 AND quarter = $3 AND month = $4 AND year = $5"
    ))
    .bind(params.section_id)
    .bind(params.school_year)
    .bind(params.quarter)
    .bind(params.month)
    .bind(params.year)
    .fetch_one(pool)
    .await?;
    Ok((existing, false))
}

pub(crate) async fn find_record(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = $1"
    ))
    .bind(record_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn lock_record(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = $1 FOR UPDATE"
    ))
    .bind(record_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_students(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
) -> Result<Vec<StudentAttendance>, sqlx::Error> {
    sqlx::query_as::<_, StudentAttendance>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM student_attendance WHERE record_id = $1 ORDER BY student_id"
    ))
    .bind(record_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn upsert_student(
    executor: impl sqlx::PgExecutor<'_>,
    params: SaveStudentAttendance<'_>,
) -> Result<StudentAttendance, sqlx::Error> {
    let totals = params.totals;
    sqlx::query_as::<_, StudentAttendance>(&format!(
        "INSERT INTO student_attendance (
            id, record_id, student_id, daily_codes, total_absences, total_tardies,
            total_present, remarks, has_valid_excuse, is_at_risk, is_dropout, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
        ON CONFLICT (record_id, student_id) DO UPDATE SET
            daily_codes = EXCLUDED.daily_codes,
            total_absences = EXCLUDED.total_absences,
            total_tardies = EXCLUDED.total_tardies,
            total_present = EXCLUDED.total_present,
            remarks = EXCLUDED.remarks,
            has_valid_excuse = EXCLUDED.has_valid_excuse,
            is_at_risk = EXCLUDED.is_at_risk,
            is_dropout = EXCLUDED.is_dropout,
            updated_at = EXCLUDED.updated_at
        RETURNING {STUDENT_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.record_id)
    .bind(params.student_id)
    .bind(params.daily_codes)
    .bind(to_i32(totals.total_absences))
    .bind(to_i32(totals.total_tardies))
    .bind(to_i32(totals.total_present))
    .bind(params.remarks)
    .bind(params.has_valid_excuse)
    .bind(totals.is_at_risk)
    .bind(totals.is_dropout)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_summary_rows(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
) -> Result<Vec<SummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, SummaryRow>(
        "SELECT s.sex, a.total_present, a.remarks
         FROM student_attendance a
         JOIN students s ON s.id = a.student_id
         WHERE a.record_id = $1",
    )
    .bind(record_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn save_summary(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
    summary: &SectionSummary,
    updated_at: time::PrimitiveDateTime,
) -> Result<AttendanceRecord, sqlx::Error> {
    let (male, female) = (&summary.male, &summary.female);
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "UPDATE attendance_records SET
            enrollment_male = $1, enrollment_female = $2,
            registered_male = $3, registered_female = $4,
            avg_attendance_male = $5, avg_attendance_female = $6,
            attendance_percentage_male = $7, attendance_percentage_female = $8,
            dropped_male = $9, dropped_female = $10,
            transferred_out_male = $11, transferred_out_female = $12,
            transferred_in_male = $13, transferred_in_female = $14,
            updated_at = $15
         WHERE id = $16
         RETURNING {RECORD_COLUMNS}",
    ))
    .bind(to_i32(male.enrollment))
    .bind(to_i32(female.enrollment))
    .bind(to_i32(male.registered))
    .bind(to_i32(female.registered))
    .bind(male.avg_daily_attendance)
    .bind(female.avg_daily_attendance)
    .bind(male.attendance_percentage)
    .bind(female.attendance_percentage)
    .bind(to_i32(male.dropped))
    .bind(to_i32(female.dropped))
    .bind(to_i32(male.transferred_out))
    .bind(to_i32(female.transferred_out))
    .bind(to_i32(male.transferred_in))
    .bind(to_i32(female.transferred_in))
    .bind(updated_at)
    .bind(record_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn finalize(
    pool: &PgPool,
    record_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "UPDATE attendance_records SET is_finalized = TRUE, updated_at = $1
         WHERE id = $2
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(updated_at)
    .bind(record_id)
    .fetch_optional(pool)
    .await
}

/// Absences summed over every month of the quarter for one student in one section.
pub(crate) async fn total_absences(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    section_id: &str,
    quarter: Quarter,
    school_year: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(a.total_absences), 0)::BIGINT
         FROM student_attendance a
         JOIN attendance_records r ON r.id = a.record_id
         WHERE a.student_id = $1 AND r.section_id = $2 AND r.quarter = $3 AND r.school_year = $4",
    )
    .bind(student_id)
    .bind(section_id)
    .bind(quarter)
    .bind(school_year)
    .fetch_one(executor)
    .await
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
