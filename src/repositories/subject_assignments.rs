use sqlx::PgPool;

use crate::db::models::SubjectAssignment;
use crate::db::types::ScheduleDay;

const COLUMNS: &str = "\
    id, section_id, subject, teacher_name, schedule_day, start_time, end_time, \
    created_at, updated_at";

pub(crate) struct UpsertAssignment<'a> {
    pub id: &'a str,
    pub section_id: &'a str,
    pub subject: &'a str,
    pub teacher_name: &'a str,
    pub schedule_day: ScheduleDay,
    pub start_time: time::Time,
    pub end_time: time::Time,
    pub now: time::PrimitiveDateTime,
}

/// One teacher per subject per section; a second call replaces the teacher and schedule.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertAssignment<'_>,
) -> Result<SubjectAssignment, sqlx::Error> {
    sqlx::query_as::<_, SubjectAssignment>(&format!(
        "INSERT INTO section_subject_assignments (
            id, section_id, subject, teacher_name, schedule_day, start_time, end_time,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         ON CONFLICT (section_id, subject) DO UPDATE SET
            teacher_name = EXCLUDED.teacher_name,
            schedule_day = EXCLUDED.schedule_day,
            start_time = EXCLUDED.start_time,
            end_time = EXCLUDED.end_time,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.subject)
    .bind(params.teacher_name)
    .bind(params.schedule_day)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_section(
    pool: &PgPool,
    section_id: &str,
) -> Result<Vec<SubjectAssignment>, sqlx::Error> {
    sqlx::query_as::<_, SubjectAssignment>(&format!(
        "SELECT {COLUMNS} FROM section_subject_assignments
         WHERE section_id = $1
         ORDER BY start_time, subject"
    ))
    .bind(section_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(
    pool: &PgPool,
    section_id: &str,
    subject: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM section_subject_assignments WHERE section_id = $1 AND subject = $2",
    )
    .bind(section_id)
    .bind(subject)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Subjects with an assigned teacher, alphabetical.
pub(crate) async fn list_subjects(
    pool: &PgPool,
    section_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT subject FROM section_subject_assignments WHERE section_id = $1 ORDER BY subject",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await
}
