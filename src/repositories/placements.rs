use sqlx::PgPool;

use crate::db::models::SectionPlacement;
use crate::db::types::PlacementStatus;

const COLUMNS: &str = "\
    id, student_id, program, section_id, status, placed_at, created_at, updated_at";

/// Pending placement joined with the ranking data bulk assignment needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RankedPlacement {
    pub(crate) student_id: String,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) overall_average: Option<f64>,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    placement_id: &str,
) -> Result<Option<SectionPlacement>, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "SELECT {COLUMNS} FROM section_placements WHERE id = $1"
    ))
    .bind(placement_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    program: &str,
) -> Result<Option<SectionPlacement>, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "SELECT {COLUMNS} FROM section_placements WHERE student_id = $1 AND program = $2"
    ))
    .bind(student_id)
    .bind(program)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Vec<SectionPlacement>, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "SELECT {COLUMNS} FROM section_placements WHERE student_id = $1 ORDER BY created_at, id"
    ))
    .bind(student_id)
    .fetch_all(executor)
    .await
}

/// Creates a pending request, or resets a rejected one back to pending.
pub(crate) async fn request(
    pool: &PgPool,
    id: &str,
    student_id: &str,
    program: &str,
    now: time::PrimitiveDateTime,
) -> Result<SectionPlacement, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "INSERT INTO section_placements (id, student_id, program, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         ON CONFLICT (student_id, program) DO UPDATE SET
            status = EXCLUDED.status,
            section_id = NULL,
            placed_at = NULL,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(student_id)
    .bind(program)
    .bind(PlacementStatus::Pending)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn upsert_approved(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    program: &str,
    section_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<SectionPlacement, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "INSERT INTO section_placements (
            id, student_id, program, section_id, status, placed_at, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$6,$6)
         ON CONFLICT (student_id, program) DO UPDATE SET
            section_id = EXCLUDED.section_id,
            status = EXCLUDED.status,
            placed_at = EXCLUDED.placed_at,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(student_id)
    .bind(program)
    .bind(section_id)
    .bind(PlacementStatus::Approved)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_rejected(
    executor: impl sqlx::PgExecutor<'_>,
    placement_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<SectionPlacement, sqlx::Error> {
    sqlx::query_as::<_, SectionPlacement>(&format!(
        "UPDATE section_placements
         SET status = $1, section_id = NULL, placed_at = NULL, updated_at = $2
         WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(PlacementStatus::Rejected)
    .bind(now)
    .bind(placement_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM section_placements WHERE student_id = $1")
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Pending placements of a program, best overall average first.
pub(crate) async fn list_pending_ranked(
    pool: &PgPool,
    program: &str,
) -> Result<Vec<RankedPlacement>, sqlx::Error> {
    sqlx::query_as::<_, RankedPlacement>(
        "SELECT p.student_id, s.last_name, s.first_name, a.overall_average
         FROM section_placements p
         JOIN students s ON s.id = p.student_id
         LEFT JOIN student_academics a ON a.student_id = p.student_id
         WHERE p.program = $1 AND p.status = $2
         ORDER BY a.overall_average DESC NULLS LAST, p.created_at, p.id",
    )
    .bind(program)
    .bind(PlacementStatus::Pending)
    .fetch_all(pool)
    .await
}

/// Student ids with an approved placement in the section.
pub(crate) async fn list_approved_students(
    pool: &PgPool,
    section_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT student_id FROM section_placements
         WHERE section_id = $1 AND status = $2
         ORDER BY student_id",
    )
    .bind(section_id)
    .bind(PlacementStatus::Approved)
    .fetch_all(pool)
    .await
}
