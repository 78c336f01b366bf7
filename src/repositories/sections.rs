use sqlx::PgPool;

use crate::db::models::Section;
use crate::db::types::PlacementStatus;

const COLUMNS: &str = "id, program_id, name, adviser_name, max_students, current_students, \
                       building, room, is_active, created_at, updated_at";

pub(crate) struct CreateSection<'a> {
    pub id: &'a str,
    pub program_id: &'a str,
    pub name: &'a str,
    pub adviser_name: Option<&'a str>,
    pub max_students: i32,
    pub building: Option<&'a str>,
    pub room: Option<&'a str>,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateSection {
    pub name: Option<String>,
    pub adviser_name: Option<String>,
    pub max_students: Option<i32>,
    pub building: Option<String>,
    pub room: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: time::PrimitiveDateTime,
}

/// Live approved-placement count of one section.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SectionLoad {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) max_students: i32,
    pub(crate) enrolled: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SectionStatsRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) program: String,
    pub(crate) max_students: i32,
    pub(crate) enrolled: i64,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSection<'_>,
) -> Result<Section, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "INSERT INTO sections (
            id, program_id, name, adviser_name, max_students, current_students,
            building, room, is_active, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,0,$6,$7,TRUE,$8,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.program_id)
    .bind(params.name)
    .bind(params.adviser_name)
    .bind(params.max_students)
    .bind(params.building)
    .bind(params.room)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!("SELECT {COLUMNS} FROM sections WHERE id = $1"))
        .bind(section_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_for_program(
    pool: &PgPool,
    program_id: &str,
) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "SELECT {COLUMNS} FROM sections WHERE program_id = $1 ORDER BY name"
    ))
    .bind(program_id)
    .fetch_all(pool)
    .await
}

/// Applies the changes unless the new `max_students` would fall below the
/// live approved count; `None` when the row is missing or the guard fails.
pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
    params: UpdateSection,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "UPDATE sections SET
            name = COALESCE($1, name),
            adviser_name = COALESCE($2, adviser_name),
            max_students = COALESCE($3, max_students),
            building = COALESCE($4, building),
            room = COALESCE($5, room),
            is_active = COALESCE($6, is_active),
            updated_at = $7
         WHERE id = $8
           AND ($3::int IS NULL OR $3::int >= (
                SELECT COUNT(*) FROM section_placements
                WHERE section_id = $8 AND status = $9
           ))
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.adviser_name)
    .bind(params.max_students)
    .bind(params.building)
    .bind(params.room)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(section_id)
    .bind(PlacementStatus::Approved)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "SELECT {COLUMNS} FROM sections WHERE id = $1 FOR UPDATE"
    ))
    .bind(section_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_approved(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM section_placements WHERE section_id = $1 AND status = $2",
    )
    .bind(section_id)
    .bind(PlacementStatus::Approved)
    .fetch_one(executor)
    .await
}

/// Row-locks every active section of the program until the transaction ends.
pub(crate) async fn lock_active_for_program(
    executor: impl sqlx::PgExecutor<'_>,
    program_id: &str,
) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "SELECT {COLUMNS} FROM sections
         WHERE program_id = $1 AND is_active
         ORDER BY id
         FOR UPDATE"
    ))
    .bind(program_id)
    .fetch_all(executor)
    .await
}

/// Active sections of the program, least loaded first, ties broken by name.
pub(crate) async fn list_loads(
    executor: impl sqlx::PgExecutor<'_>,
    program_id: &str,
) -> Result<Vec<SectionLoad>, sqlx::Error> {
    sqlx::query_as::<_, SectionLoad>(
        "SELECT s.id, s.name, s.max_students,
                COUNT(p.id) FILTER (WHERE p.status = $2) AS enrolled
         FROM sections s
         LEFT JOIN section_placements p ON p.section_id = s.id
         WHERE s.program_id = $1 AND s.is_active
         GROUP BY s.id, s.name, s.max_students
         ORDER BY enrolled, s.name",
    )
    .bind(program_id)
    .bind(PlacementStatus::Approved)
    .fetch_all(executor)
    .await
}

/// Re-derives `current_students` from the approved placements and returns the section.
pub(crate) async fn refresh_current_students(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Section, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "UPDATE sections SET
            current_students = (
                SELECT COUNT(*) FROM section_placements
                WHERE section_id = $1 AND status = $2
            ),
            updated_at = $3
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(section_id)
    .bind(PlacementStatus::Approved)
    .bind(updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn statistics(
    pool: &PgPool,
    program_id: Option<&str>,
) -> Result<Vec<SectionStatsRow>, sqlx::Error> {
    sqlx::query_as::<_, SectionStatsRow>(
        "SELECT s.id, s.name, pr.name AS program, s.max_students,
                COUNT(p.id) FILTER (WHERE p.status = $2) AS enrolled
         FROM sections s
         JOIN programs pr ON pr.id = s.program_id
         LEFT JOIN section_placements p ON p.section_id = s.id
         WHERE s.is_active AND ($1::text IS NULL OR s.program_id = $1)
         GROUP BY s.id, s.name, pr.name, s.max_students
         ORDER BY pr.name, s.name",
    )
    .bind(program_id)
    .bind(PlacementStatus::Approved)
    .fetch_all(pool)
    .await
}
