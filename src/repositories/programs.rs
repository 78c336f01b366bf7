use sqlx::PgPool;

use crate::db::models::Program;

const COLUMNS: &str = "id, name, description, school_year, is_active, created_at, updated_at";

pub(crate) struct CreateProgram<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub school_year: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateProgram<'_>,
) -> Result<Program, sqlx::Error> {
    sqlx::query_as::<_, Program>(&format!(
        "INSERT INTO programs (
            id, name, description, school_year, is_active, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,TRUE,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.school_year)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Program>, sqlx::Error> {
    sqlx::query_as::<_, Program>(&format!("SELECT {COLUMNS} FROM programs ORDER BY name"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_name(
    executor: impl sqlx::PgExecutor<'_>,
    name: &str,
) -> Result<Option<Program>, sqlx::Error> {
    sqlx::query_as::<_, Program>(&format!("SELECT {COLUMNS} FROM programs WHERE name = UPPER($1)"))
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_active_by_name(
    executor: impl sqlx::PgExecutor<'_>,
    name: &str,
) -> Result<Option<Program>, sqlx::Error> {
    sqlx::query_as::<_, Program>(&format!(
        "SELECT {COLUMNS} FROM programs WHERE name = UPPER($1) AND is_active"
    ))
    .bind(name)
    .fetch_optional(executor)
    .await
}
