use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Student, StudentAcademic};
use crate::db::types::PlacementStatus;

const COLUMNS: &str = "\
    id, lrn, last_name, first_name, middle_name, sex, birth_date, address, \
    is_transferee, is_balik_aral, is_4ps_member, is_sped, section_name, \
    created_at, updated_at";

const ACADEMIC_COLUMNS: &str = "\
    student_id, dost_exam_result, mathematics, araling_panlipunan, english, \
    edukasyon_pagpapakatao, science, edukasyon_pangkabuhayan, filipino, mapeh, \
    overall_average, updated_at";

pub(crate) struct CreateStudent<'a> {
    pub id: &'a str,
    pub lrn: &'a str,
    pub last_name: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub sex: &'a str,
    pub birth_date: Option<time::Date>,
    pub address: Option<&'a str>,
    pub is_transferee: bool,
    pub is_balik_aral: bool,
    pub is_4ps_member: bool,
    pub is_sped: bool,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpsertAcademic<'a> {
    pub student_id: &'a str,
    pub dost_exam_result: &'a str,
    pub grades: [f64; 8],
    pub overall_average: Option<f64>,
    pub updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct ListStudentsFilter {
    pub search: Option<String>,
    pub section_name: Option<String>,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateStudent<'_>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, lrn, last_name, first_name, middle_name, sex, birth_date, address,
            is_transferee, is_balik_aral, is_4ps_member, is_sped, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.lrn)
    .bind(params.last_name)
    .bind(params.first_name)
    .bind(params.middle_name)
    .bind(params.sex)
    .bind(params.birth_date)
    .bind(params.address)
    .bind(params.is_transferee)
    .bind(params.is_balik_aral)
    .bind(params.is_4ps_member)
    .bind(params.is_sped)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(student_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn exists_by_lrn(pool: &PgPool, lrn: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE lrn = $1)")
        .bind(lrn)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: ListStudentsFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM students WHERE 1=1"));

    if let Some(search) = filter.search {
        let pattern = format!("%{search}%");
        builder.push(" AND (lrn ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR first_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(section_name) = filter.section_name {
        builder.push(" AND section_name = ");
        builder.push_bind(section_name);
    }

    builder.push(" ORDER BY last_name, first_name, id OFFSET ");
    builder.push_bind(skip);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    builder.build_query_as::<Student>().fetch_all(pool).await
}

/// Section of the student's most recent approved placement.
const LATEST_SECTION_NAME: &str = "\
    SELECT sec.name FROM section_placements p
    JOIN sections sec ON sec.id = p.section_id
    WHERE p.student_id = students.id AND p.status = $1
    ORDER BY p.placed_at DESC NULLS LAST, p.id DESC
    LIMIT 1";

/// Re-derives `section_name` from the student's remaining approved placements.
pub(crate) async fn sync_section_name(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>(&format!(
        "UPDATE students SET section_name = ({LATEST_SECTION_NAME}), updated_at = $2
         WHERE id = $3
         RETURNING section_name"
    ))
    .bind(PlacementStatus::Approved)
    .bind(updated_at)
    .bind(student_id)
    .fetch_one(executor)
    .await
}

/// Re-derives `section_name` for every student approved into the section.
pub(crate) async fn sync_section_names_for_section(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        "UPDATE students SET section_name = ({LATEST_SECTION_NAME}), updated_at = $2
         WHERE id IN (
            SELECT student_id FROM section_placements WHERE section_id = $3 AND status = $1
         )"
    ))
    .bind(PlacementStatus::Approved)
    .bind(updated_at)
    .bind(section_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn find_academic(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<StudentAcademic>, sqlx::Error> {
    sqlx::query_as::<_, StudentAcademic>(&format!(
        "SELECT {ACADEMIC_COLUMNS} FROM student_academics WHERE student_id = $1"
    ))
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn upsert_academic(
    pool: &PgPool,
    params: UpsertAcademic<'_>,
) -> Result<StudentAcademic, sqlx::Error> {
    let [
        mathematics,
        araling_panlipunan,
        english,
        edukasyon_pagpapakatao,
        science,
        edukasyon_pangkabuhayan,
        filipino,
        mapeh,
    ] = params.grades;

    sqlx::query_as::<_, StudentAcademic>(&format!(
        "INSERT INTO student_academics (
            student_id, dost_exam_result, mathematics, araling_panlipunan, english,
            edukasyon_pagpapakatao, science, edukasyon_pangkabuhayan, filipino, mapeh,
            overall_average, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
        ON CONFLICT (student_id) DO UPDATE SET
            dost_exam_result = EXCLUDED.dost_exam_result,
            mathematics = EXCLUDED.mathematics,
            araling_panlipunan = EXCLUDED.araling_panlipunan,
            english = EXCLUDED.english,
            edukasyon_pagpapakatao = EXCLUDED.edukasyon_pagpapakatao,
            science = EXCLUDED.science,
            edukasyon_pangkabuhayan = EXCLUDED.edukasyon_pangkabuhayan,
            filipino = EXCLUDED.filipino,
            mapeh = EXCLUDED.mapeh,
            overall_average = EXCLUDED.overall_average,
            updated_at = EXCLUDED.updated_at
        RETURNING {ACADEMIC_COLUMNS}",
    ))
    .bind(params.student_id)
    .bind(params.dost_exam_result)
    .bind(mathematics)
    .bind(araling_panlipunan)
    .bind(english)
    .bind(edukasyon_pagpapakatao)
    .bind(science)
    .bind(edukasyon_pangkabuhayan)
    .bind(filipino)
    .bind(mapeh)
    .bind(params.overall_average)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}
