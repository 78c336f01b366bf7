use sqlx::PgPool;

use crate::db::models::ClassRecord;
use crate::db::types::Quarter;

const COLUMNS: &str = "\
    id, section_id, subject, teacher_name, quarter, school_year, \
    ww_weight, pt_weight, qa_weight, ww_hps, pt_hps, qa_hps, created_at, updated_at";

pub(crate) struct CreateClassRecord<'a> {
    pub id: &'a str,
    pub section_id: &'a str,
    pub subject: &'a str,
    pub teacher_name: &'a str,
    pub quarter: Quarter,
    pub school_year: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateGradingConfig {
    pub ww_weight: i32,
    pub pt_weight: i32,
    pub qa_weight: i32,
    pub ww_hps: Vec<i32>,
    pub pt_hps: Vec<i32>,
    pub qa_hps: i32,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClassRecord<'_>,
) -> Result<ClassRecord, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!(
        "INSERT INTO class_records (
            id, section_id, subject, teacher_name, quarter, school_year, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.subject)
    .bind(params.teacher_name)
    .bind(params.quarter)
    .bind(params.school_year)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
) -> Result<Option<ClassRecord>, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!("SELECT {COLUMNS} FROM class_records WHERE id = $1"))
        .bind(record_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_for_subject(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: &str,
    subject: &str,
    quarter: Quarter,
    school_year: &str,
) -> Result<Option<ClassRecord>, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!(
        "SELECT {COLUMNS} FROM class_records
         WHERE section_id = $1 AND subject = $2 AND quarter = $3 AND school_year = $4"
    ))
    .bind(section_id)
    .bind(subject)
    .bind(quarter)
    .bind(school_year)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_section(
    pool: &PgPool,
    section_id: &str,
) -> Result<Vec<ClassRecord>, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!(
        "SELECT {COLUMNS} FROM class_records
         WHERE section_id = $1
         ORDER BY school_year, quarter, subject"
    ))
    .bind(section_id)
    .fetch_all(pool)
    .await
}

/// Every quarter's record of one subject, ordered Q1 to Q4.
pub(crate) async fn list_for_student_subject(
    pool: &PgPool,
    student_id: &str,
    subject: &str,
    school_year: &str,
) -> Result<Vec<ClassRecord>, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!(
        "SELECT {COLUMNS} FROM class_records
         WHERE subject = $2 AND school_year = $3
           AND id IN (SELECT class_record_id FROM student_grades WHERE student_id = $1)
         ORDER BY quarter"
    ))
    .bind(student_id)
    .bind(subject)
    .bind(school_year)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_subjects(
    pool: &PgPool,
    section_id: &str,
    quarter: Quarter,
    school_year: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT subject FROM class_records
         WHERE section_id = $1 AND quarter = $2 AND school_year = $3
         ORDER BY subject",
    )
    .bind(section_id)
    .bind(quarter)
    .bind(school_year)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_config(
    executor: impl sqlx::PgExecutor<'_>,
    record_id: &str,
    params: UpdateGradingConfig,
) -> Result<Option<ClassRecord>, sqlx::Error> {
    sqlx::query_as::<_, ClassRecord>(&format!(
        "UPDATE class_records SET
            ww_weight = $1, pt_weight = $2, qa_weight = $3,
            ww_hps = $4, pt_hps = $5, qa_hps = $6, updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.ww_weight)
    .bind(params.pt_weight)
    .bind(params.qa_weight)
    .bind(params.ww_hps)
    .bind(params.pt_hps)
    .bind(params.qa_hps)
    .bind(params.updated_at)
    .bind(record_id)
    .fetch_optional(executor)
    .await
}
