use sqlx::PgPool;

use crate::db::models::StudentGrade;
use crate::services::grading::ComputedGrade;

const COLUMNS: &str = "\
    id, class_record_id, student_id, ww_scores, pt_scores, qa_score, \
    ww_total, ww_percentage, ww_weighted, pt_total, pt_percentage, pt_weighted, \
    qa_percentage, qa_weighted, initial_grade, quarterly_grade, updated_at";

pub(crate) struct SaveGrade<'a> {
    pub id: &'a str,
    pub class_record_id: &'a str,
    pub student_id: &'a str,
    pub ww_scores: &'a [f64],
    pub pt_scores: &'a [f64],
    pub qa_score: f64,
    pub computed: &'a ComputedGrade,
    pub updated_at: time::PrimitiveDateTime,
}

/// Grade row with the student's sex and name, for class-record listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct GradeWithStudent {
    #[sqlx(flatten)]
    pub(crate) grade: StudentGrade,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) sex: String,
}

pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: SaveGrade<'_>,
) -> Result<StudentGrade, sqlx::Error> {
    let computed = params.computed;
    sqlx::query_as::<_, StudentGrade>(&format!(
        "INSERT INTO student_grades (
            id, class_record_id, student_id, ww_scores, pt_scores, qa_score,
            ww_total, ww_percentage, ww_weighted, pt_total, pt_percentage, pt_weighted,
            qa_percentage, qa_weighted, initial_grade, quarterly_grade, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
        ON CONFLICT (class_record_id, student_id) DO UPDATE SET
            ww_scores = EXCLUDED.ww_scores,
            pt_scores = EXCLUDED.pt_scores,
            qa_score = EXCLUDED.qa_score,
            ww_total = EXCLUDED.ww_total,
            ww_percentage = EXCLUDED.ww_percentage,
            ww_weighted = EXCLUDED.ww_weighted,
            pt_total = EXCLUDED.pt_total,
            pt_percentage = EXCLUDED.pt_percentage,
            pt_weighted = EXCLUDED.pt_weighted,
            qa_percentage = EXCLUDED.qa_percentage,
            qa_weighted = EXCLUDED.qa_weighted,
            initial_grade = EXCLUDED.initial_grade,
            quarterly_grade = EXCLUDED.quarterly_grade,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.class_record_id)
    .bind(params.student_id)
    .bind(params.ww_scores)
    .bind(params.pt_scores)
    .bind(params.qa_score)
    .bind(computed.ww_total)
    .bind(computed.ww_percentage)
    .bind(computed.ww_weighted)
    .bind(computed.pt_total)
    .bind(computed.pt_percentage)
    .bind(computed.pt_weighted)
    .bind(computed.qa_percentage)
    .bind(computed.qa_weighted)
    .bind(computed.initial_grade)
    .bind(i32::from(computed.quarterly_grade))
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    class_record_id: &str,
    student_id: &str,
) -> Result<Option<StudentGrade>, sqlx::Error> {
    sqlx::query_as::<_, StudentGrade>(&format!(
        "SELECT {COLUMNS} FROM student_grades WHERE class_record_id = $1 AND student_id = $2"
    ))
    .bind(class_record_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_record(
    executor: impl sqlx::PgExecutor<'_>,
    class_record_id: &str,
) -> Result<Vec<StudentGrade>, sqlx::Error> {
    sqlx::query_as::<_, StudentGrade>(&format!(
        "SELECT {COLUMNS} FROM student_grades WHERE class_record_id = $1 ORDER BY student_id"
    ))
    .bind(class_record_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_with_students(
    pool: &PgPool,
    class_record_id: &str,
) -> Result<Vec<GradeWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, GradeWithStudent>(
        "SELECT g.id, g.class_record_id, g.student_id, g.ww_scores, g.pt_scores, g.qa_score,
                g.ww_total, g.ww_percentage, g.ww_weighted, g.pt_total, g.pt_percentage,
                g.pt_weighted, g.qa_percentage, g.qa_weighted, g.initial_grade,
                g.quarterly_grade, g.updated_at, s.last_name, s.first_name, s.sex
         FROM student_grades g
         JOIN students s ON s.id = g.student_id
         WHERE g.class_record_id = $1
         ORDER BY s.last_name, s.first_name",
    )
    .bind(class_record_id)
    .fetch_all(pool)
    .await
}
