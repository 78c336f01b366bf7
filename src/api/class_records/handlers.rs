use axum::{extract::Query, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::context::ActiveSection;
use crate::api::errors::ApiError;
use crate::api::validation::resolve_school_year;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ClassRecord;
use crate::repositories;
use crate::schemas::grading::{
    ClassRecordCreate, ClassRecordDetailResponse, ClassRecordListQuery, ClassRecordResponse,
    ConfigUpdateResponse, EarlyWarningResponse, GradeUpsert, GradingConfigUpdate,
    StudentGradeResponse,
};
use crate::services::grading::{self, GradingConfig, RawScores, Weights};

pub(super) async fn create_record(
    active: ActiveSection,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassRecordCreate>,
) -> Result<(axum::http::StatusCode, Json<ClassRecordResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section_id = active.require(payload.section_id)?;
    repositories::sections::find_by_id(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))?;
    let school_year = resolve_school_year(
        payload.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;

    let record = repositories::class_records::create(
        state.db(),
        repositories::class_records::CreateClassRecord {
            id: &Uuid::new_v4().to_string(),
            section_id: &section_id,
            subject: payload.subject.trim(),
            teacher_name: payload.teacher_name.trim(),
            quarter: payload.quarter,
            school_year: &school_year,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(
            e,
            "A class record already exists for this subject and quarter",
            "Failed to create class record",
        )
    })?;

    tracing::info!(
        record_id = %record.id,
        section_id = %record.section_id,
        subject = %record.subject,
        quarter = record.quarter.as_str(),
        "Class record created"
    );
    Ok((axum::http::StatusCode::CREATED, Json(ClassRecordResponse::from_db(record))))
}

pub(super) async fn list_records(
    Query(params): Query<ClassRecordListQuery>,
    active: ActiveSection,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ClassRecordResponse>>, ApiError> {
    let section_id = active.require(params.section_id)?;
    let records = repositories::class_records::list_for_section(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list class records"))?;

    Ok(Json(records.into_iter().map(ClassRecordResponse::from_db).collect()))
}

pub(super) async fn get_record(
    axum::extract::Path(record_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<ClassRecordDetailResponse>, ApiError> {
    let record = load_record(&state, &record_id).await?;
    let grades = repositories::grades::list_for_record(state.db(), &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(ClassRecordDetailResponse {
        record: ClassRecordResponse::from_db(record),
        grades: grades.into_iter().map(StudentGradeResponse::from_db).collect(),
    }))
}

/// Saves weights and HPS, then recomputes every grade row of the record.
pub(super) async fn update_config(
    axum::extract::Path(record_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<GradingConfigUpdate>,
) -> Result<Json<ConfigUpdateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let weights = Weights {
        written_works: payload.ww_weight,
        performance_tasks: payload.pt_weight,
        quarterly_assessment: payload.qa_weight,
    };
    weights.validate()?;
    let ww_hps = grading::normalize_hps("ww_hps", payload.ww_hps)?;
    let pt_hps = grading::normalize_hps("pt_hps", payload.pt_hps)?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let record = repositories::class_records::update_config(
        &mut *tx,
        &record_id,
        repositories::class_records::UpdateGradingConfig {
            ww_weight: weights.written_works,
            pt_weight: weights.performance_tasks,
            qa_weight: weights.quarterly_assessment,
            ww_hps,
            pt_hps,
            qa_hps: payload.qa_hps,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update grading config"))?
    .ok_or_else(|| ApiError::NotFound("Class record not found".to_string()))?;

    let config = GradingConfig::from_record(&record);
    let grades = repositories::grades::list_for_record(&mut *tx, &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    for grade in &grades {
        let computed = grading::compute(&config, &RawScores::from_grade(grade))?;
        repositories::grades::upsert(
            &mut *tx,
            repositories::grades::SaveGrade {
                id: &grade.id,
                class_record_id: &record_id,
                student_id: &grade.student_id,
                ww_scores: &grade.ww_scores,
                pt_scores: &grade.pt_scores,
                qa_score: grade.qa_score,
                computed: &computed,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to recompute grade"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(record_id = %record.id, recomputed = grades.len(), "Grading config updated");
    Ok(Json(ConfigUpdateResponse {
        record: ClassRecordResponse::from_db(record),
        recomputed: grades.len(),
    }))
}

pub(super) async fn upsert_grade(
    axum::extract::Path((record_id, student_id)): axum::extract::Path<(String, String)>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<GradeUpsert>,
) -> Result<Json<StudentGradeResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = load_record(&state, &record_id).await?;
    repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let ww_scores = grading::normalize_scores("ww_scores", payload.ww_scores)?;
    let pt_scores = grading::normalize_scores("pt_scores", payload.pt_scores)?;
    let config = GradingConfig::from_record(&record);
    let computed = grading::compute(
        &config,
        &RawScores { ww: &ww_scores, pt: &pt_scores, qa: payload.qa_score },
    )?;

    let grade = repositories::grades::upsert(
        state.db(),
        repositories::grades::SaveGrade {
            id: &Uuid::new_v4().to_string(),
            class_record_id: &record_id,
            student_id: &student_id,
            ww_scores: &ww_scores,
            pt_scores: &pt_scores,
            qa_score: payload.qa_score,
            computed: &computed,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save grade"))?;

    Ok(Json(StudentGradeResponse::from_db(grade)))
}

/// Students whose initial grade is below the passing mark, with what they need to recover.
pub(super) async fn early_warnings(
    axum::extract::Path(record_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<EarlyWarningResponse>>, ApiError> {
    let record = load_record(&state, &record_id).await?;
    let config = GradingConfig::from_record(&record);
    let rows = repositories::grades::list_with_students(state.db(), &record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    let mut warnings = Vec::new();
    for row in rows {
        let computed = grading::compute(&config, &RawScores::from_grade(&row.grade))?;
        let Some(kind) = grading::early_warning(computed.initial_grade, row.grade.qa_score) else {
            continue;
        };
        warnings.push(EarlyWarningResponse {
            student_id: row.grade.student_id,
            student_name: format!("{}, {}", row.last_name, row.first_name),
            sex: row.sex,
            kind,
            initial_grade: grading::round_to(computed.initial_grade, 2),
            quarterly_grade: i32::from(computed.quarterly_grade),
            required: grading::required_performance(&config, &computed, row.grade.qa_score),
        });
    }

    Ok(Json(warnings))
}

async fn load_record(state: &AppState, record_id: &str) -> Result<ClassRecord, ApiError> {
    repositories::class_records::find_by_id(state.db(), record_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class record"))?
        .ok_or_else(|| ApiError::NotFound("Class record not found".to_string()))
}
