use axum::{extract::Query, routing::delete, routing::get, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::{parse_clock, primitive_now_utc};
use crate::repositories;
use crate::schemas::enrollment::{
    SectionResponse, SectionUpdate, StatisticsQuery, SubjectAssignmentResponse,
    SubjectAssignmentUpsert,
};
use crate::services::section_assignment::{self, StatisticsReport};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(statistics))
        .route("/:section_id", get(get_section).patch(update_section))
        .route("/:section_id/subjects", get(list_subjects).put(assign_subject))
        .route("/:section_id/subjects/:subject", delete(remove_subject))
}

async fn statistics(
    Query(params): Query<StatisticsQuery>,
    state: axum::extract::State<AppState>,
) -> Result<Json<StatisticsReport>, ApiError> {
    let program = params.program.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let report = section_assignment::section_statistics(state.db(), program).await?;
    Ok(Json(report))
}

async fn get_section(
    axum::extract::Path(section_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<SectionResponse>, ApiError> {
    let section = load_section(&state, &section_id).await?;
    Ok(Json(SectionResponse::from_db(section)))
}

async fn update_section(
    axum::extract::Path(section_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SectionUpdate>,
) -> Result<Json<SectionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section = section_assignment::update_section(
        state.db(),
        &section_id,
        repositories::sections::UpdateSection {
            name: payload.name.map(|name| name.trim().to_string()),
            adviser_name: payload.adviser_name,
            max_students: payload.max_students,
            building: payload.building,
            room: payload.room,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await?;

    Ok(Json(SectionResponse::from_db(section)))
}

async fn list_subjects(
    axum::extract::Path(section_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectAssignmentResponse>>, ApiError> {
    load_section(&state, &section_id).await?;
    let assignments = repositories::subject_assignments::list_for_section(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subject assignments"))?;

    Ok(Json(assignments.into_iter().map(SubjectAssignmentResponse::from_db).collect()))
}

/// Assigns the subject teacher, replacing the previous one for that subject.
async fn assign_subject(
    axum::extract::Path(section_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectAssignmentUpsert>,
) -> Result<Json<SubjectAssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let start_time = parse_clock(&payload.start_time)
        .map_err(|_| ApiError::BadRequest("start_time must be HH:MM".to_string()))?;
    let end_time = parse_clock(&payload.end_time)
        .map_err(|_| ApiError::BadRequest("end_time must be HH:MM".to_string()))?;
    if start_time >= end_time {
        return Err(ApiError::BadRequest("start_time must be before end_time".to_string()));
    }
    load_section(&state, &section_id).await?;

    let assignment = repositories::subject_assignments::upsert(
        state.db(),
        repositories::subject_assignments::UpsertAssignment {
            id: &Uuid::new_v4().to_string(),
            section_id: &section_id,
            subject: payload.subject.trim(),
            teacher_name: payload.teacher_name.trim(),
            schedule_day: payload.schedule_day,
            start_time,
            end_time,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save subject assignment"))?;

    tracing::info!(
        section_id = %section_id,
        subject = %assignment.subject,
        teacher = %assignment.teacher_name,
        "Subject teacher assigned"
    );
    Ok(Json(SubjectAssignmentResponse::from_db(assignment)))
}

async fn remove_subject(
    axum::extract::Path((section_id, subject)): axum::extract::Path<(String, String)>,
    state: axum::extract::State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let removed = repositories::subject_assignments::delete(state.db(), &section_id, &subject)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove subject assignment"))?;
    if !removed {
        return Err(ApiError::NotFound("Subject assignment not found".to_string()));
    }
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn load_section(
    state: &AppState,
    section_id: &str,
) -> Result<crate::db::models::Section, ApiError> {
    repositories::sections::find_by_id(state.db(), section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))
}

#[cfg(test)]
mod tests;
