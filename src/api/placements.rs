use axum::{routing::post, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::PlacementStatus;
use crate::repositories;
use crate::schemas::enrollment::{
    AssignmentResponse, BulkAssignRequest, PlacementRequest, PlacementResponse, SectionResponse,
    UnassignRequest, UnassignResponse,
};
use crate::services::section_assignment::{self, AssignmentError, BulkAssignmentReport};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(request_placement))
        .route("/assign", post(assign))
        .route("/bulk-assign", post(bulk_assign))
        .route("/unassign", post(unassign))
        .route("/:placement_id/reject", post(reject))
}

async fn request_placement(
    state: axum::extract::State<AppState>,
    Json(payload): Json<PlacementRequest>,
) -> Result<(axum::http::StatusCode, Json<PlacementResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let program = section_assignment::normalize_program(&payload.program)?;

    repositories::programs::find_active_by_name(state.db(), &program)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch program"))?
        .ok_or_else(|| AssignmentError::ProgramNotFound(program.clone()))?;
    repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| AssignmentError::StudentNotFound(payload.student_id.clone()))?;

    let existing =
        repositories::placements::find_for_student(state.db(), &payload.student_id, &program)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch placement"))?;
    if existing.is_some_and(|placement| placement.status == PlacementStatus::Approved) {
        return Err(ApiError::Conflict(format!(
            "Student is already placed in a {program} section"
        )));
    }

    let placement = repositories::placements::request(
        state.db(),
        &Uuid::new_v4().to_string(),
        &payload.student_id,
        &program,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Placement already requested", "Failed to request placement")
    })?;

    tracing::info!(
        placement_id = %placement.id,
        student_id = %placement.student_id,
        program = %program,
        "Placement requested"
    );
    Ok((axum::http::StatusCode::CREATED, Json(PlacementResponse::from_db(placement))))
}

async fn reject(
    axum::extract::Path(placement_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<PlacementResponse>, ApiError> {
    let placement = repositories::placements::find_by_id(state.db(), &placement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch placement"))?
        .ok_or_else(|| ApiError::NotFound("Placement not found".to_string()))?;

    if placement.status == PlacementStatus::Rejected {
        return Ok(Json(PlacementResponse::from_db(placement)));
    }

    let rejected = section_assignment::reject_placement(state.db(), &placement).await?;
    Ok(Json(PlacementResponse::from_db(rejected)))
}

async fn assign(
    state: axum::extract::State<AppState>,
    Json(payload): Json<PlacementRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assignment = section_assignment::assign_student_to_section(
        state.db(),
        &payload.student_id,
        &payload.program,
    )
    .await?;

    Ok(Json(AssignmentResponse {
        success: true,
        message: assignment.message(),
        section: SectionResponse::from_db(assignment.section),
        placement: PlacementResponse::from_db(assignment.placement),
    }))
}

async fn bulk_assign(
    state: axum::extract::State<AppState>,
    Json(payload): Json<BulkAssignRequest>,
) -> Result<Json<BulkAssignmentReport>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let report =
        section_assignment::bulk_assign_students_by_ranking(state.db(), &payload.program).await?;
    Ok(Json(report))
}

async fn unassign(
    state: axum::extract::State<AppState>,
    Json(payload): Json<UnassignRequest>,
) -> Result<Json<UnassignResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let removed = section_assignment::unassign_student(state.db(), &payload.student_id).await?;
    Ok(Json(UnassignResponse { student_id: payload.student_id, removed }))
}
