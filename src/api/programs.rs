use axum::{routing::get, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::validation::resolve_school_year;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Program;
use crate::repositories;
use crate::schemas::enrollment::{ProgramCreate, ProgramResponse, SectionCreate, SectionResponse};
use crate::services::section_assignment::normalize_program;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_programs).post(create_program))
        .route("/:program/sections", get(list_sections).post(create_section))
}

async fn create_program(
    state: axum::extract::State<AppState>,
    Json(payload): Json<ProgramCreate>,
) -> Result<(axum::http::StatusCode, Json<ProgramResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let name = normalize_program(&payload.name)?;
    let school_year = resolve_school_year(
        payload.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;

    let program = repositories::programs::create(
        state.db(),
        repositories::programs::CreateProgram {
            id: &Uuid::new_v4().to_string(),
            name: &name,
            description: payload.description.as_deref(),
            school_year: &school_year,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Program already exists", "Failed to create program"))?;

    tracing::info!(program_id = %program.id, program = %program.name, "Program created");
    Ok((axum::http::StatusCode::CREATED, Json(ProgramResponse::from_db(program))))
}

async fn list_programs(
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ProgramResponse>>, ApiError> {
    let programs = repositories::programs::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list programs"))?;

    Ok(Json(programs.into_iter().map(ProgramResponse::from_db).collect()))
}

async fn list_sections(
    axum::extract::Path(program): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    let program = load_program(&state, &program).await?;
    let sections = repositories::sections::list_for_program(state.db(), &program.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list sections"))?;

    Ok(Json(sections.into_iter().map(SectionResponse::from_db).collect()))
}

async fn create_section(
    axum::extract::Path(program): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SectionCreate>,
) -> Result<(axum::http::StatusCode, Json<SectionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let program = load_program(&state, &program).await?;

    let section = repositories::sections::create(
        state.db(),
        repositories::sections::CreateSection {
            id: &Uuid::new_v4().to_string(),
            program_id: &program.id,
            name: payload.name.trim(),
            adviser_name: payload.adviser_name.as_deref(),
            max_students: payload.max_students,
            building: payload.building.as_deref(),
            room: payload.room.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(
            e,
            "Section already exists in this program",
            "Failed to create section",
        )
    })?;

    tracing::info!(
        section_id = %section.id,
        program = %program.name,
        max_students = section.max_students,
        "Section created"
    );
    Ok((axum::http::StatusCode::CREATED, Json(SectionResponse::from_db(section))))
}

async fn load_program(state: &AppState, program: &str) -> Result<Program, ApiError> {
    let name = normalize_program(program)?;
    repositories::programs::find_by_name(state.db(), &name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch program"))?
        .ok_or_else(|| ApiError::NotFound(format!("Program {name} not found")))
}
