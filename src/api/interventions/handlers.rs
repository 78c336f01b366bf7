use axum::{extract::Query, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::context::ActiveSection;
use crate::api::errors::ApiError;
use crate::api::validation::{parse_date_field, parse_optional_date, resolve_school_year};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, today_utc};
use crate::db::models::Intervention;
use crate::db::types::{ActionStatus, RiskLevel};
use crate::repositories;
use crate::schemas::intervention::{
    ActionCreate, ActionResponse, ActionUpdate, EscalateRequest, EscalateResponse,
    EvaluateRequest, EvaluateResponse, InterventionCreate, InterventionDetailResponse,
    InterventionListQuery, InterventionResponse, ProgressUpdateCreate, ProgressUpdateResponse,
    SectionRefreshRequest, SummaryQuery,
};
use crate::services::interventions::{
    self, CaseKey, InterventionError, InterventionSummary, ManualCase, RiskAssessment,
    RiskInputs, SectionRefreshReport, SyncOutcome,
};

pub(super) async fn assess(Json(inputs): Json<RiskInputs>) -> Json<RiskAssessment> {
    Json(interventions::assess(&inputs))
}

pub(super) async fn evaluate(
    active: ActiveSection,
    state: axum::extract::State<AppState>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section_id = active.require(payload.section_id)?;
    let school_year = resolve_school_year(
        payload.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;
    let subject = payload.subject.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let key = CaseKey {
        student_id: &payload.student_id,
        section_id: &section_id,
        subject,
        quarter: payload.quarter,
        school_year: &school_year,
    };

    let outcome =
        interventions::auto_create_intervention_if_needed(state.db(), &key, &payload.created_by)
            .await?;

    let label = outcome.label();
    let response = match outcome {
        SyncOutcome::Created(item) | SyncOutcome::Updated(item) => {
            EvaluateResponse {
                outcome: label,
                needs_intervention: item.risk_level != RiskLevel::OnTrack,
                risk_level: item.risk_level,
                reasons: item.reasons.clone(),
                intervention: Some(InterventionResponse::from_db(item)),
            }
        }
        SyncOutcome::NotNeeded(assessment) => EvaluateResponse {
            outcome: label,
            needs_intervention: assessment.needs_intervention,
            risk_level: assessment.risk_level,
            reasons: assessment.reasons,
            intervention: None,
        },
    };

    Ok(Json(response))
}

pub(super) async fn refresh_section(
    axum::extract::Path(section_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SectionRefreshRequest>,
) -> Result<Json<SectionRefreshReport>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    repositories::sections::find_by_id(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))?;
    let school_year = resolve_school_year(
        payload.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;

    let report = interventions::refresh_section(
        state.db(),
        &section_id,
        payload.quarter,
        &school_year,
        &payload.created_by,
    )
    .await?;
    Ok(Json(report))
}

pub(super) async fn list_interventions(
    Query(params): Query<InterventionListQuery>,
    active: ActiveSection,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<InterventionResponse>>, ApiError> {
    let filter = repositories::interventions::ListInterventionsFilter {
        section_id: active.or(params.section_id),
        quarter: params.quarter,
        school_year: params.school_year.filter(|value| !value.trim().is_empty()),
        active_only: params.active_only.unwrap_or(true),
    };

    let items = repositories::interventions::list(state.db(), filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list interventions"))?;

    Ok(Json(items.into_iter().map(InterventionResponse::from_db).collect()))
}

pub(super) async fn summary(
    Query(params): Query<SummaryQuery>,
    active: ActiveSection,
    state: axum::extract::State<AppState>,
) -> Result<Json<InterventionSummary>, ApiError> {
    let section_id = active.require(params.section_id)?;
    let school_year = resolve_school_year(
        params.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;

    let items = repositories::interventions::list(
        state.db(),
        repositories::interventions::ListInterventionsFilter {
            section_id: Some(section_id),
            quarter: Some(params.quarter),
            school_year: Some(school_year),
            active_only: false,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list interventions"))?;

    Ok(Json(interventions::summarize(&items)))
}

pub(super) async fn create_intervention(
    active: ActiveSection,
    state: axum::extract::State<AppState>,
    Json(payload): Json<InterventionCreate>,
) -> Result<(axum::http::StatusCode, Json<InterventionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let section_id = active.require(payload.section_id)?;
    repositories::sections::find_by_id(state.db(), &section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))?;
    repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    let school_year = resolve_school_year(
        payload.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;

    let created = interventions::create_manual(
        state.db(),
        ManualCase {
            key: CaseKey {
                student_id: &payload.student_id,
                section_id: &section_id,
                subject: payload.subject.as_deref().map(str::trim).filter(|v| !v.is_empty()),
                quarter: payload.quarter,
                school_year: &school_year,
            },
            intervention_type: payload.intervention_type,
            reason: payload.reason.as_deref().map(str::trim).filter(|v| !v.is_empty()),
            smart_goal: payload.smart_goal.as_deref().map(str::trim).filter(|v| !v.is_empty()),
            created_by: &payload.created_by,
        },
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(InterventionResponse::from_db(created))))
}

pub(super) async fn get_intervention(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<InterventionDetailResponse>, ApiError> {
    let intervention = load_intervention(&state, &intervention_id).await?;
    let actions = repositories::interventions::list_actions(state.db(), &intervention_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list actions"))?;
    let updates = repositories::interventions::list_updates(state.db(), &intervention_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list progress updates"))?;

    Ok(Json(InterventionDetailResponse {
        intervention: InterventionResponse::from_db(intervention),
        actions: actions.into_iter().map(ActionResponse::from_db).collect(),
        updates: updates.into_iter().map(ProgressUpdateResponse::from_db).collect(),
    }))
}

pub(super) async fn create_action(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ActionCreate>,
) -> Result<(axum::http::StatusCode, Json<ActionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let intervention = load_intervention(&state, &intervention_id).await?;
    let start_date =
        parse_optional_date("start_date", payload.start_date.as_deref())?.unwrap_or_else(today_utc);
    let target_date = parse_optional_date("target_date", payload.target_date.as_deref())?;
    if target_date.is_some_and(|target| target < start_date) {
        return Err(ApiError::BadRequest("target_date must not be before start_date".to_string()));
    }

    let action = repositories::interventions::create_action(
        state.db(),
        repositories::interventions::CreateAction {
            id: &Uuid::new_v4().to_string(),
            intervention_id: &intervention.id,
            tier: payload.tier.unwrap_or(intervention.current_tier),
            action_type: payload.action_type.trim(),
            name: payload.name.trim(),
            description: payload.description.trim(),
            start_date,
            target_date,
            status: ActionStatus::Planned,
            handled_by: payload.handled_by.trim(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create action"))?;

    Ok((axum::http::StatusCode::CREATED, Json(ActionResponse::from_db(action))))
}

pub(super) async fn update_action(
    axum::extract::Path(action_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ActionUpdate>,
) -> Result<Json<ActionResponse>, ApiError> {
    let target_date = parse_optional_date("target_date", payload.target_date.as_deref())?;
    let mut completion_date =
        parse_optional_date("completion_date", payload.completion_date.as_deref())?;
    if payload.status == Some(ActionStatus::Completed) && completion_date.is_none() {
        completion_date = Some(today_utc());
    }

    let action = repositories::interventions::update_action(
        state.db(),
        &action_id,
        repositories::interventions::UpdateAction {
            status: payload.status,
            target_date,
            completion_date,
            notes: payload.notes,
            was_successful: payload.was_successful,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update action"))?
    .ok_or_else(|| ApiError::NotFound("Action not found".to_string()))?;

    Ok(Json(ActionResponse::from_db(action)))
}

pub(super) async fn create_update(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ProgressUpdateCreate>,
) -> Result<(axum::http::StatusCode, Json<ProgressUpdateResponse>), ApiError> {
    let update_date = match payload.update_date.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => parse_date_field("update_date", value)?,
        _ => today_utc(),
    };

    let update = interventions::record_update(
        state.db(),
        &intervention_id,
        update_date,
        payload.status,
        payload.note.trim(),
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(ProgressUpdateResponse::from_db(update))))
}

pub(super) async fn resolve(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<InterventionResponse>, ApiError> {
    let resolved = interventions::resolve(state.db(), &intervention_id).await?;
    Ok(Json(InterventionResponse::from_db(resolved)))
}

pub(super) async fn reactivate(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<InterventionResponse>, ApiError> {
    let reopened = interventions::reactivate(state.db(), &intervention_id).await?;
    Ok(Json(InterventionResponse::from_db(reopened)))
}

pub(super) async fn escalate(
    axum::extract::Path(intervention_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<EscalateRequest>,
) -> Result<Json<EscalateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (intervention, action) = interventions::escalate(
        state.db(),
        &intervention_id,
        payload.reason.as_deref(),
        payload.handled_by.trim(),
    )
    .await?;

    Ok(Json(EscalateResponse {
        intervention: InterventionResponse::from_db(intervention),
        action: ActionResponse::from_db(action),
    }))
}

async fn load_intervention(
    state: &AppState,
    intervention_id: &str,
) -> Result<Intervention, ApiError> {
    repositories::interventions::find_by_id(state.db(), intervention_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch intervention"))?
        .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()).into())
}
