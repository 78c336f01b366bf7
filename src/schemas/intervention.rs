use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{Intervention, InterventionAction, InterventionUpdate};
use crate::db::types::{
    ActionStatus, InterventionTier, InterventionType, ProgressStatus, Quarter, RiskLevel,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EvaluateRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    pub(crate) quarter: Quarter,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
    #[validate(length(min = 1, message = "created_by must not be empty"))]
    pub(crate) created_by: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateResponse {
    pub(crate) outcome: &'static str,
    pub(crate) needs_intervention: bool,
    pub(crate) risk_level: RiskLevel,
    pub(crate) reasons: Vec<String>,
    pub(crate) intervention: Option<InterventionResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionRefreshRequest {
    pub(crate) quarter: Quarter,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
    #[validate(length(min = 1, message = "created_by must not be empty"))]
    pub(crate) created_by: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterventionListQuery {
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    #[serde(default)]
    pub(crate) quarter: Option<Quarter>,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
    #[serde(default)]
    pub(crate) active_only: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct InterventionCreate {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default = "default_intervention_type")]
    pub(crate) intervention_type: InterventionType,
    pub(crate) quarter: Quarter,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
    #[serde(default)]
    pub(crate) reason: Option<String>,
    #[serde(default)]
    pub(crate) smart_goal: Option<String>,
    #[validate(length(min = 1, message = "created_by must not be empty"))]
    pub(crate) created_by: String,
}

fn default_intervention_type() -> InterventionType {
    InterventionType::General
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ActionCreate {
    #[serde(default)]
    pub(crate) tier: Option<InterventionTier>,
    #[serde(default = "default_action_type")]
    pub(crate) action_type: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1..200 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) start_date: Option<String>,
    #[serde(default)]
    pub(crate) target_date: Option<String>,
    #[validate(length(min = 1, message = "handled_by must not be empty"))]
    pub(crate) handled_by: String,
}

fn default_action_type() -> String {
    "Other".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionUpdate {
    #[serde(default)]
    pub(crate) status: Option<ActionStatus>,
    #[serde(default)]
    pub(crate) target_date: Option<String>,
    #[serde(default)]
    pub(crate) completion_date: Option<String>,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    #[serde(default)]
    pub(crate) was_successful: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressUpdateCreate {
    #[serde(default)]
    pub(crate) update_date: Option<String>,
    pub(crate) status: ProgressStatus,
    #[serde(default)]
    pub(crate) note: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EscalateRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
    #[validate(length(min = 1, message = "handled_by must not be empty"))]
    pub(crate) handled_by: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryQuery {
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    pub(crate) quarter: Quarter,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InterventionResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) section_id: String,
    pub(crate) subject: Option<String>,
    pub(crate) intervention_type: InterventionType,
    pub(crate) quarter: Quarter,
    pub(crate) school_year: String,
    pub(crate) reason: String,
    pub(crate) smart_goal: String,
    pub(crate) risk_level: RiskLevel,
    pub(crate) current_tier: InterventionTier,
    pub(crate) current_grade: i32,
    pub(crate) total_absences: i32,
    pub(crate) missing_written_works: i32,
    pub(crate) missing_performance_tasks: i32,
    pub(crate) missed_quarterly_assessment: bool,
    pub(crate) reasons: Vec<String>,
    pub(crate) last_status: Option<ProgressStatus>,
    pub(crate) is_active: bool,
    pub(crate) is_resolved: bool,
    pub(crate) resolved_at: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl InterventionResponse {
    pub(crate) fn from_db(item: Intervention) -> Self {
        Self {
            id: item.id,
            student_id: item.student_id,
            section_id: item.section_id,
            subject: item.subject,
            intervention_type: item.intervention_type,
            quarter: item.quarter,
            school_year: item.school_year,
            reason: item.reason,
            smart_goal: item.smart_goal,
            risk_level: item.risk_level,
            current_tier: item.current_tier,
            current_grade: item.current_grade,
            total_absences: item.total_absences,
            missing_written_works: item.missing_written_works,
            missing_performance_tasks: item.missing_performance_tasks,
            missed_quarterly_assessment: item.missed_quarterly_assessment,
            reasons: item.reasons,
            last_status: item.last_status,
            is_active: item.is_active,
            is_resolved: item.is_resolved,
            resolved_at: item.resolved_at.map(format_primitive),
            created_by: item.created_by,
            created_at: format_primitive(item.created_at),
            updated_at: format_primitive(item.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionResponse {
    pub(crate) id: String,
    pub(crate) intervention_id: String,
    pub(crate) tier: InterventionTier,
    pub(crate) action_type: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) start_date: String,
    pub(crate) target_date: Option<String>,
    pub(crate) completion_date: Option<String>,
    pub(crate) status: ActionStatus,
    pub(crate) notes: String,
    pub(crate) was_successful: Option<bool>,
    pub(crate) handled_by: String,
}

impl ActionResponse {
    pub(crate) fn from_db(action: InterventionAction) -> Self {
        Self {
            id: action.id,
            intervention_id: action.intervention_id,
            tier: action.tier,
            action_type: action.action_type,
            name: action.name,
            description: action.description,
            start_date: format_date(action.start_date),
            target_date: action.target_date.map(format_date),
            completion_date: action.completion_date.map(format_date),
            status: action.status,
            notes: action.notes,
            was_successful: action.was_successful,
            handled_by: action.handled_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressUpdateResponse {
    pub(crate) id: String,
    pub(crate) intervention_id: String,
    pub(crate) update_date: String,
    pub(crate) status: ProgressStatus,
    pub(crate) note: String,
}

impl ProgressUpdateResponse {
    pub(crate) fn from_db(update: InterventionUpdate) -> Self {
        Self {
            id: update.id,
            intervention_id: update.intervention_id,
            update_date: format_date(update.update_date),
            status: update.status,
            note: update.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct InterventionDetailResponse {
    pub(crate) intervention: InterventionResponse,
    pub(crate) actions: Vec<ActionResponse>,
    pub(crate) updates: Vec<ProgressUpdateResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EscalateResponse {
    pub(crate) intervention: InterventionResponse,
    pub(crate) action: ActionResponse,
}
