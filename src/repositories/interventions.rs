use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Intervention, InterventionAction, InterventionUpdate};
use crate::db::types::{
    ActionStatus, InterventionTier, InterventionType, ProgressStatus, Quarter, RiskLevel,
};

const COLUMNS: &str = "\
    id, student_id, section_id, subject, intervention_type, quarter, school_year, reason, \
    smart_goal, risk_level, current_tier, current_grade, total_absences, \
    missing_written_works, missing_performance_tasks, missed_quarterly_assessment, reasons, \
    last_status, is_active, is_resolved, resolved_at, created_by, created_at, updated_at";

const ACTION_COLUMNS: &str = "\
    id, intervention_id, tier, action_type, name, description, start_date, target_date, \
    completion_date, status, notes, was_successful, handled_by, created_at, updated_at";

const UPDATE_COLUMNS: &str = "id, intervention_id, update_date, status, note, created_at";

/// Detection metrics written on create and on every refresh.
pub(crate) struct RiskSnapshot<'a> {
    pub reason: &'a str,
    pub reasons: &'a [String],
    pub risk_level: RiskLevel,
    pub current_tier: InterventionTier,
    pub current_grade: i32,
    pub total_absences: i32,
    pub missing_written_works: i32,
    pub missing_performance_tasks: i32,
    pub missed_quarterly_assessment: bool,
}

pub(crate) struct CreateIntervention<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub section_id: &'a str,
    pub subject: Option<&'a str>,
    pub intervention_type: InterventionType,
    pub quarter: Quarter,
    pub school_year: &'a str,
    pub smart_goal: &'a str,
    pub created_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
    pub snapshot: RiskSnapshot<'a>,
}

pub(crate) struct CreateAction<'a> {
    pub id: &'a str,
    pub intervention_id: &'a str,
    pub tier: InterventionTier,
    pub action_type: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub start_date: time::Date,
    pub target_date: Option<time::Date>,
    pub status: ActionStatus,
    pub handled_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateAction {
    pub status: Option<ActionStatus>,
    pub target_date: Option<time::Date>,
    pub completion_date: Option<time::Date>,
    pub notes: Option<String>,
    pub was_successful: Option<bool>,
    pub updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct ListInterventionsFilter {
    pub section_id: Option<String>,
    pub quarter: Option<Quarter>,
    pub school_year: Option<String>,
    pub active_only: bool,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    intervention_id: &str,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!("SELECT {COLUMNS} FROM interventions WHERE id = $1"))
        .bind(intervention_id)
        .fetch_optional(executor)
        .await
}

/// Row-locks the case until the transaction ends.
pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    intervention_id: &str,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "SELECT {COLUMNS} FROM interventions WHERE id = $1 FOR UPDATE"
    ))
    .bind(intervention_id)
    .fetch_optional(executor)
    .await
}

/// The open case for a student in a section, subject and quarter, if any.
pub(crate) async fn find_active_case(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    section_id: &str,
    subject: Option<&str>,
    quarter: Quarter,
    school_year: &str,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "SELECT {COLUMNS} FROM interventions
         WHERE student_id = $1 AND section_id = $2 AND subject IS NOT DISTINCT FROM $3
           AND quarter = $4 AND school_year = $5 AND is_active"
    ))
    .bind(student_id)
    .bind(section_id)
    .bind(subject)
    .bind(quarter)
    .bind(school_year)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateIntervention<'_>,
) -> Result<Intervention, sqlx::Error> {
    let snapshot = params.snapshot;
    sqlx::query_as::<_, Intervention>(&format!(
        "INSERT INTO interventions (
            id, student_id, section_id, subject, intervention_type, quarter, school_year,
            reason, smart_goal, risk_level, current_tier, current_grade, total_absences,
            missing_written_works, missing_performance_tasks, missed_quarterly_assessment,
            reasons, is_active, is_resolved, created_by, created_at, updated_at
        ) VALUES (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,TRUE,FALSE,$18,$19,$19
        )
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.section_id)
    .bind(params.subject)
    .bind(params.intervention_type)
    .bind(params.quarter)
    .bind(params.school_year)
    .bind(snapshot.reason)
    .bind(params.smart_goal)
    .bind(snapshot.risk_level)
    .bind(snapshot.current_tier)
    .bind(snapshot.current_grade)
    .bind(snapshot.total_absences)
    .bind(snapshot.missing_written_works)
    .bind(snapshot.missing_performance_tasks)
    .bind(snapshot.missed_quarterly_assessment)
    .bind(snapshot.reasons)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn refresh(
    executor: impl sqlx::PgExecutor<'_>,
    intervention_id: &str,
    snapshot: RiskSnapshot<'_>,
    updated_at: time::PrimitiveDateTime,
) -> Result<Intervention, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "UPDATE interventions SET
            reason = $1, reasons = $2, risk_level = $3, current_tier = $4,
            current_grade = $5, total_absences = $6, missing_written_works = $7,
            missing_performance_tasks = $8, missed_quarterly_assessment = $9, updated_at = $10
         WHERE id = $11
         RETURNING {COLUMNS}",
    ))
    .bind(snapshot.reason)
    .bind(snapshot.reasons)
    .bind(snapshot.risk_level)
    .bind(snapshot.current_tier)
    .bind(snapshot.current_grade)
    .bind(snapshot.total_absences)
    .bind(snapshot.missing_written_works)
    .bind(snapshot.missing_performance_tasks)
    .bind(snapshot.missed_quarterly_assessment)
    .bind(updated_at)
    .bind(intervention_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: ListInterventionsFilter,
) -> Result<Vec<Intervention>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM interventions WHERE 1=1"));

    if let Some(section_id) = filter.section_id {
        builder.push(" AND section_id = ");
        builder.push_bind(section_id);
    }
    if let Some(quarter) = filter.quarter {
        builder.push(" AND quarter = ");
        builder.push_bind(quarter);
    }
    if let Some(school_year) = filter.school_year {
        builder.push(" AND school_year = ");
        builder.push_bind(school_year);
    }
    if filter.active_only {
        builder.push(" AND is_active");
    }

    builder.push(" ORDER BY risk_level DESC, current_tier DESC, created_at DESC, id");
    builder.build_query_as::<Intervention>().fetch_all(pool).await
}

pub(crate) async fn set_resolved(
    pool: &PgPool,
    intervention_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "UPDATE interventions
         SET is_resolved = TRUE, is_active = FALSE, resolved_at = $1, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}",
    ))
    .bind(now)
    .bind(intervention_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_reactivated(
    pool: &PgPool,
    intervention_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "UPDATE interventions
         SET is_resolved = FALSE, is_active = TRUE, resolved_at = NULL, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}",
    ))
    .bind(now)
    .bind(intervention_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_tier(
    executor: impl sqlx::PgExecutor<'_>,
    intervention_id: &str,
    tier: InterventionTier,
    now: time::PrimitiveDateTime,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "UPDATE interventions SET current_tier = $1, updated_at = $2
         WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(tier)
    .bind(now)
    .bind(intervention_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn create_action(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAction<'_>,
) -> Result<InterventionAction, sqlx::Error> {
    sqlx::query_as::<_, InterventionAction>(&format!(
        "INSERT INTO intervention_actions (
            id, intervention_id, tier, action_type, name, description, start_date,
            target_date, status, handled_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
        RETURNING {ACTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.intervention_id)
    .bind(params.tier)
    .bind(params.action_type)
    .bind(params.name)
    .bind(params.description)
    .bind(params.start_date)
    .bind(params.target_date)
    .bind(params.status)
    .bind(params.handled_by)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update_action(
    pool: &PgPool,
    action_id: &str,
    params: UpdateAction,
) -> Result<Option<InterventionAction>, sqlx::Error> {
    sqlx::query_as::<_, InterventionAction>(&format!(
        "UPDATE intervention_actions SET
            status = COALESCE($1, status),
            target_date = COALESCE($2, target_date),
            completion_date = COALESCE($3, completion_date),
            notes = COALESCE($4, notes),
            was_successful = COALESCE($5, was_successful),
            updated_at = $6
         WHERE id = $7
         RETURNING {ACTION_COLUMNS}",
    ))
    .bind(params.status)
    .bind(params.target_date)
    .bind(params.completion_date)
    .bind(params.notes)
    .bind(params.was_successful)
    .bind(params.updated_at)
    .bind(action_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_actions(
    pool: &PgPool,
    intervention_id: &str,
) -> Result<Vec<InterventionAction>, sqlx::Error> {
    sqlx::query_as::<_, InterventionAction>(&format!(
        "SELECT {ACTION_COLUMNS} FROM intervention_actions
         WHERE intervention_id = $1
         ORDER BY start_date, created_at, id"
    ))
    .bind(intervention_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    intervention_id: &str,
    update_date: time::Date,
    status: ProgressStatus,
    note: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<InterventionUpdate, sqlx::Error> {
    sqlx::query_as::<_, InterventionUpdate>(&format!(
        "INSERT INTO intervention_updates (
            id, intervention_id, update_date, status, note, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {UPDATE_COLUMNS}",
    ))
    .bind(id)
    .bind(intervention_id)
    .bind(update_date)
    .bind(status)
    .bind(note)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_last_status(
    executor: impl sqlx::PgExecutor<'_>,
    intervention_id: &str,
    status: ProgressStatus,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE interventions SET last_status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(intervention_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn list_updates(
    pool: &PgPool,
    intervention_id: &str,
) -> Result<Vec<InterventionUpdate>, sqlx::Error> {
    sqlx::query_as::<_, InterventionUpdate>(&format!(
        "SELECT {UPDATE_COLUMNS} FROM intervention_updates
         WHERE intervention_id = $1
         ORDER BY update_date DESC, created_at DESC"
    ))
    .bind(intervention_id)
    .fetch_all(pool)
    .await
}
