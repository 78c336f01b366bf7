//! Academic and attendance risk detection for intervention cases.
//!
//! [`assess`] is the pure classifier. The async functions gather its inputs
//! from attendance and grade rows and keep at most one open case per student,
//! section, subject and quarter.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::{primitive_now_utc, today_utc};
use crate::db::models::{Intervention, InterventionAction, InterventionUpdate};
use crate::db::types::{
    ActionStatus, InterventionTier, InterventionType, ProgressStatus, Quarter, RiskLevel,
};
use crate::repositories::interventions::{CreateAction, CreateIntervention, RiskSnapshot};
use crate::services::grading::{self, round_to, PASSING_GRADE};

pub(crate) const CRITICAL_ABSENCES: u32 = 7;
pub(crate) const AT_RISK_ABSENCES: u32 = 5;
const CRITICAL_MISSING_WW: u32 = 4;
const CRITICAL_MISSING_PT: u32 = 3;
const AT_RISK_MISSING_WW: u32 = 2;
const AT_RISK_MISSING_PT: u32 = 2;

const ESCALATION_ACTION_TYPE: &str = "Parent Contact";
const ESCALATION_ACTION_NAME: &str = "Tier 3 Escalation - Parent Conference Required";
const ESCALATION_DEFAULT_DESCRIPTION: &str =
    "Previous tiers did not resolve the concern. \
     Schedule a conference with the parent or guardian.";

#[derive(Debug, Error)]
pub(crate) enum InterventionError {
    #[error("Intervention {0} not found")]
    NotFound(String),
    #[error("An active intervention already exists for this student, subject and quarter")]
    DuplicateActive,
    #[error("Intervention is already at Tier 3")]
    AlreadyEscalated,
    #[error("intervention store failure")]
    Store(#[from] sqlx::Error),
}

impl InterventionError {
    fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::DuplicateActive,
            _ => Self::Store(err),
        }
    }
}

/// Detection metrics for one student, section, subject and quarter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RiskInputs {
    pub(crate) total_absences: u32,
    pub(crate) missing_written_works: u32,
    pub(crate) missing_performance_tasks: u32,
    pub(crate) missed_quarterly_assessment: bool,
    /// Transmuted quarterly grade; 0 when no grade row exists yet.
    pub(crate) current_grade: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RiskAssessment {
    pub(crate) needs_intervention: bool,
    pub(crate) risk_level: RiskLevel,
    pub(crate) reasons: Vec<String>,
}

/// Critical checks run first; the at-risk checks only apply when nothing
/// critical was found. A failing grade is always reported.
pub(crate) fn assess(inputs: &RiskInputs) -> RiskAssessment {
    let mut risk_level = RiskLevel::OnTrack;
    let mut reasons = Vec::new();
    let mut raise = |level: RiskLevel, reason: String, current: &mut RiskLevel| {
        *current = (*current).max(level);
        reasons.push(reason);
    };

    let absences = inputs.total_absences;
    let missing_ww = inputs.missing_written_works;
    let missing_pt = inputs.missing_performance_tasks;

    if absences >= CRITICAL_ABSENCES {
        raise(RiskLevel::Critical, format!("Excessive absences: {absences}"), &mut risk_level);
    }
    if inputs.missed_quarterly_assessment {
        raise(RiskLevel::Critical, "Missed quarterly assessment".to_string(), &mut risk_level);
    }
    if missing_ww >= CRITICAL_MISSING_WW {
        raise(
            RiskLevel::Critical,
            format!("Too many missing written works: {missing_ww}"),
            &mut risk_level,
        );
    }
    if missing_pt >= CRITICAL_MISSING_PT {
        raise(
            RiskLevel::Critical,
            format!("Too many missing performance tasks: {missing_pt}"),
            &mut risk_level,
        );
    }

    if risk_level != RiskLevel::Critical {
        if absences >= AT_RISK_ABSENCES {
            raise(RiskLevel::AtRisk, format!("High absences: {absences}"), &mut risk_level);
        }
        if missing_ww >= AT_RISK_MISSING_WW {
            raise(
                RiskLevel::AtRisk,
                format!("Missing written works: {missing_ww}"),
                &mut risk_level,
            );
        }
        if missing_pt >= AT_RISK_MISSING_PT {
            raise(
                RiskLevel::AtRisk,
                format!("Missing performance tasks: {missing_pt}"),
                &mut risk_level,
            );
        }
        if missing_ww >= 1 && missing_pt >= 1 {
            raise(
                RiskLevel::AtRisk,
                "Missing both written works and performance tasks".to_string(),
                &mut risk_level,
            );
        }
    }

    let grade = inputs.current_grade;
    if grade > 0 && grade < PASSING_GRADE {
        raise(RiskLevel::AtRisk, format!("Failing grade: {grade}"), &mut risk_level);
    }

    RiskAssessment { needs_intervention: !reasons.is_empty(), risk_level, reasons }
}

/// Lowest tier a risk level calls for.
pub(crate) fn minimum_tier(risk_level: RiskLevel) -> InterventionTier {
    match risk_level {
        RiskLevel::Critical => InterventionTier::Tier2,
        RiskLevel::AtRisk | RiskLevel::OnTrack => InterventionTier::Tier1,
    }
}

/// Refreshes never lower a tier; Tier 3 is only reached through escalation.
pub(crate) fn next_tier(current: InterventionTier, risk_level: RiskLevel) -> InterventionTier {
    current.max(minimum_tier(risk_level))
}

fn classify_type(inputs: &RiskInputs) -> InterventionType {
    let academic = inputs.missing_written_works > 0
        || inputs.missing_performance_tasks > 0
        || inputs.missed_quarterly_assessment
        || (inputs.current_grade > 0 && inputs.current_grade < PASSING_GRADE);
    if academic {
        InterventionType::Academic
    } else {
        InterventionType::Attendance
    }
}

fn default_smart_goal(subject: Option<&str>, quarter: Quarter) -> String {
    match subject {
        Some(subject) => format!(
            "Submit all missing requirements in {subject} and reach a quarterly grade of at least \
             {PASSING_GRADE} by the end of {}.",
            quarter.as_str()
        ),
        None => format!(
            "Keep absences below {AT_RISK_ABSENCES} for the rest of {}.",
            quarter.as_str()
        ),
    }
}

fn snapshot<'a>(
    inputs: &RiskInputs,
    assessment: &'a RiskAssessment,
    reason: &'a str,
    current_tier: InterventionTier,
) -> RiskSnapshot<'a> {
    RiskSnapshot {
        reason,
        reasons: &assessment.reasons,
        risk_level: assessment.risk_level,
        current_tier,
        current_grade: i32::from(inputs.current_grade),
        total_absences: to_i32(inputs.total_absences),
        missing_written_works: to_i32(inputs.missing_written_works),
        missing_performance_tasks: to_i32(inputs.missing_performance_tasks),
        missed_quarterly_assessment: inputs.missed_quarterly_assessment,
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Identifies one intervention case.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CaseKey<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) section_id: &'a str,
    pub(crate) subject: Option<&'a str>,
    pub(crate) quarter: Quarter,
    pub(crate) school_year: &'a str,
}

pub(crate) async fn gather_inputs(
    pool: &PgPool,
    key: &CaseKey<'_>,
) -> Result<RiskInputs, sqlx::Error> {
    let absences = crate::repositories::attendance::total_absences(
        pool,
        key.student_id,
        key.section_id,
        key.quarter,
        key.school_year,
    )
    .await?;

    let mut inputs = RiskInputs {
        total_absences: u32::try_from(absences).unwrap_or(u32::MAX),
        ..RiskInputs::default()
    };

    let Some(subject) = key.subject else {
        return Ok(inputs);
    };
    let Some(record) = crate::repositories::class_records::find_for_subject(
        pool,
        key.section_id,
        subject,
        key.quarter,
        key.school_year,
    )
    .await?
    else {
        return Ok(inputs);
    };

    if let Some(grade) =
        crate::repositories::grades::find(pool, &record.id, key.student_id).await?
    {
        inputs.current_grade = u8::try_from(grade.quarterly_grade).unwrap_or(0);
        inputs.missing_written_works =
            grading::count_missing(&grade.ww_scores, &record.ww_hps) as u32;
        inputs.missing_performance_tasks =
            grading::count_missing(&grade.pt_scores, &record.pt_hps) as u32;
        inputs.missed_quarterly_assessment =
            grading::missed_quarterly_assessment(grade.qa_score, record.qa_hps);
    }

    Ok(inputs)
}

#[derive(Debug, Clone)]
pub(crate) enum SyncOutcome {
    Created(Intervention),
    Updated(Intervention),
    NotNeeded(RiskAssessment),
}

impl SyncOutcome {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::NotNeeded(_) => "not_needed",
        }
    }
}

/// Refreshes the open case when one exists, otherwise opens a case when the
/// student's metrics call for one.
pub(crate) async fn auto_create_intervention_if_needed(
    pool: &PgPool,
    key: &CaseKey<'_>,
    created_by: &str,
) -> Result<SyncOutcome, InterventionError> {
    let inputs = gather_inputs(pool, key).await?;
    let assessment = assess(&inputs);
    let now = primitive_now_utc();

    let existing = crate::repositories::interventions::find_active_case(
        pool,
        key.student_id,
        key.section_id,
        key.subject,
        key.quarter,
        key.school_year,
    )
    .await?;

    let outcome = if let Some(existing) = existing {
        let reason = assessment.reasons.join("; ");
        let tier = next_tier(existing.current_tier, assessment.risk_level);
        let updated = crate::repositories::interventions::refresh(
            pool,
            &existing.id,
            snapshot(&inputs, &assessment, &reason, tier),
            now,
        )
        .await?;
        SyncOutcome::Updated(updated)
    } else if assessment.needs_intervention {
        let reason = assessment.reasons.join("; ");
        let smart_goal = default_smart_goal(key.subject, key.quarter);
        let id = Uuid::new_v4().to_string();
        let created = crate::repositories::interventions::create(
            pool,
            CreateIntervention {
                id: &id,
                student_id: key.student_id,
                section_id: key.section_id,
                subject: key.subject,
                intervention_type: classify_type(&inputs),
                quarter: key.quarter,
                school_year: key.school_year,
                smart_goal: &smart_goal,
                created_by,
                created_at: now,
                snapshot: snapshot(
                    &inputs,
                    &assessment,
                    &reason,
                    minimum_tier(assessment.risk_level),
                ),
            },
        )
        .await
        .map_err(InterventionError::from_write)?;
        SyncOutcome::Created(created)
    } else {
        SyncOutcome::NotNeeded(assessment)
    };

    metrics::record_intervention_sync(outcome.label());
    if let SyncOutcome::Created(created) = &outcome {
        tracing::info!(
            intervention_id = %created.id,
            student_id = key.student_id,
            section_id = key.section_id,
            risk_level = created.risk_level.as_str(),
            "Intervention opened"
        );
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SectionRefreshReport {
    pub(crate) created: usize,
    pub(crate) updated: usize,
    pub(crate) total_students: usize,
    pub(crate) subjects_checked: usize,
    /// Subjects with an assigned teacher but no class record for the quarter.
    pub(crate) subjects_without_record: Vec<String>,
}

/// Assigned subjects that have no class record yet, in the order given.
fn missing_records(assigned: Vec<String>, recorded: &[String]) -> Vec<String> {
    assigned.into_iter().filter(|subject| !recorded.contains(subject)).collect()
}

/// Runs detection for every approved student against every subject that has
/// a class record in the section for the quarter.
pub(crate) async fn refresh_section(
    pool: &PgPool,
    section_id: &str,
    quarter: Quarter,
    school_year: &str,
    created_by: &str,
) -> Result<SectionRefreshReport, InterventionError> {
    let students =
        crate::repositories::placements::list_approved_students(pool, section_id).await?;
    let subjects =
        crate::repositories::class_records::list_subjects(pool, section_id, quarter, school_year)
            .await?;

    let assigned =
        crate::repositories::subject_assignments::list_subjects(pool, section_id).await?;

    let mut report = SectionRefreshReport {
        total_students: students.len(),
        subjects_checked: subjects.len(),
        subjects_without_record: missing_records(assigned, &subjects),
        ..SectionRefreshReport::default()
    };
    if !report.subjects_without_record.is_empty() {
        tracing::warn!(
            section_id,
            quarter = quarter.as_str(),
            subjects = ?report.subjects_without_record,
            "Assigned subjects have no class record"
        );
    }

    for student_id in &students {
        for subject in &subjects {
            let key = CaseKey {
                student_id,
                section_id,
                subject: Some(subject),
                quarter,
                school_year,
            };
            match auto_create_intervention_if_needed(pool, &key, created_by).await? {
                SyncOutcome::Created(_) => report.created += 1,
                SyncOutcome::Updated(_) => report.updated += 1,
                SyncOutcome::NotNeeded(_) => {}
            }
        }
    }

    tracing::info!(
        section_id,
        quarter = quarter.as_str(),
        created = report.created,
        updated = report.updated,
        "Section interventions refreshed"
    );
    Ok(report)
}

/// Manual case opened by an adviser; detection metrics are still filled in.
pub(crate) struct ManualCase<'a> {
    pub(crate) key: CaseKey<'a>,
    pub(crate) intervention_type: InterventionType,
    pub(crate) reason: Option<&'a str>,
    pub(crate) smart_goal: Option<&'a str>,
    pub(crate) created_by: &'a str,
}

pub(crate) async fn create_manual(
    pool: &PgPool,
    case: ManualCase<'_>,
) -> Result<Intervention, InterventionError> {
    let inputs = gather_inputs(pool, &case.key).await?;
    let assessment = assess(&inputs);
    let reason = case
        .reason
        .map(str::to_string)
        .unwrap_or_else(|| assessment.reasons.join("; "));
    let smart_goal = case
        .smart_goal
        .map(str::to_string)
        .unwrap_or_else(|| default_smart_goal(case.key.subject, case.key.quarter));

    let id = Uuid::new_v4().to_string();
    let created = crate::repositories::interventions::create(
        pool,
        CreateIntervention {
            id: &id,
            student_id: case.key.student_id,
            section_id: case.key.section_id,
            subject: case.key.subject,
            intervention_type: case.intervention_type,
            quarter: case.key.quarter,
            school_year: case.key.school_year,
            smart_goal: &smart_goal,
            created_by: case.created_by,
            created_at: primitive_now_utc(),
            snapshot: snapshot(&inputs, &assessment, &reason, minimum_tier(assessment.risk_level)),
        },
    )
    .await
    .map_err(InterventionError::from_write)?;

    tracing::info!(
        intervention_id = %created.id,
        student_id = %created.student_id,
        "Intervention created"
    );
    Ok(created)
}

pub(crate) async fn resolve(
    pool: &PgPool,
    intervention_id: &str,
) -> Result<Intervention, InterventionError> {
    let resolved = crate::repositories::interventions::set_resolved(
        pool,
        intervention_id,
        primitive_now_utc(),
    )
    .await?
    .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()))?;
    tracing::info!(intervention_id, "Intervention resolved");
    Ok(resolved)
}

/// Reopens a resolved case and re-runs detection on it.
pub(crate) async fn reactivate(
    pool: &PgPool,
    intervention_id: &str,
) -> Result<Intervention, InterventionError> {
    let reopened = crate::repositories::interventions::set_reactivated(
        pool,
        intervention_id,
        primitive_now_utc(),
    )
    .await
    .map_err(InterventionError::from_write)?
    .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()))?;

    let key = CaseKey {
        student_id: &reopened.student_id,
        section_id: &reopened.section_id,
        subject: reopened.subject.as_deref(),
        quarter: reopened.quarter,
        school_year: &reopened.school_year,
    };
    let inputs = gather_inputs(pool, &key).await?;
    let assessment = assess(&inputs);
    let reason = if assessment.reasons.is_empty() {
        reopened.reason.clone()
    } else {
        assessment.reasons.join("; ")
    };
    let tier = next_tier(reopened.current_tier, assessment.risk_level);
    let refreshed = crate::repositories::interventions::refresh(
        pool,
        &reopened.id,
        snapshot(&inputs, &assessment, &reason, tier),
        primitive_now_utc(),
    )
    .await?;

    tracing::info!(intervention_id, "Intervention reactivated");
    Ok(refreshed)
}

/// Moves the case to Tier 3 and schedules a parent conference.
///
/// The case row stays locked until commit, so only one escalation can pass
/// the Tier 3 check.
pub(crate) async fn escalate(
    pool: &PgPool,
    intervention_id: &str,
    reason: Option<&str>,
    handled_by: &str,
) -> Result<(Intervention, InterventionAction), InterventionError> {
    let mut tx = pool.begin().await?;
    let current = crate::repositories::interventions::lock_by_id(&mut *tx, intervention_id)
        .await?
        .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()))?;
    if current.current_tier == InterventionTier::Tier3 {
        return Err(InterventionError::AlreadyEscalated);
    }

    let now = primitive_now_utc();
    let escalated = crate::repositories::interventions::set_tier(
        &mut *tx,
        intervention_id,
        InterventionTier::Tier3,
        now,
    )
    .await?
    .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()))?;

    let action_id = Uuid::new_v4().to_string();
    let action = crate::repositories::interventions::create_action(
        &mut *tx,
        CreateAction {
            id: &action_id,
            intervention_id,
            tier: InterventionTier::Tier3,
            action_type: ESCALATION_ACTION_TYPE,
            name: ESCALATION_ACTION_NAME,
            description: reason
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(ESCALATION_DEFAULT_DESCRIPTION),
            start_date: today_utc(),
            target_date: None,
            status: ActionStatus::Planned,
            handled_by,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(
        intervention_id,
        student_id = %escalated.student_id,
        "Intervention escalated to Tier 3"
    );
    Ok((escalated, action))
}

/// Records a progress note and mirrors its status onto the case.
pub(crate) async fn record_update(
    pool: &PgPool,
    intervention_id: &str,
    update_date: time::Date,
    status: ProgressStatus,
    note: &str,
) -> Result<InterventionUpdate, InterventionError> {
    let mut tx = pool.begin().await?;
    crate::repositories::interventions::find_by_id(&mut *tx, intervention_id)
        .await?
        .ok_or_else(|| InterventionError::NotFound(intervention_id.to_string()))?;

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let update = crate::repositories::interventions::create_update(
        &mut *tx,
        &id,
        intervention_id,
        update_date,
        status,
        note,
        now,
    )
    .await?;
    crate::repositories::interventions::set_last_status(&mut *tx, intervention_id, status, now)
        .await?;

    tx.commit().await?;
    Ok(update)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub(crate) struct InterventionSummary {
    pub(crate) total_interventions: usize,
    pub(crate) critical_count: usize,
    pub(crate) at_risk_count: usize,
    pub(crate) tier_1_count: usize,
    pub(crate) tier_2_count: usize,
    pub(crate) tier_3_count: usize,
    pub(crate) resolved_count: usize,
    pub(crate) avg_absences: f64,
    pub(crate) avg_grade: f64,
}

/// Counts open cases by risk and tier; resolved cases are only counted.
pub(crate) fn summarize(interventions: &[Intervention]) -> InterventionSummary {
    let mut summary = InterventionSummary::default();
    let mut absences = 0.0;
    let mut grades = 0.0;

    for item in interventions {
        if item.is_resolved {
            summary.resolved_count += 1;
        }
        if !item.is_active {
            continue;
        }

        summary.total_interventions += 1;
        match item.risk_level {
            RiskLevel::Critical => summary.critical_count += 1,
            RiskLevel::AtRisk => summary.at_risk_count += 1,
            RiskLevel::OnTrack => {}
        }
        match item.current_tier {
            InterventionTier::Tier1 => summary.tier_1_count += 1,
            InterventionTier::Tier2 => summary.tier_2_count += 1,
            InterventionTier::Tier3 => summary.tier_3_count += 1,
        }
        absences += f64::from(item.total_absences);
        grades += f64::from(item.current_grade);
    }

    if summary.total_interventions > 0 {
        let open = summary.total_interventions as f64;
        summary.avg_absences = round_to(absences / open, 2);
        summary.avg_grade = round_to(grades / open, 2);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn inputs() -> RiskInputs {
        RiskInputs::default()
    }

    fn intervention(risk_level: RiskLevel, tier: InterventionTier, active: bool) -> Intervention {
        let now = datetime!(2025-09-01 08:00);
        Intervention {
            id: Uuid::new_v4().to_string(),
            student_id: "st-1".to_string(),
            section_id: "sec-1".to_string(),
            subject: Some("Mathematics".to_string()),
            intervention_type: InterventionType::Academic,
            quarter: Quarter::Q1,
            school_year: "2025-2026".to_string(),
            reason: String::new(),
            smart_goal: String::new(),
            risk_level,
            current_tier: tier,
            current_grade: 72,
            total_absences: 4,
            missing_written_works: 0,
            missing_performance_tasks: 0,
            missed_quarterly_assessment: false,
            reasons: Vec::new(),
            last_status: None,
            is_active: active,
            is_resolved: !active,
            resolved_at: None,
            created_by: "adviser".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn seven_absences_is_critical() {
        let assessment = assess(&RiskInputs { total_absences: 7, ..inputs() });
        assert!(assessment.needs_intervention);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.reasons, vec!["Excessive absences: 7".to_string()]);
    }

    #[test]
    fn two_missing_written_works_is_at_risk() {
        let assessment = assess(&RiskInputs { missing_written_works: 2, ..inputs() });
        assert!(assessment.needs_intervention);
        assert_eq!(assessment.risk_level, RiskLevel::AtRisk);
        assert_eq!(assessment.reasons, vec!["Missing written works: 2".to_string()]);
    }

    #[test]
    fn clean_record_is_on_track() {
        let assessment = assess(&RiskInputs { total_absences: 4, current_grade: 88, ..inputs() });
        assert!(!assessment.needs_intervention);
        assert_eq!(assessment.risk_level, RiskLevel::OnTrack);
        assert!(assessment.reasons.is_empty());
    }

    #[test]
    fn critical_suppresses_at_risk_reasons() {
        let assessment = assess(&RiskInputs {
            total_absences: 8,
            missing_written_works: 2,
            missing_performance_tasks: 1,
            ..inputs()
        });
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.reasons, vec!["Excessive absences: 8".to_string()]);
    }

    #[test]
    fn collects_every_critical_reason() {
        let assessment = assess(&RiskInputs {
            missed_quarterly_assessment: true,
            missing_written_works: 4,
            missing_performance_tasks: 3,
            ..inputs()
        });
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(
            assessment.reasons,
            vec![
                "Missed quarterly assessment".to_string(),
                "Too many missing written works: 4".to_string(),
                "Too many missing performance tasks: 3".to_string(),
            ]
        );
    }

    #[test]
    fn one_missing_item_of_each_kind_is_at_risk() {
        let assessment = assess(&RiskInputs {
            missing_written_works: 1,
            missing_performance_tasks: 1,
            ..inputs()
        });
        assert_eq!(assessment.risk_level, RiskLevel::AtRisk);
        assert_eq!(
            assessment.reasons,
            vec!["Missing both written works and performance tasks".to_string()]
        );
    }

    #[test]
    fn failing_grade_lifts_on_track_but_never_lowers_critical() {
        let failing = assess(&RiskInputs { current_grade: 72, ..inputs() });
        assert_eq!(failing.risk_level, RiskLevel::AtRisk);
        assert_eq!(failing.reasons, vec!["Failing grade: 72".to_string()]);

        let critical = assess(&RiskInputs { total_absences: 9, current_grade: 70, ..inputs() });
        assert_eq!(critical.risk_level, RiskLevel::Critical);
        assert_eq!(critical.reasons.len(), 2);
        assert_eq!(critical.reasons[1], "Failing grade: 70");
    }

    #[test]
    fn ungraded_student_is_not_failing() {
        let assessment = assess(&RiskInputs { current_grade: 0, ..inputs() });
        assert!(!assessment.needs_intervention);
    }

    #[test]
    fn tiers_follow_risk_and_never_drop() {
        assert_eq!(minimum_tier(RiskLevel::AtRisk), InterventionTier::Tier1);
        assert_eq!(minimum_tier(RiskLevel::Critical), InterventionTier::Tier2);
        assert_eq!(
            next_tier(InterventionTier::Tier1, RiskLevel::Critical),
            InterventionTier::Tier2
        );
        assert_eq!(next_tier(InterventionTier::Tier2, RiskLevel::AtRisk), InterventionTier::Tier2);
        assert_eq!(
            next_tier(InterventionTier::Tier3, RiskLevel::OnTrack),
            InterventionTier::Tier3
        );
    }

    #[test]
    fn absence_only_cases_are_attendance_interventions() {
        assert_eq!(
            classify_type(&RiskInputs { total_absences: 6, ..inputs() }),
            InterventionType::Attendance
        );
        assert_eq!(
            classify_type(&RiskInputs { total_absences: 6, missing_written_works: 1, ..inputs() }),
            InterventionType::Academic
        );
    }

    #[test]
    fn summary_counts_open_cases() {
        let interventions = vec![
            intervention(RiskLevel::Critical, InterventionTier::Tier2, true),
            intervention(RiskLevel::AtRisk, InterventionTier::Tier1, true),
            intervention(RiskLevel::AtRisk, InterventionTier::Tier3, true),
            intervention(RiskLevel::Critical, InterventionTier::Tier2, false),
        ];

        let summary = summarize(&interventions);
        assert_eq!(summary.total_interventions, 3);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.at_risk_count, 2);
        assert_eq!(summary.tier_1_count, 1);
        assert_eq!(summary.tier_2_count, 1);
        assert_eq!(summary.tier_3_count, 1);
        assert_eq!(summary.resolved_count, 1);
        assert_eq!(summary.avg_absences, 4.0);
        assert_eq!(summary.avg_grade, 72.0);
    }

    #[test]
    fn assigned_subjects_without_records_are_reported() {
        let recorded = vec!["English".to_string(), "Mathematics".to_string()];
        let assigned = vec!["Filipino".to_string(), "Mathematics".to_string(), "MAPEH".to_string()];
        assert_eq!(
            missing_records(assigned, &recorded),
            vec!["Filipino".to_string(), "MAPEH".to_string()]
        );
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(summarize(&[]), InterventionSummary::default());
    }
}
