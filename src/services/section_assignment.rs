//! Load-balanced placement of students into the sections of a program.
//!
//! Every assignment runs in one transaction that row-locks the program's
//! active sections first, so the live approved-placement counts read
//! afterwards cannot change underneath the capacity check.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Section, SectionPlacement};
use crate::db::types::PlacementStatus;
use crate::repositories::sections::{SectionLoad, SectionStatsRow, UpdateSection};
use crate::services::grading::round_to;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SectionCapacity {
    pub(crate) section: String,
    pub(crate) enrolled: i64,
    pub(crate) max_students: i32,
}

#[derive(Debug, Error)]
pub(crate) enum AssignmentError {
    #[error("Program is required")]
    InvalidProgram,
    #[error("Program {0} not found")]
    ProgramNotFound(String),
    #[error("Student {0} not found")]
    StudentNotFound(String),
    #[error("Section {0} not found")]
    SectionNotFound(String),
    #[error("Section already exists in this program")]
    DuplicateSection,
    #[error("Section already has {enrolled} students, max_students cannot be {requested}")]
    CapacityBelowEnrollment { enrolled: i64, requested: i32 },
    #[error("Student has no academic record")]
    NoAcademicData,
    #[error("No sections available for {0}")]
    NoSectionsAvailable(String),
    #[error("All sections for {program} are full")]
    CapacityExceeded { program: String, sections: Vec<SectionCapacity> },
    #[error("placement store failure")]
    Store(#[from] sqlx::Error),
}

impl AssignmentError {
    /// Stable label used for metrics and logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProgram => "invalid_program",
            Self::ProgramNotFound(_) => "program_not_found",
            Self::StudentNotFound(_) => "student_not_found",
            Self::SectionNotFound(_) => "section_not_found",
            Self::DuplicateSection => "duplicate_section",
            Self::CapacityBelowEnrollment { .. } => "capacity_below_enrollment",
            Self::NoAcademicData => "no_academic_data",
            Self::NoSectionsAvailable(_) => "no_sections_available",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::Store(_) => "store_error",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Assignment {
    pub(crate) placement: SectionPlacement,
    pub(crate) section: Section,
    /// False when the student already held an approved seat in the program.
    pub(crate) changed: bool,
}

impl Assignment {
    pub(crate) fn message(&self) -> String {
        if self.changed {
            format!("Assigned to section {}", self.section.name)
        } else {
            format!("Already assigned to section {}", self.section.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FailedStudent {
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BulkAssignmentReport {
    pub(crate) success: bool,
    pub(crate) assigned: usize,
    pub(crate) failed: usize,
    pub(crate) failed_students: Vec<FailedStudent>,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SectionStatistics {
    pub(crate) section_id: String,
    pub(crate) name: String,
    pub(crate) program: String,
    pub(crate) max_students: i32,
    pub(crate) enrolled: i64,
    pub(crate) available: i64,
    pub(crate) capacity_percentage: f64,
    pub(crate) is_full: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StatisticsReport {
    pub(crate) total_capacity: i64,
    pub(crate) total_enrolled: i64,
    pub(crate) total_available: i64,
    pub(crate) sections: Vec<SectionStatistics>,
}

/// Trims and uppercases a program name; placements and programs store it that way.
pub(crate) fn normalize_program(program: &str) -> Result<String, AssignmentError> {
    let program = program.trim().to_uppercase();
    if program.is_empty() {
        return Err(AssignmentError::InvalidProgram);
    }
    Ok(program)
}

/// First section with spare capacity in the given (least loaded first) order.
pub(crate) fn pick_section<'a>(
    program: &str,
    loads: &'a [SectionLoad],
) -> Result<&'a SectionLoad, AssignmentError> {
    if loads.is_empty() {
        return Err(AssignmentError::NoSectionsAvailable(program.to_string()));
    }

    loads.iter().find(|load| load.enrolled < i64::from(load.max_students)).ok_or_else(|| {
        AssignmentError::CapacityExceeded {
            program: program.to_string(),
            sections: loads
                .iter()
                .map(|load| SectionCapacity {
                    section: load.name.clone(),
                    enrolled: load.enrolled,
                    max_students: load.max_students,
                })
                .collect(),
        }
    })
}

pub(crate) async fn assign_student_to_section(
    pool: &PgPool,
    student_id: &str,
    program: &str,
) -> Result<Assignment, AssignmentError> {
    let program = normalize_program(program)?;
    let result = assign_in_transaction(pool, student_id, &program).await;

    match &result {
        Ok(assignment) if assignment.changed => {
            metrics::record_section_assignment("assigned");
            tracing::info!(
                student_id,
                program = %program,
                section_id = %assignment.section.id,
                section = %assignment.section.name,
                enrolled = assignment.section.current_students,
                "Student assigned to section"
            );
        }
        Ok(_) => metrics::record_section_assignment("unchanged"),
        Err(AssignmentError::Store(err)) => {
            metrics::record_section_assignment("store_error");
            tracing::error!(
                student_id,
                program = %program,
                error = %err,
                "Section assignment failed"
            );
        }
        Err(err) => {
            metrics::record_section_assignment(err.kind());
            tracing::warn!(
                student_id,
                program = %program,
                reason = err.kind(),
                "Student not assigned"
            );
        }
    }

    result
}

async fn assign_in_transaction(
    pool: &PgPool,
    student_id: &str,
    program: &str,
) -> Result<Assignment, AssignmentError> {
    let mut tx = pool.begin().await?;

    let program_row = crate::repositories::programs::find_active_by_name(&mut *tx, program)
        .await?
        .ok_or_else(|| AssignmentError::ProgramNotFound(program.to_string()))?;

    crate::repositories::students::find_by_id(&mut *tx, student_id)
        .await?
        .ok_or_else(|| AssignmentError::StudentNotFound(student_id.to_string()))?;

    if crate::repositories::students::find_academic(&mut *tx, student_id).await?.is_none() {
        return Err(AssignmentError::NoAcademicData);
    }

    crate::repositories::sections::lock_active_for_program(&mut *tx, &program_row.id).await?;

    let existing =
        crate::repositories::placements::find_for_student(&mut *tx, student_id, program).await?;
    if let Some(placement) = existing.as_ref().filter(|p| p.status == PlacementStatus::Approved) {
        if let Some(section_id) = placement.section_id.as_deref() {
            if let Some(section) =
                crate::repositories::sections::find_by_id(&mut *tx, section_id).await?
            {
                tx.commit().await?;
                return Ok(Assignment { placement: placement.clone(), section, changed: false });
            }
        }
    }

    let loads = crate::repositories::sections::list_loads(&mut *tx, &program_row.id).await?;
    let target = pick_section(program, &loads)?;

    let now = primitive_now_utc();
    let placement_id = Uuid::new_v4().to_string();
    let placement = crate::repositories::placements::upsert_approved(
        &mut *tx,
        &placement_id,
        student_id,
        program,
        &target.id,
        now,
    )
    .await?;

    let section =
        crate::repositories::sections::refresh_current_students(&mut *tx, &target.id, now).await?;
    let previous_section = existing.and_then(|p| p.section_id).filter(|id| *id != section.id);
    if let Some(previous) = previous_section {
        crate::repositories::sections::refresh_current_students(&mut *tx, &previous, now).await?;
    }

    crate::repositories::students::sync_section_name(&mut *tx, student_id, now).await?;

    tx.commit().await?;
    Ok(Assignment { placement, section, changed: true })
}

/// Greedy placement of every pending request in the program, best average first.
pub(crate) async fn bulk_assign_students_by_ranking(
    pool: &PgPool,
    program: &str,
) -> Result<BulkAssignmentReport, AssignmentError> {
    let program = normalize_program(program)?;
    let pending = crate::repositories::placements::list_pending_ranked(pool, &program).await?;

    let mut assigned = 0;
    let mut failed_students = Vec::new();
    for candidate in &pending {
        match assign_student_to_section(pool, &candidate.student_id, &program).await {
            Ok(_) => assigned += 1,
            Err(err) => failed_students.push(FailedStudent {
                student_id: candidate.student_id.clone(),
                name: format!("{}, {}", candidate.last_name, candidate.first_name),
                reason: err.to_string(),
            }),
        }
    }

    let report = bulk_report(&program, assigned, failed_students);
    tracing::info!(
        program = %program,
        assigned = report.assigned,
        failed = report.failed,
        "Bulk section assignment finished"
    );
    Ok(report)
}

fn bulk_report(
    program: &str,
    assigned: usize,
    failed_students: Vec<FailedStudent>,
) -> BulkAssignmentReport {
    let failed = failed_students.len();
    let message = if assigned == 0 && failed == 0 {
        format!("No pending placements for {program}")
    } else {
        format!("Assigned {assigned} student(s) to {program} sections, {failed} failed")
    };

    BulkAssignmentReport { success: failed == 0, assigned, failed, failed_students, message }
}

/// Drops the student's placements and frees their seats.
pub(crate) async fn unassign_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<u64, AssignmentError> {
    let mut tx = pool.begin().await?;

    crate::repositories::students::find_by_id(&mut *tx, student_id)
        .await?
        .ok_or_else(|| AssignmentError::StudentNotFound(student_id.to_string()))?;

    let placements =
        crate::repositories::placements::list_for_student(&mut *tx, student_id).await?;
    let removed = crate::repositories::placements::delete_for_student(&mut *tx, student_id).await?;

    let now = primitive_now_utc();
    for section_id in placements.iter().filter_map(|p| p.section_id.as_deref()) {
        crate::repositories::sections::refresh_current_students(&mut *tx, section_id, now).await?;
    }
    crate::repositories::students::sync_section_name(&mut *tx, student_id, now).await?;

    tx.commit().await?;
    tracing::info!(student_id, removed, "Student unassigned");
    Ok(removed)
}

/// Marks the placement rejected, releasing its seat when it was approved.
///
/// The student's `section_name` falls back to their latest remaining
/// approved placement in another program.
pub(crate) async fn reject_placement(
    pool: &PgPool,
    placement: &SectionPlacement,
) -> Result<SectionPlacement, AssignmentError> {
    let mut tx = pool.begin().await?;
    let now = primitive_now_utc();

    let rejected =
        crate::repositories::placements::set_rejected(&mut *tx, &placement.id, now).await?;
    if placement.status == PlacementStatus::Approved {
        if let Some(section_id) = placement.section_id.as_deref() {
            crate::repositories::sections::refresh_current_students(&mut *tx, section_id, now)
                .await?;
            crate::repositories::students::sync_section_name(
                &mut *tx,
                &placement.student_id,
                now,
            )
            .await?;
        }
    }

    tx.commit().await?;
    tracing::info!(
        placement_id = %placement.id,
        student_id = %placement.student_id,
        "Placement rejected"
    );
    Ok(rejected)
}

/// Edits a section while holding its row lock, the same lock assignment
/// takes, so capacity can never drop below the approved count. A rename is
/// carried onto every student seated in the section.
pub(crate) async fn update_section(
    pool: &PgPool,
    section_id: &str,
    params: UpdateSection,
) -> Result<Section, AssignmentError> {
    let mut tx = pool.begin().await?;
    let current = crate::repositories::sections::lock_by_id(&mut *tx, section_id)
        .await?
        .ok_or_else(|| AssignmentError::SectionNotFound(section_id.to_string()))?;

    let requested = params.max_students;
    let renamed = params.name.as_deref().is_some_and(|name| name != current.name);
    let updated = crate::repositories::sections::update(&mut *tx, section_id, params)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AssignmentError::DuplicateSection
            }
            _ => AssignmentError::Store(err),
        })?;
    let Some(section) = updated else {
        let enrolled = crate::repositories::sections::count_approved(&mut *tx, section_id).await?;
        return Err(AssignmentError::CapacityBelowEnrollment {
            enrolled,
            requested: requested.unwrap_or(current.max_students),
        });
    };

    if renamed {
        let students = crate::repositories::students::sync_section_names_for_section(
            &mut *tx,
            section_id,
            section.updated_at,
        )
        .await?;
        tracing::info!(
            section_id,
            from = %current.name,
            to = %section.name,
            students,
            "Section renamed"
        );
    }

    tx.commit().await?;
    Ok(section)
}

pub(crate) async fn section_statistics(
    pool: &PgPool,
    program: Option<&str>,
) -> Result<StatisticsReport, AssignmentError> {
    let program_id = match program {
        Some(name) => {
            let name = normalize_program(name)?;
            match crate::repositories::programs::find_by_name(pool, &name).await? {
                Some(row) => Some(row.id),
                None => return Ok(build_statistics(Vec::new())),
            }
        }
        None => None,
    };

    let rows = crate::repositories::sections::statistics(pool, program_id.as_deref()).await?;
    Ok(build_statistics(rows))
}

fn build_statistics(rows: Vec<SectionStatsRow>) -> StatisticsReport {
    let sections: Vec<SectionStatistics> = rows
        .into_iter()
        .map(|row| {
            let max_students = i64::from(row.max_students);
            let capacity_percentage = if max_students > 0 {
                round_to(row.enrolled as f64 / max_students as f64 * 100.0, 1)
            } else {
                0.0
            };
            SectionStatistics {
                section_id: row.id,
                name: row.name,
                program: row.program,
                max_students: row.max_students,
                enrolled: row.enrolled,
                available: (max_students - row.enrolled).max(0),
                capacity_percentage,
                is_full: row.enrolled >= max_students,
            }
        })
        .collect();

    StatisticsReport {
        total_capacity: sections.iter().map(|s| i64::from(s.max_students)).sum(),
        total_enrolled: sections.iter().map(|s| s.enrolled).sum(),
        total_available: sections.iter().map(|s| s.available).sum(),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(id: &str, name: &str, enrolled: i64, max_students: i32) -> SectionLoad {
        SectionLoad { id: id.to_string(), name: name.to_string(), max_students, enrolled }
    }

    #[test]
    fn normalize_program_trims_and_uppercases() {
        assert_eq!(normalize_program("  ste ").unwrap(), "STE");
        assert!(matches!(normalize_program("   "), Err(AssignmentError::InvalidProgram)));
    }

    #[test]
    fn picks_least_loaded_section() {
        let loads = vec![load("s1", "Rizal", 3, 10), load("s2", "Bonifacio", 7, 10)];
        let picked = pick_section("STE", &loads).unwrap();
        assert_eq!(picked.id, "s1");
    }

    #[test]
    fn skips_full_sections_in_load_order() {
        let loads = vec![load("s1", "Small", 5, 5), load("s2", "Large", 8, 40)];
        let picked = pick_section("STE", &loads).unwrap();
        assert_eq!(picked.id, "s2");
    }

    #[test]
    fn all_full_reports_capacity() {
        let loads = vec![load("s1", "Rizal", 10, 10), load("s2", "Bonifacio", 10, 10)];
        let err = pick_section("STE", &loads).unwrap_err();
        match err {
            AssignmentError::CapacityExceeded { program, sections } => {
                assert_eq!(program, "STE");
                assert_eq!(sections.len(), 2);
                assert_eq!(sections[0].section, "Rizal");
                assert_eq!(sections[0].enrolled, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_sections_is_distinct_from_full() {
        let err = pick_section("SPA", &[]).unwrap_err();
        assert!(matches!(err, AssignmentError::NoSectionsAvailable(ref p) if p == "SPA"));
        assert_eq!(err.kind(), "no_sections_available");
    }

    #[test]
    fn empty_bulk_run_reports_nothing_to_do() {
        let report = bulk_report("STE", 0, Vec::new());
        assert!(report.success);
        assert_eq!(report.assigned, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.message, "No pending placements for STE");
    }

    #[test]
    fn bulk_report_fails_when_any_student_failed() {
        let failed = vec![FailedStudent {
            student_id: "st-1".to_string(),
            name: "Dela Cruz, Juan".to_string(),
            reason: AssignmentError::NoAcademicData.to_string(),
        }];
        let report = bulk_report("STE", 3, failed);
        assert!(!report.success);
        assert_eq!(report.assigned, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_students[0].reason, "Student has no academic record");
    }

    #[test]
    fn statistics_compute_fill_and_totals() {
        let rows = vec![
            SectionStatsRow {
                id: "s1".to_string(),
                name: "Rizal".to_string(),
                program: "STE".to_string(),
                max_students: 40,
                enrolled: 13,
            },
            SectionStatsRow {
                id: "s2".to_string(),
                name: "Bonifacio".to_string(),
                program: "STE".to_string(),
                max_students: 30,
                enrolled: 30,
            },
        ];

        let report = build_statistics(rows);
        assert_eq!(report.total_capacity, 70);
        assert_eq!(report.total_enrolled, 43);
        assert_eq!(report.total_available, 27);
        assert_eq!(report.sections[0].capacity_percentage, 32.5);
        assert!(!report.sections[0].is_full);
        assert!(report.sections[1].is_full);
        assert_eq!(report.sections[1].available, 0);
    }
}
