use serde::Serialize;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime, Time};

use crate::db::types::{
    ActionStatus, InterventionTier, InterventionType, PlacementStatus, ProgressStatus, Quarter,
    RiskLevel, ScheduleDay,
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Program {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) school_year: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Section {
    pub(crate) id: String,
    pub(crate) program_id: String,
    pub(crate) name: String,
    pub(crate) adviser_name: Option<String>,
    pub(crate) max_students: i32,
    pub(crate) current_students: i32,
    pub(crate) building: Option<String>,
    pub(crate) room: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) lrn: String,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) middle_name: Option<String>,
    pub(crate) sex: String,
    pub(crate) birth_date: Option<Date>,
    pub(crate) address: Option<String>,
    pub(crate) is_transferee: bool,
    pub(crate) is_balik_aral: bool,
    pub(crate) is_4ps_member: bool,
    pub(crate) is_sped: bool,
    pub(crate) section_name: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Student {
    /// `Last, First Middle` as printed on school forms.
    pub(crate) fn display_name(&self) -> String {
        match self.middle_name.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(middle) => format!("{}, {} {}", self.last_name, self.first_name, middle),
            None => format!("{}, {}", self.last_name, self.first_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct StudentAcademic {
    pub(crate) student_id: String,
    pub(crate) dost_exam_result: String,
    pub(crate) mathematics: f64,
    pub(crate) araling_panlipunan: f64,
    pub(crate) english: f64,
    pub(crate) edukasyon_pagpapakatao: f64,
    pub(crate) science: f64,
    pub(crate) edukasyon_pangkabuhayan: f64,
    pub(crate) filipino: f64,
    pub(crate) mapeh: f64,
    pub(crate) overall_average: Option<f64>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct SectionPlacement {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) program: String,
    pub(crate) section_id: Option<String>,
    pub(crate) status: PlacementStatus,
    pub(crate) placed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct ClassRecord {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) subject: String,
    pub(crate) teacher_name: String,
    pub(crate) quarter: Quarter,
    pub(crate) school_year: String,
    pub(crate) ww_weight: i32,
    pub(crate) pt_weight: i32,
    pub(crate) qa_weight: i32,
    pub(crate) ww_hps: Vec<i32>,
    pub(crate) pt_hps: Vec<i32>,
    pub(crate) qa_hps: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct StudentGrade {
    pub(crate) id: String,
    pub(crate) class_record_id: String,
    pub(crate) student_id: String,
    pub(crate) ww_scores: Vec<f64>,
    pub(crate) pt_scores: Vec<f64>,
    pub(crate) qa_score: f64,
    pub(crate) ww_total: f64,
    pub(crate) ww_percentage: f64,
    pub(crate) ww_weighted: f64,
    pub(crate) pt_total: f64,
    pub(crate) pt_percentage: f64,
    pub(crate) pt_weighted: f64,
    pub(crate) qa_percentage: f64,
    pub(crate) qa_weighted: f64,
    pub(crate) initial_grade: f64,
    pub(crate) quarterly_grade: i32,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct AttendanceRecord {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) school_year: String,
    pub(crate) quarter: Quarter,
    pub(crate) month: i32,
    pub(crate) year: i32,
    pub(crate) school_name: String,
    pub(crate) school_id: String,
    pub(crate) grade_level: String,
    pub(crate) adviser_name: Option<String>,
    pub(crate) total_days: i32,
    pub(crate) late_enrollees_male: i32,
    pub(crate) late_enrollees_female: i32,
    pub(crate) enrollment_male: i32,
    pub(crate) enrollment_female: i32,
    pub(crate) registered_male: i32,
    pub(crate) registered_female: i32,
    pub(crate) avg_attendance_male: f64,
    pub(crate) avg_attendance_female: f64,
    pub(crate) attendance_percentage_male: f64,
    pub(crate) attendance_percentage_female: f64,
    pub(crate) dropped_male: i32,
    pub(crate) dropped_female: i32,
    pub(crate) transferred_out_male: i32,
    pub(crate) transferred_out_female: i32,
    pub(crate) transferred_in_male: i32,
    pub(crate) transferred_in_female: i32,
    pub(crate) is_finalized: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct StudentAttendance {
    pub(crate) id: String,
    pub(crate) record_id: String,
    pub(crate) student_id: String,
    pub(crate) daily_codes: Vec<String>,
    pub(crate) total_absences: i32,
    pub(crate) total_tardies: i32,
    pub(crate) total_present: i32,
    pub(crate) remarks: String,
    pub(crate) has_valid_excuse: bool,
    pub(crate) is_at_risk: bool,
    pub(crate) is_dropout: bool,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Intervention {
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
    pub(crate) resolved_at: Option<PrimitiveDateTime>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct InterventionAction {
    pub(crate) id: String,
    pub(crate) intervention_id: String,
    pub(crate) tier: InterventionTier,
    pub(crate) action_type: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) start_date: Date,
    pub(crate) target_date: Option<Date>,
    pub(crate) completion_date: Option<Date>,
    pub(crate) status: ActionStatus,
    pub(crate) notes: String,
    pub(crate) was_successful: Option<bool>,
    pub(crate) handled_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct InterventionUpdate {
    pub(crate) id: String,
    pub(crate) intervention_id: String,
    pub(crate) update_date: Date,
    pub(crate) status: ProgressStatus,
    pub(crate) note: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Guardian {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) position: i32,
    pub(crate) relationship: String,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) middle_name: Option<String>,
    pub(crate) birth_date: Option<Date>,
    pub(crate) occupation: Option<String>,
    pub(crate) contact_number: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Study habits and home environment from the enrollment survey.
#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct StudentNonAcademic {
    pub(crate) student_id: String,
    pub(crate) study_hours: Option<String>,
    pub(crate) study_place: Option<String>,
    pub(crate) study_with: Option<String>,
    pub(crate) family_support: Option<String>,
    pub(crate) parent_highest_education: Option<String>,
    pub(crate) parent_marital_status: Option<String>,
    pub(crate) house_type: Option<String>,
    pub(crate) has_quiet_place: bool,
    pub(crate) study_area: Option<String>,
    pub(crate) transport_mode: Option<String>,
    pub(crate) travel_time: Option<String>,
    pub(crate) access_resources: Option<String>,
    pub(crate) computer_use: Option<String>,
    pub(crate) hobbies: Option<String>,
    pub(crate) personality_traits: Option<String>,
    pub(crate) confidence_level: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct SubjectAssignment {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) subject: String,
    pub(crate) teacher_name: String,
    pub(crate) schedule_day: ScheduleDay,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
