use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_clock, format_date, format_primitive};
use crate::db::models::{
    Program, Section, SectionPlacement, Student, StudentAcademic, SubjectAssignment,
};
use crate::db::types::{PlacementStatus, ScheduleDay};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgramCreate {
    #[validate(length(min = 1, max = 32, message = "name must be 1..32 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgramResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) school_year: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl ProgramResponse {
    pub(crate) fn from_db(program: Program) -> Self {
        Self {
            id: program.id,
            name: program.name,
            description: program.description,
            school_year: program.school_year,
            is_active: program.is_active,
            created_at: format_primitive(program.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) adviser_name: Option<String>,
    #[validate(range(min = 1, max = 100, message = "max_students must be in range 1..100"))]
    pub(crate) max_students: i32,
    #[serde(default)]
    pub(crate) building: Option<String>,
    #[serde(default)]
    pub(crate) room: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) adviser_name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 100, message = "max_students must be in range 1..100"))]
    pub(crate) max_students: Option<i32>,
    #[serde(default)]
    pub(crate) building: Option<String>,
    #[serde(default)]
    pub(crate) room: Option<String>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SectionResponse {
    pub(crate) id: String,
    pub(crate) program_id: String,
    pub(crate) name: String,
    pub(crate) adviser_name: Option<String>,
    pub(crate) max_students: i32,
    pub(crate) current_students: i32,
    pub(crate) available_slots: i32,
    pub(crate) building: Option<String>,
    pub(crate) room: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) updated_at: String,
}

impl SectionResponse {
    pub(crate) fn from_db(section: Section) -> Self {
        Self {
            available_slots: (section.max_students - section.current_students).max(0),
            id: section.id,
            program_id: section.program_id,
            name: section.name,
            adviser_name: section.adviser_name,
            max_students: section.max_students,
            current_students: section.current_students,
            building: section.building,
            room: section.room,
            is_active: section.is_active,
            updated_at: format_primitive(section.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatisticsQuery {
    #[serde(default)]
    pub(crate) program: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[validate(length(equal = 12, message = "lrn must be exactly 12 characters"))]
    pub(crate) lrn: String,
    #[validate(length(min = 1, message = "last_name must not be empty"))]
    pub(crate) last_name: String,
    #[validate(length(min = 1, message = "first_name must not be empty"))]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) middle_name: Option<String>,
    #[validate(length(min = 1, message = "sex must not be empty"))]
    pub(crate) sex: String,
    #[serde(default)]
    pub(crate) birth_date: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    pub(crate) is_transferee: bool,
    #[serde(default)]
    pub(crate) is_balik_aral: bool,
    #[serde(default)]
    pub(crate) is_4ps_member: bool,
    #[serde(default)]
    pub(crate) is_sped: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) section_name: Option<String>,
    #[serde(default)]
    pub(crate) skip: Option<i64>,
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) lrn: String,
    pub(crate) display_name: String,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) middle_name: Option<String>,
    pub(crate) sex: String,
    pub(crate) birth_date: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) is_transferee: bool,
    pub(crate) is_balik_aral: bool,
    pub(crate) is_4ps_member: bool,
    pub(crate) is_sped: bool,
    pub(crate) section_name: Option<String>,
    pub(crate) created_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            display_name: student.display_name(),
            id: student.id,
            lrn: student.lrn,
            last_name: student.last_name,
            first_name: student.first_name,
            middle_name: student.middle_name,
            sex: student.sex,
            birth_date: student.birth_date.map(format_date),
            address: student.address,
            is_transferee: student.is_transferee,
            is_balik_aral: student.is_balik_aral,
            is_4ps_member: student.is_4ps_member,
            is_sped: student.is_sped,
            section_name: student.section_name,
            created_at: format_primitive(student.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AcademicUpsert {
    #[serde(default = "default_dost_result")]
    pub(crate) dost_exam_result: String,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) mathematics: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) araling_panlipunan: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) english: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) edukasyon_pagpapakatao: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) science: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) edukasyon_pangkabuhayan: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) filipino: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "grades must be in range 0..100"))]
    pub(crate) mapeh: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "overall_average must be in range 0..100"))]
    pub(crate) overall_average: Option<f64>,
}

fn default_dost_result() -> String {
    "not-taken".to_string()
}

impl AcademicUpsert {
    pub(crate) fn grades(&self) -> [f64; 8] {
        [
            self.mathematics,
            self.araling_panlipunan,
            self.english,
            self.edukasyon_pagpapakatao,
            self.science,
            self.edukasyon_pangkabuhayan,
            self.filipino,
            self.mapeh,
        ]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AcademicResponse {
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
    pub(crate) updated_at: String,
}

impl AcademicResponse {
    pub(crate) fn from_db(academic: StudentAcademic) -> Self {
        Self {
            student_id: academic.student_id,
            dost_exam_result: academic.dost_exam_result,
            mathematics: academic.mathematics,
            araling_panlipunan: academic.araling_panlipunan,
            english: academic.english,
            edukasyon_pagpapakatao: academic.edukasyon_pagpapakatao,
            science: academic.science,
            edukasyon_pangkabuhayan: academic.edukasyon_pangkabuhayan,
            filipino: academic.filipino,
            mapeh: academic.mapeh,
            overall_average: academic.overall_average,
            updated_at: format_primitive(academic.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PlacementRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[validate(length(min = 1, message = "program must not be empty"))]
    pub(crate) program: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkAssignRequest {
    #[validate(length(min = 1, message = "program must not be empty"))]
    pub(crate) program: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UnassignRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlacementResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) program: String,
    pub(crate) section_id: Option<String>,
    pub(crate) status: PlacementStatus,
    pub(crate) placed_at: Option<String>,
    pub(crate) created_at: String,
}

impl PlacementResponse {
    pub(crate) fn from_db(placement: SectionPlacement) -> Self {
        Self {
            id: placement.id,
            student_id: placement.student_id,
            program: placement.program,
            section_id: placement.section_id,
            status: placement.status,
            placed_at: placement.placed_at.map(format_primitive),
            created_at: format_primitive(placement.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) section: SectionResponse,
    pub(crate) placement: PlacementResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnassignResponse {
    pub(crate) student_id: String,
    pub(crate) removed: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectAssignmentUpsert {
    #[validate(length(min = 1, max = 100, message = "subject must be 1..100 characters"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "teacher_name must not be empty"))]
    pub(crate) teacher_name: String,
    #[serde(default = "default_schedule_day")]
    pub(crate) schedule_day: ScheduleDay,
    /// `HH:MM`, 24-hour.
    pub(crate) start_time: String,
    pub(crate) end_time: String,
}

fn default_schedule_day() -> ScheduleDay {
    ScheduleDay::Daily
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectAssignmentResponse {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) subject: String,
    pub(crate) teacher_name: String,
    pub(crate) schedule_day: ScheduleDay,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) updated_at: String,
}

impl SubjectAssignmentResponse {
    pub(crate) fn from_db(assignment: SubjectAssignment) -> Self {
        Self {
            id: assignment.id,
            section_id: assignment.section_id,
            subject: assignment.subject,
            teacher_name: assignment.teacher_name,
            schedule_day: assignment.schedule_day,
            start_time: format_clock(assignment.start_time),
            end_time: format_clock(assignment.end_time),
            updated_at: format_primitive(assignment.updated_at),
        }
    }
}
