use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{ClassRecord, StudentGrade};
use crate::db::types::Quarter;
use crate::services::grading::{FinalGrade, RequiredPerformance, WarningKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassRecordCreate {
    #[serde(default)]
    pub(crate) section_id: Option<String>,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "teacher_name must not be empty"))]
    pub(crate) teacher_name: String,
    pub(crate) quarter: Quarter,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassRecordListQuery {
    #[serde(default)]
    pub(crate) section_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradingConfigUpdate {
    #[validate(range(min = 0, max = 100, message = "ww_weight must be in range 0..100"))]
    pub(crate) ww_weight: i32,
    #[validate(range(min = 0, max = 100, message = "pt_weight must be in range 0..100"))]
    pub(crate) pt_weight: i32,
    #[validate(range(min = 0, max = 100, message = "qa_weight must be in range 0..100"))]
    pub(crate) qa_weight: i32,
    #[serde(default)]
    #[validate(length(max = 10, message = "ww_hps accepts at most 10 entries"))]
    pub(crate) ww_hps: Vec<i32>,
    #[serde(default)]
    #[validate(length(max = 10, message = "pt_hps accepts at most 10 entries"))]
    pub(crate) pt_hps: Vec<i32>,
    #[serde(default)]
    #[validate(range(min = 0, message = "qa_hps must be non-negative"))]
    pub(crate) qa_hps: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeUpsert {
    #[serde(default)]
    #[validate(length(max = 10, message = "ww_scores accepts at most 10 entries"))]
    pub(crate) ww_scores: Vec<f64>,
    #[serde(default)]
    #[validate(length(max = 10, message = "pt_scores accepts at most 10 entries"))]
    pub(crate) pt_scores: Vec<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "qa_score must be non-negative"))]
    pub(crate) qa_score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassRecordResponse {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) subject: String,
    pub(crate) teacher_name: String,
    pub(crate) quarter: Quarter,
    pub(crate) school_year: String,
    pub(crate) ww_weight: i32,
    pub(crate) pt_weight: i32,
    pub(crate) qa_weight: i32,
    pub(crate) weights_sum_to_hundred: bool,
    pub(crate) ww_hps: Vec<i32>,
    pub(crate) pt_hps: Vec<i32>,
    pub(crate) qa_hps: i32,
    pub(crate) updated_at: String,
}

impl ClassRecordResponse {
    pub(crate) fn from_db(record: ClassRecord) -> Self {
        Self {
            weights_sum_to_hundred: record.ww_weight + record.pt_weight + record.qa_weight == 100,
            id: record.id,
            section_id: record.section_id,
            subject: record.subject,
            teacher_name: record.teacher_name,
            quarter: record.quarter,
            school_year: record.school_year,
            ww_weight: record.ww_weight,
            pt_weight: record.pt_weight,
            qa_weight: record.qa_weight,
            ww_hps: record.ww_hps,
            pt_hps: record.pt_hps,
            qa_hps: record.qa_hps,
            updated_at: format_primitive(record.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentGradeResponse {
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
    pub(crate) updated_at: String,
}

impl StudentGradeResponse {
    pub(crate) fn from_db(grade: StudentGrade) -> Self {
        Self {
            id: grade.id,
            class_record_id: grade.class_record_id,
            student_id: grade.student_id,
            ww_scores: grade.ww_scores,
            pt_scores: grade.pt_scores,
            qa_score: grade.qa_score,
            ww_total: grade.ww_total,
            ww_percentage: grade.ww_percentage,
            ww_weighted: grade.ww_weighted,
            pt_total: grade.pt_total,
            pt_percentage: grade.pt_percentage,
            pt_weighted: grade.pt_weighted,
            qa_percentage: grade.qa_percentage,
            qa_weighted: grade.qa_weighted,
            initial_grade: grade.initial_grade,
            quarterly_grade: grade.quarterly_grade,
            updated_at: format_primitive(grade.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassRecordDetailResponse {
    pub(crate) record: ClassRecordResponse,
    pub(crate) grades: Vec<StudentGradeResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConfigUpdateResponse {
    pub(crate) record: ClassRecordResponse,
    pub(crate) recomputed: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct EarlyWarningResponse {
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) sex: String,
    pub(crate) kind: WarningKind,
    pub(crate) initial_grade: f64,
    pub(crate) quarterly_grade: i32,
    pub(crate) required: RequiredPerformance,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeSummaryQuery {
    pub(crate) subject: String,
    #[serde(default)]
    pub(crate) school_year: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuarterGrade {
    pub(crate) quarter: Quarter,
    pub(crate) quarterly_grade: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeSummaryResponse {
    pub(crate) student_id: String,
    pub(crate) subject: String,
    pub(crate) school_year: String,
    pub(crate) quarters: Vec<QuarterGrade>,
    #[serde(flatten)]
    pub(crate) final_grade: FinalGrade,
}
