//! Quarterly grade computation under the DepEd K-12 grading scheme.
//!
//! Raw written-work, performance-task and quarterly-assessment scores are
//! turned into percentages of their highest possible score, weighted by the
//! class record's component weights and summed into an initial grade, which is
//! then transmuted into the reported 60..=100 quarterly grade.

use serde::Serialize;
use thiserror::Error;

use crate::db::models::{ClassRecord, StudentGrade};

/// Number of written-work and performance-task columns on a class record.
pub(crate) const ITEM_SLOTS: usize = 10;
pub(crate) const PASSING_GRADE: u8 = 75;
/// Initial grade that transmutes to [`PASSING_GRADE`].
pub(crate) const PASSING_INITIAL_GRADE: f64 = 60.0;

/// Lower bound of each initial-grade band and the grade it transmutes to, highest first.
const TRANSMUTATION_TABLE: [(f64, u8); 41] = [
    (100.0, 100),
    (98.40, 99),
    (96.80, 98),
    (95.20, 97),
    (93.60, 96),
    (92.00, 95),
    (90.40, 94),
    (88.80, 93),
    (87.20, 92),
    (85.60, 91),
    (84.00, 90),
    (82.40, 89),
    (80.80, 88),
    (79.20, 87),
    (77.60, 86),
    (76.00, 85),
    (74.40, 84),
    (72.80, 83),
    (71.20, 82),
    (69.60, 81),
    (68.00, 80),
    (66.40, 79),
    (64.80, 78),
    (63.20, 77),
    (61.60, 76),
    (60.00, 75),
    (56.00, 74),
    (52.00, 73),
    (48.00, 72),
    (44.00, 71),
    (40.00, 70),
    (36.00, 69),
    (32.00, 68),
    (28.00, 67),
    (24.00, 66),
    (20.00, 65),
    (16.00, 64),
    (12.00, 63),
    (8.00, 62),
    (4.00, 61),
    (0.0, 60),
];

#[derive(Debug, Error, PartialEq)]
pub(crate) enum GradeError {
    #[error("initial grade {0} cannot be transmuted")]
    InvalidInitialGrade(f64),
    #[error("{component} weight must be between 0 and 100, got {value}")]
    InvalidWeight { component: &'static str, value: i32 },
    #[error("{component} accepts at most 10 entries, got {actual}")]
    TooManyItems { component: &'static str, actual: usize },
    #[error("{component} values must be non-negative numbers")]
    NegativeValue { component: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Weights {
    pub(crate) written_works: i32,
    pub(crate) performance_tasks: i32,
    pub(crate) quarterly_assessment: i32,
}

impl Weights {
    pub(crate) fn validate(&self) -> Result<(), GradeError> {
        for (component, value) in [
            ("written works", self.written_works),
            ("performance tasks", self.performance_tasks),
            ("quarterly assessment", self.quarterly_assessment),
        ] {
            if !(0..=100).contains(&value) {
                return Err(GradeError::InvalidWeight { component, value });
            }
        }
        Ok(())
    }

    /// Weights are expected to total 100 but a class record may be saved mid-edit.
    pub(crate) fn sums_to_hundred(&self) -> bool {
        self.written_works + self.performance_tasks + self.quarterly_assessment == 100
    }
}

/// Weights and highest possible scores of one class record.
#[derive(Debug, Clone)]
pub(crate) struct GradingConfig {
    pub(crate) weights: Weights,
    pub(crate) ww_hps: Vec<i32>,
    pub(crate) pt_hps: Vec<i32>,
    pub(crate) qa_hps: i32,
}

impl GradingConfig {
    pub(crate) fn from_record(record: &ClassRecord) -> Self {
        Self {
            weights: Weights {
                written_works: record.ww_weight,
                performance_tasks: record.pt_weight,
                quarterly_assessment: record.qa_weight,
            },
            ww_hps: record.ww_hps.clone(),
            pt_hps: record.pt_hps.clone(),
            qa_hps: record.qa_hps,
        }
    }

    fn ww_hps_total(&self) -> f64 {
        self.ww_hps.iter().map(|value| f64::from(*value)).sum()
    }

    fn pt_hps_total(&self) -> f64 {
        self.pt_hps.iter().map(|value| f64::from(*value)).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RawScores<'a> {
    pub(crate) ww: &'a [f64],
    pub(crate) pt: &'a [f64],
    pub(crate) qa: f64,
}

impl<'a> RawScores<'a> {
    pub(crate) fn from_grade(grade: &'a StudentGrade) -> Self {
        Self { ww: &grade.ww_scores, pt: &grade.pt_scores, qa: grade.qa_score }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ComputedGrade {
    pub(crate) ww_total: f64,
    pub(crate) ww_percentage: f64,
    pub(crate) ww_weighted: f64,
    pub(crate) pt_total: f64,
    pub(crate) pt_percentage: f64,
    pub(crate) pt_weighted: f64,
    pub(crate) qa_percentage: f64,
    pub(crate) qa_weighted: f64,
    pub(crate) initial_grade: f64,
    pub(crate) quarterly_grade: u8,
}

pub(crate) fn compute(
    config: &GradingConfig,
    scores: &RawScores<'_>,
) -> Result<ComputedGrade, GradeError> {
    config.weights.validate()?;

    let ww_total: f64 = scores.ww.iter().sum();
    let (ww_percentage, ww_weighted) =
        weighted_component(ww_total, config.ww_hps_total(), config.weights.written_works);

    let pt_total: f64 = scores.pt.iter().sum();
    let (pt_percentage, pt_weighted) =
        weighted_component(pt_total, config.pt_hps_total(), config.weights.performance_tasks);

    let (qa_percentage, qa_weighted) = weighted_component(
        scores.qa,
        f64::from(config.qa_hps),
        config.weights.quarterly_assessment,
    );

    // Not clamped: misconfigured HPS or weights may push this past 100.
    let initial_grade = ww_weighted + pt_weighted + qa_weighted;
    let quarterly_grade = transmute(initial_grade)?;

    Ok(ComputedGrade {
        ww_total,
        ww_percentage,
        ww_weighted,
        pt_total,
        pt_percentage,
        pt_weighted,
        qa_percentage,
        qa_weighted,
        initial_grade,
        quarterly_grade,
    })
}

fn weighted_component(total: f64, hps_total: f64, weight: i32) -> (f64, f64) {
    let percentage = if hps_total > 0.0 { total / hps_total * 100.0 } else { 0.0 };
    (percentage, percentage * (f64::from(weight) / 100.0))
}

/// Maps an initial grade onto the transmutation table. Anything at or above 100
/// transmutes to 100; negative or NaN input is rejected.
pub(crate) fn transmute(initial_grade: f64) -> Result<u8, GradeError> {
    if initial_grade.is_nan() || initial_grade < 0.0 {
        return Err(GradeError::InvalidInitialGrade(initial_grade));
    }

    TRANSMUTATION_TABLE
        .iter()
        .find(|(lower_bound, _)| initial_grade >= *lower_bound)
        .map(|(_, grade)| *grade)
        .ok_or(GradeError::InvalidInitialGrade(initial_grade))
}

/// Pads a score or HPS row to [`ITEM_SLOTS`] entries, rejecting negative values.
pub(crate) fn normalize_scores(
    component: &'static str,
    values: Vec<f64>,
) -> Result<Vec<f64>, GradeError> {
    if values.len() > ITEM_SLOTS {
        return Err(GradeError::TooManyItems { component, actual: values.len() });
    }
    if values.iter().any(|value| value.is_nan() || *value < 0.0) {
        return Err(GradeError::NegativeValue { component });
    }

    let mut values = values;
    values.resize(ITEM_SLOTS, 0.0);
    Ok(values)
}

pub(crate) fn normalize_hps(
    component: &'static str,
    values: Vec<i32>,
) -> Result<Vec<i32>, GradeError> {
    if values.len() > ITEM_SLOTS {
        return Err(GradeError::TooManyItems { component, actual: values.len() });
    }
    if values.iter().any(|value| *value < 0) {
        return Err(GradeError::NegativeValue { component });
    }

    let mut values = values;
    values.resize(ITEM_SLOTS, 0);
    Ok(values)
}

/// Items that carry an HPS but have no score recorded.
pub(crate) fn count_missing(scores: &[f64], hps: &[i32]) -> usize {
    scores.iter().zip(hps).filter(|(score, hps)| **hps > 0 && **score == 0.0).count()
}

pub(crate) fn missed_quarterly_assessment(qa_score: f64, qa_hps: i32) -> bool {
    qa_hps > 0 && qa_score == 0.0
}

pub(crate) fn is_passing(quarterly_grade: u8) -> bool {
    quarterly_grade >= PASSING_GRADE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum Remarks {
    #[serde(rename = "PASSED")]
    Passed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "---")]
    NoGrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct FinalGrade {
    pub(crate) final_grade: u8,
    pub(crate) remarks: Remarks,
}

/// Average of the quarters that have a grade, rounded half to even.
pub(crate) fn final_grade(quarterly_grades: &[u8]) -> FinalGrade {
    let graded: Vec<f64> = quarterly_grades
        .iter()
        .filter(|grade| **grade > 0)
        .map(|grade| f64::from(*grade))
        .collect();

    let final_grade = if graded.is_empty() {
        0
    } else {
        let mean = graded.iter().sum::<f64>() / graded.len() as f64;
        mean.round_ties_even().clamp(0.0, 100.0) as u8
    };

    let remarks = if final_grade >= PASSING_GRADE {
        Remarks::Passed
    } else if final_grade > 0 {
        Remarks::Failed
    } else {
        Remarks::NoGrade
    };

    FinalGrade { final_grade, remarks }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum WarningKind {
    /// Quarterly assessment taken and the initial grade is below passing.
    Failed,
    /// Quarter still in progress with a below-passing initial grade.
    AtRisk,
}

/// Early warnings look at the initial grade; a row without scores is skipped.
pub(crate) fn early_warning(initial_grade: f64, qa_score: f64) -> Option<WarningKind> {
    if initial_grade == 0.0 || initial_grade >= PASSING_INITIAL_GRADE {
        return None;
    }

    if qa_score > 0.0 {
        Some(WarningKind::Failed)
    } else {
        Some(WarningKind::AtRisk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct RequiredPerformance {
    pub(crate) initial_grade: f64,
    pub(crate) target_initial_grade: f64,
    pub(crate) points_needed: f64,
    pub(crate) qa_completed: bool,
    pub(crate) ww_improvement_needed: f64,
    pub(crate) pt_improvement_needed: f64,
    /// Score to aim for on a pending quarterly assessment.
    pub(crate) qa_score_needed: Option<f64>,
}

pub(crate) fn required_performance(
    config: &GradingConfig,
    computed: &ComputedGrade,
    qa_score: f64,
) -> RequiredPerformance {
    let qa_completed = qa_score > 0.0;
    let improvement = |weight: i32, percentage: f64| {
        if weight > 0 {
            round_to(f64::max(0.0, PASSING_INITIAL_GRADE - percentage), 1)
        } else {
            0.0
        }
    };

    let qa_score_needed = (!qa_completed && config.weights.quarterly_assessment > 0)
        .then(|| round_to(PASSING_INITIAL_GRADE / 100.0 * f64::from(config.qa_hps), 1));

    RequiredPerformance {
        initial_grade: round_to(computed.initial_grade, 2),
        target_initial_grade: PASSING_INITIAL_GRADE,
        points_needed: round_to(f64::max(0.0, PASSING_INITIAL_GRADE - computed.initial_grade), 2),
        qa_completed,
        ww_improvement_needed: improvement(
            config.weights.written_works,
            computed.ww_percentage,
        ),
        pt_improvement_needed: improvement(
            config.weights.performance_tasks,
            computed.pt_percentage,
        ),
        qa_score_needed,
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
