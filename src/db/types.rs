use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "placementstatus", rename_all = "lowercase")]
pub(crate) enum PlacementStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "quarter", rename_all = "UPPERCASE")]
pub(crate) enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub(crate) const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

/// Academic + attendance risk used by interventions. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "risklevel")]
pub(crate) enum RiskLevel {
    #[serde(rename = "On Track")]
    #[sqlx(rename = "On Track")]
    OnTrack,
    #[serde(rename = "At Risk")]
    #[sqlx(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Critical")]
    #[sqlx(rename = "Critical")]
    Critical,
}

impl RiskLevel {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::AtRisk => "At Risk",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "interventiontier")]
pub(crate) enum InterventionTier {
    #[serde(rename = "Tier 1")]
    #[sqlx(rename = "Tier 1")]
    Tier1,
    #[serde(rename = "Tier 2")]
    #[sqlx(rename = "Tier 2")]
    Tier2,
    #[serde(rename = "Tier 3")]
    #[sqlx(rename = "Tier 3")]
    Tier3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "interventiontype")]
pub(crate) enum InterventionType {
    Academic,
    Behavioral,
    Attendance,
    Social,
    Emotional,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "actionstatus")]
pub(crate) enum ActionStatus {
    Planned,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "progressstatus")]
pub(crate) enum ProgressStatus {
    Improved,
    #[serde(rename = "No change")]
    #[sqlx(rename = "No change")]
    NoChange,
    Worsened,
}

/// Meeting pattern of a subject in a section's timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "scheduleday", rename_all = "UPPERCASE")]
pub(crate) enum ScheduleDay {
    Daily,
    Mwf,
    Tth,
}
