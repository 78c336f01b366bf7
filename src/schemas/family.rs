use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{Guardian, StudentNonAcademic};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub(crate) struct GuardianInput {
    #[validate(length(min = 1, max = 50, message = "relationship must be 1..50 characters"))]
    pub(crate) relationship: String,
    #[validate(length(min = 1, max = 50, message = "last_name must be 1..50 characters"))]
    pub(crate) last_name: String,
    #[validate(length(min = 1, max = 50, message = "first_name must be 1..50 characters"))]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) middle_name: Option<String>,
    #[serde(default)]
    pub(crate) birth_date: Option<String>,
    #[serde(default)]
    pub(crate) occupation: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "contact_number must be at most 20 characters"))]
    pub(crate) contact_number: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
}

/// Replaces the student's whole guardian list, kept in the given order.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GuardiansReplace {
    #[validate(length(max = 4, message = "at most 4 guardians per student"))]
    #[validate(nested)]
    pub(crate) guardians: Vec<GuardianInput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuardianResponse {
    pub(crate) id: String,
    pub(crate) relationship: String,
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) middle_name: Option<String>,
    pub(crate) birth_date: Option<String>,
    pub(crate) occupation: Option<String>,
    pub(crate) contact_number: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) address: Option<String>,
}

impl GuardianResponse {
    pub(crate) fn from_db(guardian: Guardian) -> Self {
        Self {
            id: guardian.id,
            relationship: guardian.relationship,
            last_name: guardian.last_name,
            first_name: guardian.first_name,
            middle_name: guardian.middle_name,
            birth_date: guardian.birth_date.map(format_date),
            occupation: guardian.occupation,
            contact_number: guardian.contact_number,
            email: guardian.email,
            address: guardian.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GuardiansResponse {
    pub(crate) student_id: String,
    pub(crate) guardians: Vec<GuardianResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NonAcademicUpsert {
    #[serde(default)]
    pub(crate) study_hours: Option<String>,
    #[serde(default)]
    pub(crate) study_place: Option<String>,
    #[serde(default)]
    pub(crate) study_with: Option<String>,
    #[serde(default)]
    pub(crate) family_support: Option<String>,
    #[serde(default)]
    pub(crate) parent_highest_education: Option<String>,
    #[serde(default)]
    pub(crate) parent_marital_status: Option<String>,
    #[serde(default)]
    pub(crate) house_type: Option<String>,
    #[serde(default)]
    pub(crate) has_quiet_place: bool,
    #[serde(default)]
    pub(crate) study_area: Option<String>,
    #[serde(default)]
    pub(crate) transport_mode: Option<String>,
    #[serde(default)]
    pub(crate) travel_time: Option<String>,
    #[serde(default)]
    pub(crate) access_resources: Option<String>,
    #[serde(default)]
    pub(crate) computer_use: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "hobbies must be at most 500 characters"))]
    pub(crate) hobbies: Option<String>,
    #[serde(default)]
    pub(crate) personality_traits: Option<String>,
    #[serde(default)]
    pub(crate) confidence_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NonAcademicResponse {
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
    pub(crate) updated_at: String,
}

impl NonAcademicResponse {
    pub(crate) fn from_db(record: StudentNonAcademic) -> Self {
        Self {
            student_id: record.student_id,
            study_hours: record.study_hours,
            study_place: record.study_place,
            study_with: record.study_with,
            family_support: record.family_support,
            parent_highest_education: record.parent_highest_education,
            parent_marital_status: record.parent_marital_status,
            house_type: record.house_type,
            has_quiet_place: record.has_quiet_place,
            study_area: record.study_area,
            transport_mode: record.transport_mode,
            travel_time: record.travel_time,
            access_resources: record.access_resources,
            computer_use: record.computer_use,
            hobbies: record.hobbies,
            personality_traits: record.personality_traits,
            confidence_level: record.confidence_level,
            updated_at: format_primitive(record.updated_at),
        }
    }
}

/// Blank survey answers are stored as absent.
pub(crate) fn answer(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guardian_list_is_validated_per_entry() {
        let payload: GuardiansReplace = serde_json::from_value(json!({
            "guardians": [
                { "relationship": "Mother", "last_name": "Reyes", "first_name": "Liza" },
                { "relationship": "", "last_name": "Reyes", "first_name": "Ramon" }
            ]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: GuardiansReplace = serde_json::from_value(json!({
            "guardians": [{
                "relationship": "Mother",
                "last_name": "Reyes",
                "first_name": "Liza",
                "email": "not-an-address"
            }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn blank_answers_are_absent() {
        assert_eq!(answer(Some("  ")), None);
        assert_eq!(answer(Some(" Bus ")), Some("Bus"));
        assert_eq!(answer(None), None);
    }
}
