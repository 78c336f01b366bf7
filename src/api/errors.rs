use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::attendance::AttendanceError;
use crate::services::grading::GradeError;
use crate::services::interventions::InterventionError;
use crate::services::section_assignment::AssignmentError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Unique violations become `conflict`; a dangling reference is the caller's mistake.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str, context: &str) -> Self {
        match constraint_code(&err).as_deref() {
            Some("23505") => Self::Conflict(conflict.to_string()),
            Some("23503") => Self::BadRequest("Referenced record does not exist".to_string()),
            _ => Self::internal(err, context),
        }
    }

    fn status_and_detail(self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

fn constraint_code(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().map(|code| code.into_owned()),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::InvalidProgram => ApiError::BadRequest(err.to_string()),
            AssignmentError::ProgramNotFound(_)
            | AssignmentError::StudentNotFound(_)
            | AssignmentError::SectionNotFound(_) => ApiError::NotFound(err.to_string()),
            AssignmentError::DuplicateSection | AssignmentError::CapacityBelowEnrollment { .. } => {
                ApiError::Conflict(err.to_string())
            }
            AssignmentError::NoAcademicData => ApiError::UnprocessableEntity(err.to_string()),
            AssignmentError::NoSectionsAvailable(_) => ApiError::Conflict(err.to_string()),
            AssignmentError::CapacityExceeded { ref sections, .. } => {
                let listing = sections
                    .iter()
                    .map(|s| format!("{} {}/{}", s.section, s.enrolled, s.max_students))
                    .collect::<Vec<_>>()
                    .join(", ");
                ApiError::Conflict(format!("{err} ({listing})"))
            }
            AssignmentError::Store(source) => {
                ApiError::internal(source, "Failed to update section placement")
            }
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        match err {
            GradeError::InvalidInitialGrade(_) => ApiError::UnprocessableEntity(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::Finalized => ApiError::Conflict(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<InterventionError> for ApiError {
    fn from(err: InterventionError) -> Self {
        match err {
            InterventionError::NotFound(_) => ApiError::NotFound(err.to_string()),
            InterventionError::DuplicateActive | InterventionError::AlreadyEscalated => {
                ApiError::Conflict(err.to_string())
            }
            InterventionError::Store(source) => {
                ApiError::internal(source, "Failed to update intervention")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::section_assignment::SectionCapacity;

    #[test]
    fn capacity_errors_list_every_section() {
        let err = ApiError::from(AssignmentError::CapacityExceeded {
            program: "STE".to_string(),
            sections: vec![
                SectionCapacity { section: "Rizal".to_string(), enrolled: 40, max_students: 40 },
                SectionCapacity { section: "Mabini".to_string(), enrolled: 35, max_students: 35 },
            ],
        });
        match err {
            ApiError::Conflict(detail) => {
                assert_eq!(detail, "All sections for STE are full (Rizal 40/40, Mabini 35/35)")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn domain_failures_map_to_client_statuses() {
        let (status, _) = ApiError::from(AssignmentError::NoAcademicData).status_and_detail();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = ApiError::from(AttendanceError::Finalized).status_and_detail();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, detail) =
            ApiError::from(InterventionError::NotFound("iv-1".to_string())).status_and_detail();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(detail, "Intervention iv-1 not found");
    }
}
