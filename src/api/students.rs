use axum::{extract::Query, routing::get, routing::put, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::validation::{page_bounds, parse_optional_date, resolve_school_year, validate_lrn};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::repositories;
use crate::schemas::enrollment::{
    AcademicResponse, AcademicUpsert, StudentCreate, StudentListQuery, StudentResponse,
};
use crate::schemas::family::{
    answer, GuardianResponse, GuardiansReplace, GuardiansResponse, NonAcademicResponse,
    NonAcademicUpsert,
};
use crate::schemas::grading::{GradeSummaryQuery, GradeSummaryResponse, QuarterGrade};
use crate::services::grading::{self, round_to};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", get(get_student))
        .route("/:student_id/academic", put(upsert_academic).get(get_academic))
        .route("/:student_id/guardians", put(replace_guardians).get(list_guardians))
        .route("/:student_id/non-academic", put(upsert_non_academic).get(get_non_academic))
        .route("/:student_id/grade-summary", get(grade_summary))
}

async fn create_student(
    state: axum::extract::State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(axum::http::StatusCode, Json<StudentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_lrn(&payload.lrn)?;
    let birth_date = parse_optional_date("birth_date", payload.birth_date.as_deref())?;

    let exists = repositories::students::exists_by_lrn(state.db(), &payload.lrn)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check LRN"))?;
    if exists {
        return Err(ApiError::Conflict("A student with this LRN already exists".to_string()));
    }

    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            lrn: &payload.lrn,
            last_name: payload.last_name.trim(),
            first_name: payload.first_name.trim(),
            middle_name: payload.middle_name.as_deref().map(str::trim),
            sex: payload.sex.trim(),
            birth_date,
            address: payload.address.as_deref(),
            is_transferee: payload.is_transferee,
            is_balik_aral: payload.is_balik_aral,
            is_4ps_member: payload.is_4ps_member,
            is_sped: payload.is_sped,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(
            e,
            "A student with this LRN already exists",
            "Failed to create student",
        )
    })?;

    tracing::info!(student_id = %student.id, "Student registered");
    Ok((axum::http::StatusCode::CREATED, Json(StudentResponse::from_db(student))))
}

async fn list_students(
    Query(params): Query<StudentListQuery>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let (skip, limit) = page_bounds(params.skip, params.limit);
    let filter = repositories::students::ListStudentsFilter {
        search: params.search.map(|value| value.trim().to_string()).filter(|v| !v.is_empty()),
        section_name: params.section_name.filter(|value| !value.trim().is_empty()),
    };

    let students = repositories::students::list(state.db(), filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(students.into_iter().map(StudentResponse::from_db).collect()))
}

async fn get_student(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = load_student(&state, &student_id).await?;
    Ok(Json(StudentResponse::from_db(student)))
}

async fn get_academic(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<AcademicResponse>, ApiError> {
    let academic = repositories::students::find_academic(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch academic record"))?
        .ok_or_else(|| ApiError::NotFound("Academic record not found".to_string()))?;

    Ok(Json(AcademicResponse::from_db(academic)))
}

async fn upsert_academic(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AcademicUpsert>,
) -> Result<Json<AcademicResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    load_student(&state, &student_id).await?;

    let grades = payload.grades();
    let overall_average = payload.overall_average.unwrap_or_else(|| overall_average(&grades));

    let academic = repositories::students::upsert_academic(
        state.db(),
        repositories::students::UpsertAcademic {
            student_id: &student_id,
            dost_exam_result: payload.dost_exam_result.trim(),
            grades,
            overall_average: Some(overall_average),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save academic record"))?;

    Ok(Json(AcademicResponse::from_db(academic)))
}

async fn list_guardians(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<GuardiansResponse>, ApiError> {
    load_student(&state, &student_id).await?;
    let guardians = repositories::family::list_guardians(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list guardians"))?;

    Ok(Json(GuardiansResponse {
        student_id,
        guardians: guardians.into_iter().map(GuardianResponse::from_db).collect(),
    }))
}

async fn replace_guardians(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<GuardiansReplace>,
) -> Result<Json<GuardiansResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let birth_dates = payload
        .guardians
        .iter()
        .map(|guardian| parse_optional_date("birth_date", guardian.birth_date.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::students::find_by_id(&mut *tx, &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    repositories::family::delete_guardians(&mut *tx, &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear guardians"))?;

    let now = primitive_now_utc();
    let mut saved = Vec::with_capacity(payload.guardians.len());
    for (position, (guardian, birth_date)) in
        payload.guardians.iter().zip(birth_dates).enumerate()
    {
        let row = repositories::family::create_guardian(
            &mut *tx,
            repositories::family::CreateGuardian {
                id: &Uuid::new_v4().to_string(),
                student_id: &student_id,
                position: i32::try_from(position).unwrap_or(i32::MAX),
                relationship: guardian.relationship.trim(),
                last_name: guardian.last_name.trim(),
                first_name: guardian.first_name.trim(),
                middle_name: answer(guardian.middle_name.as_deref()),
                birth_date,
                occupation: answer(guardian.occupation.as_deref()),
                contact_number: answer(guardian.contact_number.as_deref()),
                email: answer(guardian.email.as_deref()),
                address: answer(guardian.address.as_deref()),
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save guardian"))?;
        saved.push(GuardianResponse::from_db(row));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit guardians"))?;
    tracing::info!(student_id = %student_id, guardians = saved.len(), "Guardians saved");
    Ok(Json(GuardiansResponse { student_id, guardians: saved }))
}

async fn get_non_academic(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<NonAcademicResponse>, ApiError> {
    let record = repositories::family::find_non_academic(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch non-academic record"))?
        .ok_or_else(|| ApiError::NotFound("Non-academic record not found".to_string()))?;

    Ok(Json(NonAcademicResponse::from_db(record)))
}

async fn upsert_non_academic(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<NonAcademicUpsert>,
) -> Result<Json<NonAcademicResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    load_student(&state, &student_id).await?;

    let record = repositories::family::upsert_non_academic(
        state.db(),
        repositories::family::UpsertNonAcademic {
            student_id: &student_id,
            study_hours: answer(payload.study_hours.as_deref()),
            study_place: answer(payload.study_place.as_deref()),
            study_with: answer(payload.study_with.as_deref()),
            family_support: answer(payload.family_support.as_deref()),
            parent_highest_education: answer(payload.parent_highest_education.as_deref()),
            parent_marital_status: answer(payload.parent_marital_status.as_deref()),
            house_type: answer(payload.house_type.as_deref()),
            has_quiet_place: payload.has_quiet_place,
            study_area: answer(payload.study_area.as_deref()),
            transport_mode: answer(payload.transport_mode.as_deref()),
            travel_time: answer(payload.travel_time.as_deref()),
            access_resources: answer(payload.access_resources.as_deref()),
            computer_use: answer(payload.computer_use.as_deref()),
            hobbies: answer(payload.hobbies.as_deref()),
            personality_traits: answer(payload.personality_traits.as_deref()),
            confidence_level: answer(payload.confidence_level.as_deref()),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save non-academic record"))?;

    Ok(Json(NonAcademicResponse::from_db(record)))
}

async fn grade_summary(
    axum::extract::Path(student_id): axum::extract::Path<String>,
    Query(params): Query<GradeSummaryQuery>,
    state: axum::extract::State<AppState>,
) -> Result<Json<GradeSummaryResponse>, ApiError> {
    load_student(&state, &student_id).await?;
    let school_year = resolve_school_year(
        params.school_year.as_deref(),
        &state.settings().school().default_school_year,
    )?;
    let subject = params.subject.trim();

    let records = repositories::class_records::list_for_student_subject(
        state.db(),
        &student_id,
        subject,
        &school_year,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list class records"))?;

    let mut quarters = Vec::with_capacity(records.len());
    for record in records {
        let grade = repositories::grades::find(state.db(), &record.id, &student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch grade"))?;
        if let Some(grade) = grade {
            quarters.push(QuarterGrade {
                quarter: record.quarter,
                quarterly_grade: grade.quarterly_grade,
            });
        }
    }

    let quarterly: Vec<u8> =
        quarters.iter().map(|q| u8::try_from(q.quarterly_grade).unwrap_or(0)).collect();

    Ok(Json(GradeSummaryResponse {
        student_id,
        subject: subject.to_string(),
        school_year,
        final_grade: grading::final_grade(&quarterly),
        quarters,
    }))
}

/// Mean of the eight entrance grades.
fn overall_average(grades: &[f64; 8]) -> f64 {
    round_to(grades.iter().sum::<f64>() / grades.len() as f64, 2)
}

async fn load_student(state: &AppState, student_id: &str) -> Result<Student, ApiError> {
    repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::overall_average;
    use crate::test_support;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(test_support::json_request(method, uri, None, body))
            .await
            .expect("request");
        let status = response.status();
        (status, test_support::read_json(response).await)
    }

    #[test]
    fn overall_average_is_mean_rounded_to_cents() {
        let grades = [90.0, 85.0, 88.0, 92.0, 91.0, 87.0, 89.0, 86.5];
        assert_eq!(overall_average(&grades), 88.56);
    }

    #[tokio::test]
    #[ignore = "requires the PostgreSQL test database"]
    async fn guardians_are_replaced_as_a_list() {
        let ctx = test_support::setup_test_context().await;
        let student =
            test_support::insert_student(ctx.state.db(), "600000000001", "Reyes", "Male", 88.0)
                .await;
        let uri = format!("/api/v1/students/{}/guardians", student.id);

        let (status, saved) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({
                "guardians": [
                    {
                        "relationship": "Mother",
                        "last_name": "Reyes",
                        "first_name": "Liza",
                        "birth_date": "1985-03-14",
                        "contact_number": "09171234567",
                        "email": "liza.reyes@example.com"
                    },
                    { "relationship": "Father", "last_name": "Reyes", "first_name": "Ramon" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {saved}");
        assert_eq!(saved["guardians"][0]["relationship"], "Mother");
        assert_eq!(saved["guardians"][0]["birth_date"], "1985-03-14");
        assert_eq!(saved["guardians"][1]["first_name"], "Ramon");

        let (status, saved) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({
                "guardians": [
                    { "relationship": "Grandmother", "last_name": "Santos", "first_name": "Nena" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {saved}");

        let (status, listed) = send(&ctx.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "response: {listed}");
        assert_eq!(listed["guardians"].as_array().map(Vec::len), Some(1));
        assert_eq!(listed["guardians"][0]["relationship"], "Grandmother");

        let (status, body) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({
                "guardians": [{
                    "relationship": "Mother",
                    "last_name": "Reyes",
                    "first_name": "Liza",
                    "birth_date": "03/14/1985"
                }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

        let (status, _) =
            send(&ctx.app, Method::GET, "/api/v1/students/missing/guardians", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires the PostgreSQL test database"]
    async fn non_academic_survey_is_upserted() {
        let ctx = test_support::setup_test_context().await;
        let student =
            test_support::insert_student(ctx.state.db(), "600000000002", "Castillo", "Female", 91.0)
                .await;
        let uri = format!("/api/v1/students/{}/non-academic", student.id);

        let (status, _) = send(&ctx.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, saved) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({
                "study_hours": "2-3 hours",
                "study_place": "Home",
                "has_quiet_place": true,
                "transport_mode": " Jeepney ",
                "hobbies": "   "
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {saved}");
        assert_eq!(saved["transport_mode"], "Jeepney");
        assert!(saved["hobbies"].is_null());

        let (status, saved) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({ "study_hours": "1 hour", "travel_time": "30 minutes" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {saved}");

        let (status, fetched) = send(&ctx.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "response: {fetched}");
        assert_eq!(fetched["study_hours"], "1 hour");
        assert_eq!(fetched["travel_time"], "30 minutes");
        assert_eq!(fetched["has_quiet_place"], false);
        assert!(fetched["study_place"].is_null());
    }
}
