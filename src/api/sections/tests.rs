use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::test_support;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(test_support::json_request(method, uri, None, body))
        .await
        .expect("request");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn assign(app: &Router, student_id: &str, program: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/placements/assign",
        Some(json!({ "student_id": student_id, "program": program })),
    )
    .await
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn renaming_a_section_updates_its_students() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 40).await;
    let seated = test_support::insert_student(db, "500000000001", "Mendoza", "Female", 93.0).await;
    let outsider = test_support::insert_student(db, "500000000002", "Lim", "Male", 90.0).await;

    let (status, body) = assign(&ctx.app, &seated.id, "STE").await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, renamed) = send(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/sections/{}", section.id),
        Some(json!({ "name": " Del Pilar " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {renamed}");
    assert_eq!(renamed["name"], "Del Pilar");

    let (_, student) =
        send(&ctx.app, Method::GET, &format!("/api/v1/students/{}", seated.id), None).await;
    assert_eq!(student["section_name"], "Del Pilar");
    let (_, student) =
        send(&ctx.app, Method::GET, &format!("/api/v1/students/{}", outsider.id), None).await;
    assert!(student["section_name"].is_null());

    let (status, listed) =
        send(&ctx.app, Method::GET, "/api/v1/students?section_name=Del%20Pilar", None).await;
    assert_eq!(status, StatusCode::OK, "response: {listed}");
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn capacity_cannot_drop_below_seated_students() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 2).await;
    for (lrn, name) in [("500000000011", "Ocampo"), ("500000000012", "Pascual")] {
        let student = test_support::insert_student(db, lrn, name, "Female", 91.0).await;
        let (status, body) = assign(&ctx.app, &student.id, "STE").await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
    }

    let uri = format!("/api/v1/sections/{}", section.id);
    let (status, body) =
        send(&ctx.app, Method::PATCH, &uri, Some(json!({ "max_students": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["detail"], "Section already has 2 students, max_students cannot be 1");

    let (status, current) = send(&ctx.app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK, "response: {current}");
    assert_eq!(current["max_students"], 2);
    assert_eq!(current["current_students"], 2);

    let (status, missing) =
        send(&ctx.app, Method::PATCH, "/api/v1/sections/missing", Some(json!({ "room": "B" })))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {missing}");
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn shrinking_while_assigning_never_overfills() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 2).await;
    let first = test_support::insert_student(db, "500000000021", "Navarro", "Male", 94.0).await;
    let second = test_support::insert_student(db, "500000000022", "Torres", "Female", 92.0).await;
    let (status, body) = assign(&ctx.app, &first.id, "STE").await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let uri = format!("/api/v1/sections/{}", section.id);
    let ((assign_status, assigned), (shrink_status, shrunk)) = tokio::join!(
        assign(&ctx.app, &second.id, "STE"),
        send(&ctx.app, Method::PATCH, &uri, Some(json!({ "max_students": 1 }))),
    );
    let mut statuses = [assign_status.as_u16(), shrink_status.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409], "responses: {assigned} / {shrunk}");

    let (_, current) = send(&ctx.app, Method::GET, &uri, None).await;
    let enrolled = current["current_students"].as_i64().expect("current_students");
    let capacity = current["max_students"].as_i64().expect("max_students");
    assert!(enrolled <= capacity, "section: {current}");
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn subject_teachers_are_assigned_once_per_subject() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "SPA").await;
    let section = test_support::insert_section(db, &program, "Luna", 30).await;
    let uri = format!("/api/v1/sections/{}/subjects", section.id);

    let (status, first) = send(
        &ctx.app,
        Method::PUT,
        &uri,
        Some(json!({
            "subject": "English",
            "teacher_name": "Ms. Cruz",
            "start_time": "08:00",
            "end_time": "09:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {first}");
    assert_eq!(first["schedule_day"], "DAILY");
    assert_eq!(first["start_time"], "08:00");

    let (status, replaced) = send(
        &ctx.app,
        Method::PUT,
        &uri,
        Some(json!({
            "subject": "English",
            "teacher_name": "Mr. Lopez",
            "schedule_day": "TTH",
            "start_time": "13:00",
            "end_time": "14:30"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {replaced}");
    assert_eq!(replaced["id"], first["id"]);
    assert_eq!(replaced["teacher_name"], "Mr. Lopez");
    assert_eq!(replaced["end_time"], "14:30");

    let (status, listed) = send(&ctx.app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK, "response: {listed}");
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    for (start, end) in [("9am", "10:00"), ("10:00", "09:00")] {
        let (status, body) = send(
            &ctx.app,
            Method::PUT,
            &uri,
            Some(json!({
                "subject": "Filipino",
                "teacher_name": "Ms. Dizon",
                "start_time": start,
                "end_time": end
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    }

    let remove = || {
        ctx.app.clone().oneshot(test_support::json_request(
            Method::DELETE,
            &format!("{uri}/English"),
            None,
            None,
        ))
    };
    let response = remove().await.expect("remove subject");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = remove().await.expect("remove subject again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
