use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

fn october_codes() -> Vec<&'static str> {
    let mut codes = vec![""; 23];
    codes[..5].fill("X");
    codes[5] = "t";
    codes
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn monthly_record_tracks_absences_until_finalized() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 40).await;
    let student = test_support::insert_student(db, "200000000001", "Garcia", "Female", 90.0).await;

    let payload = json!({
        "quarter": "Q1",
        "month": 10,
        "year": 2025,
        "late_enrollees_female": 1
    });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/attendance/records",
            Some(&section.id),
            Some(payload.clone()),
        ))
        .await
        .expect("create attendance record");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["record"]["total_days"], 23);
    let record_id = created["record"]["id"].as_str().expect("record id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/attendance/records",
            Some(&section.id),
            Some(payload),
        ))
        .await
        .expect("reopen attendance record");
    let status = response.status();
    let reopened = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {reopened}");
    assert_eq!(reopened["record"]["id"], record_id.as_str());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attendance/records/{record_id}/students/{}", student.id),
            None,
            Some(json!({ "daily_codes": october_codes() })),
        ))
        .await
        .expect("save student attendance");
    let status = response.status();
    let saved = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {saved}");
    assert_eq!(saved["student"]["total_absences"], 5);
    assert_eq!(saved["student"]["total_tardies"], 1);
    assert_eq!(saved["student"]["total_present"], 18);
    assert_eq!(saved["student"]["daily_codes"][5], "T");
    assert_eq!(saved["student"]["is_at_risk"], true);
    assert_eq!(
        saved["student"]["warning"],
        "Warning: 5 absences (2 more until dropout threshold)"
    );
    assert_eq!(saved["record"]["female"]["enrollment"], 1);
    assert_eq!(saved["record"]["female"]["registered"], 2);
    assert_eq!(saved["record"]["female"]["avg_daily_attendance"], 0.78);
    assert_eq!(saved["record"]["female"]["attendance_percentage"], 78.26);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attendance/records/{record_id}/finalize"),
            None,
            None,
        ))
        .await
        .expect("finalize record");
    let status = response.status();
    let finalized = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {finalized}");
    assert_eq!(finalized["is_finalized"], true);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attendance/records/{record_id}/students/{}", student.id),
            None,
            Some(json!({ "daily_codes": [] })),
        ))
        .await
        .expect("save after finalize");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn unknown_attendance_codes_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Mabini", 35).await;
    let student = test_support::insert_student(db, "200000000002", "Lopez", "Male", 89.0).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/attendance/records",
            Some(&section.id),
            Some(json!({ "quarter": "Q1", "month": 10, "year": 2025 })),
        ))
        .await
        .expect("create attendance record");
    let created = test_support::read_json(response).await;
    let record_id = created["record"]["id"].as_str().expect("record id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attendance/records/{record_id}/students/{}", student.id),
            None,
            Some(json!({ "daily_codes": ["", "L"] })),
        ))
        .await
        .expect("save invalid codes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
