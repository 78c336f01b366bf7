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

/// Mathematics Q1 record with five written works, two tasks and a 50-point exam.
async fn open_math_record(app: &Router, section_id: &str) -> String {
    let (status, created) = send(
        app,
        Method::POST,
        "/api/v1/class-records",
        Some(json!({
            "section_id": section_id,
            "subject": "Mathematics",
            "teacher_name": "Ms. Cruz",
            "quarter": "Q1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let record_id = created["id"].as_str().expect("record id").to_string();

    let (status, body) = send(
        app,
        Method::PUT,
        &format!("/api/v1/class-records/{record_id}/config"),
        Some(json!({
            "ww_weight": 30,
            "pt_weight": 50,
            "qa_weight": 20,
            "ww_hps": [10, 10, 10, 10, 10],
            "pt_hps": [20, 20],
            "qa_hps": 50
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    record_id
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn detection_opens_then_raises_a_case_until_escalated() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 40).await;
    let student = test_support::insert_student(db, "300000000001", "Bautista", "Male", 91.0).await;
    let record_id = open_math_record(&ctx.app, &section.id).await;
    let grade_uri = format!("/api/v1/class-records/{record_id}/grades/{}", student.id);

    let (status, body) = send(
        &ctx.app,
        Method::PUT,
        &grade_uri,
        Some(json!({ "ww_scores": [8, 8], "pt_scores": [15, 15], "qa_score": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let evaluate = json!({
        "student_id": student.id,
        "section_id": section.id,
        "subject": "Mathematics",
        "quarter": "Q1",
        "created_by": "Ms. Cruz"
    });
    let (status, opened) =
        send(&ctx.app, Method::POST, "/api/v1/interventions/evaluate", Some(evaluate.clone()))
            .await;
    assert_eq!(status, StatusCode::OK, "response: {opened}");
    assert_eq!(opened["outcome"], "created");
    assert_eq!(opened["risk_level"], "At Risk");
    assert_eq!(opened["intervention"]["current_tier"], "Tier 1");
    assert_eq!(opened["intervention"]["missing_written_works"], 3);
    let intervention_id =
        opened["intervention"]["id"].as_str().expect("intervention id").to_string();

    let (status, body) = send(
        &ctx.app,
        Method::PUT,
        &grade_uri,
        Some(json!({ "ww_scores": [8, 8], "pt_scores": [15, 15] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, raised) =
        send(&ctx.app, Method::POST, "/api/v1/interventions/evaluate", Some(evaluate)).await;
    assert_eq!(status, StatusCode::OK, "response: {raised}");
    assert_eq!(raised["outcome"], "updated");
    assert_eq!(raised["risk_level"], "Critical");
    assert_eq!(raised["intervention"]["id"], intervention_id.as_str());
    assert_eq!(raised["intervention"]["current_tier"], "Tier 2");
    assert_eq!(raised["intervention"]["missed_quarterly_assessment"], true);

    let escalate_uri = format!("/api/v1/interventions/{intervention_id}/escalate");
    let (status, escalated) = send(
        &ctx.app,
        Method::POST,
        &escalate_uri,
        Some(json!({ "handled_by": "Guidance Office" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {escalated}");
    assert_eq!(escalated["intervention"]["current_tier"], "Tier 3");
    assert_eq!(escalated["action"]["tier"], "Tier 3");
    assert_eq!(escalated["action"]["status"], "Planned");

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        &escalate_uri,
        Some(json!({ "handled_by": "Guidance Office" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, resolved) = send(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/interventions/{intervention_id}/resolve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {resolved}");
    assert_eq!(resolved["is_resolved"], true);
    assert_eq!(resolved["is_active"], false);

    let (status, open_cases) = send(
        &ctx.app,
        Method::GET,
        &format!("/api/v1/interventions?section_id={}", section.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open_cases.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn on_track_student_gets_no_case() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Mabini", 35).await;
    let student = test_support::insert_student(db, "300000000002", "Villanueva", "Female", 94.0)
        .await;
    let record_id = open_math_record(&ctx.app, &section.id).await;

    let (status, body) = send(
        &ctx.app,
        Method::PUT,
        &format!("/api/v1/class-records/{record_id}/grades/{}", student.id),
        Some(json!({
            "ww_scores": [9, 9, 9, 9, 9],
            "pt_scores": [18, 18],
            "qa_score": 45
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, evaluated) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/interventions/evaluate",
        Some(json!({
            "student_id": student.id,
            "section_id": section.id,
            "subject": "Mathematics",
            "quarter": "Q1",
            "created_by": "Ms. Cruz"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {evaluated}");
    assert_eq!(evaluated["outcome"], "not_needed");
    assert_eq!(evaluated["needs_intervention"], false);
    assert!(evaluated["intervention"].is_null());
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn unknown_intervention_is_not_found() {
    let ctx = test_support::setup_test_context().await;

    let (status, body) =
        send(&ctx.app, Method::GET, "/api/v1/interventions/missing-case", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn concurrent_escalations_schedule_one_parent_conference() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Bonifacio", 40).await;
    let student = test_support::insert_student(db, "300000000003", "Garcia", "Male", 88.0).await;
    let record_id = open_math_record(&ctx.app, &section.id).await;

    let (status, body) = send(
        &ctx.app,
        Method::PUT,
        &format!("/api/v1/class-records/{record_id}/grades/{}", student.id),
        Some(json!({ "ww_scores": [8, 8], "pt_scores": [15, 15], "qa_score": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, opened) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/interventions/evaluate",
        Some(json!({
            "student_id": student.id,
            "section_id": section.id,
            "subject": "Mathematics",
            "quarter": "Q1",
            "created_by": "Ms. Cruz"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {opened}");
    let intervention_id =
        opened["intervention"]["id"].as_str().expect("intervention id").to_string();

    let escalate_uri = format!("/api/v1/interventions/{intervention_id}/escalate");
    let payload = json!({ "handled_by": "Guidance Office" });
    let (first, second) = tokio::join!(
        send(&ctx.app, Method::POST, &escalate_uri, Some(payload.clone())),
        send(&ctx.app, Method::POST, &escalate_uri, Some(payload)),
    );
    let mut statuses = [first.0.as_u16(), second.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409], "responses: {} / {}", first.1, second.1);

    let (status, detail) = send(
        &ctx.app,
        Method::GET,
        &format!("/api/v1/interventions/{intervention_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {detail}");
    assert_eq!(detail["intervention"]["current_tier"], "Tier 3");
    let tier3_actions = detail["actions"]
        .as_array()
        .expect("actions")
        .iter()
        .filter(|action| action["tier"] == "Tier 3")
        .count();
    assert_eq!(tier3_actions, 1);
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn section_refresh_reports_assigned_subjects_without_records() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Luna", 40).await;
    let student = test_support::insert_student(db, "300000000004", "Aguilar", "Female", 90.0).await;
    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/placements/assign",
        Some(json!({ "student_id": student.id, "program": "STE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    for (subject, teacher, start) in
        [("Mathematics", "Ms. Cruz", "07:30"), ("Science", "Mr. Lopez", "09:00")]
    {
        let (status, body) = send(
            &ctx.app,
            Method::PUT,
            &format!("/api/v1/sections/{}/subjects", section.id),
            Some(json!({
                "subject": subject,
                "teacher_name": teacher,
                "schedule_day": "MWF",
                "start_time": start,
                "end_time": "10:00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
    }

    let record_id = open_math_record(&ctx.app, &section.id).await;
    let (status, body) = send(
        &ctx.app,
        Method::PUT,
        &format!("/api/v1/class-records/{record_id}/grades/{}", student.id),
        Some(json!({ "ww_scores": [8, 8], "pt_scores": [15, 15], "qa_score": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, report) = send(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/interventions/sections/{}/refresh", section.id),
        Some(json!({ "quarter": "Q1", "created_by": "Adviser" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {report}");
    assert_eq!(report["total_students"], 1);
    assert_eq!(report["subjects_checked"], 1);
    assert_eq!(report["created"], 1);
    assert_eq!(report["subjects_without_record"], json!(["Science"]));
}
