use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn grades_are_transmuted_and_recomputed_on_config_change() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let program = test_support::insert_program(db, "STE").await;
    let section = test_support::insert_section(db, &program, "Rizal", 40).await;
    let passing = test_support::insert_student(db, "100000000001", "Santos", "Female", 92.0).await;
    let failing = test_support::insert_student(db, "100000000002", "Reyes", "Male", 88.0).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/class-records",
            Some(&section.id),
            Some(json!({
                "subject": "Mathematics",
                "teacher_name": "Ms. Cruz",
                "quarter": "Q1"
            })),
        ))
        .await
        .expect("create class record");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["section_id"], section.id.as_str());
    assert_eq!(created["school_year"], test_support::TEST_SCHOOL_YEAR);
    assert_eq!(created["weights_sum_to_hundred"], true);
    let record_id = created["id"].as_str().expect("record id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/class-records/{record_id}/config"),
            None,
            Some(json!({
                "ww_weight": 30,
                "pt_weight": 50,
                "qa_weight": 20,
                "ww_hps": [20, 20],
                "pt_hps": [50],
                "qa_hps": 50
            })),
        ))
        .await
        .expect("update config");
    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["recomputed"], 0);
    assert_eq!(updated["record"]["ww_hps"].as_array().map(Vec::len), Some(10));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/class-records/{record_id}/grades/{}", passing.id),
            None,
            Some(json!({ "ww_scores": [18, 16], "pt_scores": [40], "qa_score": 45 })),
        ))
        .await
        .expect("save passing grade");
    let status = response.status();
    let grade = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {grade}");
    assert_eq!(grade["quarterly_grade"], 89);
    assert_eq!(grade["ww_percentage"], 85.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/class-records/{record_id}/grades/{}", failing.id),
            None,
            Some(json!({ "ww_scores": [5, 5], "pt_scores": [10] })),
        ))
        .await
        .expect("save failing grade");
    let status = response.status();
    let grade = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {grade}");
    assert_eq!(grade["quarterly_grade"], 64);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/class-records/{record_id}/early-warnings"),
            None,
            None,
        ))
        .await
        .expect("early warnings");
    assert_eq!(response.status(), StatusCode::OK);
    let warnings = test_support::read_json(response).await;
    let warnings = warnings.as_array().expect("warnings array");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["student_id"], failing.id.as_str());
    assert_eq!(warnings[0]["kind"], "at_risk");
    assert_eq!(warnings[0]["required"]["qa_score_needed"], 30.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/class-records/{record_id}/config"),
            None,
            Some(json!({
                "ww_weight": 40,
                "pt_weight": 40,
                "qa_weight": 20,
                "ww_hps": [20, 20],
                "pt_hps": [50],
                "qa_hps": 50
            })),
        ))
        .await
        .expect("reweight");
    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["recomputed"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/class-records/{record_id}"),
            None,
            None,
        ))
        .await
        .expect("record detail");
    let detail = test_support::read_json(response).await;
    let grades = detail["grades"].as_array().expect("grades array");
    let passing_row = grades
        .iter()
        .find(|row| row["student_id"] == passing.id.as_str())
        .expect("passing row");
    // 34 + 32 + 18 = 84.0
    assert_eq!(passing_row["quarterly_grade"], 90);
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn duplicate_class_record_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let program = test_support::insert_program(ctx.state.db(), "STE").await;
    let section = test_support::insert_section(ctx.state.db(), &program, "Mabini", 35).await;

    let payload = json!({
        "section_id": section.id,
        "subject": "Science",
        "teacher_name": "Mr. Dela Cruz",
        "quarter": "Q2"
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/class-records",
            None,
            Some(payload.clone()),
        ))
        .await
        .expect("create class record");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/class-records",
            None,
            Some(payload),
        ))
        .await
        .expect("create duplicate");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires the PostgreSQL test database"]
async fn weights_outside_range_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let program = test_support::insert_program(ctx.state.db(), "STE").await;
    let section = test_support::insert_section(ctx.state.db(), &program, "Bonifacio", 35).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/class-records",
            Some(&section.id),
            Some(json!({ "subject": "English", "teacher_name": "Ms. Lim", "quarter": "Q1" })),
        ))
        .await
        .expect("create class record");
    let created = test_support::read_json(response).await;
    let record_id = created["id"].as_str().expect("record id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/class-records/{record_id}/config"),
            None,
            Some(json!({ "ww_weight": 120, "pt_weight": 0, "qa_weight": 0 })),
        ))
        .await
        .expect("update config");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
