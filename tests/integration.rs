//! End-to-end tests for the Evaluation Engine HTTP API.
//!
//! These tests drive the router the way a client would:
//! - Stateless scoring and grade combination
//! - Period, task and axis entry leading to a comprehensive evaluation
//! - Calibration sessions fixing final grades
//! - Growth-level certification and progress
//! - Error codes

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use evaluation_engine::api::{AppState, create_router};
use evaluation_engine::config::ConfigLoader;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_router_for_test() -> Router {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    create_router(AppState::new(config))
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, "POST", uri, Some(body)).await
}

async fn create_period(router: &Router) {
    let (status, _) = post(
        router,
        "/periods",
        json!({"id": "2025H1", "start_date": "2025-01-01", "end_date": "2025-06-30"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// Enters tasks at 110% and 80% achievement plus two achieved checklist
/// axes, then builds the comprehensive evaluation. Returns its id.
async fn evaluate_employee(router: &Router, employee_id: &str) -> String {
    for (suffix, weight, actual) in [("a", 60, 11), ("b", 40, 8)] {
        let (status, body) = post(
            router,
            "/tasks",
            json!({
                "id": format!("{employee_id}_{suffix}"),
                "employee_id": employee_id,
                "period_id": "2025H1",
                "title": "Quarterly target",
                "weight": weight,
                "target_value": 10,
                "actual_value": actual
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "task rejected: {body}");
    }

    let axes = [
        json!({"axis": "contribution"}),
        json!({"axis": "expertise", "items": [4, 4, 3, 3, 4], "required_level": 3.0}),
        json!({"axis": "impact", "items": [4, 3, 4, 5], "required_level": 3.0}),
    ];
    for mut axis in axes {
        axis["employee_id"] = json!(employee_id);
        axis["period_id"] = json!("2025H1");
        axis["evaluator_id"] = json!("mgr_lee");
        let (status, body) = post(router, "/axis-evaluations", axis).await;
        assert_eq!(status, StatusCode::OK, "axis rejected: {body}");
    }

    let (status, body) = post(
        router,
        "/comprehensive-evaluations",
        json!({"employee_id": employee_id, "period_id": "2025H1", "department": "risk"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "comprehensive rejected: {body}");
    body["evaluation"]["id"].as_str().unwrap().to_string()
}

async fn open_session(router: &Router, evaluation_ids: &[&str]) -> (StatusCode, Value) {
    post(
        router,
        "/calibration-sessions",
        json!({
            "period_id": "2025H1",
            "department": "risk",
            "session_date": "2025-07-10",
            "participants": ["hr_kim"],
            "evaluation_ids": evaluation_ids
        }),
    )
    .await
}

async fn calibrate(router: &Router, evaluation_id: &str, grade: &str) -> Value {
    let (status, session) = open_session(router, &[evaluation_id]).await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = session["id"].as_str().unwrap().to_string();

    let (status, _) = post(router, &format!("/calibration-sessions/{session_id}/start"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(
        router,
        &format!("/calibration-sessions/{session_id}/adjustments"),
        json!({
            "evaluation_id": evaluation_id,
            "new_grade": grade,
            "reason": "peer comparison",
            "actor": "hr_kim"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, completed) =
        post(router, &format!("/calibration-sessions/{session_id}/complete"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    completed
}

// =============================================================================
// Scoring
// =============================================================================

#[tokio::test]
async fn test_weighted_contribution_combines_to_a() {
    let router = create_router_for_test();

    let (status, contribution) = post(
        &router,
        "/score/contribution",
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "tasks": [
                {"weight": 60, "achievement_rate": 1.1},
                {"weight": 40, "achievement_rate": 0.8}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&contribution["score"]), Decimal::from_str("2.94").unwrap());
    assert_eq!(contribution["is_achieved"], false);

    let (_, expertise) = post(
        &router,
        "/score/checklist",
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "axis": "expertise",
            "items": [4, 4, 3, 3, 4],
            "required_level": 3.0
        }),
    )
    .await;
    let (_, impact) = post(
        &router,
        "/score/checklist",
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "axis": "impact",
            "items": [4, 3, 4, 5],
            "required_level": 3.0
        }),
    )
    .await;
    assert_eq!(expertise["is_achieved"], true);
    assert_eq!(impact["is_achieved"], true);

    let (status, combined) = post(
        &router,
        "/grade/combine",
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "contribution": {"score": contribution["score"], "is_achieved": false},
            "expertise": {"score": expertise["score"], "is_achieved": true},
            "impact": {"score": impact["score"], "is_achieved": true}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(combined["preliminary_grade"], "A");
    assert_eq!(combined["achieved_count"], 2);
}

#[tokio::test]
async fn test_checklist_uses_growth_level_requirement() {
    let router = create_router_for_test();
    let request = |growth_level: u8| {
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "axis": "expertise",
            "items": [3, 3, 3, 3, 3],
            "growth_level": growth_level
        })
    };

    let (status, junior) = post(&router, "/score/checklist", request(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(junior["is_achieved"], true);

    let (_, principal) = post(&router, "/score/checklist", request(5)).await;
    assert_eq!(principal["is_achieved"], false);
}

// =============================================================================
// Evaluation lifecycle
// =============================================================================

#[tokio::test]
async fn test_stored_axes_build_comprehensive_evaluation() {
    let router = create_router_for_test();
    create_period(&router).await;
    evaluate_employee(&router, "emp_001").await;

    let (status, rebuilt) = post(
        &router,
        "/comprehensive-evaluations",
        json!({"employee_id": "emp_001", "period_id": "2025H1", "department": "risk"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rebuilt["evaluation"]["preliminary_grade"], "A");
    assert!(rebuilt["evaluation"]["final_grade"].is_null());
    assert!(rebuilt["supersedes"].is_string());
}

#[tokio::test]
async fn test_incomplete_axes_return_conflict() {
    let router = create_router_for_test();
    create_period(&router).await;
    let (status, _) = post(
        &router,
        "/axis-evaluations",
        json!({
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "axis": "impact",
            "evaluator_id": "mgr_lee",
            "items": [4, 3, 4, 5],
            "required_level": 3.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &router,
        "/comprehensive-evaluations",
        json!({"employee_id": "emp_001", "period_id": "2025H1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INCOMPLETE_EVALUATION");
    assert_eq!(body["details"], "contribution,expertise");
}

#[tokio::test]
async fn test_task_weights_cannot_exceed_one_hundred() {
    let router = create_router_for_test();
    create_period(&router).await;
    evaluate_employee(&router, "emp_001").await;

    let (status, body) = post(
        &router,
        "/tasks",
        json!({
            "id": "emp_001_c",
            "employee_id": "emp_001",
            "period_id": "2025H1",
            "weight": 1,
            "target_value": 10
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Calibration
// =============================================================================

#[tokio::test]
async fn test_calibration_session_fixes_final_grades() {
    let router = create_router_for_test();
    create_period(&router).await;
    let first = evaluate_employee(&router, "emp_001").await;
    let second = evaluate_employee(&router, "emp_002").await;

    let (status, session) = open_session(&router, &[&first, &second]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["status"], "SCHEDULED");
    let session_id = session["id"].as_str().unwrap().to_string();

    // Members cannot join a second open session
    let (status, body) = open_session(&router, &[&first]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "POLICY_VIOLATION");

    // Adjustments need an in-progress session
    let adjust = |grade: &str| {
        json!({
            "evaluation_id": first,
            "new_grade": grade,
            "reason": "peer comparison",
            "actor": "hr_kim"
        })
    };
    let adjustments_uri = format!("/calibration-sessions/{session_id}/adjustments");
    let (status, _) = post(&router, &adjustments_uri, adjust("A+")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, started) =
        post(&router, &format!("/calibration-sessions/{session_id}/start"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "IN_PROGRESS");

    let (status, adjustment) = post(&router, &adjustments_uri, adjust("A+")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(adjustment["from_grade"], "A");
    assert_eq!(adjustment["to_grade"], "A+");

    // Three tiers down from A is past the bound
    let (status, body) = post(&router, &adjustments_uri, adjust("C")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("tiers"));

    let (status, _) = post(&router, "/periods/2025H1/close", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, completed) =
        post(&router, &format!("/calibration-sessions/{session_id}/complete"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "COMPLETED");
    let grades: Vec<&str> = completed["evaluations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|evaluation| evaluation["final_grade"].as_str().unwrap())
        .collect();
    assert_eq!(grades, vec!["A+", "A"]);

    let (status, fetched) = send(
        &router,
        "GET",
        &format!("/calibration-sessions/{session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["adjustments"].as_array().unwrap().len(), 1);

    let (status, closed) = post(&router, "/periods/2025H1/close", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "CLOSED");

    let (status, body) = post(
        &router,
        "/tasks/emp_001_a/check-in",
        json!({"actual_value": 12}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "POLICY_VIOLATION");
}

#[tokio::test]
async fn test_cancelled_session_releases_members() {
    let router = create_router_for_test();
    create_period(&router).await;
    let evaluation = evaluate_employee(&router, "emp_001").await;

    let (_, session) = open_session(&router, &[&evaluation]).await;
    let session_id = session["id"].as_str().unwrap();
    let (status, cancelled) =
        post(&router, &format!("/calibration-sessions/{session_id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (status, _) = open_session(&router, &[&evaluation]).await;
    assert_eq!(status, StatusCode::CREATED);
}

// =============================================================================
// Growth-level certification
// =============================================================================

#[tokio::test]
async fn test_certification_fails_on_missing_course() {
    let router = create_router_for_test();
    create_period(&router).await;
    let evaluation = evaluate_employee(&router, "emp_001").await;
    calibrate(&router, &evaluation, "B+").await;

    let (status, body) = post(
        &router,
        "/growth-level-certification-check",
        json!({
            "employee_id": "emp_001",
            "current_level": 2,
            "target_level": 3,
            "period_id": "2025H1",
            "completed_courses": ["compliance_201", "leadership_basics"],
            "skills": ["excel_modeling", "credit_analysis"],
            "years_of_experience": 5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certification_result"], "FAIL");
    assert_eq!(body["eval_ok"], true);
    assert_eq!(body["missing_courses"], json!(["risk_management_301"]));
    assert_eq!(body["missing_skills"], json!([]));
    assert_eq!(body["growth_level"]["certification_status"], "IN_PROGRESS");
}

#[tokio::test]
async fn test_certification_pass_and_progress() {
    let router = create_router_for_test();
    create_period(&router).await;
    let evaluation = evaluate_employee(&router, "emp_001").await;
    calibrate(&router, &evaluation, "A").await;

    let request = json!({
        "employee_id": "emp_001",
        "current_level": 2,
        "target_level": 3,
        "completed_courses": ["compliance_201", "risk_management_301", "leadership_basics"],
        "skills": ["excel_modeling", "credit_analysis"],
        "years_of_experience": 4
    });

    let (status, body) = post(&router, "/growth-level-certification-check", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certification_result"], "PASS");
    assert_eq!(body["growth_level"]["certification_status"], "ELIGIBLE");

    let (status, progress) = post(&router, "/growth-level-progress", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["progress"]["can_apply"], true);
    assert_eq!(decimal(&progress["progress"]["overall"]), Decimal::ONE_HUNDRED);
    assert_eq!(progress["growth_level"]["certification_status"], "ELIGIBLE");
}

#[tokio::test]
async fn test_certification_requires_higher_target() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/growth-level-certification-check",
        json!({"employee_id": "emp_001", "current_level": 3, "target_level": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_axis_evaluation_for_unknown_period_returns_404() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/axis-evaluations",
        json!({
            "employee_id": "emp_001",
            "period_id": "2030H1",
            "axis": "impact",
            "evaluator_id": "mgr_lee",
            "items": [4, 3, 4, 5],
            "required_level": 3.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_period_returns_400() {
    let router = create_router_for_test();
    create_period(&router).await;
    let (status, body) = post(
        &router,
        "/periods",
        json!({"id": "2025H1", "start_date": "2025-01-01", "end_date": "2025-06-30"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_content_type_returns_error() {
    let router = create_router_for_test();
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/grade/combine")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["code"], "MISSING_CONTENT_TYPE");
}
