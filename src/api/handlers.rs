//! HTTP request handlers for the Evaluation Engine API.
//!
//! Every handler tags its request with a correlation id, decodes the JSON
//! body, delegates to the [`PerformanceService`](crate::service::PerformanceService)
//! and maps engine errors onto JSON error responses.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::Task;

use super::request::{
    AdjustmentRequest, AxisEvaluationInput, CertificationRequest, ChecklistScoreRequest,
    CheckInRequest, CombineRequest, ComprehensiveRequest, ContributionScoreRequest,
    OpenSessionRequest, PeriodRequest,
};
use super::response::{ApiError, ApiErrorResponse, CombineResponse, ScoreResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/score/contribution", post(score_contribution_handler))
        .route("/score/checklist", post(score_checklist_handler))
        .route("/grade/combine", post(combine_handler))
        .route("/periods", post(create_period_handler))
        .route("/periods/:id/close", post(close_period_handler))
        .route("/tasks", post(upsert_task_handler))
        .route("/tasks/:id/check-in", post(check_in_handler))
        .route("/axis-evaluations", post(axis_evaluation_handler))
        .route("/comprehensive-evaluations", post(comprehensive_handler))
        .route("/calibration-sessions", post(open_session_handler))
        .route("/calibration-sessions/:id", get(get_session_handler))
        .route("/calibration-sessions/:id/start", post(start_session_handler))
        .route(
            "/calibration-sessions/:id/adjustments",
            post(adjustment_handler),
        )
        .route(
            "/calibration-sessions/:id/complete",
            post(complete_session_handler),
        )
        .route("/calibration-sessions/:id/cancel", post(cancel_session_handler))
        .route(
            "/growth-level-certification-check",
            post(certification_check_handler),
        )
        .route("/growth-level-progress", post(progress_handler))
        .with_state(state)
}

async fn score_contribution_handler(
    State(state): State<AppState>,
    payload: Result<Json<ContributionScoreRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("score_contribution");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state
        .service()
        .score_contribution(Some(&request.period_id), &request.tasks)
        .map(|result| ScoreResponse {
            employee_id: request.employee_id,
            period_id: request.period_id,
            result,
        });
    respond(correlation_id, "score_contribution", StatusCode::OK, result)
}

async fn score_checklist_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChecklistScoreRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("score_checklist");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state
        .service()
        .score_checklist(
            request.axis,
            &request.items,
            request.required_level,
            request.growth_level,
        )
        .map(|result| ScoreResponse {
            employee_id: request.employee_id,
            period_id: request.period_id,
            result,
        });
    respond(correlation_id, "score_checklist", StatusCode::OK, result)
}

async fn combine_handler(
    State(state): State<AppState>,
    payload: Result<Json<CombineRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("combine");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state
        .service()
        .combine(&request.employee_id, &request.period_id, &request.outcomes())
        .map(|combined| CombineResponse {
            employee_id: request.employee_id,
            period_id: request.period_id,
            combined,
        });
    respond(correlation_id, "combine", StatusCode::OK, result)
}

async fn create_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("create_period");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().create_period(request.into());
    respond(correlation_id, "create_period", StatusCode::CREATED, result)
}

async fn close_period_handler(
    State(state): State<AppState>,
    Path(period_id): Path<String>,
) -> Response {
    let correlation_id = begin("close_period");
    let result = state.service().close_period(&period_id);
    respond(correlation_id, "close_period", StatusCode::OK, result)
}

async fn upsert_task_handler(
    State(state): State<AppState>,
    payload: Result<Json<Task>, JsonRejection>,
) -> Response {
    let correlation_id = begin("upsert_task");
    let task = match decode(payload, correlation_id) {
        Ok(task) => task,
        Err(response) => return response,
    };
    let result = state.service().upsert_task(task);
    respond(correlation_id, "upsert_task", StatusCode::OK, result)
}

async fn check_in_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    payload: Result<Json<CheckInRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("check_in");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().check_in(&task_id, request.actual_value);
    respond(correlation_id, "check_in", StatusCode::OK, result)
}

async fn axis_evaluation_handler(
    State(state): State<AppState>,
    payload: Result<Json<AxisEvaluationInput>, JsonRejection>,
) -> Response {
    let correlation_id = begin("record_axis_evaluation");
    let input = match decode(payload, correlation_id) {
        Ok(input) => input,
        Err(response) => return response,
    };
    let result = state.service().record_axis_evaluation(input);
    respond(correlation_id, "record_axis_evaluation", StatusCode::OK, result)
}

async fn comprehensive_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComprehensiveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("build_comprehensive");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().build_comprehensive(
        &request.employee_id,
        &request.period_id,
        &request.department,
        request.feedback,
    );
    respond(correlation_id, "build_comprehensive", StatusCode::CREATED, result)
}

async fn open_session_handler(
    State(state): State<AppState>,
    payload: Result<Json<OpenSessionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("open_session");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state
        .service()
        .open_session(request.details, &request.evaluation_ids);
    respond(correlation_id, "open_session", StatusCode::CREATED, result)
}

async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let correlation_id = begin("get_session");
    let session_id = match parse_session_id(&session_id, correlation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state.service().session(session_id);
    respond(correlation_id, "get_session", StatusCode::OK, result)
}

async fn start_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let correlation_id = begin("start_session");
    let session_id = match parse_session_id(&session_id, correlation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state.service().start_session(session_id);
    respond(correlation_id, "start_session", StatusCode::OK, result)
}

async fn adjustment_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("apply_adjustment");
    let session_id = match parse_session_id(&session_id, correlation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().apply_adjustment(session_id, request);
    respond(correlation_id, "apply_adjustment", StatusCode::CREATED, result)
}

async fn complete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let correlation_id = begin("complete_session");
    let session_id = match parse_session_id(&session_id, correlation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state.service().complete_session(session_id);
    respond(correlation_id, "complete_session", StatusCode::OK, result)
}

async fn cancel_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let correlation_id = begin("cancel_session");
    let session_id = match parse_session_id(&session_id, correlation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state.service().cancel_session(session_id);
    respond(correlation_id, "cancel_session", StatusCode::OK, result)
}

async fn certification_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<CertificationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("certification_check");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().check_certification(request);
    respond(correlation_id, "certification_check", StatusCode::OK, result)
}

async fn progress_handler(
    State(state): State<AppState>,
    payload: Result<Json<CertificationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = begin("growth_level_progress");
    let request = match decode(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.service().progress(request);
    respond(correlation_id, "growth_level_progress", StatusCode::OK, result)
}

/// Generates a correlation id and logs the start of a request.
fn begin(operation: &'static str) -> Uuid {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, operation, "Processing request");
    correlation_id
}

/// Unwraps a JSON body or builds the 400 response for a rejected one.
fn decode<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(json_response(StatusCode::BAD_REQUEST, error))
}

fn parse_session_id(raw: &str, correlation_id: Uuid) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|err| {
        warn!(correlation_id = %correlation_id, session_id = %raw, "Invalid session id");
        json_response(
            StatusCode::BAD_REQUEST,
            ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid session id '{raw}'"),
                err.to_string(),
            ),
        )
    })
}

/// Serializes a service result, logging the outcome.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    success: StatusCode,
    result: EngineResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                "Request completed successfully"
            );
            json_response(success, body)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Request failed"
            );
            let api_error: ApiErrorResponse = err.into();
            json_response(api_error.status, api_error.error)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}
