//! Response types for the Evaluation Engine API.
//!
//! This module defines the response envelopes and the mapping from
//! [`EngineError`] to HTTP status codes and error bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::calculation::{AxisScoreResult, CombinedGrade};
use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::ValidationError { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, field),
            ),
            EngineError::IncompleteEvaluation { missing, .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "INCOMPLETE_EVALUATION",
                    message,
                    missing
                        .iter()
                        .map(|axis| axis.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            ),
            EngineError::PolicyViolation { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("POLICY_VIOLATION", message),
            ),
            EngineError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details("NOT_FOUND", message, entity),
            ),
            EngineError::GrowthLevelNotFound { level } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "GROWTH_LEVEL_NOT_FOUND",
                    message,
                    format!("Growth level {level} has no configured requirements"),
                ),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

/// Response body for the scoring endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Score, achievement and audit step.
    #[serde(flatten)]
    pub result: AxisScoreResult,
}

/// Response body for `POST /grade/combine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineResponse {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Preliminary grade, outcomes and audit step.
    #[serde(flatten)]
    pub combined: CombinedGrade,
}
