//! HTTP API module for the Evaluation Engine.
//!
//! This module exposes scoring, grade combination, period and task
//! management, calibration sessions and growth-level certification as
//! JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AdjustmentRequest, AxisEvaluationInput, CertificationRequest, CheckInRequest,
    ChecklistScoreRequest, CombineRequest, ComprehensiveRequest, ContributionScoreRequest,
    OpenSessionRequest, PeriodRequest,
};
pub use response::{ApiError, ApiErrorResponse, CombineResponse, ScoreResponse};
pub use state::AppState;
