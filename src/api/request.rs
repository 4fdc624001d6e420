//! Request types for the Evaluation Engine API.
//!
//! Bodies that map one-to-one onto a service input reuse that type
//! directly; the rest are defined here and converted into domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::AxisOutcomes;
use crate::models::{
    Axis, AxisOutcome, EvaluationFeedback, EvaluationPeriod, PeriodStatus, SessionDetails,
    TaskInput,
};

pub use crate::calibration::AdjustmentRequest;
pub use crate::service::{AxisEvaluationInput, CertificationRequest};

/// Request body for `POST /score/contribution`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionScoreRequest {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period; a registered period may override the
    /// achievement threshold.
    pub period_id: String,
    /// Weighted tasks with their achievement rates.
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
}

/// Request body for `POST /score/checklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistScoreRequest {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// `expertise` or `impact`.
    pub axis: Axis,
    /// One rating per checklist item.
    pub items: Vec<i32>,
    /// Score required to achieve the axis.
    #[serde(default)]
    pub required_level: Option<Decimal>,
    /// Growth level used to look up `required_level` when omitted.
    #[serde(default)]
    pub growth_level: Option<u8>,
}

/// Request body for `POST /grade/combine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineRequest {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Contribution outcome, if entered.
    #[serde(default)]
    pub contribution: Option<AxisOutcome>,
    /// Expertise outcome, if entered.
    #[serde(default)]
    pub expertise: Option<AxisOutcome>,
    /// Impact outcome, if entered.
    #[serde(default)]
    pub impact: Option<AxisOutcome>,
}

impl CombineRequest {
    /// The three outcomes as the combiner reads them.
    pub fn outcomes(&self) -> AxisOutcomes {
        AxisOutcomes {
            contribution: self.contribution,
            expertise: self.expertise,
            impact: self.impact,
        }
    }
}

/// Request body for `POST /periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRequest {
    /// Unique period identifier (e.g. "2025H1").
    pub id: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Optional Contribution threshold override.
    #[serde(default)]
    pub achievement_threshold: Option<Decimal>,
}

impl From<PeriodRequest> for EvaluationPeriod {
    fn from(req: PeriodRequest) -> Self {
        EvaluationPeriod {
            id: req.id,
            start_date: req.start_date,
            end_date: req.end_date,
            status: PeriodStatus::Open,
            achievement_threshold: req.achievement_threshold,
        }
    }
}

/// Request body for `POST /tasks/:id/check-in`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    /// The newly achieved value.
    pub actual_value: Decimal,
}

/// Request body for `POST /comprehensive-evaluations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveRequest {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Organisational unit for calibration grouping.
    #[serde(default)]
    pub department: String,
    /// Free-text feedback.
    #[serde(default)]
    pub feedback: EvaluationFeedback,
}

/// Request body for `POST /calibration-sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    /// Period, department, date and participants.
    #[serde(flatten)]
    pub details: SessionDetails,
    /// Comprehensive evaluations to review.
    pub evaluation_ids: Vec<Uuid>,
}
