//! The per-employee, per-period aggregation root.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AxisOutcome, FinalGrade, PreliminaryGrade};

/// Free-text feedback attached to a comprehensive evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFeedback {
    /// Overall comment from the manager.
    #[serde(default)]
    pub manager_comment: Option<String>,
    /// Observed strengths.
    #[serde(default)]
    pub strengths: Option<String>,
    /// Suggested improvements.
    #[serde(default)]
    pub improvements: Option<String>,
}

/// One employee's combined evaluation for one period.
///
/// Records are never deleted. Rebuilding an evaluation marks the previous
/// record with `superseded_by`, and `final_grade` is frozen once the owning
/// calibration session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensiveEvaluation {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Organisational unit used to group calibration sessions.
    #[serde(default)]
    pub department: String,
    /// Contribution axis outcome.
    pub contribution: AxisOutcome,
    /// Expertise axis outcome.
    pub expertise: AxisOutcome,
    /// Impact axis outcome.
    pub impact: AxisOutcome,
    /// Mean of the three axis scores, used to resolve half grades.
    pub total_score: Decimal,
    /// Grade derived from achievement counts. Records imported from
    /// elsewhere may lack one; they cannot enter calibration.
    pub preliminary_grade: Option<PreliminaryGrade>,
    /// Binding seven-tier grade, set when calibration completes.
    pub final_grade: Option<FinalGrade>,
    /// True once a completed calibration session produced `final_grade`.
    pub is_calibrated: bool,
    /// Signed tier distance applied by the committee (0 when unadjusted).
    pub calibration_adjustment: i8,
    /// Free-text feedback.
    #[serde(default)]
    pub feedback: EvaluationFeedback,
    /// The record that replaced this one, if any.
    #[serde(default)]
    pub superseded_by: Option<Uuid>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl ComprehensiveEvaluation {
    /// True when no newer record has replaced this one.
    pub fn is_current(&self) -> bool {
        self.superseded_by.is_none()
    }
}
