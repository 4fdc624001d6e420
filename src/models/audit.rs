//! Audit records explaining scoring and calibration decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FinalGrade;

/// A single step in an audit trace recording a scoring decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// One committee change to an evaluation's final grade.
///
/// Adjustments are append-only: re-adjusting an evaluation adds a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationAdjustment {
    /// The adjusted comprehensive evaluation.
    pub evaluation_id: Uuid,
    /// The grade the evaluation would have received without this change.
    pub from_grade: FinalGrade,
    /// The grade chosen by the committee.
    pub to_grade: FinalGrade,
    /// Signed tier distance between the preliminary baseline and `to_grade`.
    pub adjustment: i8,
    /// Why the committee made the change.
    pub reason: String,
    /// Who made the change.
    pub actor: String,
    /// When the change was made.
    pub adjusted_at: DateTime<Utc>,
}
