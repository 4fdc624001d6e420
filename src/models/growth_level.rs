//! Growth-level certification records and decisions.
//!
//! This module contains the [`GrowthLevel`] history row, the structured
//! [`CertificationDecision`] returned by a certification check, and the
//! [`ProgressReport`] shown while an employee works towards a level.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a training course.
pub type CourseId = String;

/// Identifier of a skill.
pub type SkillId = String;

/// Where an employee stands in certifying to their target level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationStatus {
    /// No check has run yet.
    NotStarted,
    /// At least one requirement is unmet.
    InProgress,
    /// Every requirement is met; awaiting human approval.
    Eligible,
    /// Approved by a human reviewer.
    Certified,
    /// Rejected by a human reviewer.
    Rejected,
}

/// Overall outcome of a certification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificationResult {
    /// Every requirement is met.
    Pass,
    /// At least one requirement is unmet.
    Fail,
}

/// The structured outcome of a certification check.
///
/// A failed check lists exactly what is missing so callers can render
/// actionable feedback.
///
/// # Example
///
/// ```
/// use evaluation_engine::models::{CertificationDecision, CertificationResult};
///
/// let decision = CertificationDecision {
///     certification_result: CertificationResult::Fail,
///     eval_ok: true,
///     missing_courses: vec!["risk_201".to_string()],
///     missing_skills: vec![],
/// };
/// let json = serde_json::to_string(&decision).unwrap();
/// assert_eq!(
///     json,
///     r#"{"certification_result":"FAIL","eval_ok":true,"missing_courses":["risk_201"],"missing_skills":[]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDecision {
    /// `PASS` iff `eval_ok` and both missing lists are empty.
    pub certification_result: CertificationResult,
    /// Whether the latest final grade meets the level's floor.
    pub eval_ok: bool,
    /// Required courses not yet completed, in configured order.
    pub missing_courses: Vec<CourseId>,
    /// Required skills not yet held, in configured order.
    pub missing_skills: Vec<SkillId>,
}

impl CertificationDecision {
    /// Returns true for a `PASS` decision.
    pub fn passed(&self) -> bool {
        self.certification_result == CertificationResult::Pass
    }
}

/// Percent completion of each requirement family for a target level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Evaluation-grade requirement, 0-100.
    pub evaluation: Decimal,
    /// Required training, 0-100.
    pub training: Decimal,
    /// Required skills, 0-100.
    pub skills: Decimal,
    /// Required years of experience, 0-100.
    pub experience: Decimal,
    /// Weighted average of the four values above.
    pub overall: Decimal,
    /// True when `overall` reaches 100.
    pub can_apply: bool,
}

/// One certification-check row in an employee's growth-level history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthLevel {
    /// The employee.
    pub employee_id: String,
    /// The period the check ran in, if known.
    #[serde(default)]
    pub period_id: Option<String>,
    /// The level currently held.
    pub current_level: u8,
    /// The level being certified to.
    pub target_level: u8,
    /// Overall progress towards the target, 0-100.
    pub progress_percentage: Decimal,
    /// Certification state after the check.
    pub certification_status: CertificationStatus,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}

impl GrowthLevel {
    /// Status an employee moves to after a check, given their previous status.
    ///
    /// A pass makes the employee `ELIGIBLE`; only a human reviewer moves them
    /// to `CERTIFIED`, and a certified employee is never downgraded by a check.
    pub fn next_status(
        previous: Option<CertificationStatus>,
        decision: &CertificationDecision,
    ) -> CertificationStatus {
        match (previous, decision.passed()) {
            (Some(CertificationStatus::Certified), _) => CertificationStatus::Certified,
            (_, true) => CertificationStatus::Eligible,
            (_, false) => CertificationStatus::InProgress,
        }
    }
}
