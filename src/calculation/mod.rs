//! Scoring and grading logic for the evaluation engine.
//!
//! This module contains the pure calculation functions: Contribution axis
//! scoring from weighted tasks, Expertise and Impact checklist scoring,
//! combination of the three axis outcomes into a preliminary grade, the
//! half-grade mapping onto the seven-tier scale, and growth-level
//! certification and progress checks. Nothing here performs I/O.

mod certification;
mod checklist;
mod contribution;
mod grade_combiner;
mod half_grade;
mod progress;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, Axis};

pub use certification::{CertificationEvidence, GrowthLevelCertifier};
pub use checklist::score_checklist;
pub use contribution::score_contribution;
pub use grade_combiner::{AxisOutcomes, CombinedGrade, GradeCombiner};
pub use half_grade::HalfGradePolicy;
pub use progress::calculate_progress;

/// Upper bound of every axis score.
pub const SCORE_SCALE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// The result of scoring one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisScoreResult {
    /// The axis that was scored.
    pub axis: Axis,
    /// Score on the 0-5 band, rounded to two places.
    pub score: Decimal,
    /// Whether the axis was achieved.
    pub is_achieved: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}
