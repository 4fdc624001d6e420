//! Core data models for the Evaluation Engine.
//!
//! This module contains all the domain records consumed and produced by
//! the engine. None of them know about HTTP or storage.

mod audit;
mod axis_evaluation;
mod calibration;
mod comprehensive;
mod grade;
mod growth_level;
mod period;
mod task;

pub use audit::{AuditStep, CalibrationAdjustment};
pub use axis_evaluation::{AxisEvaluation, AxisInputs, AxisOutcome};
pub use calibration::{CalibrationSession, SessionDetails, SessionStatus};
pub use comprehensive::{ComprehensiveEvaluation, EvaluationFeedback};
pub use grade::{Axis, FinalGrade, PreliminaryGrade};
pub use growth_level::{
    CertificationDecision, CertificationResult, CertificationStatus, CourseId, GrowthLevel,
    ProgressReport, SkillId,
};
pub use period::{EvaluationPeriod, PeriodStatus};
pub use task::{MAX_TOTAL_WEIGHT, Task, TaskInput};
