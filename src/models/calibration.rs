//! Calibration session records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CalibrationAdjustment, ComprehensiveEvaluation};

/// Lifecycle of a calibration session.
///
/// `SCHEDULED → IN_PROGRESS → COMPLETED`, with `CANCELLED` reachable from
/// either non-terminal state. There are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created; members are reserved but no adjustments are accepted yet.
    Scheduled,
    /// The committee is adjusting grades.
    InProgress,
    /// Final grades are binding and frozen.
    Completed,
    /// Abandoned; no grades became binding.
    Cancelled,
}

impl SessionStatus {
    /// True for `COMPLETED` and `CANCELLED`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Scheduled, SessionStatus::InProgress)
                | (SessionStatus::InProgress, SessionStatus::Completed)
                | (SessionStatus::Scheduled, SessionStatus::Cancelled)
                | (SessionStatus::InProgress, SessionStatus::Cancelled)
        )
    }
}

/// Identifying details supplied when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    /// The period under review.
    pub period_id: String,
    /// The department under review.
    #[serde(default)]
    pub department: String,
    /// The date the committee meets.
    pub session_date: NaiveDate,
    /// Committee members.
    #[serde(default)]
    pub participants: Vec<String>,
}

/// A point-in-time copy of a calibration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSession {
    /// Unique identifier for the session.
    pub id: Uuid,
    /// Period, department, date and participants.
    #[serde(flatten)]
    pub details: SessionDetails,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Member evaluations, with final grades once completed.
    pub evaluations: Vec<ComprehensiveEvaluation>,
    /// Every adjustment made during the session, oldest first.
    pub adjustments: Vec<CalibrationAdjustment>,
}
