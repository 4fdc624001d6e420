//! Evaluation period model.
//!
//! This module contains the [`EvaluationPeriod`] type that bounds every
//! task, axis evaluation and calibration session.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an evaluation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Tasks and axis evaluations may be written.
    Open,
    /// Every task and axis evaluation of the period is frozen.
    Closed,
}

/// A span of time over which employees are evaluated.
///
/// # Example
///
/// ```
/// use evaluation_engine::models::{EvaluationPeriod, PeriodStatus};
/// use chrono::NaiveDate;
///
/// let period = EvaluationPeriod {
///     id: "2025H1".to_string(),
///     start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
///     status: PeriodStatus::Open,
///     achievement_threshold: None,
/// };
///
/// assert!(period.is_open());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPeriod {
    /// Unique identifier for the period (e.g. "2025H1").
    pub id: String,
    /// The first day of the period (inclusive).
    pub start_date: NaiveDate,
    /// The last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Whether the period still accepts writes.
    pub status: PeriodStatus,
    /// Contribution achievement threshold for this period, overriding the
    /// policy default when present (1.0 = 100%).
    #[serde(default)]
    pub achievement_threshold: Option<Decimal>,
}

impl EvaluationPeriod {
    /// Returns true while the period accepts writes.
    pub fn is_open(&self) -> bool {
        self.status == PeriodStatus::Open
    }
}
