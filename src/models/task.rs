//! Task model used by the Contribution axis.
//!
//! A [`Task`] is an employee's weighted objective for a period. Employees
//! update `actual_value` through check-ins; the achievement rate is always
//! derived, never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ContributionPolicy;
use crate::error::{EngineError, EngineResult};

/// Upper bound of a single task weight, and of the weight total per
/// employee and period.
pub const MAX_TOTAL_WEIGHT: Decimal = Decimal::ONE_HUNDRED;

/// A weighted objective owned by one employee in one period.
///
/// # Example
///
/// ```
/// use evaluation_engine::models::Task;
/// use rust_decimal::Decimal;
///
/// let task = Task {
///     id: "task_001".to_string(),
///     employee_id: "emp_001".to_string(),
///     period_id: "2025H1".to_string(),
///     title: "Close Q2 ledger".to_string(),
///     weight: Decimal::from(60),
///     target_value: Decimal::from(200),
///     target_unit: "accounts".to_string(),
///     actual_value: Decimal::from(220),
/// };
///
/// assert_eq!(task.achievement_rate().unwrap(), Decimal::new(11, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: String,
    /// The employee who owns the task.
    pub employee_id: String,
    /// The evaluation period the task belongs to.
    pub period_id: String,
    /// Short description of the objective.
    #[serde(default)]
    pub title: String,
    /// Relative weight in percent (0-100).
    pub weight: Decimal,
    /// The value that counts as 100% achievement.
    pub target_value: Decimal,
    /// Unit of the target (e.g. "accounts", "KRW million").
    #[serde(default)]
    pub target_unit: String,
    /// The latest checked-in actual value.
    #[serde(default)]
    pub actual_value: Decimal,
}

impl Task {
    /// Returns `actual_value / target_value`.
    ///
    /// Fails with a validation error when the target is not positive or
    /// the ratio does not fit a decimal.
    pub fn achievement_rate(&self) -> EngineResult<Decimal> {
        if self.target_value <= Decimal::ZERO {
            return Err(EngineError::validation(
                format!("tasks[{}].target_value", self.id),
                "target value must be greater than zero",
            ));
        }
        self.actual_value
            .checked_div(self.target_value)
            .ok_or_else(|| {
                EngineError::validation(
                    format!("tasks[{}].actual_value", self.id),
                    format!(
                        "actual value {} against target {} is out of range",
                        self.actual_value, self.target_value
                    ),
                )
            })
    }

    /// Checks the weight and target without looking at other tasks.
    pub fn validate(&self) -> EngineResult<()> {
        if self.weight < Decimal::ZERO || self.weight > MAX_TOTAL_WEIGHT {
            return Err(EngineError::validation(
                format!("tasks[{}].weight", self.id),
                format!("weight {} is outside 0..=100", self.weight),
            ));
        }
        if self.actual_value < Decimal::ZERO {
            return Err(EngineError::validation(
                format!("tasks[{}].actual_value", self.id),
                "actual value cannot be negative",
            ));
        }
        self.achievement_rate().map(|_| ())
    }

    /// The task's own score before weighting: the capped achievement rate
    /// times the axis multiplier, rounded to two places.
    pub fn base_score(&self, policy: &ContributionPolicy) -> EngineResult<Decimal> {
        let rate = self.achievement_rate()?.min(policy.achievement_rate_cap);
        Ok((rate * policy.score_multiplier).round_dp(2))
    }

    /// Converts the task into the scorer's input record.
    pub fn to_input(&self) -> EngineResult<TaskInput> {
        Ok(TaskInput {
            weight: self.weight,
            achievement_rate: self.achievement_rate()?,
        })
    }
}

/// The part of a task the Contribution scorer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    /// Relative weight in percent (0-100).
    pub weight: Decimal,
    /// Actual divided by target (1.0 = 100%).
    pub achievement_rate: Decimal,
}
