//! Per-axis evaluation records.
//!
//! Each employee receives one [`AxisEvaluation`] per axis per period. The
//! record keeps the itemized inputs so the score can be re-derived and
//! audited later.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Axis, TaskInput};

/// The itemized inputs an axis score was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisInputs {
    /// Contribution: weighted task completion.
    Tasks {
        /// The employee's tasks for the period.
        tasks: Vec<TaskInput>,
    },
    /// Expertise or Impact: checklist ratings against a required level.
    Checklist {
        /// One rating per checklist item.
        items: Vec<i32>,
        /// The score needed to count as achieved.
        required_level: Decimal,
    },
}

/// The scored result of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisOutcome {
    /// The score on the 0-5 band.
    pub score: Decimal,
    /// Whether the axis threshold was met.
    pub is_achieved: bool,
}

/// A stored evaluation of one axis for one employee and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEvaluation {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// Which axis this record scores.
    pub axis: Axis,
    /// The inputs the score was computed from.
    pub inputs: AxisInputs,
    /// The computed score on the 0-5 band.
    pub score: Decimal,
    /// Whether the axis threshold was met.
    pub is_achieved: bool,
    /// The evaluator (manager) who last wrote this record.
    pub evaluator_id: String,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl AxisEvaluation {
    /// Returns the score and achievement flag.
    pub fn outcome(&self) -> AxisOutcome {
        AxisOutcome {
            score: self.score,
            is_achieved: self.is_achieved,
        }
    }
}
