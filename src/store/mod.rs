//! Persistence for periods, tasks, evaluations and growth-level history.
//!
//! The immutability rules live here, as write guards any backend must
//! enforce:
//!
//! * tasks and axis evaluations cannot be written once their period is
//!   `CLOSED`;
//! * a task write may not push an employee's period weight total above 100;
//! * a calibrated `final_grade` can never be rewritten;
//! * comprehensive evaluations are superseded, never removed.

mod memory;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AxisEvaluation, ComprehensiveEvaluation, EvaluationPeriod, FinalGrade, GrowthLevel, Task,
};

pub use memory::InMemoryEvaluationRepository;

/// Storage abstraction so the service can be exercised in isolation.
pub trait EvaluationRepository: Send + Sync {
    /// Registers a new period.
    fn insert_period(&self, period: EvaluationPeriod) -> EngineResult<EvaluationPeriod>;

    /// Looks up a period.
    fn period(&self, period_id: &str) -> EngineResult<EvaluationPeriod>;

    /// Marks a period `CLOSED`. Closing a closed period is a no-op.
    fn close_period(&self, period_id: &str) -> EngineResult<EvaluationPeriod>;

    /// Inserts or replaces a task.
    fn upsert_task(&self, task: Task) -> EngineResult<Task>;

    /// Records a check-in against a task.
    fn check_in(&self, task_id: &str, actual_value: Decimal) -> EngineResult<Task>;

    /// Tasks of one employee in one period, ordered by id.
    fn tasks_for(&self, employee_id: &str, period_id: &str) -> EngineResult<Vec<Task>>;

    /// Inserts or replaces the evaluation of one axis.
    fn put_axis_evaluation(&self, evaluation: AxisEvaluation) -> EngineResult<AxisEvaluation>;

    /// The axis evaluations entered so far for one employee and period.
    fn axis_evaluations(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> EngineResult<Vec<AxisEvaluation>>;

    /// Stores a comprehensive evaluation, superseding the employee's
    /// current record for the period.
    fn insert_comprehensive(
        &self,
        evaluation: ComprehensiveEvaluation,
    ) -> EngineResult<ComprehensiveEvaluation>;

    /// Looks up a comprehensive evaluation by id, superseded or not.
    fn comprehensive(&self, id: Uuid) -> EngineResult<ComprehensiveEvaluation>;

    /// The current comprehensive evaluation of one employee and period.
    fn current_comprehensive(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> EngineResult<Option<ComprehensiveEvaluation>>;

    /// Writes the outcome of a completed calibration session. Either every
    /// record is written or none is.
    fn record_final_grades(&self, evaluations: &[ComprehensiveEvaluation]) -> EngineResult<()>;

    /// The final grade of the employee's most recent calibrated evaluation.
    fn latest_final_grade(&self, employee_id: &str) -> EngineResult<Option<FinalGrade>>;

    /// Appends a growth-level history row.
    fn record_growth_level(&self, row: GrowthLevel) -> EngineResult<GrowthLevel>;

    /// The newest growth-level row for an employee and target level.
    fn latest_growth_level(
        &self,
        employee_id: &str,
        target_level: u8,
    ) -> EngineResult<Option<GrowthLevel>>;
}
