use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Axis, AxisEvaluation, ComprehensiveEvaluation, EvaluationPeriod, FinalGrade, GrowthLevel,
    MAX_TOTAL_WEIGHT, PeriodStatus, Task,
};

use super::EvaluationRepository;

#[derive(Debug, Default)]
struct Tables {
    periods: HashMap<String, EvaluationPeriod>,
    tasks: BTreeMap<String, Task>,
    axes: HashMap<(String, String, Axis), AxisEvaluation>,
    comprehensive: HashMap<Uuid, ComprehensiveEvaluation>,
    current: HashMap<(String, String), Uuid>,
    growth_levels: Vec<GrowthLevel>,
}

impl Tables {
    fn period(&self, period_id: &str) -> EngineResult<&EvaluationPeriod> {
        self.periods
            .get(period_id)
            .ok_or_else(|| EngineError::not_found("period", period_id))
    }

    fn open_period(&self, period_id: &str, what: &str) -> EngineResult<&EvaluationPeriod> {
        let period = self.period(period_id)?;
        if !period.is_open() {
            return Err(EngineError::policy(format!(
                "period '{period_id}' is closed; {what} can no longer change"
            )));
        }
        Ok(period)
    }

    fn period_end(&self, period_id: &str) -> NaiveDate {
        self.periods
            .get(period_id)
            .map(|period| period.end_date)
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Mutex-backed repository for tests and single-process deployments.
///
/// All tables share one lock, so every multi-record guard is checked and
/// applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryEvaluationRepository {
    tables: Mutex<Tables>,
}

impl InMemoryEvaluationRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert_period(&self, period: EvaluationPeriod) -> EngineResult<EvaluationPeriod> {
        if period.id.trim().is_empty() {
            return Err(EngineError::validation("id", "period id is required"));
        }
        if period.end_date < period.start_date {
            return Err(EngineError::validation(
                "end_date",
                format!(
                    "end date {} is before start date {}",
                    period.end_date, period.start_date
                ),
            ));
        }
        if period
            .achievement_threshold
            .is_some_and(|threshold| threshold <= Decimal::ZERO)
        {
            return Err(EngineError::validation(
                "achievement_threshold",
                "threshold must be greater than zero",
            ));
        }

        let mut tables = self.tables();
        if tables.periods.contains_key(&period.id) {
            return Err(EngineError::validation(
                "id",
                format!("period '{}' already exists", period.id),
            ));
        }
        tables.periods.insert(period.id.clone(), period.clone());
        Ok(period)
    }

    fn period(&self, period_id: &str) -> EngineResult<EvaluationPeriod> {
        self.tables().period(period_id).cloned()
    }

    fn close_period(&self, period_id: &str) -> EngineResult<EvaluationPeriod> {
        let mut tables = self.tables();
        let period = tables
            .periods
            .get_mut(period_id)
            .ok_or_else(|| EngineError::not_found("period", period_id))?;
        period.status = PeriodStatus::Closed;
        Ok(period.clone())
    }

    fn upsert_task(&self, task: Task) -> EngineResult<Task> {
        task.validate()?;

        let mut tables = self.tables();
        tables.open_period(&task.period_id, "tasks")?;

        if tables.tasks.get(&task.id).is_some_and(|existing| {
            existing.employee_id != task.employee_id || existing.period_id != task.period_id
        }) {
            return Err(EngineError::validation(
                format!("tasks[{}]", task.id),
                "a task cannot move to another employee or period",
            ));
        }

        let others: Decimal = tables
            .tasks
            .values()
            .filter(|t| {
                t.id != task.id && t.employee_id == task.employee_id && t.period_id == task.period_id
            })
            .map(|t| t.weight)
            .sum();
        if others + task.weight > MAX_TOTAL_WEIGHT {
            return Err(EngineError::validation(
                format!("tasks[{}].weight", task.id),
                format!(
                    "weights for employee '{}' in period '{}' would total {}",
                    task.employee_id,
                    task.period_id,
                    others + task.weight
                ),
            ));
        }

        tables.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn check_in(&self, task_id: &str, actual_value: Decimal) -> EngineResult<Task> {
        if actual_value < Decimal::ZERO {
            return Err(EngineError::validation(
                "actual_value",
                "actual value cannot be negative",
            ));
        }

        let mut tables = self.tables();
        let period_id = tables
            .tasks
            .get(task_id)
            .map(|task| task.period_id.clone())
            .ok_or_else(|| EngineError::not_found("task", task_id))?;
        tables.open_period(&period_id, "tasks")?;

        let task = tables
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| EngineError::not_found("task", task_id))?;
        let updated = Task {
            actual_value,
            ..task.clone()
        };
        updated.validate()?;
        *task = updated.clone();
        Ok(updated)
    }

    fn tasks_for(&self, employee_id: &str, period_id: &str) -> EngineResult<Vec<Task>> {
        Ok(self
            .tables()
            .tasks
            .values()
            .filter(|task| task.employee_id == employee_id && task.period_id == period_id)
            .cloned()
            .collect())
    }

    fn put_axis_evaluation(&self, evaluation: AxisEvaluation) -> EngineResult<AxisEvaluation> {
        let mut tables = self.tables();
        tables.open_period(&evaluation.period_id, "axis evaluations")?;
        let key = (
            evaluation.employee_id.clone(),
            evaluation.period_id.clone(),
            evaluation.axis,
        );
        tables.axes.insert(key, evaluation.clone());
        Ok(evaluation)
    }

    fn axis_evaluations(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> EngineResult<Vec<AxisEvaluation>> {
        let tables = self.tables();
        Ok(Axis::ALL
            .iter()
            .filter_map(|axis| {
                tables
                    .axes
                    .get(&(employee_id.to_string(), period_id.to_string(), *axis))
                    .cloned()
            })
            .collect())
    }

    fn insert_comprehensive(
        &self,
        evaluation: ComprehensiveEvaluation,
    ) -> EngineResult<ComprehensiveEvaluation> {
        let mut tables = self.tables();
        tables.period(&evaluation.period_id)?;
        if tables.comprehensive.contains_key(&evaluation.id) {
            return Err(EngineError::validation(
                "id",
                format!("evaluation {} already exists", evaluation.id),
            ));
        }

        let key = (evaluation.employee_id.clone(), evaluation.period_id.clone());
        if let Some(previous_id) = tables.current.get(&key).copied() {
            if let Some(previous) = tables.comprehensive.get_mut(&previous_id) {
                if previous.is_calibrated {
                    return Err(EngineError::policy(format!(
                        "evaluation {previous_id} is calibrated and cannot be superseded"
                    )));
                }
                previous.superseded_by = Some(evaluation.id);
            }
        }

        tables.current.insert(key, evaluation.id);
        tables.comprehensive.insert(evaluation.id, evaluation.clone());
        Ok(evaluation)
    }

    fn comprehensive(&self, id: Uuid) -> EngineResult<ComprehensiveEvaluation> {
        self.tables()
            .comprehensive
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("comprehensive evaluation", id))
    }

    fn current_comprehensive(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> EngineResult<Option<ComprehensiveEvaluation>> {
        let tables = self.tables();
        Ok(tables
            .current
            .get(&(employee_id.to_string(), period_id.to_string()))
            .and_then(|id| tables.comprehensive.get(id))
            .cloned())
    }

    fn record_final_grades(&self, evaluations: &[ComprehensiveEvaluation]) -> EngineResult<()> {
        let mut tables = self.tables();

        for incoming in evaluations {
            let stored = tables
                .comprehensive
                .get(&incoming.id)
                .ok_or_else(|| EngineError::not_found("comprehensive evaluation", incoming.id))?;
            if stored.is_calibrated {
                return Err(EngineError::policy(format!(
                    "final grade of evaluation {} is frozen",
                    incoming.id
                )));
            }
            if !stored.is_current() {
                return Err(EngineError::policy(format!(
                    "evaluation {} has been superseded",
                    incoming.id
                )));
            }
            if incoming.final_grade.is_none() || !incoming.is_calibrated {
                return Err(EngineError::validation(
                    "final_grade",
                    format!("evaluation {} has no calibrated final grade", incoming.id),
                ));
            }
        }

        for incoming in evaluations {
            if let Some(stored) = tables.comprehensive.get_mut(&incoming.id) {
                stored.final_grade = incoming.final_grade;
                stored.calibration_adjustment = incoming.calibration_adjustment;
                stored.is_calibrated = true;
            }
        }
        Ok(())
    }

    fn latest_final_grade(&self, employee_id: &str) -> EngineResult<Option<FinalGrade>> {
        let tables = self.tables();
        Ok(tables
            .comprehensive
            .values()
            .filter(|evaluation| evaluation.employee_id == employee_id && evaluation.is_calibrated)
            .max_by_key(|evaluation| {
                (tables.period_end(&evaluation.period_id), evaluation.created_at)
            })
            .and_then(|evaluation| evaluation.final_grade))
    }

    fn record_growth_level(&self, row: GrowthLevel) -> EngineResult<GrowthLevel> {
        self.tables().growth_levels.push(row.clone());
        Ok(row)
    }

    fn latest_growth_level(
        &self,
        employee_id: &str,
        target_level: u8,
    ) -> EngineResult<Option<GrowthLevel>> {
        Ok(self
            .tables()
            .growth_levels
            .iter()
            .rev()
            .find(|row| row.employee_id == employee_id && row.target_level == target_level)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisInputs, AxisOutcome, CertificationStatus, EvaluationFeedback, PreliminaryGrade};
    use chrono::{Duration, Utc};

    fn period(id: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> EvaluationPeriod {
        EvaluationPeriod {
            id: id.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            status: PeriodStatus::Open,
            achievement_threshold: None,
        }
    }

    fn repository() -> InMemoryEvaluationRepository {
        let repository = InMemoryEvaluationRepository::new();
        repository
            .insert_period(period("2025H1", (2025, 1, 1), (2025, 6, 30)))
            .unwrap();
        repository
    }

    fn task(id: &str, weight: i64) -> Task {
        Task {
            id: id.to_string(),
            employee_id: "emp_001".to_string(),
            period_id: "2025H1".to_string(),
            title: String::new(),
            weight: Decimal::from(weight),
            target_value: Decimal::from(10),
            target_unit: "cases".to_string(),
            actual_value: Decimal::ZERO,
        }
    }

    fn axis_evaluation(axis: Axis) -> AxisEvaluation {
        AxisEvaluation {
            employee_id: "emp_001".to_string(),
            period_id: "2025H1".to_string(),
            axis,
            inputs: AxisInputs::Checklist {
                items: vec![3],
                required_level: Decimal::from(3),
            },
            score: Decimal::from(3),
            is_achieved: true,
            evaluator_id: "mgr_lee".to_string(),
            updated_at: Utc::now(),
        }
    }

    fn comprehensive(period_id: &str) -> ComprehensiveEvaluation {
        let outcome = AxisOutcome {
            score: Decimal::from(3),
            is_achieved: true,
        };
        ComprehensiveEvaluation {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            period_id: period_id.to_string(),
            department: "risk".to_string(),
            contribution: outcome,
            expertise: outcome,
            impact: outcome,
            total_score: Decimal::from(3),
            preliminary_grade: Some(PreliminaryGrade::A),
            final_grade: None,
            is_calibrated: false,
            calibration_adjustment: 0,
            feedback: EvaluationFeedback::default(),
            superseded_by: None,
            created_at: Utc::now(),
        }
    }

    fn calibrated(mut evaluation: ComprehensiveEvaluation, grade: FinalGrade) -> ComprehensiveEvaluation {
        evaluation.final_grade = Some(grade);
        evaluation.is_calibrated = true;
        evaluation
    }

    #[test]
    fn test_duplicate_period_is_rejected() {
        let repository = repository();
        assert!(matches!(
            repository.insert_period(period("2025H1", (2025, 1, 1), (2025, 6, 30))),
            Err(EngineError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_inverted_period_dates_are_rejected() {
        let repository = InMemoryEvaluationRepository::new();
        assert!(
            repository
                .insert_period(period("bad", (2025, 6, 30), (2025, 1, 1)))
                .is_err()
        );
    }

    #[test]
    fn test_task_weight_total_is_capped() {
        let repository = repository();
        repository.upsert_task(task("t1", 60)).unwrap();
        repository.upsert_task(task("t2", 40)).unwrap();

        match repository.upsert_task(task("t3", 1)) {
            Err(EngineError::ValidationError { field, message }) => {
                assert_eq!(field, "tasks[t3].weight");
                assert!(message.contains("101"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }

        // Replacing a task counts its new weight only once
        repository.upsert_task(task("t2", 30)).unwrap();
        repository.upsert_task(task("t3", 10)).unwrap();
        assert_eq!(repository.tasks_for("emp_001", "2025H1").unwrap().len(), 3);
    }

    #[test]
    fn test_closed_period_freezes_tasks_and_axes() {
        let repository = repository();
        repository.upsert_task(task("t1", 50)).unwrap();
        repository.close_period("2025H1").unwrap();

        assert!(matches!(
            repository.check_in("t1", Decimal::from(8)),
            Err(EngineError::PolicyViolation { .. })
        ));
        assert!(matches!(
            repository.upsert_task(task("t2", 10)),
            Err(EngineError::PolicyViolation { .. })
        ));
        assert!(matches!(
            repository.put_axis_evaluation(axis_evaluation(Axis::Impact)),
            Err(EngineError::PolicyViolation { .. })
        ));
    }

    #[test]
    fn test_check_in_updates_actual_value() {
        let repository = repository();
        repository.upsert_task(task("t1", 50)).unwrap();
        let updated = repository.check_in("t1", Decimal::from(12)).unwrap();
        assert_eq!(updated.achievement_rate().unwrap(), Decimal::new(12, 1));
        assert!(matches!(
            repository.check_in("missing", Decimal::ONE),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_check_in_out_of_range_leaves_task_unchanged() {
        let repository = repository();
        repository
            .upsert_task(Task {
                target_value: Decimal::new(1, 4),
                ..task("t1", 50)
            })
            .unwrap();

        assert!(matches!(
            repository.check_in("t1", Decimal::MAX),
            Err(EngineError::ValidationError { .. })
        ));
        let stored = repository.tasks_for("emp_001", "2025H1").unwrap();
        assert_eq!(stored[0].actual_value, Decimal::ZERO);
    }

    #[test]
    fn test_axis_evaluations_are_replaced_per_axis() {
        let repository = repository();
        repository.put_axis_evaluation(axis_evaluation(Axis::Impact)).unwrap();
        let mut again = axis_evaluation(Axis::Impact);
        again.score = Decimal::from(4);
        repository.put_axis_evaluation(again).unwrap();
        repository.put_axis_evaluation(axis_evaluation(Axis::Expertise)).unwrap();

        let stored = repository.axis_evaluations("emp_001", "2025H1").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].axis, Axis::Expertise);
        assert_eq!(stored[1].score, Decimal::from(4));
    }

    #[test]
    fn test_rebuilding_supersedes_previous_record() {
        let repository = repository();
        let first = repository.insert_comprehensive(comprehensive("2025H1")).unwrap();
        let second = repository.insert_comprehensive(comprehensive("2025H1")).unwrap();

        let previous = repository.comprehensive(first.id).unwrap();
        assert_eq!(previous.superseded_by, Some(second.id));
        let current = repository.current_comprehensive("emp_001", "2025H1").unwrap().unwrap();
        assert_eq!(current.id, second.id);
    }

    #[test]
    fn test_calibrated_record_cannot_be_superseded_or_regraded() {
        let repository = repository();
        let record = repository.insert_comprehensive(comprehensive("2025H1")).unwrap();
        repository
            .record_final_grades(&[calibrated(record.clone(), FinalGrade::A)])
            .unwrap();

        assert!(matches!(
            repository.insert_comprehensive(comprehensive("2025H1")),
            Err(EngineError::PolicyViolation { .. })
        ));
        assert!(matches!(
            repository.record_final_grades(&[calibrated(record, FinalGrade::S)]),
            Err(EngineError::PolicyViolation { .. })
        ));
        assert_eq!(
            repository.latest_final_grade("emp_001").unwrap(),
            Some(FinalGrade::A)
        );
    }

    #[test]
    fn test_record_final_grades_is_all_or_nothing() {
        let repository = repository();
        let good = repository.insert_comprehensive(comprehensive("2025H1")).unwrap();
        let unknown = comprehensive("2025H1");

        let result = repository.record_final_grades(&[
            calibrated(good.clone(), FinalGrade::B),
            calibrated(unknown, FinalGrade::B),
        ]);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
        assert!(!repository.comprehensive(good.id).unwrap().is_calibrated);
    }

    #[test]
    fn test_latest_final_grade_follows_period_order() {
        let repository = repository();
        repository
            .insert_period(period("2024H2", (2024, 7, 1), (2024, 12, 31)))
            .unwrap();

        let recent = repository.insert_comprehensive(comprehensive("2025H1")).unwrap();
        let mut older = comprehensive("2024H2");
        older.created_at = Utc::now() + Duration::days(1);
        let older = repository.insert_comprehensive(older).unwrap();

        repository
            .record_final_grades(&[
                calibrated(recent, FinalGrade::BPlus),
                calibrated(older, FinalGrade::S),
            ])
            .unwrap();
        assert_eq!(
            repository.latest_final_grade("emp_001").unwrap(),
            Some(FinalGrade::BPlus)
        );
        assert_eq!(repository.latest_final_grade("emp_404").unwrap(), None);
    }

    #[test]
    fn test_latest_growth_level_row() {
        let repository = repository();
        for status in [CertificationStatus::InProgress, CertificationStatus::Eligible] {
            repository
                .record_growth_level(GrowthLevel {
                    employee_id: "emp_001".to_string(),
                    period_id: None,
                    current_level: 2,
                    target_level: 3,
                    progress_percentage: Decimal::ONE_HUNDRED,
                    certification_status: status,
                    checked_at: Utc::now(),
                })
                .unwrap();
        }
        let latest = repository.latest_growth_level("emp_001", 3).unwrap().unwrap();
        assert_eq!(latest.certification_status, CertificationStatus::Eligible);
        assert!(repository.latest_growth_level("emp_001", 4).unwrap().is_none());
    }
}
