//! The performance-evaluation workflow.
//!
//! [`PerformanceService`] composes the pure calculations, the calibration
//! engine and a repository into the operations the HTTP layer exposes:
//! score axes, combine them into a comprehensive evaluation, calibrate a
//! cohort and check growth-level certification against the resulting
//! history.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::calculation::{
    AxisOutcomes, AxisScoreResult, CertificationEvidence, CombinedGrade, GradeCombiner,
    GrowthLevelCertifier, HalfGradePolicy, score_checklist, score_contribution,
};
use crate::calibration::{AdjustmentRequest, CalibrationEngine};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, Axis, AxisEvaluation, AxisInputs, CalibrationAdjustment, CalibrationSession,
    CertificationDecision, CertificationStatus, ComprehensiveEvaluation, CourseId,
    EvaluationFeedback, EvaluationPeriod, GrowthLevel, ProgressReport, SessionDetails, SkillId,
    Task, TaskInput,
};
use crate::store::{EvaluationRepository, InMemoryEvaluationRepository};

/// Input for scoring and recording one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEvaluationInput {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluation period.
    pub period_id: String,
    /// The axis being evaluated.
    pub axis: Axis,
    /// The manager entering the evaluation.
    pub evaluator_id: String,
    /// Checklist ratings. Ignored for Contribution, which reads the
    /// employee's stored tasks.
    #[serde(default)]
    pub items: Vec<i32>,
    /// Score required to achieve a checklist axis.
    #[serde(default)]
    pub required_level: Option<Decimal>,
    /// The employee's current growth level, used to look up
    /// `required_level` when it is omitted.
    #[serde(default)]
    pub growth_level: Option<u8>,
}

/// A stored axis evaluation with the audit step that produced its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAxisEvaluation {
    /// The stored record.
    pub evaluation: AxisEvaluation,
    /// How the score was derived.
    pub audit_step: AuditStep,
}

/// A stored comprehensive evaluation with its combination audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedComprehensiveEvaluation {
    /// The stored record.
    pub evaluation: ComprehensiveEvaluation,
    /// The record this one superseded, if any.
    pub supersedes: Option<Uuid>,
    /// How the preliminary grade was derived.
    pub audit_step: AuditStep,
}

/// Input for a certification check or progress query.
///
/// The final grade is not supplied: it is read from the employee's latest
/// calibrated evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRequest {
    /// The employee being checked.
    pub employee_id: String,
    /// The employee's current growth level.
    pub current_level: u8,
    /// The level the employee wants to certify into.
    pub target_level: u8,
    /// The period the check is recorded against, if any.
    #[serde(default)]
    pub period_id: Option<String>,
    /// Courses the employee has completed.
    #[serde(default)]
    pub completed_courses: Vec<CourseId>,
    /// Skills the employee holds.
    #[serde(default)]
    pub skills: Vec<SkillId>,
    /// Years of relevant experience.
    #[serde(default)]
    pub years_of_experience: Decimal,
}

/// Outcome of a certification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationCheck {
    /// The structured decision.
    #[serde(flatten)]
    pub decision: CertificationDecision,
    /// The growth-level row recorded for this check.
    pub growth_level: GrowthLevel,
}

/// Where an employee stands on a growth level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthLevelSummary {
    /// Current level.
    pub current: u8,
    /// Target level.
    pub target: u8,
    /// Status from the latest check, `NOT_STARTED` if never checked.
    pub certification_status: CertificationStatus,
}

/// Outcome of a progress query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCheck {
    /// Level and status.
    pub growth_level: GrowthLevelSummary,
    /// Percent completion per requirement.
    pub progress: ProgressReport,
}

/// Service composing scoring, calibration, certification and storage.
pub struct PerformanceService<R = InMemoryEvaluationRepository> {
    config: Arc<ConfigLoader>,
    repository: Arc<R>,
    combiner: GradeCombiner,
    certifier: GrowthLevelCertifier,
    calibration: CalibrationEngine,
    /// Serialises period lifecycle checks with the writes they guard:
    /// closing, opening a session and rebuilding a member.
    period_guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<R> PerformanceService<R>
where
    R: EvaluationRepository + 'static,
{
    /// Creates a service whose half grades follow the configured boundaries.
    pub fn new(config: ConfigLoader, repository: Arc<R>) -> Self {
        let half_grade = Arc::new(config.policy().half_grade.clone());
        Self::with_half_grade_policy(config, repository, half_grade)
    }

    /// Creates a service with a custom half-grade policy.
    pub fn with_half_grade_policy(
        config: ConfigLoader,
        repository: Arc<R>,
        half_grade: Arc<dyn HalfGradePolicy>,
    ) -> Self {
        let combiner = GradeCombiner::new(config.policy().grade_mapping.clone());
        let certifier = GrowthLevelCertifier::from_config(config.config());
        Self {
            config: Arc::new(config),
            repository,
            combiner,
            certifier,
            calibration: CalibrationEngine::new(half_grade),
            period_guards: Mutex::new(HashMap::new()),
        }
    }

    fn period_guard(&self, period_id: &str) -> Arc<Mutex<()>> {
        lock(&self.period_guards)
            .entry(period_id.to_string())
            .or_default()
            .clone()
    }

    /// The Contribution threshold for a period: its override if set, the
    /// policy default otherwise. Unregistered periods use the default.
    pub fn contribution_threshold(&self, period_id: Option<&str>) -> EngineResult<Decimal> {
        let default = self.config.policy().contribution.achievement_threshold;
        let Some(period_id) = period_id else {
            return Ok(default);
        };
        match self.repository.period(period_id) {
            Ok(period) => Ok(period.achievement_threshold.unwrap_or(default)),
            Err(EngineError::NotFound { .. }) => Ok(default),
            Err(err) => Err(err),
        }
    }

    /// Scores Contribution from explicit task inputs.
    pub fn score_contribution(
        &self,
        period_id: Option<&str>,
        tasks: &[TaskInput],
    ) -> EngineResult<AxisScoreResult> {
        let threshold = self.contribution_threshold(period_id)?;
        score_contribution(tasks, &self.config.policy().contribution, threshold, 1)
    }

    /// Scores a checklist axis. `required_level` wins over `growth_level`;
    /// one of them must be given.
    pub fn score_checklist(
        &self,
        axis: Axis,
        items: &[i32],
        required_level: Option<Decimal>,
        growth_level: Option<u8>,
    ) -> EngineResult<AxisScoreResult> {
        let policy = self.config.policy().checklist(axis)?;
        let required_level = self.required_level(axis, required_level, growth_level)?;
        score_checklist(axis, items, required_level, policy, 1)
    }

    fn required_level(
        &self,
        axis: Axis,
        required_level: Option<Decimal>,
        growth_level: Option<u8>,
    ) -> EngineResult<Decimal> {
        match (required_level, growth_level) {
            (Some(level), _) => Ok(level),
            (None, Some(growth_level)) => self.config.required_level_for(axis, growth_level),
            (None, None) => Err(EngineError::validation(
                "required_level",
                "either required_level or growth_level is required",
            )),
        }
    }

    /// Combines explicit axis outcomes into a preliminary grade.
    pub fn combine(
        &self,
        employee_id: &str,
        period_id: &str,
        outcomes: &AxisOutcomes,
    ) -> EngineResult<CombinedGrade> {
        self.combiner.combine(employee_id, period_id, outcomes, 1)
    }

    /// Registers a period.
    pub fn create_period(&self, period: EvaluationPeriod) -> EngineResult<EvaluationPeriod> {
        let period = self.repository.insert_period(period)?;
        info!(period_id = %period.id, status = ?period.status, "Evaluation period created");
        Ok(period)
    }

    /// Closes a period, freezing its tasks and axis evaluations.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` while a scheduled or running calibration session
    /// covers the period.
    pub fn close_period(&self, period_id: &str) -> EngineResult<EvaluationPeriod> {
        let guard = self.period_guard(period_id);
        let _held = lock(&guard);
        if self.calibration.has_active_sessions(period_id) {
            warn!(period_id = %period_id, "Period close blocked by open calibration session");
            return Err(EngineError::policy(format!(
                "period '{period_id}' still has open calibration sessions"
            )));
        }
        let period = self.repository.close_period(period_id)?;
        info!(period_id = %period_id, "Evaluation period closed");
        Ok(period)
    }

    /// Inserts or replaces a task.
    pub fn upsert_task(&self, task: Task) -> EngineResult<Task> {
        let task = self.repository.upsert_task(task)?;
        let base_score = task.base_score(&self.config.policy().contribution)?;
        info!(
            task_id = %task.id,
            employee_id = %task.employee_id,
            period_id = %task.period_id,
            weight = %task.weight,
            base_score = %base_score,
            "Task saved"
        );
        Ok(task)
    }

    /// Records progress against a task.
    pub fn check_in(&self, task_id: &str, actual_value: Decimal) -> EngineResult<Task> {
        let task = self.repository.check_in(task_id, actual_value)?;
        let base_score = task.base_score(&self.config.policy().contribution)?;
        info!(
            task_id = %task_id,
            actual_value = %actual_value,
            base_score = %base_score,
            "Task check-in recorded"
        );
        Ok(task)
    }

    /// Scores one axis and stores the result.
    ///
    /// Contribution is scored from the employee's stored tasks using the
    /// period's threshold; checklist axes from the supplied ratings.
    pub fn record_axis_evaluation(
        &self,
        input: AxisEvaluationInput,
    ) -> EngineResult<RecordedAxisEvaluation> {
        if input.evaluator_id.trim().is_empty() {
            return Err(EngineError::validation(
                "evaluator_id",
                "evaluator is required",
            ));
        }
        let period = self.repository.period(&input.period_id)?;

        let (inputs, scored) = match input.axis {
            Axis::Contribution => {
                let tasks = self
                    .repository
                    .tasks_for(&input.employee_id, &input.period_id)?
                    .iter()
                    .map(Task::to_input)
                    .collect::<EngineResult<Vec<_>>>()?;
                let policy = &self.config.policy().contribution;
                let threshold = period
                    .achievement_threshold
                    .unwrap_or(policy.achievement_threshold);
                let scored = score_contribution(&tasks, policy, threshold, 1)?;
                (AxisInputs::Tasks { tasks }, scored)
            }
            axis => {
                let policy = self.config.policy().checklist(axis)?;
                let required_level =
                    self.required_level(axis, input.required_level, input.growth_level)?;
                let scored = score_checklist(axis, &input.items, required_level, policy, 1)?;
                (
                    AxisInputs::Checklist {
                        items: input.items,
                        required_level,
                    },
                    scored,
                )
            }
        };

        let evaluation = self.repository.put_axis_evaluation(AxisEvaluation {
            employee_id: input.employee_id,
            period_id: input.period_id,
            axis: input.axis,
            inputs,
            score: scored.score,
            is_achieved: scored.is_achieved,
            evaluator_id: input.evaluator_id,
            updated_at: Utc::now(),
        })?;

        info!(
            employee_id = %evaluation.employee_id,
            period_id = %evaluation.period_id,
            axis = %evaluation.axis,
            score = %evaluation.score,
            is_achieved = evaluation.is_achieved,
            "Axis evaluation recorded"
        );
        Ok(RecordedAxisEvaluation {
            evaluation,
            audit_step: scored.audit_step,
        })
    }

    /// Combines the stored axes of one employee into a new comprehensive
    /// evaluation, superseding the current one.
    ///
    /// # Errors
    ///
    /// * `IncompleteEvaluation` naming the axes not yet entered.
    /// * `PolicyViolation` when the current record is calibrated or under
    ///   review in an open calibration session.
    pub fn build_comprehensive(
        &self,
        employee_id: &str,
        period_id: &str,
        department: &str,
        feedback: EvaluationFeedback,
    ) -> EngineResult<RecordedComprehensiveEvaluation> {
        self.repository.period(period_id)?;
        let guard = self.period_guard(period_id);
        let _held = lock(&guard);

        let mut outcomes = AxisOutcomes::default();
        for evaluation in self.repository.axis_evaluations(employee_id, period_id)? {
            outcomes.set(evaluation.axis, evaluation.outcome());
        }
        let combined = self.combiner.combine(employee_id, period_id, &outcomes, 1)?;

        let previous = self
            .repository
            .current_comprehensive(employee_id, period_id)?;
        if let Some(previous) = &previous {
            if let Some(session_id) = self.calibration.open_session_of(previous.id) {
                return Err(EngineError::policy(format!(
                    "evaluation {} is under review in calibration session {session_id}",
                    previous.id
                )));
            }
        }

        let evaluation = self.repository.insert_comprehensive(ComprehensiveEvaluation {
            id: Uuid::new_v4(),
            employee_id: employee_id.to_string(),
            period_id: period_id.to_string(),
            department: department.to_string(),
            contribution: combined.contribution,
            expertise: combined.expertise,
            impact: combined.impact,
            total_score: combined.total_score,
            preliminary_grade: Some(combined.preliminary_grade),
            final_grade: None,
            is_calibrated: false,
            calibration_adjustment: 0,
            feedback,
            superseded_by: None,
            created_at: Utc::now(),
        })?;

        info!(
            employee_id = %employee_id,
            period_id = %period_id,
            evaluation_id = %evaluation.id,
            preliminary_grade = %combined.preliminary_grade,
            "Comprehensive evaluation recorded"
        );
        Ok(RecordedComprehensiveEvaluation {
            evaluation,
            supersedes: previous.map(|p| p.id),
            audit_step: combined.audit_step,
        })
    }

    /// Opens a calibration session over stored evaluations.
    pub fn open_session(
        &self,
        details: SessionDetails,
        evaluation_ids: &[Uuid],
    ) -> EngineResult<CalibrationSession> {
        let guard = self.period_guard(&details.period_id);
        let _held = lock(&guard);
        let period = self.repository.period(&details.period_id)?;
        if !period.is_open() {
            return Err(EngineError::policy(format!(
                "period '{}' is closed; no new calibration sessions",
                period.id
            )));
        }
        let evaluations = evaluation_ids
            .iter()
            .map(|id| self.repository.comprehensive(*id))
            .collect::<EngineResult<Vec<_>>>()?;
        self.calibration.open_session(
            details,
            evaluations,
            self.config.policy().calibration.clone(),
        )
    }

    /// Starts a scheduled session.
    pub fn start_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        self.calibration.start_session(session_id)
    }

    /// Records a committee adjustment.
    pub fn apply_adjustment(
        &self,
        session_id: Uuid,
        request: AdjustmentRequest,
    ) -> EngineResult<CalibrationAdjustment> {
        self.calibration.apply_adjustment(session_id, request)
    }

    /// Completes a session and persists its binding final grades.
    ///
    /// The grades are written before the session becomes `COMPLETED`; if
    /// the write fails the session stays `IN_PROGRESS` and can be retried.
    pub fn complete_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        self.calibration.complete_session(session_id, |finals| {
            self.repository.record_final_grades(finals).inspect_err(|err| {
                error!(
                    session_id = %session_id,
                    error = %err,
                    "Final grades could not be persisted"
                );
            })
        })
    }

    /// Cancels a session.
    pub fn cancel_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        self.calibration.cancel_session(session_id)
    }

    /// Returns a session snapshot.
    pub fn session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        self.calibration.get_session(session_id)
    }

    /// Checks certification and records a growth-level row.
    ///
    /// A `FAIL` decision is a successful call.
    pub fn check_certification(
        &self,
        request: CertificationRequest,
    ) -> EngineResult<CertificationCheck> {
        let evidence = self.evidence(&request)?;
        let decision = self.certifier.check(request.target_level, &evidence)?;
        let progress = self.certifier.progress(request.target_level, &evidence)?;

        let previous = self
            .repository
            .latest_growth_level(&request.employee_id, request.target_level)?
            .map(|row| row.certification_status);
        let growth_level = self.repository.record_growth_level(GrowthLevel {
            employee_id: request.employee_id,
            period_id: request.period_id,
            current_level: request.current_level,
            target_level: request.target_level,
            progress_percentage: progress.overall,
            certification_status: GrowthLevel::next_status(previous, &decision),
            checked_at: Utc::now(),
        })?;

        info!(
            employee_id = %growth_level.employee_id,
            target_level = growth_level.target_level,
            result = ?decision.certification_result,
            status = ?growth_level.certification_status,
            missing_courses = decision.missing_courses.len(),
            missing_skills = decision.missing_skills.len(),
            "Certification decided"
        );
        Ok(CertificationCheck {
            decision,
            growth_level,
        })
    }

    /// Reports progress towards a growth level without recording anything.
    pub fn progress(&self, request: CertificationRequest) -> EngineResult<ProgressCheck> {
        let evidence = self.evidence(&request)?;
        let progress = self.certifier.progress(request.target_level, &evidence)?;
        let certification_status = self
            .repository
            .latest_growth_level(&request.employee_id, request.target_level)?
            .map(|row| row.certification_status)
            .unwrap_or(CertificationStatus::NotStarted);
        Ok(ProgressCheck {
            growth_level: GrowthLevelSummary {
                current: request.current_level,
                target: request.target_level,
                certification_status,
            },
            progress,
        })
    }

    fn evidence(&self, request: &CertificationRequest) -> EngineResult<CertificationEvidence> {
        if request.target_level <= request.current_level {
            return Err(EngineError::validation(
                "target_level",
                format!(
                    "target level {} must be above current level {}",
                    request.target_level, request.current_level
                ),
            ));
        }
        self.config.growth_level(request.target_level)?;
        if request.years_of_experience < Decimal::ZERO {
            return Err(EngineError::validation(
                "years_of_experience",
                "years of experience cannot be negative",
            ));
        }
        Ok(CertificationEvidence {
            final_grade: self.repository.latest_final_grade(&request.employee_id)?,
            completed_courses: request.completed_courses.clone(),
            skills: request.skills.clone(),
            years_of_experience: request.years_of_experience,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
