//! The calibration session state machine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::HalfGradePolicy;
use crate::config::CalibrationPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalibrationAdjustment, CalibrationSession, ComprehensiveEvaluation, FinalGrade,
    SessionDetails, SessionStatus,
};

/// A committee request to move one evaluation to a new final grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// The comprehensive evaluation being adjusted.
    pub evaluation_id: Uuid,
    /// The grade the committee chose.
    pub new_grade: FinalGrade,
    /// Why the committee made the change.
    #[serde(default)]
    pub reason: String,
    /// Who made the change.
    pub actor: String,
}

struct SessionState {
    session: CalibrationSession,
    policy: CalibrationPolicy,
    /// Half-grade-resolved preliminary grade per member.
    baselines: HashMap<Uuid, FinalGrade>,
    /// Latest committee choice per adjusted member.
    chosen: HashMap<Uuid, FinalGrade>,
}

impl SessionState {
    fn transition(&mut self, next: SessionStatus) -> EngineResult<()> {
        let current = self.session.status;
        if !current.can_transition_to(next) {
            return Err(EngineError::policy(format!(
                "calibration session {} is {:?} and cannot move to {:?}",
                self.session.id, current, next
            )));
        }
        self.session.status = next;
        Ok(())
    }

    fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.session.evaluations.iter().map(|evaluation| evaluation.id)
    }
}

/// Runs calibration sessions.
///
/// Every session sits behind its own mutex, so adjustments to one session
/// never wait on another. A second index records which evaluations belong
/// to a `SCHEDULED` or `IN_PROGRESS` session; an evaluation may be a member
/// of at most one such session.
///
/// Lock order is registry, then session, then membership. No path takes
/// them in another order.
pub struct CalibrationEngine {
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<SessionState>>>>,
    membership: Mutex<HashMap<Uuid, Uuid>>,
    half_grade: Arc<dyn HalfGradePolicy>,
}

impl CalibrationEngine {
    /// Creates an engine that resolves unadjusted grades with `half_grade`.
    pub fn new(half_grade: Arc<dyn HalfGradePolicy>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            membership: Mutex::new(HashMap::new()),
            half_grade,
        }
    }

    /// Opens a `SCHEDULED` session over `evaluations`.
    ///
    /// # Errors
    ///
    /// * `ValidationError` for an empty or duplicated member set, or a member
    ///   from a different period.
    /// * `PolicyViolation` when a member lacks a preliminary grade, is
    ///   superseded, already calibrated, or belongs to another open session.
    /// * `InvalidConfig` when the half-grade policy resolves a letter to a
    ///   tier of another letter.
    pub fn open_session(
        &self,
        details: SessionDetails,
        evaluations: Vec<ComprehensiveEvaluation>,
        policy: CalibrationPolicy,
    ) -> EngineResult<CalibrationSession> {
        if evaluations.is_empty() {
            return Err(EngineError::validation(
                "evaluations",
                "a calibration session needs at least one evaluation",
            ));
        }

        let mut seen = HashSet::new();
        let mut baselines = HashMap::new();
        for evaluation in &evaluations {
            if !seen.insert(evaluation.id) {
                return Err(EngineError::validation(
                    "evaluations",
                    format!("evaluation {} is listed twice", evaluation.id),
                ));
            }
            if evaluation.period_id != details.period_id {
                return Err(EngineError::validation(
                    "evaluations",
                    format!(
                        "evaluation {} belongs to period '{}', not '{}'",
                        evaluation.id, evaluation.period_id, details.period_id
                    ),
                ));
            }
            let Some(preliminary) = evaluation.preliminary_grade else {
                return Err(EngineError::policy(format!(
                    "evaluation {} has no preliminary grade",
                    evaluation.id
                )));
            };
            if evaluation.is_calibrated {
                return Err(EngineError::policy(format!(
                    "evaluation {} is already calibrated",
                    evaluation.id
                )));
            }
            if !evaluation.is_current() {
                return Err(EngineError::policy(format!(
                    "evaluation {} has been superseded",
                    evaluation.id
                )));
            }
            let baseline = self.half_grade.resolve(preliminary, evaluation.total_score);
            if baseline.letter() != Some(preliminary) {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "half-grade policy mapped {preliminary} to {baseline}, outside its letter"
                    ),
                });
            }
            baselines.insert(evaluation.id, baseline);
        }

        let session = CalibrationSession {
            id: Uuid::new_v4(),
            details,
            status: SessionStatus::Scheduled,
            evaluations,
            adjustments: Vec::new(),
        };

        // Members are claimed and the session inserted under one registry lock.
        let mut sessions = lock(&self.sessions);
        {
            let mut membership = lock(&self.membership);
            if let Some((evaluation_id, owner)) = session
                .evaluations
                .iter()
                .find_map(|e| membership.get(&e.id).map(|owner| (e.id, *owner)))
            {
                return Err(EngineError::policy(format!(
                    "evaluation {evaluation_id} already belongs to open session {owner}"
                )));
            }
            for evaluation in &session.evaluations {
                membership.insert(evaluation.id, session.id);
            }
        }

        let snapshot = session.clone();
        sessions.insert(
            session.id,
            Arc::new(Mutex::new(SessionState {
                session,
                policy,
                baselines,
                chosen: HashMap::new(),
            })),
        );

        info!(
            session_id = %snapshot.id,
            period_id = %snapshot.details.period_id,
            department = %snapshot.details.department,
            members = snapshot.evaluations.len(),
            "Calibration session opened"
        );
        Ok(snapshot)
    }

    /// Moves a session from `SCHEDULED` to `IN_PROGRESS`.
    pub fn start_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        let handle = self.handle(session_id)?;
        let mut state = lock(&handle);
        state.transition(SessionStatus::InProgress)?;
        info!(session_id = %session_id, "Calibration session started");
        Ok(state.session.clone())
    }

    /// Records a committee adjustment.
    ///
    /// The adjustment is measured from the member's baseline, the tier its
    /// preliminary grade maps to, so repeated adjustments of one evaluation
    /// cannot walk it further than the policy bound. Every call appends a
    /// new [`CalibrationAdjustment`].
    ///
    /// # Errors
    ///
    /// * `PolicyViolation` unless the session is `IN_PROGRESS`, when the
    ///   distance exceeds `max_adjustment_tiers`, or when the actor is not a
    ///   participant and the policy requires one.
    /// * `ValidationError` for a blank actor, or a blank reason when the
    ///   policy requires one.
    /// * `NotFound` for an unknown session or a non-member evaluation.
    pub fn apply_adjustment(
        &self,
        session_id: Uuid,
        request: AdjustmentRequest,
    ) -> EngineResult<CalibrationAdjustment> {
        let handle = self.handle(session_id)?;
        let mut state = lock(&handle);

        if state.session.status != SessionStatus::InProgress {
            return Err(EngineError::policy(format!(
                "calibration session {} is {:?}; adjustments require IN_PROGRESS",
                session_id, state.session.status
            )));
        }

        let actor = request.actor.trim();
        if actor.is_empty() {
            return Err(EngineError::validation("actor", "actor is required"));
        }
        if state.policy.require_reason && request.reason.trim().is_empty() {
            return Err(EngineError::validation(
                "reason",
                "a reason is required for every adjustment",
            ));
        }
        if state.policy.require_participant_actor
            && !state.session.details.participants.iter().any(|p| p == actor)
        {
            return Err(EngineError::policy(format!(
                "'{actor}' is not a participant of calibration session {session_id}"
            )));
        }

        let Some(&baseline) = state.baselines.get(&request.evaluation_id) else {
            return Err(EngineError::not_found(
                "session member",
                request.evaluation_id,
            ));
        };

        let adjustment = request.new_grade.distance_from(baseline);
        let bound = state.policy.max_adjustment_tiers;
        if adjustment.unsigned_abs() > bound {
            warn!(
                session_id = %session_id,
                evaluation_id = %request.evaluation_id,
                adjustment,
                bound,
                "Calibration adjustment rejected"
            );
            return Err(EngineError::policy(format!(
                "adjusting {} from {} to {} moves {} tiers; the bound is {}",
                request.evaluation_id,
                baseline,
                request.new_grade,
                adjustment.unsigned_abs(),
                bound
            )));
        }

        let from_grade = state
            .chosen
            .get(&request.evaluation_id)
            .copied()
            .unwrap_or(baseline);
        let record = CalibrationAdjustment {
            evaluation_id: request.evaluation_id,
            from_grade,
            to_grade: request.new_grade,
            adjustment,
            reason: request.reason.trim().to_string(),
            actor: actor.to_string(),
            adjusted_at: Utc::now(),
        };

        state.chosen.insert(request.evaluation_id, request.new_grade);
        if let Some(member) = state
            .session
            .evaluations
            .iter_mut()
            .find(|evaluation| evaluation.id == request.evaluation_id)
        {
            member.calibration_adjustment = adjustment;
        }
        state.session.adjustments.push(record.clone());

        info!(
            session_id = %session_id,
            evaluation_id = %record.evaluation_id,
            from = %record.from_grade,
            to = %record.to_grade,
            adjustment,
            actor = %record.actor,
            "Calibration adjustment recorded"
        );
        Ok(record)
    }

    /// Completes an `IN_PROGRESS` session.
    ///
    /// Every member receives a final grade: the committee's latest choice if
    /// adjusted, its baseline otherwise. `persist` receives the finalized
    /// members while the session is still locked; only when it succeeds does
    /// the session become `COMPLETED` and its members are released. A failed
    /// write leaves the session `IN_PROGRESS` with membership intact.
    pub fn complete_session<F>(
        &self,
        session_id: Uuid,
        persist: F,
    ) -> EngineResult<CalibrationSession>
    where
        F: FnOnce(&[ComprehensiveEvaluation]) -> EngineResult<()>,
    {
        let handle = self.handle(session_id)?;
        let mut state = lock(&handle);
        if !state.session.status.can_transition_to(SessionStatus::Completed) {
            state.transition(SessionStatus::Completed)?;
        }

        let finalized: Vec<ComprehensiveEvaluation> = state
            .session
            .evaluations
            .iter()
            .map(|evaluation| {
                let mut evaluation = evaluation.clone();
                if let Some(&baseline) = state.baselines.get(&evaluation.id) {
                    let final_grade = state.chosen.get(&evaluation.id).copied().unwrap_or(baseline);
                    evaluation.final_grade = Some(final_grade);
                    evaluation.calibration_adjustment = final_grade.distance_from(baseline);
                    evaluation.is_calibrated = true;
                }
                evaluation
            })
            .collect();

        if let Err(err) = persist(&finalized) {
            warn!(
                session_id = %session_id,
                error = %err,
                "Final grades not persisted; session stays in progress"
            );
            return Err(err);
        }

        state.session.evaluations = finalized;
        state.transition(SessionStatus::Completed)?;
        self.release(state.member_ids());
        info!(
            session_id = %session_id,
            period_id = %state.session.details.period_id,
            adjustments = state.session.adjustments.len(),
            "Calibration session completed"
        );
        Ok(state.session.clone())
    }

    /// Cancels a `SCHEDULED` or `IN_PROGRESS` session. No grade becomes
    /// binding and members are released.
    pub fn cancel_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        let handle = self.handle(session_id)?;
        let mut state = lock(&handle);
        state.transition(SessionStatus::Cancelled)?;
        state.chosen.clear();
        for evaluation in &mut state.session.evaluations {
            evaluation.calibration_adjustment = 0;
        }
        self.release(state.member_ids());
        info!(session_id = %session_id, "Calibration session cancelled");
        Ok(state.session.clone())
    }

    /// Returns a snapshot of a session.
    pub fn get_session(&self, session_id: Uuid) -> EngineResult<CalibrationSession> {
        let handle = self.handle(session_id)?;
        let state = lock(&handle);
        Ok(state.session.clone())
    }

    /// True while a `SCHEDULED` or `IN_PROGRESS` session covers `period_id`.
    pub fn has_active_sessions(&self, period_id: &str) -> bool {
        let sessions = lock(&self.sessions);
        sessions.values().any(|handle| {
            let state = lock(handle);
            !state.session.status.is_terminal() && state.session.details.period_id == period_id
        })
    }

    /// The open session `evaluation_id` belongs to, if any.
    pub fn open_session_of(&self, evaluation_id: Uuid) -> Option<Uuid> {
        lock(&self.membership).get(&evaluation_id).copied()
    }

    fn handle(&self, session_id: Uuid) -> EngineResult<Arc<Mutex<SessionState>>> {
        lock(&self.sessions)
            .get(&session_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("calibration session", session_id))
    }

    fn release(&self, members: impl Iterator<Item = Uuid>) {
        let mut membership = lock(&self.membership);
        for id in members {
            membership.remove(&id);
        }
        debug!(open_members = membership.len(), "Session members released");
    }
}

impl std::fmt::Debug for CalibrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationEngine")
            .field("sessions", &lock(&self.sessions).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
