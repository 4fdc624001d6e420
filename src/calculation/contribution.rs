//! Contribution axis scoring.
//!
//! This module scores the Contribution axis from an employee's weighted
//! tasks. Each task's achievement rate is capped before weighting so a
//! single over-performing task cannot dominate the axis.

use rust_decimal::Decimal;

use crate::config::ContributionPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{Axis, AuditStep, MAX_TOTAL_WEIGHT, TaskInput};

use super::AxisScoreResult;

/// Scores the Contribution axis.
///
/// `score = Σ(weight/100 × min(rate, cap)) × multiplier`. The axis is
/// achieved when the capped achievement, normalised over the recorded
/// weight `Σ(weight × min(rate, cap)) / Σweight`, reaches `threshold`, so
/// tasks covering less than 100 weight points are judged on what they cover.
/// Achievement is weighted, not unanimous: one task below target does not
/// fail the axis if the weighted sum still reaches the threshold.
///
/// # Arguments
///
/// * `tasks` - The employee's tasks for the period
/// * `policy` - Cap and score multiplier
/// * `threshold` - Weighted achievement required (1.0 = 100%)
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `ValidationError` when a weight is outside 0..=100, the weights
/// sum above 100, or an achievement rate is negative. Nothing is clamped.
///
/// # Examples
///
/// ```
/// use evaluation_engine::calculation::score_contribution;
/// use evaluation_engine::config::ContributionPolicy;
/// use evaluation_engine::models::TaskInput;
/// use rust_decimal::Decimal;
///
/// let tasks = [
///     TaskInput { weight: Decimal::from(60), achievement_rate: Decimal::new(11, 1) },
///     TaskInput { weight: Decimal::from(40), achievement_rate: Decimal::new(8, 1) },
/// ];
/// let result = score_contribution(&tasks, &ContributionPolicy::default(), Decimal::ONE, 1).unwrap();
///
/// // 0.6 × 1.1 + 0.4 × 0.8 = 0.98, just short of 100%
/// assert!(!result.is_achieved);
/// assert_eq!(result.score, Decimal::new(294, 2));
/// ```
pub fn score_contribution(
    tasks: &[TaskInput],
    policy: &ContributionPolicy,
    threshold: Decimal,
    step_number: u32,
) -> EngineResult<AxisScoreResult> {
    validate_tasks(tasks)?;

    let weighted_points: Decimal = tasks
        .iter()
        .map(|task| task.weight * task.achievement_rate.min(policy.achievement_rate_cap))
        .sum();
    let total_weight: Decimal = tasks.iter().map(|task| task.weight).sum();
    let weighted_achievement = weighted_points / MAX_TOTAL_WEIGHT;

    // No weighted tasks means nothing was achieved, not a vacuous pass.
    // Compared without dividing so rounding never decides the outcome.
    // A threshold too large to scale can never be reached.
    let is_achieved = total_weight > Decimal::ZERO
        && threshold
            .checked_mul(total_weight)
            .is_some_and(|required| weighted_points >= required);
    let normalized_achievement = if total_weight > Decimal::ZERO {
        weighted_points / total_weight
    } else {
        Decimal::ZERO
    };
    let score = (weighted_achievement * policy.score_multiplier).round_dp(2);
    let capped_tasks = tasks
        .iter()
        .filter(|task| task.achievement_rate > policy.achievement_rate_cap)
        .count();

    let reasoning = if tasks.is_empty() {
        "No tasks recorded for the period: score 0, not achieved".to_string()
    } else {
        format!(
            "Achievement {}% over {} weight point(s) {} threshold {}% ({} task(s), {} capped at {}%): score {}",
            (normalized_achievement * MAX_TOTAL_WEIGHT).round_dp(2).normalize(),
            total_weight.normalize(),
            if is_achieved { "meets" } else { "is below" },
            threshold
                .checked_mul(MAX_TOTAL_WEIGHT)
                .unwrap_or(Decimal::MAX)
                .normalize(),
            tasks.len(),
            capped_tasks,
            (policy.achievement_rate_cap * MAX_TOTAL_WEIGHT).normalize(),
            score.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "contribution_score".to_string(),
        rule_name: "Contribution Axis Score".to_string(),
        input: serde_json::json!({
            "task_count": tasks.len(),
            "threshold": threshold.normalize().to_string(),
            "achievement_rate_cap": policy.achievement_rate_cap.normalize().to_string(),
            "score_multiplier": policy.score_multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "weighted_achievement": weighted_achievement.normalize().to_string(),
            "normalized_achievement": normalized_achievement.round_dp(4).normalize().to_string(),
            "score": score.normalize().to_string(),
            "is_achieved": is_achieved
        }),
        reasoning,
    };

    Ok(AxisScoreResult {
        axis: Axis::Contribution,
        score,
        is_achieved,
        audit_step,
    })
}

fn validate_tasks(tasks: &[TaskInput]) -> EngineResult<()> {
    for (index, task) in tasks.iter().enumerate() {
        if task.weight < Decimal::ZERO || task.weight > MAX_TOTAL_WEIGHT {
            return Err(EngineError::validation(
                format!("tasks[{index}].weight"),
                format!("weight {} is outside 0..=100", task.weight),
            ));
        }
        if task.achievement_rate < Decimal::ZERO {
            return Err(EngineError::validation(
                format!("tasks[{index}].achievement_rate"),
                format!("achievement rate {} cannot be negative", task.achievement_rate),
            ));
        }
    }

    let total_weight: Decimal = tasks.iter().map(|task| task.weight).sum();
    if total_weight > MAX_TOTAL_WEIGHT {
        return Err(EngineError::validation(
            "tasks",
            format!("task weights sum to {total_weight}, above 100"),
        ));
    }

    Ok(())
}
