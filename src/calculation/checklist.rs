//! Expertise and Impact axis scoring.
//!
//! Both axes are scored from a fixed-size checklist of integer ratings.
//! The weighted mean of the ratings is scaled onto the 0-5 band and
//! compared against the required level for the employee's growth level.

use rust_decimal::Decimal;

use crate::config::ChecklistPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{Axis, AuditStep};

use super::{AxisScoreResult, SCORE_SCALE};

/// Scores a checklist axis (Expertise or Impact).
///
/// # Arguments
///
/// * `axis` - The axis being scored; Contribution is rejected
/// * `items` - One rating per checklist item, each in `0..=max_rating`
/// * `required_level` - The score needed to achieve the axis (0-5)
/// * `policy` - Checklist size, rating range and item weights
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `ValidationError` for a wrong item count, an out-of-range rating
/// or required level. Ratings are never clamped into range.
///
/// # Examples
///
/// ```
/// use evaluation_engine::calculation::score_checklist;
/// use evaluation_engine::config::ChecklistPolicy;
/// use evaluation_engine::models::Axis;
/// use rust_decimal::Decimal;
///
/// let policy = ChecklistPolicy::equal_weights(4);
/// let result = score_checklist(Axis::Impact, &[4, 3, 4, 5], Decimal::from(3), &policy, 1).unwrap();
///
/// assert_eq!(result.score, Decimal::from(4));
/// assert!(result.is_achieved);
/// ```
pub fn score_checklist(
    axis: Axis,
    items: &[i32],
    required_level: Decimal,
    policy: &ChecklistPolicy,
    step_number: u32,
) -> EngineResult<AxisScoreResult> {
    if axis == Axis::Contribution {
        return Err(EngineError::validation(
            "axis",
            "contribution is scored from tasks, not a checklist",
        ));
    }

    if items.len() != policy.item_count {
        return Err(EngineError::validation(
            "items",
            format!(
                "{axis} checklist expects {} items, got {}",
                policy.item_count,
                items.len()
            ),
        ));
    }

    if let Some((index, rating)) = items
        .iter()
        .enumerate()
        .find(|(_, rating)| !(0..=policy.max_rating).contains(*rating))
    {
        return Err(EngineError::validation(
            format!("items[{index}]"),
            format!("rating {rating} is outside 0..={}", policy.max_rating),
        ));
    }

    if required_level < Decimal::ZERO || required_level > SCORE_SCALE {
        return Err(EngineError::validation(
            "required_level",
            format!("required level {required_level} is outside 0..=5"),
        ));
    }

    let weights: Vec<Decimal> = match &policy.item_weights {
        Some(weights) => weights.clone(),
        None => vec![Decimal::ONE; items.len()],
    };
    let total_weight: Decimal = weights.iter().copied().sum();
    let weighted_sum: Decimal = items
        .iter()
        .zip(weights.iter())
        .map(|(rating, weight)| Decimal::from(*rating) * *weight)
        .sum();

    let mean = weighted_sum / total_weight;
    let score = (mean / Decimal::from(policy.max_rating) * SCORE_SCALE).round_dp(2);
    let is_achieved = score >= required_level;

    let audit_step = AuditStep {
        step_number,
        rule_id: format!("{axis}_checklist_score"),
        rule_name: format!("{} Checklist Score", axis.label()),
        input: serde_json::json!({
            "items": items,
            "required_level": required_level.normalize().to_string(),
            "max_rating": policy.max_rating,
            "weighted": policy.item_weights.is_some()
        }),
        output: serde_json::json!({
            "score": score.normalize().to_string(),
            "is_achieved": is_achieved
        }),
        reasoning: format!(
            "Weighted mean rating {} of {} scales to {} on the 0-5 band, {} required level {}",
            mean.round_dp(2).normalize(),
            policy.max_rating,
            score.normalize(),
            if is_achieved { "meeting" } else { "below" },
            required_level.normalize()
        ),
    };

    Ok(AxisScoreResult {
        axis,
        score,
        is_achieved,
        audit_step,
    })
}
