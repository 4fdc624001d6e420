//! Growth-level progress percentages.

use rust_decimal::Decimal;

use crate::config::{LevelRequirements, ProgressWeights};
use crate::models::ProgressReport;

use super::certification::{CertificationEvidence, missing};

/// Computes per-requirement progress and its weighted average.
///
/// Each family is a percentage in 0-100. A family with nothing required is
/// complete. The evaluation family is complete when the final grade meets
/// the floor and otherwise scales with the grade's position on the scale.
/// `can_apply` is true once `overall` reaches 100.
pub fn calculate_progress(
    requirements: &LevelRequirements,
    weights: &ProgressWeights,
    evidence: &CertificationEvidence,
) -> ProgressReport {
    let evaluation = match evidence.final_grade {
        None => Decimal::ZERO,
        Some(grade) if grade >= requirements.min_final_grade => Decimal::ONE_HUNDRED,
        Some(grade) => percent(
            Decimal::from(grade.rank() + 1),
            Decimal::from(requirements.min_final_grade.rank() + 1),
        ),
    };

    let training = coverage(&requirements.required_courses, &evidence.completed_courses);
    let skills = coverage(&requirements.required_skills, &evidence.skills);

    let experience = if requirements.min_years_experience <= Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        percent(
            evidence.years_of_experience.max(Decimal::ZERO),
            requirements.min_years_experience,
        )
    };

    let overall = ((evaluation * weights.evaluation
        + training * weights.training
        + skills * weights.skills
        + experience * weights.experience)
        / weights.total())
    .round_dp(2);

    ProgressReport {
        evaluation,
        training,
        skills,
        experience,
        overall,
        can_apply: overall >= Decimal::ONE_HUNDRED,
    }
}

fn coverage(required: &[String], have: &[String]) -> Decimal {
    let gaps = missing(required, have).len();
    let mut distinct = required.to_vec();
    distinct.sort();
    distinct.dedup();
    if distinct.is_empty() {
        return Decimal::ONE_HUNDRED;
    }
    percent(
        Decimal::from(distinct.len() - gaps),
        Decimal::from(distinct.len()),
    )
}

/// `part / whole` as a percentage capped at 100, rounded to two places.
fn percent(part: Decimal, whole: Decimal) -> Decimal {
    // At or past the whole is complete; below it the ratio stays under one.
    if whole <= Decimal::ZERO || part >= whole {
        return Decimal::ONE_HUNDRED;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}
