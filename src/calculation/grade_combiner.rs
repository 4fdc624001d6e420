//! Preliminary grade combination.
//!
//! This module combines the three axis outcomes of one employee and period
//! into a preliminary A/B/C grade. The grade depends only on how many axes
//! were achieved; which axes they were does not matter. The count-to-grade
//! table is injected policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::GradeMapping;
use crate::error::{EngineError, EngineResult};
use crate::models::{Axis, AuditStep, AxisOutcome, PreliminaryGrade};

/// The three axis outcomes for one employee and period.
///
/// Any axis not yet entered is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisOutcomes {
    /// Contribution outcome.
    #[serde(default)]
    pub contribution: Option<AxisOutcome>,
    /// Expertise outcome.
    #[serde(default)]
    pub expertise: Option<AxisOutcome>,
    /// Impact outcome.
    #[serde(default)]
    pub impact: Option<AxisOutcome>,
}

impl AxisOutcomes {
    /// Returns the outcome for `axis`, if entered.
    pub fn get(&self, axis: Axis) -> Option<AxisOutcome> {
        match axis {
            Axis::Contribution => self.contribution,
            Axis::Expertise => self.expertise,
            Axis::Impact => self.impact,
        }
    }

    /// Sets the outcome for `axis`.
    pub fn set(&mut self, axis: Axis, outcome: AxisOutcome) {
        match axis {
            Axis::Contribution => self.contribution = Some(outcome),
            Axis::Expertise => self.expertise = Some(outcome),
            Axis::Impact => self.impact = Some(outcome),
        }
    }

    /// Axes that have not been entered, in canonical order.
    pub fn missing(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.get(*axis).is_none())
            .collect()
    }
}

/// The result of combining three axis outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedGrade {
    /// The preliminary A/B/C grade.
    pub preliminary_grade: PreliminaryGrade,
    /// Contribution outcome.
    pub contribution: AxisOutcome,
    /// Expertise outcome.
    pub expertise: AxisOutcome,
    /// Impact outcome.
    pub impact: AxisOutcome,
    /// How many of the three axes were achieved.
    pub achieved_count: u8,
    /// Mean of the three axis scores, rounded to two places.
    pub total_score: Decimal,
    /// The audit step recording this combination.
    pub audit_step: AuditStep,
}

/// Combines axis outcomes into a preliminary grade using an injected table.
///
/// # Example
///
/// ```
/// use evaluation_engine::calculation::GradeCombiner;
/// use evaluation_engine::config::GradeMapping;
/// use evaluation_engine::models::PreliminaryGrade;
///
/// let combiner = GradeCombiner::new(GradeMapping::default());
/// assert_eq!(combiner.grade_for_flags(true, true, false).unwrap(), PreliminaryGrade::A);
/// assert_eq!(combiner.grade_for_flags(true, false, false).unwrap(), PreliminaryGrade::B);
/// assert_eq!(combiner.grade_for_flags(false, false, false).unwrap(), PreliminaryGrade::C);
/// ```
#[derive(Debug, Clone)]
pub struct GradeCombiner {
    mapping: GradeMapping,
}

impl GradeCombiner {
    /// Creates a combiner over the given count-to-grade table.
    pub fn new(mapping: GradeMapping) -> Self {
        Self { mapping }
    }

    /// Maps three achievement flags onto a preliminary grade.
    pub fn grade_for_flags(
        &self,
        contribution: bool,
        expertise: bool,
        impact: bool,
    ) -> EngineResult<PreliminaryGrade> {
        let achieved = [contribution, expertise, impact]
            .into_iter()
            .filter(|flag| *flag)
            .count() as u8;
        self.mapping.grade_for(achieved)
    }

    /// Combines the outcomes of one employee and period.
    ///
    /// # Errors
    ///
    /// Returns `IncompleteEvaluation` naming every missing axis. This is
    /// distinct from a valid all-axes-failed result, which is grade C.
    pub fn combine(
        &self,
        employee_id: &str,
        period_id: &str,
        outcomes: &AxisOutcomes,
        step_number: u32,
    ) -> EngineResult<CombinedGrade> {
        let (Some(contribution), Some(expertise), Some(impact)) =
            (outcomes.contribution, outcomes.expertise, outcomes.impact)
        else {
            return Err(EngineError::IncompleteEvaluation {
                employee_id: employee_id.to_string(),
                period_id: period_id.to_string(),
                missing: outcomes.missing(),
            });
        };

        let preliminary_grade = self.grade_for_flags(
            contribution.is_achieved,
            expertise.is_achieved,
            impact.is_achieved,
        )?;
        let achieved_count = [contribution, expertise, impact]
            .iter()
            .filter(|outcome| outcome.is_achieved)
            .count() as u8;
        let total_score =
            ((contribution.score + expertise.score + impact.score) / Decimal::from(3)).round_dp(2);

        let audit_step = AuditStep {
            step_number,
            rule_id: "grade_combination".to_string(),
            rule_name: "Preliminary Grade Combination".to_string(),
            input: serde_json::json!({
                "employee_id": employee_id,
                "period_id": period_id,
                "contribution_achieved": contribution.is_achieved,
                "expertise_achieved": expertise.is_achieved,
                "impact_achieved": impact.is_achieved
            }),
            output: serde_json::json!({
                "achieved_count": achieved_count,
                "preliminary_grade": preliminary_grade,
                "total_score": total_score.normalize().to_string()
            }),
            reasoning: format!(
                "{} of 3 axes achieved: preliminary grade {}",
                achieved_count, preliminary_grade
            ),
        };

        Ok(CombinedGrade {
            preliminary_grade,
            contribution,
            expertise,
            impact,
            achieved_count,
            total_score,
            audit_step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn outcome(score: i64, is_achieved: bool) -> AxisOutcome {
        AxisOutcome {
            score: Decimal::from(score),
            is_achieved,
        }
    }

    fn combiner() -> GradeCombiner {
        GradeCombiner::new(GradeMapping::default())
    }

    #[test]
    fn test_combine_two_achieved_is_a() {
        let outcomes = AxisOutcomes {
            contribution: Some(outcome(2, false)),
            expertise: Some(outcome(4, true)),
            impact: Some(outcome(3, true)),
        };
        let combined = combiner().combine("emp_001", "2025H1", &outcomes, 1).unwrap();
        assert_eq!(combined.preliminary_grade, PreliminaryGrade::A);
        assert_eq!(combined.achieved_count, 2);
        assert_eq!(combined.total_score, Decimal::from(3));
        assert!(combined.audit_step.reasoning.contains("2 of 3"));
    }

    #[test]
    fn test_all_failed_is_grade_c_not_an_error() {
        let outcomes = AxisOutcomes {
            contribution: Some(outcome(1, false)),
            expertise: Some(outcome(1, false)),
            impact: Some(outcome(1, false)),
        };
        let combined = combiner().combine("emp_001", "2025H1", &outcomes, 1).unwrap();
        assert_eq!(combined.preliminary_grade, PreliminaryGrade::C);
    }

    #[test]
    fn test_missing_axes_are_reported() {
        let outcomes = AxisOutcomes {
            contribution: Some(outcome(3, true)),
            expertise: None,
            impact: None,
        };
        match combiner().combine("emp_001", "2025H1", &outcomes, 1) {
            Err(EngineError::IncompleteEvaluation {
                employee_id,
                period_id,
                missing,
            }) => {
                assert_eq!(employee_id, "emp_001");
                assert_eq!(period_id, "2025H1");
                assert_eq!(missing, vec![Axis::Expertise, Axis::Impact]);
            }
            other => panic!("Expected IncompleteEvaluation, got {:?}", other),
        }
    }

    #[test]
    fn test_injected_mapping_changes_policy() {
        let strict = GradeCombiner::new(GradeMapping {
            by_achieved_count: BTreeMap::from([
                (0, PreliminaryGrade::C),
                (1, PreliminaryGrade::C),
                (2, PreliminaryGrade::B),
                (3, PreliminaryGrade::A),
            ]),
        });
        assert_eq!(strict.grade_for_flags(true, true, false).unwrap(), PreliminaryGrade::B);
        assert_eq!(strict.grade_for_flags(true, true, true).unwrap(), PreliminaryGrade::A);
    }

    #[test]
    fn test_total_score_is_rounded_mean() {
        let outcomes = AxisOutcomes {
            contribution: Some(outcome(3, true)),
            expertise: Some(outcome(3, true)),
            impact: Some(outcome(4, true)),
        };
        let combined = combiner().combine("emp_001", "2025H1", &outcomes, 1).unwrap();
        assert_eq!(combined.total_score, Decimal::new(333, 2));
    }

    proptest! {
        /// The grade depends only on the number of achieved axes.
        #[test]
        fn property_combination_is_symmetric(flags in proptest::array::uniform3(any::<bool>())) {
            let [a, b, c] = flags;
            let combiner = combiner();
            let expected = combiner.grade_for_flags(a, b, c).unwrap();
            for (x, y, z) in [(a, c, b), (b, a, c), (b, c, a), (c, a, b), (c, b, a)] {
                prop_assert_eq!(combiner.grade_for_flags(x, y, z).unwrap(), expected);
            }
        }

        /// `combine` agrees with the flag mapping whatever the scores are.
        #[test]
        fn property_combine_is_pure_function_of_flags(
            flags in proptest::array::uniform3(any::<bool>()),
            scores in proptest::array::uniform3(0i64..=5),
        ) {
            let outcomes = AxisOutcomes {
                contribution: Some(outcome(scores[0], flags[0])),
                expertise: Some(outcome(scores[1], flags[1])),
                impact: Some(outcome(scores[2], flags[2])),
            };
            let combiner = combiner();
            let combined = combiner.combine("emp", "p", &outcomes, 1).unwrap();
            prop_assert_eq!(
                combined.preliminary_grade,
                combiner.grade_for_flags(flags[0], flags[1], flags[2]).unwrap()
            );
        }
    }
}
