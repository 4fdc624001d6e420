//! Mapping of preliminary letters onto the seven-tier scale.
//!
//! When calibration completes, every evaluation the committee did not adjust
//! receives the tier its preliminary letter maps to. Which half of the
//! letter (A or A+, B or B+, C or D) is a policy decision, so the mapping is
//! an injectable [`HalfGradePolicy`].

use rust_decimal::Decimal;

use crate::config::HalfGradeBoundaries;
use crate::models::{FinalGrade, PreliminaryGrade};

/// Resolves a preliminary letter and total score to a seven-tier grade.
///
/// Implemented for [`HalfGradeBoundaries`] and for any matching closure.
///
/// # Example
///
/// ```
/// use evaluation_engine::calculation::HalfGradePolicy;
/// use evaluation_engine::models::{FinalGrade, PreliminaryGrade};
/// use rust_decimal::Decimal;
///
/// let always_upper = |grade: PreliminaryGrade, _score: Decimal| match grade {
///     PreliminaryGrade::A => FinalGrade::APlus,
///     PreliminaryGrade::B => FinalGrade::BPlus,
///     PreliminaryGrade::C => FinalGrade::C,
/// };
/// assert_eq!(always_upper.resolve(PreliminaryGrade::B, Decimal::ZERO), FinalGrade::BPlus);
/// ```
pub trait HalfGradePolicy: Send + Sync {
    /// Returns the tier for `grade` given the evaluation's total score.
    fn resolve(&self, grade: PreliminaryGrade, total_score: Decimal) -> FinalGrade;
}

impl<F> HalfGradePolicy for F
where
    F: Fn(PreliminaryGrade, Decimal) -> FinalGrade + Send + Sync,
{
    fn resolve(&self, grade: PreliminaryGrade, total_score: Decimal) -> FinalGrade {
        self(grade, total_score)
    }
}

impl HalfGradePolicy for HalfGradeBoundaries {
    fn resolve(&self, grade: PreliminaryGrade, total_score: Decimal) -> FinalGrade {
        match grade {
            PreliminaryGrade::A => match self.a_plus_min_score {
                Some(min) if total_score >= min => FinalGrade::APlus,
                _ => FinalGrade::A,
            },
            PreliminaryGrade::B => match self.b_plus_min_score {
                Some(min) if total_score >= min => FinalGrade::BPlus,
                _ => FinalGrade::B,
            },
            PreliminaryGrade::C => match self.d_below_score {
                Some(floor) if total_score < floor => FinalGrade::D,
                _ => FinalGrade::C,
            },
        }
    }
}
