//! Growth-level certification checks.
//!
//! This module decides whether an employee meets the requirements of a
//! growth level. It performs no I/O: the latest calibrated final grade,
//! completed courses, skill inventory and experience are supplied by the
//! caller. A failing check is a normal result that lists every gap.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, LevelRequirements, ProgressWeights};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CertificationDecision, CertificationResult, CourseId, FinalGrade, ProgressReport, SkillId,
};

use super::progress::calculate_progress;

/// Everything a certification check reads about the employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationEvidence {
    /// Final grade of the latest completed calibration, if any.
    #[serde(default)]
    pub final_grade: Option<FinalGrade>,
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

/// Checks employees against configured growth-level requirements.
///
/// # Example
///
/// ```
/// use evaluation_engine::calculation::{CertificationEvidence, GrowthLevelCertifier};
/// use evaluation_engine::config::{LevelRequirements, ProgressWeights};
/// use evaluation_engine::models::{CertificationResult, FinalGrade};
/// use rust_decimal::Decimal;
/// use std::collections::BTreeMap;
///
/// let levels = BTreeMap::from([(
///     3,
///     LevelRequirements {
///         name: "Lv.3".to_string(),
///         min_final_grade: FinalGrade::B,
///         required_courses: vec!["c1".to_string(), "c2".to_string(), "c3".to_string()],
///         required_skills: vec!["s1".to_string()],
///         min_years_experience: Decimal::ZERO,
///     },
/// )]);
/// let certifier = GrowthLevelCertifier::new(levels, ProgressWeights::default());
///
/// let evidence = CertificationEvidence {
///     final_grade: Some(FinalGrade::BPlus),
///     completed_courses: vec!["c1".to_string(), "c2".to_string()],
///     skills: vec!["s1".to_string()],
///     years_of_experience: Decimal::ZERO,
/// };
/// let decision = certifier.check(3, &evidence).unwrap();
///
/// assert_eq!(decision.certification_result, CertificationResult::Fail);
/// assert!(decision.eval_ok);
/// assert_eq!(decision.missing_courses, vec!["c3".to_string()]);
/// assert!(decision.missing_skills.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct GrowthLevelCertifier {
    levels: BTreeMap<u8, LevelRequirements>,
    weights: ProgressWeights,
}

impl GrowthLevelCertifier {
    /// Creates a certifier over explicit requirements.
    pub fn new(levels: BTreeMap<u8, LevelRequirements>, weights: ProgressWeights) -> Self {
        Self { levels, weights }
    }

    /// Creates a certifier from loaded configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.growth_levels().clone(),
            config.policy().progress_weights.clone(),
        )
    }

    /// Returns the requirements of `level`.
    pub fn requirements(&self, level: u8) -> EngineResult<&LevelRequirements> {
        self.levels
            .get(&level)
            .ok_or(EngineError::GrowthLevelNotFound { level })
    }

    /// Decides whether `evidence` satisfies `target_level`.
    ///
    /// `PASS` iff the final grade meets the level's floor and no required
    /// course or skill is missing. Only an unknown level is an error.
    pub fn check(
        &self,
        target_level: u8,
        evidence: &CertificationEvidence,
    ) -> EngineResult<CertificationDecision> {
        let requirements = self.requirements(target_level)?;

        let eval_ok = evidence
            .final_grade
            .is_some_and(|grade| grade >= requirements.min_final_grade);
        let missing_courses = missing(&requirements.required_courses, &evidence.completed_courses);
        let missing_skills = missing(&requirements.required_skills, &evidence.skills);

        let certification_result =
            if eval_ok && missing_courses.is_empty() && missing_skills.is_empty() {
                CertificationResult::Pass
            } else {
                CertificationResult::Fail
            };

        Ok(CertificationDecision {
            certification_result,
            eval_ok,
            missing_courses,
            missing_skills,
        })
    }

    /// Reports percent completion of each requirement for `target_level`.
    pub fn progress(
        &self,
        target_level: u8,
        evidence: &CertificationEvidence,
    ) -> EngineResult<ProgressReport> {
        let requirements = self.requirements(target_level)?;
        Ok(calculate_progress(requirements, &self.weights, evidence))
    }
}

/// Required entries not present in `have`, in required order, deduplicated.
pub(crate) fn missing(required: &[String], have: &[String]) -> Vec<String> {
    let have: HashSet<&str> = have.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut gaps = Vec::new();
    for item in required {
        if !have.contains(item.as_str()) && seen.insert(item.as_str()) {
            gaps.push(item.clone());
        }
    }
    gaps
}
