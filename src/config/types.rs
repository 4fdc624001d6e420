//! Configuration types for evaluation policy.
//!
//! This module contains the strongly-typed policy structures that are
//! deserialized from YAML configuration files. Every grading rule the
//! engine applies lives here so that policy changes are data changes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{Axis, CourseId, FinalGrade, PreliminaryGrade, SkillId};

/// Contribution axis policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContributionPolicy {
    /// Weighted achievement needed for the axis to count as achieved
    /// (1.0 = 100%). A period may override it.
    pub achievement_threshold: Decimal,
    /// Per-task ceiling on the achievement rate, so one over-performing
    /// task cannot carry the axis.
    pub achievement_rate_cap: Decimal,
    /// Converts capped weighted achievement into the 0-5 score band.
    pub score_multiplier: Decimal,
}

impl Default for ContributionPolicy {
    fn default() -> Self {
        Self {
            achievement_threshold: Decimal::ONE,
            achievement_rate_cap: Decimal::new(15, 1),
            score_multiplier: Decimal::new(3, 0),
        }
    }
}

/// Expertise or Impact checklist policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChecklistPolicy {
    /// The fixed number of checklist items.
    pub item_count: usize,
    /// Highest valid rating for an item; the lowest is 0.
    #[serde(default = "default_max_rating")]
    pub max_rating: i32,
    /// Relative item weights. Items are weighted equally when absent.
    #[serde(default)]
    pub item_weights: Option<Vec<Decimal>>,
    /// Score required to achieve the axis, by the employee's growth level.
    #[serde(default)]
    pub required_level_by_growth_level: BTreeMap<u8, Decimal>,
}

fn default_max_rating() -> i32 {
    5
}

impl ChecklistPolicy {
    /// An equally weighted checklist of `item_count` items rated 0-5.
    pub fn equal_weights(item_count: usize) -> Self {
        Self {
            item_count,
            max_rating: default_max_rating(),
            item_weights: None,
            required_level_by_growth_level: BTreeMap::new(),
        }
    }

    fn validate(&self, axis: Axis) -> EngineResult<()> {
        if self.item_count == 0 {
            return Err(invalid(format!("{axis}.item_count must be at least 1")));
        }
        if self.max_rating <= 0 {
            return Err(invalid(format!("{axis}.max_rating must be positive")));
        }
        if let Some(weights) = &self.item_weights {
            if weights.len() != self.item_count {
                return Err(invalid(format!(
                    "{axis}.item_weights has {} entries but item_count is {}",
                    weights.len(),
                    self.item_count
                )));
            }
            if weights.iter().any(|w| *w < Decimal::ZERO) {
                return Err(invalid(format!("{axis}.item_weights cannot be negative")));
            }
            if weights.iter().copied().sum::<Decimal>() <= Decimal::ZERO {
                return Err(invalid(format!("{axis}.item_weights must sum above zero")));
            }
        }
        Ok(())
    }
}

/// Maps the number of achieved axes onto a preliminary grade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeMapping {
    /// Achieved-axis count (0..=3) to preliminary grade.
    pub by_achieved_count: BTreeMap<u8, PreliminaryGrade>,
}

impl Default for GradeMapping {
    fn default() -> Self {
        Self {
            by_achieved_count: BTreeMap::from([
                (0, PreliminaryGrade::C),
                (1, PreliminaryGrade::B),
                (2, PreliminaryGrade::A),
                (3, PreliminaryGrade::A),
            ]),
        }
    }
}

impl GradeMapping {
    /// Returns the preliminary grade for `achieved` axes.
    pub fn grade_for(&self, achieved: u8) -> EngineResult<PreliminaryGrade> {
        self.by_achieved_count
            .get(&achieved)
            .copied()
            .ok_or_else(|| invalid(format!("grade_mapping has no entry for {achieved} axes")))
    }

    fn validate(&self) -> EngineResult<()> {
        for count in 0..=3u8 {
            self.grade_for(count)?;
        }
        if let Some(extra) = self.by_achieved_count.keys().find(|count| **count > 3) {
            return Err(invalid(format!(
                "grade_mapping entry for {extra} axes is impossible with three axes"
            )));
        }
        Ok(())
    }
}

/// Bounds on committee adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalibrationPolicy {
    /// Largest allowed distance, in tiers, from the preliminary baseline.
    pub max_adjustment_tiers: u8,
    /// Whether every adjustment must carry a non-empty reason.
    #[serde(default = "default_true")]
    pub require_reason: bool,
    /// Whether only listed session participants may adjust.
    #[serde(default)]
    pub require_participant_actor: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            max_adjustment_tiers: 2,
            require_reason: true,
            require_participant_actor: false,
        }
    }
}

/// Total-score boundaries that split a letter into its two tiers.
///
/// A missing boundary maps the letter onto its base tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HalfGradeBoundaries {
    /// `A` becomes `A+` at or above this total score.
    #[serde(default)]
    pub a_plus_min_score: Option<Decimal>,
    /// `B` becomes `B+` at or above this total score.
    #[serde(default)]
    pub b_plus_min_score: Option<Decimal>,
    /// `C` becomes `D` below this total score.
    #[serde(default)]
    pub d_below_score: Option<Decimal>,
}

/// Weights used to average the four progress percentages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressWeights {
    /// Weight of the evaluation-grade requirement.
    pub evaluation: Decimal,
    /// Weight of the training requirement.
    pub training: Decimal,
    /// Weight of the skill requirement.
    pub skills: Decimal,
    /// Weight of the experience requirement.
    pub experience: Decimal,
}

impl Default for ProgressWeights {
    fn default() -> Self {
        let quarter = Decimal::from(25);
        Self {
            evaluation: quarter,
            training: quarter,
            skills: quarter,
            experience: quarter,
        }
    }
}

impl ProgressWeights {
    /// Sum of all four weights.
    pub fn total(&self) -> Decimal {
        self.evaluation + self.training + self.skills + self.experience
    }

    fn validate(&self) -> EngineResult<()> {
        let weights = [self.evaluation, self.training, self.skills, self.experience];
        if weights.iter().any(|w| *w < Decimal::ZERO) {
            return Err(invalid("progress_weights cannot be negative"));
        }
        if self.total() <= Decimal::ZERO {
            return Err(invalid("progress_weights must sum above zero"));
        }
        Ok(())
    }
}

/// The policy file (`policy.yaml`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyConfig {
    /// Contribution scoring.
    pub contribution: ContributionPolicy,
    /// Expertise checklist scoring.
    pub expertise: ChecklistPolicy,
    /// Impact checklist scoring.
    pub impact: ChecklistPolicy,
    /// Achieved-count to preliminary grade table.
    #[serde(default)]
    pub grade_mapping: GradeMapping,
    /// Committee adjustment bounds.
    #[serde(default)]
    pub calibration: CalibrationPolicy,
    /// Half-grade boundaries.
    #[serde(default)]
    pub half_grade: HalfGradeBoundaries,
    /// Progress averaging weights.
    #[serde(default)]
    pub progress_weights: ProgressWeights,
}

impl PolicyConfig {
    /// Returns the checklist policy for a checklist axis.
    pub fn checklist(&self, axis: Axis) -> EngineResult<&ChecklistPolicy> {
        match axis {
            Axis::Expertise => Ok(&self.expertise),
            Axis::Impact => Ok(&self.impact),
            Axis::Contribution => Err(EngineError::validation(
                "axis",
                "contribution is scored from tasks, not a checklist",
            )),
        }
    }

    fn validate(&self) -> EngineResult<()> {
        let contribution = &self.contribution;
        if contribution.achievement_threshold <= Decimal::ZERO {
            return Err(invalid("contribution.achievement_threshold must be positive"));
        }
        if contribution.achievement_rate_cap <= Decimal::ZERO {
            return Err(invalid("contribution.achievement_rate_cap must be positive"));
        }
        if contribution.score_multiplier <= Decimal::ZERO {
            return Err(invalid("contribution.score_multiplier must be positive"));
        }
        self.expertise.validate(Axis::Expertise)?;
        self.impact.validate(Axis::Impact)?;
        self.grade_mapping.validate()?;
        self.progress_weights.validate()
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            contribution: ContributionPolicy::default(),
            expertise: ChecklistPolicy::equal_weights(5),
            impact: ChecklistPolicy::equal_weights(5),
            grade_mapping: GradeMapping::default(),
            calibration: CalibrationPolicy::default(),
            half_grade: HalfGradeBoundaries::default(),
            progress_weights: ProgressWeights::default(),
        }
    }
}

/// Requirements for certifying into one growth level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelRequirements {
    /// Display name (e.g. "Lv.3 Senior").
    pub name: String,
    /// Lowest final grade that satisfies the evaluation requirement.
    pub min_final_grade: FinalGrade,
    /// Courses that must be completed.
    #[serde(default)]
    pub required_courses: Vec<CourseId>,
    /// Skills that must be held.
    #[serde(default)]
    pub required_skills: Vec<SkillId>,
    /// Minimum years of experience.
    #[serde(default)]
    pub min_years_experience: Decimal,
}

/// The growth level file (`growth_levels.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrowthLevelsConfig {
    /// Requirements keyed by level number.
    pub levels: BTreeMap<u8, LevelRequirements>,
}

/// The complete evaluation configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scoring, grading and calibration policy.
    policy: PolicyConfig,
    /// Growth-level requirements.
    growth_levels: BTreeMap<u8, LevelRequirements>,
}

impl EngineConfig {
    /// Creates a new EngineConfig, rejecting semantically invalid policy.
    pub fn new(
        policy: PolicyConfig,
        growth_levels: BTreeMap<u8, LevelRequirements>,
    ) -> EngineResult<Self> {
        policy.validate()?;
        if let Some((level, req)) = growth_levels
            .iter()
            .find(|(_, req)| req.min_years_experience < Decimal::ZERO)
        {
            return Err(invalid(format!(
                "growth level {level} ({}) has negative min_years_experience",
                req.name
            )));
        }
        Ok(Self {
            policy,
            growth_levels,
        })
    }

    /// Returns the policy.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Returns all growth-level requirements.
    pub fn growth_levels(&self) -> &BTreeMap<u8, LevelRequirements> {
        &self.growth_levels
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig {
        message: message.into(),
    }
}
