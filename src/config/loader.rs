//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading evaluation
//! policy from YAML files.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::Axis;

use super::types::{EngineConfig, GrowthLevelsConfig, LevelRequirements, PolicyConfig};

/// Loads and provides access to evaluation policy.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and provides methods to query scoring policy and growth-level
/// requirements.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── policy.yaml          # Scoring, grade mapping, calibration bounds
/// └── growth_levels.yaml   # Per-level certification requirements
/// ```
///
/// # Example
///
/// ```no_run
/// use evaluation_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let level = loader.growth_level(3)?;
/// println!("Level 3 requires at least {}", level.min_final_grade);
/// # Ok::<(), evaluation_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The policy is internally inconsistent
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<PolicyConfig>(&path.join("policy.yaml"))?;
        let growth_levels =
            Self::load_yaml::<GrowthLevelsConfig>(&path.join("growth_levels.yaml"))?;

        debug!(
            path = %path.display(),
            growth_levels = growth_levels.levels.len(),
            "Loaded evaluation policy"
        );

        Ok(Self {
            config: EngineConfig::new(policy, growth_levels.levels)?,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the scoring and calibration policy.
    pub fn policy(&self) -> &PolicyConfig {
        self.config.policy()
    }

    /// Gets the certification requirements of a growth level.
    ///
    /// Returns `GrowthLevelNotFound` when the level is not configured.
    pub fn growth_level(&self, level: u8) -> EngineResult<&LevelRequirements> {
        self.config
            .growth_levels()
            .get(&level)
            .ok_or(EngineError::GrowthLevelNotFound { level })
    }

    /// Gets the score a checklist axis requires at a given growth level.
    ///
    /// Higher growth levels demand higher thresholds, so the lookup is
    /// keyed by the employee's current level.
    pub fn required_level_for(&self, axis: Axis, growth_level: u8) -> EngineResult<Decimal> {
        self.policy()
            .checklist(axis)?
            .required_level_by_growth_level
            .get(&growth_level)
            .copied()
            .ok_or(EngineError::GrowthLevelNotFound {
                level: growth_level,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinalGrade, PreliminaryGrade};

    fn config_path() -> &'static str {
        "./config/default"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
    }

    #[test]
    fn test_contribution_policy_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let contribution = &loader.policy().contribution;
        assert_eq!(contribution.achievement_threshold, Decimal::ONE);
        assert_eq!(contribution.achievement_rate_cap, Decimal::new(15, 1));
        assert_eq!(contribution.score_multiplier, Decimal::from(3));
    }

    #[test]
    fn test_grade_mapping_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let mapping = &loader.policy().grade_mapping;
        assert_eq!(mapping.grade_for(0).unwrap(), PreliminaryGrade::C);
        assert_eq!(mapping.grade_for(1).unwrap(), PreliminaryGrade::B);
        assert_eq!(mapping.grade_for(2).unwrap(), PreliminaryGrade::A);
        assert_eq!(mapping.grade_for(3).unwrap(), PreliminaryGrade::A);
    }

    #[test]
    fn test_calibration_bound_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(loader.policy().calibration.max_adjustment_tiers, 2);
        assert!(loader.policy().calibration.require_reason);
    }

    #[test]
    fn test_half_grade_boundaries_unset_by_default() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let half = &loader.policy().half_grade;
        assert_eq!(half.a_plus_min_score, None);
        assert_eq!(half.b_plus_min_score, None);
        assert_eq!(half.d_below_score, None);
    }

    #[test]
    fn test_get_growth_level() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let level = loader.growth_level(3).unwrap();
        assert_eq!(level.min_final_grade, FinalGrade::B);
        assert_eq!(level.required_courses.len(), 3);
        assert!(!level.required_skills.is_empty());
    }

    #[test]
    fn test_get_growth_level_unknown_returns_error() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        match loader.growth_level(42) {
            Err(EngineError::GrowthLevelNotFound { level }) => assert_eq!(level, 42),
            other => panic!("Expected GrowthLevelNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_required_level_increases_with_growth_level() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let junior = loader.required_level_for(Axis::Expertise, 1).unwrap();
        let senior = loader.required_level_for(Axis::Expertise, 4).unwrap();
        assert!(senior > junior);
    }

    #[test]
    fn test_required_level_for_contribution_is_rejected() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert!(matches!(
            loader.required_level_for(Axis::Contribution, 1),
            Err(EngineError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        match ConfigLoader::load("/nonexistent/path") {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("policy.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other.err()),
        }
    }
}
