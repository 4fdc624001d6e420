//! Configuration loading and management for the Evaluation Engine.
//!
//! This module loads grading policy from YAML files: contribution and
//! checklist scoring rules, the achieved-count grade table, calibration
//! bounds, half-grade boundaries and growth-level requirements.
//!
//! # Example
//!
//! ```no_run
//! use evaluation_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Max adjustment: {} tiers", config.policy().calibration.max_adjustment_tiers);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CalibrationPolicy, ChecklistPolicy, ContributionPolicy, EngineConfig, GradeMapping,
    GrowthLevelsConfig, HalfGradeBoundaries, LevelRequirements, PolicyConfig, ProgressWeights,
};
