//! Committee calibration of preliminary grades.
//!
//! A calibration session reviews the preliminary grades of one period and
//! department. While `IN_PROGRESS` the committee may move individual grades
//! within a bounded number of tiers; completing the session makes the final
//! grades binding.

mod engine;

pub use engine::{AdjustmentRequest, CalibrationEngine};
