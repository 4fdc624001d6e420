//! Error types for the Evaluation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while scoring, calibrating and
//! certifying employees.
//!
//! A failed growth-level certification is not an error: it is the `FAIL`
//! branch of [`crate::models::CertificationDecision`].

use thiserror::Error;

use crate::models::Axis;

/// The main error type for the Evaluation Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use evaluation_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but describes an unusable policy.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the policy.
        message: String,
    },

    /// An input was malformed or out of range. Inputs are never clamped.
    #[error("Invalid value for '{field}': {message}")]
    ValidationError {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Grade combination was attempted before all three axes were entered.
    #[error("Evaluation for employee '{employee_id}' in period '{period_id}' is missing axes: {}", format_axes(.missing))]
    IncompleteEvaluation {
        /// The employee being evaluated.
        employee_id: String,
        /// The evaluation period.
        period_id: String,
        /// The axes that have not been entered yet.
        missing: Vec<Axis>,
    },

    /// A calibration bound was exceeded, an operation was attempted in the
    /// wrong state, or a frozen record was written to.
    #[error("Policy violation: {message}")]
    PolicyViolation {
        /// A description of the violated rule.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record (e.g. "period", "calibration session").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The requested growth level has no configured requirements.
    #[error("Growth level not configured: {level}")]
    GrowthLevelNotFound {
        /// The requested level.
        level: u8,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::ValidationError`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::PolicyViolation`].
    pub fn policy(message: impl Into<String>) -> Self {
        Self::PolicyViolation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

fn format_axes(axes: &[Axis]) -> String {
    axes.iter()
        .map(|axis| axis.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/policy.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/policy.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_validation_error_displays_field_and_message() {
        let error = EngineError::validation("items[2]", "rating 7 is outside 0..=5");
        assert_eq!(
            error.to_string(),
            "Invalid value for 'items[2]': rating 7 is outside 0..=5"
        );
    }

    #[test]
    fn test_incomplete_evaluation_lists_missing_axes() {
        let error = EngineError::IncompleteEvaluation {
            employee_id: "emp_001".to_string(),
            period_id: "2025H1".to_string(),
            missing: vec![Axis::Expertise, Axis::Impact],
        };
        assert_eq!(
            error.to_string(),
            "Evaluation for employee 'emp_001' in period '2025H1' is missing axes: expertise, impact"
        );
    }

    #[test]
    fn test_policy_violation_displays_message() {
        let error = EngineError::policy("adjustment of 3 tiers exceeds bound of 2");
        assert_eq!(
            error.to_string(),
            "Policy violation: adjustment of 3 tiers exceeds bound of 2"
        );
    }

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = EngineError::not_found("period", "2025H1");
        assert_eq!(error.to_string(), "period not found: 2025H1");
    }

    #[test]
    fn test_growth_level_not_found_displays_level() {
        let error = EngineError::GrowthLevelNotFound { level: 9 };
        assert_eq!(error.to_string(), "Growth level not configured: 9");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_policy_violation() -> EngineResult<()> {
            Err(EngineError::policy("frozen"))
        }

        fn propagates_error() -> EngineResult<()> {
            returns_policy_violation()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
