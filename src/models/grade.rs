//! Evaluation axes and grade scales.
//!
//! Preliminary grades use a three-letter scale derived from axis
//! achievement counts. Final grades use the seven-tier calibration scale,
//! ordered `D < C < B < B+ < A < A+ < S`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three independently scored evaluation dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Weighted task completion for the period.
    Contribution,
    /// Checklist-scored professional expertise.
    Expertise,
    /// Checklist-scored organisational impact.
    Impact,
}

impl Axis {
    /// All axes in canonical order.
    pub const ALL: [Axis; 3] = [Axis::Contribution, Axis::Expertise, Axis::Impact];

    /// Returns the snake_case identifier used in payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Contribution => "contribution",
            Axis::Expertise => "expertise",
            Axis::Impact => "impact",
        }
    }

    /// Returns the capitalised name used in audit rule names.
    pub fn label(&self) -> &'static str {
        match self {
            Axis::Contribution => "Contribution",
            Axis::Expertise => "Expertise",
            Axis::Impact => "Impact",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The A/B/C grade derived purely from axis achievement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreliminaryGrade {
    /// Strong result.
    A,
    /// Partial result.
    B,
    /// No axis achieved.
    C,
}

impl fmt::Display for PreliminaryGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PreliminaryGrade::A => "A",
            PreliminaryGrade::B => "B",
            PreliminaryGrade::C => "C",
        };
        f.write_str(s)
    }
}

/// The seven-tier grade produced by calibration.
///
/// Ordering follows the scale, so `FinalGrade::BPlus > FinalGrade::B`.
///
/// # Example
///
/// ```
/// use evaluation_engine::models::FinalGrade;
///
/// assert!(FinalGrade::APlus > FinalGrade::A);
/// assert_eq!(FinalGrade::A.distance_from(FinalGrade::B), 2);
/// assert_eq!(serde_json::to_string(&FinalGrade::BPlus).unwrap(), "\"B+\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FinalGrade {
    /// Lowest tier.
    D,
    /// Lower half of the C letter.
    C,
    /// Lower half of the B letter.
    B,
    /// Upper half of the B letter.
    #[serde(rename = "B+")]
    BPlus,
    /// Lower half of the A letter.
    A,
    /// Upper half of the A letter.
    #[serde(rename = "A+")]
    APlus,
    /// Highest tier; only reachable through calibration.
    S,
}

impl FinalGrade {
    /// All tiers from lowest to highest.
    pub const SCALE: [FinalGrade; 7] = [
        FinalGrade::D,
        FinalGrade::C,
        FinalGrade::B,
        FinalGrade::BPlus,
        FinalGrade::A,
        FinalGrade::APlus,
        FinalGrade::S,
    ];

    /// Zero-based position on the scale (`D` = 0, `S` = 6).
    pub fn rank(&self) -> i8 {
        match self {
            FinalGrade::D => 0,
            FinalGrade::C => 1,
            FinalGrade::B => 2,
            FinalGrade::BPlus => 3,
            FinalGrade::A => 4,
            FinalGrade::APlus => 5,
            FinalGrade::S => 6,
        }
    }

    /// Signed number of tiers from `other` to `self`.
    pub fn distance_from(&self, other: FinalGrade) -> i8 {
        self.rank() - other.rank()
    }

    /// The letter this tier belongs to on the preliminary scale, if any.
    pub fn letter(&self) -> Option<PreliminaryGrade> {
        match self {
            FinalGrade::A | FinalGrade::APlus => Some(PreliminaryGrade::A),
            FinalGrade::B | FinalGrade::BPlus => Some(PreliminaryGrade::B),
            FinalGrade::C | FinalGrade::D => Some(PreliminaryGrade::C),
            FinalGrade::S => None,
        }
    }
}

impl fmt::Display for FinalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalGrade::D => "D",
            FinalGrade::C => "C",
            FinalGrade::B => "B",
            FinalGrade::BPlus => "B+",
            FinalGrade::A => "A",
            FinalGrade::APlus => "A+",
            FinalGrade::S => "S",
        };
        f.write_str(s)
    }
}
