//! Risk level classification
//!
//! Two threshold families exist; the profile picks one and it is applied to
//! both flood and scarcity scores of the same run.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdScheme {
    /// `<=25` Low, `<=50` Medium, `<=75` High, else Critical
    FourLevel,
    /// `<30` Low, `<60` Moderate, else High
    ThreeLevel,
}

/// Discrete risk level, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ThresholdScheme {
    pub fn classify(&self, score: f64) -> RiskLevel {
        match self {
            ThresholdScheme::FourLevel => match score {
                s if s <= 25.0 => RiskLevel::Low,
                s if s <= 50.0 => RiskLevel::Medium,
                s if s <= 75.0 => RiskLevel::High,
                _ => RiskLevel::Critical,
            },
            ThresholdScheme::ThreeLevel => match score {
                s if s < 30.0 => RiskLevel::Low,
                s if s < 60.0 => RiskLevel::Moderate,
                _ => RiskLevel::High,
            },
        }
    }

    /// Levels this scheme can produce, lowest first
    pub fn levels(&self) -> &'static [RiskLevel] {
        match self {
            ThresholdScheme::FourLevel => &[
                RiskLevel::Low,
                RiskLevel::Medium,
                RiskLevel::High,
                RiskLevel::Critical,
            ],
            ThresholdScheme::ThreeLevel => &[RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High],
        }
    }
}
