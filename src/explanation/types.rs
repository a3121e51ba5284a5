use crate::classify::RiskLevel;
use crate::resolver::ResolutionMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which composite an interactive request asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    Flood,
    Scarcity,
}

impl RiskType {
    pub fn label(&self) -> &'static str {
        match self {
            RiskType::Flood => "Flood Risk",
            RiskType::Scarcity => "Water Scarcity Risk",
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flood" => Ok(RiskType::Flood),
            "scarcity" | "water_scarcity" | "drought" => Ok(RiskType::Scarcity),
            other => Err(format!("unknown risk type '{}'", other)),
        }
    }
}

/// Component that contributed most to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Rainfall,
    Groundwater,
    LandUse,
}

/// Weighted contributions of the three indicators, rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentImpacts {
    pub rainfall_impact: f64,
    pub groundwater_impact: f64,
    pub landuse_impact: f64,
}

/// Interactive result for one resolved unit
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub panchayat: String,
    pub risk_type: RiskType,
    pub risk_label: String,
    /// Score for the requested risk type
    pub score: f64,
    pub level: RiskLevel,
    #[serde(flatten)]
    pub impacts: ComponentImpacts,
    pub dominant_factor: Factor,
    pub explanation: String,
    pub flood_score: f64,
    pub flood_level: RiskLevel,
    pub scarcity_score: f64,
    pub scarcity_level: RiskLevel,
    pub profile: String,
    pub resolution: ResolutionMethod,
}
