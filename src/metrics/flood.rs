//! FLOOD RISK
//!
//! flood = clamp(w_r·Rainfall + w_l·LandUse + w_g·GroundwaterRise + FloodBoost, 0, 100)
//!
//! The boost is added after the weighted base and before the clamp, so it can
//! push a unit to the 100 ceiling but never past it.

use super::Indicators;
use crate::error::{ensure_in_range, RiskError};
use crate::profile::ScoringProfile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloodResult {
    /// Final score (0-100)
    pub score: f64,
    /// Weighted sum before the boost
    pub base: f64,
    pub boost: f64,
    pub rainfall_impact: f64,
    pub landuse_impact: f64,
    pub groundwater_impact: f64,
}

pub fn calculate_flood(indicators: &Indicators, profile: &ScoringProfile) -> Result<FloodResult, RiskError> {
    let w = &profile.flood;

    let rainfall_impact = w.rainfall * indicators.rainfall_flood;
    let landuse_impact = w.landuse * indicators.landuse_flood;
    let groundwater_impact = w.groundwater * indicators.groundwater_flood;

    let base = ensure_in_range("flood_base", rainfall_impact + landuse_impact + groundwater_impact)?;
    let boost = indicators.flood_boost;

    let score = ensure_in_range("flood", (base + boost).clamp(0.0, 100.0))?;

    Ok(FloodResult {
        score,
        base,
        boost,
        rainfall_impact,
        landuse_impact,
        groundwater_impact,
    })
}
