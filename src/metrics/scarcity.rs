//! WATER SCARCITY RISK
//!
//! Order of operations:
//!   1. weighted = w_r·Rainfall + w_g·GroundwaterMagnitude + w_l·LandUse
//!   2. moderated = weighted · SWF        (whole sum, not per term)
//!   3. recharge buffer ×0.75 for rural, forest-dominant units
//!   4. dominance cap: scarcity ≤ cap · flood
//!   5. clamp to [0, 100]

use super::Indicators;
use crate::error::{ensure_in_range, RiskError};
use crate::profile::ScoringProfile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScarcityResult {
    /// Final score (0-100)
    pub score: f64,
    /// Weighted sum before any correction
    pub weighted: f64,
    pub surface_water_factor: f64,
    pub recharge_buffer_applied: bool,
    pub dominance_capped: bool,
    pub rainfall_impact: f64,
    pub groundwater_impact: f64,
    pub landuse_impact: f64,
}

/// Scarcity score; `flood_score` is the same unit's final flood score (for the cap)
pub fn calculate_scarcity(
    indicators: &Indicators,
    profile: &ScoringProfile,
    flood_score: f64,
) -> Result<ScarcityResult, RiskError> {
    let w = &profile.scarcity;

    let rainfall_impact = w.rainfall * indicators.rainfall_scarcity;
    let groundwater_impact = w.groundwater * indicators.groundwater_scarcity;
    let landuse_impact = w.landuse * indicators.landuse_scarcity;

    let weighted = ensure_in_range(
        "scarcity_weighted",
        rainfall_impact + groundwater_impact + landuse_impact,
    )?;

    let mut score = weighted * indicators.surface_water_factor;

    let recharge_buffer_applied = match &profile.recharge_buffer {
        Some(buffer) if buffer.applies(indicators.urban_percent, indicators.forest_percent) => {
            score *= buffer.factor;
            true
        }
        _ => false,
    };

    let mut dominance_capped = false;
    if let Some(ratio) = profile.dominance_cap {
        let cap = ratio * flood_score;
        if score > cap {
            score = cap;
            dominance_capped = true;
        }
    }

    let score = ensure_in_range("scarcity", score.clamp(0.0, 100.0))?;

    Ok(ScarcityResult {
        score,
        weighted,
        surface_water_factor: indicators.surface_water_factor,
        recharge_buffer_applied,
        dominance_capped,
        rainfall_impact,
        groundwater_impact,
        landuse_impact,
    })
}
