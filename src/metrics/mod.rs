//! Composite risk metrics
//!
//! Indicators are normalized once per unit into an [`Indicators`] set, then
//! each target score applies its own weighting and correction terms.
//! Flood and scarcity pick different land-use and groundwater variants from
//! the same raw record, so there is no single shared land-use score.

pub mod flood;
pub mod scarcity;

pub use flood::{calculate_flood, FloodResult};
pub use scarcity::{calculate_scarcity, ScarcityResult};

use crate::data::UnitRecord;
use crate::error::{ensure_in_range, RiskError};
use crate::profile::{RainfallMode, ScoringProfile};
use crate::utils::normalization::{
    flood_boost, groundwater_score, landuse_score, rainfall_deficit_score, rainfall_score,
    rainfall_surplus_score, surface_water_factor,
};
use serde::Serialize;

/// Normalized indicators for one unit under one profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicators {
    pub rainfall_flood: f64,
    pub rainfall_scarcity: f64,
    pub groundwater_flood: f64,
    pub groundwater_scarcity: f64,
    pub landuse_flood: f64,
    pub landuse_scarcity: f64,
    /// Scarcity multiplier in [0.1, 1.0]
    pub surface_water_factor: f64,
    /// Additive flood term
    pub flood_boost: f64,
    pub urban_percent: f64,
    pub forest_percent: f64,
}

/// Normalize every indicator a profile needs for `unit`.
///
/// `reference_drop` is the batch-wide scalar from `resolve_reference_drop`.
pub fn compute_indicators(
    unit: &UnitRecord,
    profile: &ScoringProfile,
    reference_drop: f64,
) -> Result<Indicators, RiskError> {
    let (rainfall_flood, rainfall_scarcity) = match profile.rainfall_mode {
        RainfallMode::Magnitude => {
            let shared = rainfall_score(unit.rainfall_normal, unit.rainfall_current);
            (shared, shared)
        }
        RainfallMode::Directional => (
            rainfall_surplus_score(unit.rainfall_normal, unit.rainfall_current),
            rainfall_deficit_score(unit.rainfall_normal, unit.rainfall_current),
        ),
    };

    let groundwater = unit.groundwater();
    let groundwater_flood = groundwater_score(groundwater, reference_drop, profile.flood_groundwater, None);
    let groundwater_scarcity = groundwater_score(
        groundwater,
        reference_drop,
        profile.scarcity_groundwater,
        profile.noise_threshold_m,
    );

    let urban = unit.urban();
    let forest = unit.forest();

    let indicators = Indicators {
        rainfall_flood: ensure_in_range("rainfall_flood", rainfall_flood)?,
        rainfall_scarcity: ensure_in_range("rainfall_scarcity", rainfall_scarcity)?,
        groundwater_flood: ensure_in_range("groundwater_flood", groundwater_flood)?,
        groundwater_scarcity: ensure_in_range("groundwater_scarcity", groundwater_scarcity)?,
        landuse_flood: ensure_in_range("landuse_flood", landuse_score(urban, forest, profile.flood_landuse))?,
        landuse_scarcity: ensure_in_range(
            "landuse_scarcity",
            landuse_score(urban, forest, profile.scarcity_landuse),
        )?,
        surface_water_factor: surface_water_factor(unit.water_body_percent, profile.surface_water),
        flood_boost: flood_boost(unit.water_body(), profile.flood_boost_multiplier),
        urban_percent: urban,
        forest_percent: forest,
    };

    tracing::debug!(unit = %unit.name, ?indicators, "Normalized indicators");

    Ok(indicators)
}
