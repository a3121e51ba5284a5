//! Indicator Normalization
//!
//! Converts the four raw environmental signals to comparable 0-100 scores,
//! plus the two water-body terms (surface water factor and flood boost)
//! that moderate the composites rather than feed them as indicators.
//!
//! Every function here is pure and per-record. The one dataset-wide input,
//! the groundwater reference drop, is resolved once per batch by
//! [`resolve_reference_drop`] and passed in as a scalar.

use crate::profile::{GroundwaterMode, LandUseWeighting, ReferenceDrop, SurfaceWaterModeration};

/// Lower bound of the surface water factor
pub const MIN_SURFACE_WATER_FACTOR: f64 = 0.1;

fn clip(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Signed rainfall ratio `(current - normal) / normal`; 0 when normal is not positive
pub fn rainfall_ratio(rainfall_normal: f64, rainfall_current: f64) -> f64 {
    if rainfall_normal <= 0.0 {
        return 0.0;
    }
    (rainfall_current - rainfall_normal) / rainfall_normal
}

/// Rainfall deviation magnitude: `min(|normal - current| / normal · 100, 100)`
pub fn rainfall_score(rainfall_normal: f64, rainfall_current: f64) -> f64 {
    clip(rainfall_ratio(rainfall_normal, rainfall_current).abs() * 100.0)
}

/// Surplus-only rainfall score (deficits give 0)
pub fn rainfall_surplus_score(rainfall_normal: f64, rainfall_current: f64) -> f64 {
    clip(rainfall_ratio(rainfall_normal, rainfall_current).max(0.0) * 100.0)
}

/// Deficit-only rainfall score (surpluses give 0)
pub fn rainfall_deficit_score(rainfall_normal: f64, rainfall_current: f64) -> f64 {
    clip((-rainfall_ratio(rainfall_normal, rainfall_current)).max(0.0) * 100.0)
}

/// Scale a change in meters against the reference drop
fn scale_change(change_m: f64, reference_drop: f64) -> f64 {
    if reference_drop <= 0.0 || !reference_drop.is_finite() {
        return 0.0;
    }
    clip(change_m / reference_drop * 100.0)
}

/// Unsigned groundwater change score; 0 without readings
///
/// `groundwater` is `(last, current)` after substitution (see `UnitRecord::groundwater`).
pub fn groundwater_magnitude_score(groundwater: Option<(f64, f64)>, reference_drop: f64) -> f64 {
    groundwater_score(groundwater, reference_drop, GroundwaterMode::Magnitude, None)
}

/// Groundwater score for one target score.
///
/// Depths are meters below ground, so a rise is `current < last`.
/// Changes strictly below `noise_threshold_m` count as no change.
pub fn groundwater_score(
    groundwater: Option<(f64, f64)>,
    reference_drop: f64,
    mode: GroundwaterMode,
    noise_threshold_m: Option<f64>,
) -> f64 {
    let Some((last, current)) = groundwater else {
        return 0.0;
    };

    let counted = match mode {
        GroundwaterMode::Magnitude => true,
        GroundwaterMode::RiseOnly => current < last,
        GroundwaterMode::DropOnly => current > last,
    };
    if !counted {
        return 0.0;
    }

    let change = (last - current).abs();
    if noise_threshold_m.is_some_and(|t| change < t) {
        return 0.0;
    }

    scale_change(change, reference_drop)
}

/// Land-use composition score for the given weighting
pub fn landuse_score(urban_percent: f64, forest_percent: f64, weighting: LandUseWeighting) -> f64 {
    let forest_deficit = 100.0 - forest_percent;
    let raw = match weighting {
        LandUseWeighting::General => (urban_percent / 100.0) * 50.0 + (forest_deficit / 100.0) * 50.0,
        LandUseWeighting::RechargeDeficit => 0.6 * urban_percent + 0.4 * forest_deficit,
        LandUseWeighting::UrbanOnly => urban_percent,
        LandUseWeighting::ForestDeficit => forest_deficit,
    };
    clip(raw)
}

/// Surface Water Factor in [0.1, 1.0]; 1.0 when water-body coverage is absent or ≤ 0
pub fn surface_water_factor(water_body_percent: Option<f64>, moderation: SurfaceWaterModeration) -> f64 {
    let wb = match water_body_percent {
        Some(wb) if wb > 0.0 => wb,
        _ => return 1.0,
    };

    let factor = match moderation {
        SurfaceWaterModeration::None => return 1.0,
        SurfaceWaterModeration::Linear { divisor } => 1.0 - wb / divisor,
        SurfaceWaterModeration::Scaled { coefficient } => 1.0 - wb * coefficient / 100.0,
    };

    factor.clamp(MIN_SURFACE_WATER_FACTOR, 1.0)
}

/// Additive flood term for proximity to open water; uncapped until the final clamp
pub fn flood_boost(water_body_percent: f64, multiplier: f64) -> f64 {
    water_body_percent.max(0.0) * multiplier
}

/// Percentile with linear interpolation between closest ranks.
///
/// Returns `None` for an empty slice. `pct` is on the 0-100 scale.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Resolve the reference drop to a single scalar for the whole batch.
///
/// `observed_changes` are absolute groundwater changes across all units;
/// they are only read by the percentile strategy.
pub fn resolve_reference_drop(reference: ReferenceDrop, observed_changes: &[f64]) -> f64 {
    match reference {
        ReferenceDrop::Fixed { meters } => meters,
        ReferenceDrop::Percentile { percentile: pct, floor } => percentile(observed_changes, pct)
            .map_or(floor, |p| p.max(floor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rainfall_edge_cases() {
        assert_eq!(rainfall_score(1000.0, 1000.0), 0.0);
        assert_relative_eq!(rainfall_score(1000.0, 1300.0), 30.0, epsilon = 1e-9);
        assert_relative_eq!(rainfall_score(1000.0, 700.0), 30.0, epsilon = 1e-9);
        assert_eq!(rainfall_score(1000.0, 0.0), 100.0);
        assert_eq!(rainfall_score(1000.0, 5000.0), 100.0);
        assert_eq!(rainfall_score(0.0, 0.0), 0.0);
        assert_eq!(rainfall_score(0.0, 500.0), 0.0);
    }

    #[test]
    fn test_rainfall_direction_split() {
        assert_relative_eq!(rainfall_surplus_score(1000.0, 1250.0), 25.0, epsilon = 1e-9);
        assert_eq!(rainfall_deficit_score(1000.0, 1250.0), 0.0);
        assert_relative_eq!(rainfall_deficit_score(1000.0, 800.0), 20.0, epsilon = 1e-9);
        assert_eq!(rainfall_surplus_score(1000.0, 800.0), 0.0);
        assert_eq!(rainfall_surplus_score(0.0, 800.0), 0.0);
    }

    #[test]
    fn test_groundwater_magnitude() {
        assert_eq!(groundwater_magnitude_score(Some((5.0, 5.0)), 3.0), 0.0);
        assert_relative_eq!(groundwater_magnitude_score(Some((5.0, 2.0)), 3.0), 100.0, epsilon = 1e-9);
        assert_eq!(groundwater_magnitude_score(Some((5.0, 0.0)), 3.0), 100.0);
        assert_relative_eq!(groundwater_magnitude_score(Some((5.0, 3.0)), 3.0), 66.6667, epsilon = 1e-3);
        assert_eq!(groundwater_magnitude_score(None, 3.0), 0.0);
        assert_eq!(groundwater_magnitude_score(Some((5.0, 2.0)), 0.0), 0.0);
    }

    #[test]
    fn test_groundwater_rise_only_for_flood() {
        // Depth 5.0 -> 3.0 m: water table rose by 2 m
        let rise = groundwater_score(Some((5.0, 3.0)), 3.0, GroundwaterMode::RiseOnly, None);
        assert!(rise > 0.0);
        assert_relative_eq!(rise, 200.0 / 3.0, epsilon = 1e-9);

        // Depth 3.0 -> 5.0 m: drop, contributes nothing to flood however large
        let drop = groundwater_score(Some((3.0, 50.0)), 3.0, GroundwaterMode::RiseOnly, None);
        assert_eq!(drop, 0.0);

        let none = groundwater_score(None, 3.0, GroundwaterMode::RiseOnly, None);
        assert_eq!(none, 0.0);
    }

    #[test]
    fn test_groundwater_noise_threshold() {
        let small = groundwater_score(Some((5.0, 5.3)), 3.0, GroundwaterMode::Magnitude, Some(0.4));
        assert_eq!(small, 0.0);

        let at_threshold = groundwater_score(Some((5.0, 5.4)), 3.0, GroundwaterMode::Magnitude, Some(0.4));
        assert!(at_threshold > 0.0);
    }

    #[test]
    fn test_landuse_weightings() {
        assert_relative_eq!(landuse_score(40.0, 30.0, LandUseWeighting::General), 55.0, epsilon = 1e-9);
        assert_relative_eq!(landuse_score(40.0, 30.0, LandUseWeighting::RechargeDeficit), 52.0, epsilon = 1e-9);
        assert_eq!(landuse_score(40.0, 30.0, LandUseWeighting::UrbanOnly), 40.0);
        assert_eq!(landuse_score(40.0, 30.0, LandUseWeighting::ForestDeficit), 70.0);

        // Full forest is ~0, full urban with no forest is the ceiling
        assert_eq!(landuse_score(0.0, 100.0, LandUseWeighting::General), 0.0);
        assert_eq!(landuse_score(100.0, 0.0, LandUseWeighting::General), 100.0);
    }

    #[test]
    fn test_landuse_never_negative() {
        for (u, f) in [(6.7, 44.0), (6.4, 32.3), (7.3, 18.0), (5.5, 46.8), (7.9, 48.9), (0.0, 120.0)] {
            for w in [
                LandUseWeighting::General,
                LandUseWeighting::RechargeDeficit,
                LandUseWeighting::UrbanOnly,
                LandUseWeighting::ForestDeficit,
            ] {
                let score = landuse_score(u, f, w);
                assert!((0.0..=100.0).contains(&score), "{:?}({}, {}) = {}", w, u, f, score);
            }
        }
    }

    #[test]
    fn test_surface_water_factor() {
        let linear = SurfaceWaterModeration::Linear { divisor: 50.0 };
        assert_eq!(surface_water_factor(None, linear), 1.0);
        assert_eq!(surface_water_factor(Some(0.0), linear), 1.0);
        assert_eq!(surface_water_factor(Some(-3.0), linear), 1.0);
        assert_relative_eq!(surface_water_factor(Some(10.0), linear), 0.8, epsilon = 1e-9);
        assert_eq!(surface_water_factor(Some(80.0), linear), MIN_SURFACE_WATER_FACTOR);

        let scaled = SurfaceWaterModeration::Scaled { coefficient: 0.8 };
        assert_relative_eq!(surface_water_factor(Some(10.0), scaled), 0.92, epsilon = 1e-9);

        assert_eq!(surface_water_factor(Some(10.0), SurfaceWaterModeration::None), 1.0);
    }

    #[test]
    fn test_flood_boost() {
        assert_eq!(flood_boost(0.0, 1.2), 0.0);
        assert_relative_eq!(flood_boost(10.0, 1.2), 12.0, epsilon = 1e-9);
        assert_eq!(flood_boost(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_relative_eq!(percentile(&values, 90.0).unwrap(), 4.6, epsilon = 1e-9);
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[test]
    fn test_resolve_reference_drop() {
        let fixed = ReferenceDrop::Fixed { meters: 3.0 };
        assert_eq!(resolve_reference_drop(fixed, &[10.0]), 3.0);

        let adaptive = ReferenceDrop::Percentile { percentile: 90.0, floor: 1.0 };
        assert_relative_eq!(resolve_reference_drop(adaptive, &[0.5, 1.0, 2.0, 4.0, 6.0]), 5.2, epsilon = 1e-9);

        // Floored when changes are tiny or absent
        assert_eq!(resolve_reference_drop(adaptive, &[0.1, 0.2]), 1.0);
        assert_eq!(resolve_reference_drop(adaptive, &[]), 1.0);
    }
}
