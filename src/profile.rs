//! Scoring Profiles
//!
//! The formulas evolved through several eras (directional vs magnitude
//! groundwater, additive flood boost, fixed vs percentile reference drop).
//! A profile pins every one of those choices so a single run never mixes
//! two eras. Profiles are selected once per invocation, either by built-in
//! name or from a JSON file.

use crate::classify::ThresholdScheme;
use crate::error::RiskError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PROFILE: &str = "moderated_v3";

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// How rainfall deviation enters the two scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainfallMode {
    /// |deviation| feeds both flood and scarcity
    Magnitude,
    /// Surplus feeds flood only, deficit feeds scarcity only
    Directional,
}

/// Land-use composition weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandUseWeighting {
    /// (urban/100)·50 + ((100-forest)/100)·50, runoff oriented
    General,
    /// 0.6·urban + 0.4·(100-forest), recharge oriented
    RechargeDeficit,
    /// Urban percentage as-is
    UrbanOnly,
    /// 100 - forest
    ForestDeficit,
}

/// Which groundwater movements count toward a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundwaterMode {
    /// Unsigned change
    Magnitude,
    /// Only a rising water table (current depth < last depth)
    RiseOnly,
    /// Only a falling water table (current depth > last depth)
    DropOnly,
}

/// Scale for converting a groundwater change in meters to 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceDrop {
    /// Fixed reference in meters
    Fixed { meters: f64 },
    /// Dataset-adaptive: the given percentile of observed changes, floored
    Percentile { percentile: f64, floor: f64 },
}

/// Scarcity moderation by surface water coverage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceWaterModeration {
    None,
    /// max(1 - water_body/divisor, 0.1)
    Linear { divisor: f64 },
    /// max(1 - water_body·coefficient/100, 0.1)
    Scaled { coefficient: f64 },
}

/// Scarcity reduction for rural, forest-dominant units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RechargeBuffer {
    /// Applies when urban % is strictly below this
    pub urban_below: f64,
    /// ...and forest % is strictly above this
    pub forest_above: f64,
    pub factor: f64,
}

impl RechargeBuffer {
    pub fn applies(&self, urban: f64, forest: f64) -> bool {
        urban < self.urban_below && forest > self.forest_above
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloodWeights {
    pub rainfall: f64,
    pub landuse: f64,
    pub groundwater: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScarcityWeights {
    pub rainfall: f64,
    pub groundwater: f64,
    pub landuse: f64,
}

/// Named, versioned scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub name: String,
    pub version: u32,
    pub rainfall_mode: RainfallMode,
    pub flood: FloodWeights,
    pub scarcity: ScarcityWeights,
    pub flood_landuse: LandUseWeighting,
    pub scarcity_landuse: LandUseWeighting,
    pub flood_groundwater: GroundwaterMode,
    pub scarcity_groundwater: GroundwaterMode,
    pub reference_drop: ReferenceDrop,
    /// Scarcity-side groundwater changes below this (m) are seasonal noise
    #[serde(default)]
    pub noise_threshold_m: Option<f64>,
    #[serde(default)]
    pub flood_boost_multiplier: f64,
    pub surface_water: SurfaceWaterModeration,
    #[serde(default)]
    pub recharge_buffer: Option<RechargeBuffer>,
    /// Scarcity may not exceed this multiple of flood
    #[serde(default)]
    pub dominance_cap: Option<f64>,
    pub thresholds: ThresholdScheme,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::moderated_v3()
    }
}

impl ScoringProfile {
    /// Directional flood groundwater, flood boost, SWF, recharge buffer and dominance cap
    pub fn moderated_v3() -> Self {
        Self {
            name: "moderated_v3".to_string(),
            version: 3,
            rainfall_mode: RainfallMode::Magnitude,
            flood: FloodWeights { rainfall: 0.4, landuse: 0.4, groundwater: 0.2 },
            scarcity: ScarcityWeights { rainfall: 0.4, groundwater: 0.4, landuse: 0.2 },
            flood_landuse: LandUseWeighting::General,
            scarcity_landuse: LandUseWeighting::RechargeDeficit,
            flood_groundwater: GroundwaterMode::RiseOnly,
            scarcity_groundwater: GroundwaterMode::Magnitude,
            reference_drop: ReferenceDrop::Fixed { meters: 3.0 },
            noise_threshold_m: Some(0.4),
            flood_boost_multiplier: 1.2,
            surface_water: SurfaceWaterModeration::Linear { divisor: 50.0 },
            recharge_buffer: Some(RechargeBuffer {
                urban_below: 30.0,
                forest_above: 20.0,
                factor: 0.75,
            }),
            dominance_cap: Some(1.1),
            thresholds: ThresholdScheme::ThreeLevel,
        }
    }

    /// Plain weighted sums of magnitude indicators (interactive dashboard era)
    pub fn weighted_v2() -> Self {
        Self {
            name: "weighted_v2".to_string(),
            version: 2,
            rainfall_mode: RainfallMode::Magnitude,
            flood: FloodWeights { rainfall: 0.4, landuse: 0.4, groundwater: 0.2 },
            scarcity: ScarcityWeights { rainfall: 0.4, groundwater: 0.4, landuse: 0.2 },
            flood_landuse: LandUseWeighting::General,
            scarcity_landuse: LandUseWeighting::General,
            flood_groundwater: GroundwaterMode::Magnitude,
            scarcity_groundwater: GroundwaterMode::Magnitude,
            reference_drop: ReferenceDrop::Fixed { meters: 3.0 },
            noise_threshold_m: None,
            flood_boost_multiplier: 0.0,
            surface_water: SurfaceWaterModeration::None,
            recharge_buffer: None,
            dominance_cap: None,
            thresholds: ThresholdScheme::ThreeLevel,
        }
    }

    /// Signed rainfall split with single-factor land use (first batch era)
    pub fn directional_v1() -> Self {
        Self {
            name: "directional_v1".to_string(),
            version: 1,
            rainfall_mode: RainfallMode::Directional,
            flood: FloodWeights { rainfall: 0.5, landuse: 0.3, groundwater: 0.2 },
            scarcity: ScarcityWeights { rainfall: 0.4, groundwater: 0.4, landuse: 0.2 },
            flood_landuse: LandUseWeighting::UrbanOnly,
            scarcity_landuse: LandUseWeighting::ForestDeficit,
            flood_groundwater: GroundwaterMode::DropOnly,
            scarcity_groundwater: GroundwaterMode::DropOnly,
            reference_drop: ReferenceDrop::Fixed { meters: 2.0 },
            noise_threshold_m: None,
            flood_boost_multiplier: 0.0,
            surface_water: SurfaceWaterModeration::None,
            recharge_buffer: None,
            dominance_cap: None,
            thresholds: ThresholdScheme::FourLevel,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["moderated_v3", "weighted_v2", "directional_v1"]
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Result<Self, RiskError> {
        match name {
            "moderated_v3" => Ok(Self::moderated_v3()),
            "weighted_v2" => Ok(Self::weighted_v2()),
            "directional_v1" => Ok(Self::directional_v1()),
            other => Err(RiskError::UnknownProfile(other.to_string())),
        }
    }

    /// Load and validate a profile from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring profile: {:?}", path))?;

        let profile: ScoringProfile = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse scoring profile JSON")?;

        profile.validate()?;
        Ok(profile)
    }

    /// Resolve a `SCORING_PROFILE`-style setting: a `.json` path or a built-in name
    pub fn from_setting(setting: &str) -> Result<Self> {
        if setting.ends_with(".json") {
            Self::load(Path::new(setting))
        } else {
            Ok(Self::builtin(setting)?)
        }
    }

    /// Reject profiles that could push a score outside [0, 100]
    pub fn validate(&self) -> Result<(), RiskError> {
        let f = &self.flood;
        check_weights("flood", &[f.rainfall, f.landuse, f.groundwater])?;
        let s = &self.scarcity;
        check_weights("scarcity", &[s.rainfall, s.groundwater, s.landuse])?;

        match self.reference_drop {
            ReferenceDrop::Fixed { meters } if !(meters > 0.0) => {
                return Err(RiskError::InvalidProfile(format!(
                    "fixed reference drop must be positive, got {}",
                    meters
                )));
            }
            ReferenceDrop::Percentile { percentile, floor }
                if !(percentile > 0.0 && percentile <= 100.0) || !(floor > 0.0) =>
            {
                return Err(RiskError::InvalidProfile(format!(
                    "percentile reference needs percentile in (0, 100] and positive floor, got {} / {}",
                    percentile, floor
                )));
            }
            _ => {}
        }

        match self.surface_water {
            SurfaceWaterModeration::Linear { divisor } if !(divisor > 0.0) => {
                return Err(RiskError::InvalidProfile("SWF divisor must be positive".into()));
            }
            SurfaceWaterModeration::Scaled { coefficient } if !(coefficient > 0.0) => {
                return Err(RiskError::InvalidProfile("SWF coefficient must be positive".into()));
            }
            _ => {}
        }

        if !(self.flood_boost_multiplier >= 0.0) {
            return Err(RiskError::InvalidProfile("flood boost multiplier must be >= 0".into()));
        }
        if let Some(t) = self.noise_threshold_m {
            if !(t >= 0.0) {
                return Err(RiskError::InvalidProfile("noise threshold must be >= 0".into()));
            }
        }
        if let Some(buffer) = &self.recharge_buffer {
            if !(0.0..=1.0).contains(&buffer.factor) {
                return Err(RiskError::InvalidProfile(format!(
                    "recharge buffer factor must be in [0, 1], got {}",
                    buffer.factor
                )));
            }
        }
        if let Some(cap) = self.dominance_cap {
            if !(cap > 0.0) {
                return Err(RiskError::InvalidProfile("dominance cap must be positive".into()));
            }
        }

        Ok(())
    }
}

fn check_weights(target: &str, weights: &[f64]) -> Result<(), RiskError> {
    if weights.iter().any(|w| !(*w >= 0.0)) {
        return Err(RiskError::InvalidProfile(format!(
            "{} weights must be non-negative: {:?}",
            target, weights
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(RiskError::InvalidProfile(format!(
            "{} weights sum to {}, expected 1.0",
            target, sum
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for name in ScoringProfile::builtin_names() {
            let profile = ScoringProfile::builtin(name).unwrap();
            assert_eq!(profile.name, *name);
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(
            ScoringProfile::builtin("v99"),
            Err(RiskError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut profile = ScoringProfile::moderated_v3();
        profile.flood.rainfall = 0.6;
        assert!(matches!(profile.validate(), Err(RiskError::InvalidProfile(_))));

        let mut profile = ScoringProfile::moderated_v3();
        profile.scarcity.landuse = -0.2;
        profile.scarcity.rainfall = 0.8;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");

        let mut profile = ScoringProfile::moderated_v3();
        profile.name = "custom".to_string();
        profile.reference_drop = ReferenceDrop::Percentile { percentile: 90.0, floor: 1.0 };
        profile.surface_water = SurfaceWaterModeration::Scaled { coefficient: 0.8 };
        fs::write(&path, serde_json::to_string_pretty(&profile).unwrap()).unwrap();

        let loaded = ScoringProfile::from_setting(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_load_rejects_invalid_json_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        let mut profile = ScoringProfile::weighted_v2();
        profile.dominance_cap = Some(0.0);
        fs::write(&path, serde_json::to_string(&profile).unwrap()).unwrap();

        assert!(ScoringProfile::load(&path).is_err());
    }

    #[test]
    fn test_recharge_buffer_bounds_are_strict() {
        let buffer = ScoringProfile::moderated_v3().recharge_buffer.unwrap();
        assert!(buffer.applies(29.9, 20.1));
        assert!(!buffer.applies(30.0, 50.0));
        assert!(!buffer.applies(10.0, 20.0));
    }
}
