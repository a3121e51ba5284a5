use crate::explanation::types::*;
use crate::resolver::ResolutionMethod;
use crate::scorer::UnitScore;

/// Builds interactive assessments from computed unit scores
pub struct ExplanationGenerator;

impl ExplanationGenerator {
    /// Assemble the assessment for `risk_type` from a scored unit
    pub fn generate(
        unit_score: &UnitScore,
        risk_type: RiskType,
        profile_name: &str,
        resolution: ResolutionMethod,
    ) -> Assessment {
        let (score, level, impacts) = match risk_type {
            RiskType::Flood => (
                unit_score.flood_score,
                unit_score.flood_level,
                ComponentImpacts {
                    rainfall_impact: round2(unit_score.flood.rainfall_impact),
                    groundwater_impact: round2(unit_score.flood.groundwater_impact),
                    landuse_impact: round2(unit_score.flood.landuse_impact),
                },
            ),
            RiskType::Scarcity => (
                unit_score.scarcity_score,
                unit_score.scarcity_level,
                ComponentImpacts {
                    rainfall_impact: round2(unit_score.scarcity.rainfall_impact),
                    groundwater_impact: round2(unit_score.scarcity.groundwater_impact),
                    landuse_impact: round2(unit_score.scarcity.landuse_impact),
                },
            ),
        };

        let dominant_factor = Self::dominant_factor(&impacts);

        Assessment {
            panchayat: unit_score.name.clone(),
            risk_type,
            risk_label: risk_type.label().to_string(),
            score: round2(score),
            level,
            impacts,
            dominant_factor,
            explanation: Self::factor_message(dominant_factor).to_string(),
            flood_score: round2(unit_score.flood_score),
            flood_level: unit_score.flood_level,
            scarcity_score: round2(unit_score.scarcity_score),
            scarcity_level: unit_score.scarcity_level,
            profile: profile_name.to_string(),
            resolution,
        }
    }

    /// Largest impact wins; ties go to rainfall, then groundwater, then land use
    pub fn dominant_factor(impacts: &ComponentImpacts) -> Factor {
        let r = impacts.rainfall_impact;
        let g = impacts.groundwater_impact;
        let l = impacts.landuse_impact;

        if r >= g && r >= l {
            Factor::Rainfall
        } else if g >= l {
            Factor::Groundwater
        } else {
            Factor::LandUse
        }
    }

    pub fn factor_message(factor: Factor) -> &'static str {
        match factor {
            Factor::Rainfall => {
                "Rainfall variation is the dominant factor influencing the assessed risk in this region."
            }
            Factor::Groundwater => {
                "Groundwater level fluctuation significantly contributes to the assessed risk in this region."
            }
            Factor::LandUse => {
                "Land-use characteristics such as urbanization influence the assessed risk in this region."
            }
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
