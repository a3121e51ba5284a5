//! Risk Scorer - Main coordinator for scoring Panchayats
//!
//! Ties the pipeline together: Normalizer → Composite Scorer → Classifier
//! for every unit on the batch path, and Resolver → the same pipeline →
//! explanation on the interactive path. Includes sequential and parallel
//! (Rayon) batch implementations.

use crate::classify::RiskLevel;
use crate::data::{RiskData, UnitRecord};
use crate::error::RiskError;
use crate::explanation::{Assessment, ExplanationGenerator, RiskType};
use crate::metrics::{calculate_flood, calculate_scarcity, compute_indicators, FloodResult, Indicators, ScarcityResult};
use crate::profile::ScoringProfile;
use crate::resolver::{Geocoder, LocationResolver, ResolutionMethod};
use crate::utils::normalization::resolve_reference_drop;
use rayon::prelude::*;
use serde::Serialize;

/// Main risk scorer over one data snapshot and one profile
pub struct RiskScorer {
    data: RiskData,
    profile: ScoringProfile,
    /// Groundwater reference scale resolved once for the whole snapshot
    reference_drop: f64,
}

/// Scores for one unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitScore {
    pub name: String,
    pub flood_score: f64,
    pub flood_level: RiskLevel,
    pub scarcity_score: f64,
    pub scarcity_level: RiskLevel,
    #[serde(skip)]
    pub indicators: Indicators,
    #[serde(skip)]
    pub flood: FloodResult,
    #[serde(skip)]
    pub scarcity: ScarcityResult,
}

impl RiskScorer {
    /// Validate the profile and resolve the reference drop against `data`
    pub fn new(data: RiskData, profile: ScoringProfile) -> Result<Self, RiskError> {
        profile.validate()?;

        let reference_drop = resolve_reference_drop(profile.reference_drop, &data.groundwater_changes());

        tracing::info!(
            profile = %profile.name,
            version = profile.version,
            reference_drop,
            units = data.units.len(),
            "Risk scorer initialized"
        );

        Ok(Self {
            data,
            profile,
            reference_drop,
        })
    }

    pub fn data(&self) -> &RiskData {
        &self.data
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    pub fn reference_drop(&self) -> f64 {
        self.reference_drop
    }

    /// Score a single unit: both composites, classified with the profile's scheme
    pub fn score_unit(&self, unit: &UnitRecord) -> Result<UnitScore, RiskError> {
        let indicators = compute_indicators(unit, &self.profile, self.reference_drop)?;
        let flood = calculate_flood(&indicators, &self.profile)?;
        let scarcity = calculate_scarcity(&indicators, &self.profile, flood.score)?;

        let scheme = self.profile.thresholds;

        Ok(UnitScore {
            name: unit.name.clone(),
            flood_score: flood.score,
            flood_level: scheme.classify(flood.score),
            scarcity_score: scarcity.score,
            scarcity_level: scheme.classify(scarcity.score),
            indicators,
            flood,
            scarcity,
        })
    }

    /// Score every unit in input order
    pub fn score_all(&self) -> Result<Vec<UnitScore>, RiskError> {
        let scores = self
            .data
            .units
            .iter()
            .map(|unit| self.score_unit(unit))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(units = scores.len(), "Batch scoring complete");
        Ok(scores)
    }

    /// Score every unit IN PARALLEL using Rayon
    ///
    /// Rows are independent; results come back in input order, identical
    /// to `score_all`.
    pub fn score_all_parallel(&self) -> Result<Vec<UnitScore>, RiskError> {
        let scores = self
            .data
            .units
            .par_iter()
            .map(|unit| self.score_unit(unit))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(units = scores.len(), "Parallel batch scoring complete");
        Ok(scores)
    }

    /// Resolve free text to a unit and explain its score for `risk_type`
    pub fn assess(
        &self,
        query: &str,
        risk_type: RiskType,
        geocoder: &dyn Geocoder,
    ) -> Result<Assessment, RiskError> {
        let resolver = LocationResolver::new(&self.data, geocoder);
        let resolution = resolver.resolve(query)?;
        self.assess_unit(resolution.unit, risk_type, resolution.method)
    }

    /// Explain an already resolved unit
    pub fn assess_unit(
        &self,
        unit: &UnitRecord,
        risk_type: RiskType,
        resolution: ResolutionMethod,
    ) -> Result<Assessment, RiskError> {
        let unit_score = self.score_unit(unit)?;
        Ok(ExplanationGenerator::generate(
            &unit_score,
            risk_type,
            &self.profile.name,
            resolution,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ThresholdScheme;
    use crate::data::LocationRecord;
    use crate::explanation::Factor;
    use crate::metrics::test_support::example_unit;
    use crate::profile::ReferenceDrop;
    use crate::utils::geo::GeoPoint;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        answer: Option<GeoPoint>,
        calls: AtomicUsize,
    }

    impl CountingGeocoder {
        fn new(answer: Option<GeoPoint>) -> Self {
            Self { answer, calls: AtomicUsize::new(0) }
        }
    }

    impl Geocoder for CountingGeocoder {
        fn geocode(&self, _query: &str) -> Result<Option<GeoPoint>, RiskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    fn scorer_with(profile: ScoringProfile) -> RiskScorer {
        let locations = vec![LocationRecord {
            name: "Perumon".to_string(),
            latitude: Some(8.95),
            longitude: Some(76.60),
        }];
        RiskScorer::new(RiskData::from_records(vec![example_unit()], locations), profile).unwrap()
    }

    #[test]
    fn test_worked_example_levels_per_scheme() {
        let scorer = scorer_with(ScoringProfile::moderated_v3());
        let score = scorer.score_unit(&example_unit()).unwrap();
        assert_relative_eq!(score.flood_score, 59.3333, epsilon = 1e-3);
        assert_eq!(score.flood_level, RiskLevel::Moderate);

        let mut four_level = ScoringProfile::moderated_v3();
        four_level.thresholds = ThresholdScheme::FourLevel;
        let scorer = scorer_with(four_level);
        let score = scorer.score_unit(&example_unit()).unwrap();
        assert_eq!(score.flood_level, RiskLevel::High);
    }

    #[test]
    fn test_exact_match_short_circuits_geocoding() {
        let scorer = scorer_with(ScoringProfile::moderated_v3());
        let geocoder = CountingGeocoder::new(None);

        let assessment = scorer.assess("Perumon*", RiskType::Flood, &geocoder).unwrap();
        assert_eq!(assessment.panchayat, "Perumon");
        assert_eq!(assessment.resolution, ResolutionMethod::ExactMatch);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);

        // 12.0 rainfall, 13.33 groundwater, 22.0 land use
        assert_eq!(assessment.impacts.landuse_impact, 22.0);
        assert_eq!(assessment.dominant_factor, Factor::LandUse);
        assert_eq!(assessment.score, 59.33);
    }

    #[test]
    fn test_geocode_without_results_is_not_found() {
        let scorer = scorer_with(ScoringProfile::moderated_v3());
        let geocoder = CountingGeocoder::new(None);

        let err = scorer.assess("Atlantis", RiskType::Scarcity, &geocoder).unwrap_err();
        assert!(matches!(err, RiskError::LocationNotFound { .. }));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_geocode_falls_back_to_nearest() {
        let scorer = scorer_with(ScoringProfile::moderated_v3());
        let geocoder = CountingGeocoder::new(Some(GeoPoint::new(8.97, 76.62)));

        let assessment = scorer.assess("Perumon Bridge", RiskType::Scarcity, &geocoder).unwrap();
        assert_eq!(assessment.panchayat, "Perumon");
        assert_eq!(assessment.risk_label, "Water Scarcity Risk");
        assert!(matches!(assessment.resolution, ResolutionMethod::NearestNeighbor { .. }));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let units: Vec<UnitRecord> = (0..50)
            .map(|i| {
                let mut u = example_unit();
                u.name = format!("Unit {}", i);
                u.rainfall_current = 600.0 + 20.0 * i as f64;
                u.groundwater_current = Some(2.0 + 0.1 * i as f64);
                u.urban_percent = Some((i % 7) as f64 * 10.0);
                u.forest_percent = Some((i % 5) as f64 * 15.0);
                u.water_body_percent = Some((i % 4) as f64 * 5.0);
                u
            })
            .collect();

        let mut profile = ScoringProfile::moderated_v3();
        profile.reference_drop = ReferenceDrop::Percentile { percentile: 90.0, floor: 1.0 };
        let scorer = RiskScorer::new(RiskData::from_records(units, vec![]), profile).unwrap();

        let sequential = scorer.score_all().unwrap();
        let parallel = scorer.score_all_parallel().unwrap();
        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.flood_score, b.flood_score);
            assert_eq!(a.scarcity_score, b.scarcity_score);
        }
    }

    #[test]
    fn test_invalid_profile_rejected_at_construction() {
        let mut profile = ScoringProfile::moderated_v3();
        profile.scarcity.groundwater = 0.9;
        let result = RiskScorer::new(RiskData::from_records(vec![], vec![]), profile);
        assert!(matches!(result, Err(RiskError::InvalidProfile(_))));
    }
}
