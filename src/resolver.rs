//! Location Resolution
//!
//! Maps free-text input onto a known unit. First success wins:
//!   1. exact match on normalized name (no network)
//!   2. one synchronous geocode of the raw text
//!   3. nearest location record by haversine distance
//!
//! Geocoder failures and an empty nearest-neighbour search both surface as
//! `RiskError::LocationNotFound`; nothing is retried or defaulted.

use crate::data::{LocationRecord, RiskData, UnitRecord};
use crate::error::RiskError;
use crate::utils::geo::GeoPoint;
use crate::utils::names::normalize_name;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// External geocoding lookup. `Ok(None)` means the service found nothing.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, RiskError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Timeouts count as "not found"
    pub timeout_secs: u64,
    /// Appended to every query, e.g. ", Kerala, India"
    pub query_suffix: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: NOMINATIM_SEARCH_URL.to_string(),
            user_agent: "CW-RAS-Location-Resolver".to_string(),
            timeout_secs: 10,
            query_suffix: None,
        }
    }
}

impl GeocoderConfig {
    /// Overlay `GEOCODER_URL`, `GEOCODER_TIMEOUT_SECS`, `GEOCODER_QUERY_SUFFIX`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GEOCODER_URL") {
            config.base_url = url;
        }
        if let Some(secs) = std::env::var("GEOCODER_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }
        if let Ok(suffix) = std::env::var("GEOCODER_QUERY_SUFFIX") {
            if !suffix.is_empty() {
                config.query_suffix = Some(suffix);
            }
        }
        config
    }
}

/// One element of a Nominatim `format=json` search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Blocking Nominatim client: `{q, format: "json", limit: 1}`
pub struct NominatimGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    fn full_query(&self, query: &str) -> String {
        match &self.config.query_suffix {
            Some(suffix) => format!("{}{}", query, suffix),
            None => query.to_string(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, RiskError> {
        let q = self.full_query(query);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("q", q.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| RiskError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RiskError::UpstreamUnavailable(format!(
                "geocoder returned HTTP {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .map_err(|e| RiskError::UpstreamUnavailable(format!("malformed geocoder response: {}", e)))?;

        parse_first_place(&places)
    }
}

fn parse_first_place(places: &[NominatimPlace]) -> Result<Option<GeoPoint>, RiskError> {
    let Some(place) = places.first() else {
        return Ok(None);
    };

    let lat = place.lat.trim().parse::<f64>();
    let lon = place.lon.trim().parse::<f64>();
    match (lat, lon) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Ok(Some(GeoPoint::new(lat, lon))),
        _ => Err(RiskError::UpstreamUnavailable(format!(
            "unparseable coordinates: lat='{}' lon='{}'",
            place.lat, place.lon
        ))),
    }
}

/// How a query was mapped to its unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ResolutionMethod {
    ExactMatch,
    NearestNeighbor {
        geocoded: GeoPoint,
        matched_location: String,
        distance_km: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub unit: &'a UnitRecord,
    pub method: ResolutionMethod,
}

pub struct LocationResolver<'a> {
    data: &'a RiskData,
    geocoder: &'a dyn Geocoder,
}

impl<'a> LocationResolver<'a> {
    pub fn new(data: &'a RiskData, geocoder: &'a dyn Geocoder) -> Self {
        Self { data, geocoder }
    }

    /// Run the full fallback chain
    pub fn resolve(&self, query: &str) -> Result<Resolution<'a>, RiskError> {
        if normalize_name(query).is_empty() {
            return Err(not_found(query));
        }

        if let Some(resolution) = self.exact_match(query) {
            return Ok(resolution);
        }

        let point = match self.geocoder.geocode(query) {
            Ok(Some(point)) => point,
            Ok(None) => {
                tracing::info!(query, "Geocoder returned no results");
                return Err(not_found(query));
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "Geocoding failed");
                return Err(not_found(query));
            }
        };

        self.resolve_geocoded(query, point)
    }

    /// Step 1: case-insensitive, `*`-stripped name equality
    pub fn exact_match(&self, query: &str) -> Option<Resolution<'a>> {
        self.data.unit_by_name(query).map(|unit| Resolution {
            unit,
            method: ResolutionMethod::ExactMatch,
        })
    }

    /// Step 3 given an already geocoded point (lets hosts memoize geocodes)
    pub fn resolve_geocoded(&self, query: &str, point: GeoPoint) -> Result<Resolution<'a>, RiskError> {
        let (location, distance_km) = match nearest_location(&self.data.locations, point) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(query, error = %e, "Nearest-neighbour search failed");
                return Err(not_found(query));
            }
        };

        let Some(unit) = self.data.unit_by_name(&location.name) else {
            tracing::warn!(query, location = %location.name, "Nearest location has no unit record");
            return Err(not_found(query));
        };

        tracing::debug!(query, unit = %unit.name, distance_km, "Resolved by nearest neighbour");

        Ok(Resolution {
            unit,
            method: ResolutionMethod::NearestNeighbor {
                geocoded: point,
                matched_location: location.name.clone(),
                distance_km,
            },
        })
    }
}

/// Closest location with known coordinates; ties keep the first encountered
pub fn nearest_location(
    locations: &[LocationRecord],
    point: GeoPoint,
) -> Result<(&LocationRecord, f64), RiskError> {
    let mut best: Option<(&LocationRecord, f64)> = None;

    for location in locations {
        let Some((lat, lon)) = location.coordinates() else {
            continue;
        };
        let distance = point.distance_km(&GeoPoint::new(lat, lon));
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((location, distance)),
        }
    }

    best.ok_or(RiskError::NoLocationCandidates)
}

fn not_found(query: &str) -> RiskError {
    RiskError::LocationNotFound {
        query: query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGeocoder {
        answer: Option<GeoPoint>,
        calls: AtomicUsize,
    }

    impl Geocoder for FixedGeocoder {
        fn geocode(&self, _query: &str) -> Result<Option<GeoPoint>, RiskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    fn location(name: &str, lat: Option<f64>, lon: Option<f64>) -> LocationRecord {
        LocationRecord {
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_nearest_location_skips_missing_coordinates() {
        let locations = vec![
            location("Unresolved", None, None),
            location("Far", Some(10.5), Some(76.2)),
            location("Near", Some(8.96), Some(76.61)),
        ];
        let (found, distance) = nearest_location(&locations, GeoPoint::new(8.95, 76.60)).unwrap();
        assert_eq!(found.name, "Near");
        assert!(distance < 2.0);
    }

    #[test]
    fn test_nearest_location_tie_keeps_first() {
        let locations = vec![
            location("First", Some(9.0), Some(76.0)),
            location("Second", Some(9.0), Some(76.0)),
        ];
        let (found, _) = nearest_location(&locations, GeoPoint::new(9.1, 76.1)).unwrap();
        assert_eq!(found.name, "First");
    }

    #[test]
    fn test_nearest_location_empty() {
        let locations = vec![location("Unresolved", Some(9.0), None)];
        assert!(matches!(
            nearest_location(&locations, GeoPoint::new(9.0, 76.0)),
            Err(RiskError::NoLocationCandidates)
        ));
    }

    #[test]
    fn test_parse_first_place() {
        let places = vec![NominatimPlace { lat: "8.95".into(), lon: " 76.6".into() }];
        assert_eq!(parse_first_place(&places).unwrap(), Some(GeoPoint::new(8.95, 76.6)));
        assert_eq!(parse_first_place(&[]).unwrap(), None);

        let bad = vec![NominatimPlace { lat: "north".into(), lon: "76.6".into() }];
        assert!(matches!(parse_first_place(&bad), Err(RiskError::UpstreamUnavailable(_))));
    }

    #[test]
    fn test_nominatim_response_shape() {
        let body = r#"[{"place_id": 1, "lat": "8.9512", "lon": "76.6031", "display_name": "Perumon"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        assert_eq!(parse_first_place(&places).unwrap(), Some(GeoPoint::new(8.9512, 76.6031)));
    }

    #[test]
    fn test_blank_query_never_geocodes() {
        let data = RiskData::from_records(vec![], vec![]);
        let geocoder = FixedGeocoder { answer: Some(GeoPoint::new(9.0, 76.0)), calls: AtomicUsize::new(0) };
        let resolver = LocationResolver::new(&data, &geocoder);

        assert!(matches!(resolver.resolve(" * "), Err(RiskError::LocationNotFound { .. })));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}
