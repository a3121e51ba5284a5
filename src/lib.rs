//! CW-RAS Risk Scorer
//!
//! Flood and water-scarcity risk indicators for Panchayats from four raw
//! environmental signals: rainfall deviation, groundwater-level change,
//! land-use composition and surface-water extent.
//!
//! - `utils/`: indicator normalization, haversine distance, name normalization
//! - `metrics/`: flood and scarcity composites with their correction terms
//! - `classify`: threshold schemes and risk levels
//! - `resolver`: exact match → geocode → nearest-neighbour location chain
//! - `scorer`: batch (sequential / Rayon) and interactive coordinator
//! - `explanation/`: component impacts and dominant-factor text
//! - `report`: ranked CSV output through Polars

pub mod error;
pub mod utils;
pub mod data;
pub mod profile;
pub mod classify;
pub mod metrics;
pub mod resolver;
pub mod explanation;
pub mod scorer;
pub mod report;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::RiskError;
pub use data::{LocationRecord, RiskData, UnitRecord};
pub use profile::{ScoringProfile, DEFAULT_PROFILE};
pub use classify::{RiskLevel, ThresholdScheme};
pub use metrics::*;
pub use resolver::{Geocoder, GeocoderConfig, LocationResolver, NominatimGeocoder, Resolution, ResolutionMethod};
pub use explanation::{Assessment, RiskType};
pub use scorer::{RiskScorer, UnitScore};
pub use report::{BatchReport, RankBy, ScoreDistribution};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
