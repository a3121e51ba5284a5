//! Utility modules for risk scoring
//!
//! - Normalization: raw signals to 0-100 indicators, water-body terms
//! - Geo: haversine distance for nearest-neighbour resolution
//! - Names: place-name normalization for exact matching

pub mod normalization;
pub mod geo;
pub mod names;

// Re-export commonly used items
pub use normalization::{
    flood_boost, groundwater_magnitude_score, groundwater_score, landuse_score, percentile,
    rainfall_deficit_score, rainfall_ratio, rainfall_score, rainfall_surplus_score,
    resolve_reference_drop, surface_water_factor,
};
pub use geo::{haversine_km, GeoPoint};
pub use names::normalize_name;
