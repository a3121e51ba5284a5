//! Domain errors for risk scoring and location resolution
//!
//! Loading and plumbing code uses `anyhow`; the variants here are the
//! outcomes a host must be able to match on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    /// Free-text input could not be mapped to any unit. Terminal for the request.
    #[error("location not found: '{query}'")]
    LocationNotFound { query: String },

    /// Geocoding service unreachable, timed out, or returned a malformed body
    #[error("geocoding service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Nearest-neighbour search had no location with known coordinates
    #[error("no location records with coordinates to search")]
    NoLocationCandidates,

    #[error("unknown unit: '{0}'")]
    UnknownUnit(String),

    /// A computed score left [0, 100]. Indicates a misconfigured profile or bad input.
    #[error("{field} = {value} is outside [0, 100]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("invalid scoring profile: {0}")]
    InvalidProfile(String),

    #[error("unknown scoring profile '{0}'")]
    UnknownProfile(String),
}

impl RiskError {
    /// True for every outcome a user should see as "location not found"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RiskError::LocationNotFound { .. }
                | RiskError::UpstreamUnavailable(_)
                | RiskError::NoLocationCandidates
                | RiskError::UnknownUnit(_)
        )
    }
}

/// Reject non-finite values and anything outside [0, 100]
pub fn ensure_in_range(field: &'static str, value: f64) -> Result<f64, RiskError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(RiskError::OutOfRange { field, value })
    }
}
