// API Server Binary Entry Point
//
// Purpose: Start the Axum API server for interactive risk lookups
// Usage: cargo run --features api --bin api_server

use anyhow::Context;
use cwras_scorer::{create_router, AppState, GeocoderConfig, NominatimGeocoder, RiskData, RiskScorer, ScoringProfile, DEFAULT_PROFILE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "cwras_scorer=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

    let units_csv = std::env::var("UNITS_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("CW_RAS_master_dataset.csv"));

    let locations_csv = std::env::var("LOCATIONS_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("panchayat_locations.csv"));

    let profile_setting = std::env::var("SCORING_PROFILE")
        .unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let geocoder_config = GeocoderConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  UNITS_CSV: {}", units_csv.display());
    tracing::info!("  LOCATIONS_CSV: {}", locations_csv.display());
    tracing::info!("  SCORING_PROFILE: {}", profile_setting);
    tracing::info!("  GEOCODER_URL: {}", geocoder_config.base_url);
    tracing::info!("  PORT: {}", port);

    // Load the snapshot once; it is read-only for the server's lifetime
    tracing::info!("Initializing application state...");
    let data = RiskData::load(&units_csv, &locations_csv)?;
    let profile = ScoringProfile::from_setting(&profile_setting)?;
    let scorer = RiskScorer::new(data, profile)?;

    // The blocking HTTP client must not be built on an async worker
    let geocoder = tokio::task::spawn_blocking(move || NominatimGeocoder::new(geocoder_config))
        .await
        .context("Geocoder construction task failed")??;

    let state = AppState::new(scorer, Arc::new(geocoder));
    tracing::info!("Application state initialized successfully");

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
