// Axum API Server Module
//
// Purpose: interactive lookup path. Resolves free-text place names to a
// Panchayat and explains its flood or scarcity score; also serves the
// ranked batch scores as JSON.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::RiskError;
use crate::explanation::{Assessment, JsonFormatter, MarkdownFormatter, RiskType};
use crate::report::RankBy;
use crate::resolver::{Geocoder, LocationResolver, ResolutionMethod};
use crate::scorer::RiskScorer;
use crate::utils::geo::GeoPoint;
use crate::utils::names::normalize_name;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<RiskScorer>,
    pub geocoder: Arc<dyn Geocoder>,
    /// Host-side memo of geocode answers, keyed by normalized query
    pub geocode_cache: Cache<String, Option<GeoPoint>>,
}

impl AppState {
    pub fn new(scorer: RiskScorer, geocoder: Arc<dyn Geocoder>) -> Self {
        tracing::info!("Initializing Moka geocode cache...");
        let geocode_cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(3600)) // 1 h TTL
            .build();

        Self {
            scorer: Arc::new(scorer),
            geocoder,
            geocode_cache,
        }
    }

    /// Geocode through the cache; the blocking lookup runs off the async runtime.
    /// Failures are not cached.
    async fn geocode_cached(&self, query: &str) -> Result<Option<GeoPoint>, RiskError> {
        let key = normalize_name(query);
        if let Some(hit) = self.geocode_cache.get(&key).await {
            tracing::debug!(query, "Geocode cache hit");
            return Ok(hit);
        }

        let geocoder = self.geocoder.clone();
        let q = query.to_string();
        let result = tokio::task::spawn_blocking(move || geocoder.geocode(&q))
            .await
            .map_err(|e| RiskError::UpstreamUnavailable(format!("geocode task failed: {}", e)))??;

        self.geocode_cache.insert(key, result).await;
        Ok(result)
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Unit selector
        .route("/api/panchayats", get(list_panchayats))

        // Interactive lookup
        .route("/api/assess", post(assess))
        .route("/api/assess/report", post(assess_report))

        // Batch scores (ranked)
        .route("/api/scores", get(batch_scores))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "profile": state.scorer.profile().name,
        "units": state.scorer.data().units.len(),
    }))
}

async fn list_panchayats(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.scorer.data().panchayat_names())
}

#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    pub location: String,
    pub risk_type: RiskType,
}

/// Resolve and explain: exact match → cached geocode → nearest neighbour
async fn assess(
    State(state): State<AppState>,
    Json(payload): Json<AssessRequest>,
) -> Result<Json<Assessment>, AppError> {
    let assessment = resolve_and_assess(&state, payload).await?;
    Ok(Json(assessment))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `markdown` (default) or `json`
    pub format: Option<String>,
}

/// Same lookup as `/api/assess`, rendered as a document
async fn assess_report(
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
    Json(payload): Json<AssessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = resolve_and_assess(&state, payload).await?;

    let (content_type, body) = match params.format.as_deref().unwrap_or("markdown") {
        "markdown" | "md" => ("text/markdown; charset=utf-8", MarkdownFormatter::format(&assessment)),
        "json" => (
            "application/json",
            JsonFormatter::format(&assessment)
                .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?,
        ),
        other => return Err(AppError::BadRequest(format!("Unknown report format '{}'", other))),
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

async fn resolve_and_assess(state: &AppState, payload: AssessRequest) -> Result<Assessment, AppError> {
    let query = payload.location.trim().to_string();
    tracing::info!(query = %query, risk_type = ?payload.risk_type, "Assessment request");

    if normalize_name(&query).is_empty() {
        return Err(AppError::BadRequest("location must not be empty".to_string()));
    }

    let scorer = &state.scorer;

    if let Some(unit) = scorer.data().unit_by_name(&query) {
        return Ok(scorer.assess_unit(unit, payload.risk_type, ResolutionMethod::ExactMatch)?);
    }

    let point = match state.geocode_cached(&query).await {
        Ok(Some(point)) => point,
        Ok(None) => return Err(AppError::NotFound(format!("location not found: '{}'", query))),
        Err(e) => {
            tracing::warn!(query = %query, error = %e, "Geocoding failed");
            return Err(AppError::NotFound(format!("location not found: '{}'", query)));
        }
    };

    let resolver = LocationResolver::new(scorer.data(), state.geocoder.as_ref());
    let resolution = resolver.resolve_geocoded(&query, point)?;
    Ok(scorer.assess_unit(resolution.unit, payload.risk_type, resolution.method)?)
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub rank_by: Option<String>,
}

async fn batch_scores(
    State(state): State<AppState>,
    Query(params): Query<ScoresQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let rank_by: RankBy = match params.rank_by.as_deref() {
        Some(s) => s.parse().map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?,
        None => RankBy::default(),
    };

    // CPU-bound work: run in blocking thread pool
    let scorer = state.scorer.clone();
    let mut scores = tokio::task::spawn_blocking(move || scorer.score_all_parallel())
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    scores.sort_by(|a, b| rank_by.key(b).total_cmp(&rank_by.key(a)));

    Ok(Json(serde_json::json!({
        "profile": state.scorer.profile().name,
        "rank_by": rank_by,
        "count": scores.len(),
        "scores": scores,
    })))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
    NotFound(String),
}

impl From<RiskError> for AppError {
    fn from(e: RiskError) -> Self {
        if e.is_not_found() {
            AppError::NotFound(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
