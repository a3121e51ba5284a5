//! Batch scoring: every Panchayat in the master dataset → ranked CSV
//!
//! Usage: cargo run --release --bin score_batch
//!
//! Environment: DATA_DIR, UNITS_CSV, OUTPUT_CSV, SCORING_PROFILE, RANK_BY

use cwras_scorer::{BatchReport, RankBy, RiskData, RiskScorer, ScoreDistribution, ScoringProfile, DEFAULT_PROFILE};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cwras_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let units_csv = std::env::var("UNITS_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("CW_RAS_master_dataset.csv"));
    let output_csv = std::env::var("OUTPUT_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("CW_RAS_output_results.csv"));
    let profile_setting = std::env::var("SCORING_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
    let rank_by: RankBy = match std::env::var("RANK_BY") {
        Ok(s) => s.parse()?,
        Err(_) => RankBy::default(),
    };

    let start = Instant::now();
    let data = RiskData::load_units_only(&units_csv)?;
    let profile = ScoringProfile::from_setting(&profile_setting)?;
    let scheme = profile.thresholds;
    let scorer = RiskScorer::new(data, profile)?;
    let load_time = start.elapsed();

    let score_start = Instant::now();
    let scores = scorer.score_all_parallel()?;
    let score_time = score_start.elapsed();

    let distribution = ScoreDistribution::from_scores(&scores, scheme);
    for (level, count) in &distribution.flood {
        tracing::info!(level = %level, count, "Flood risk distribution");
    }
    for (level, count) in &distribution.scarcity {
        tracing::info!(level = %level, count, "Scarcity risk distribution");
    }
    if let (Some((flo, fhi)), Some((slo, shi))) = (distribution.flood_range, distribution.scarcity_range) {
        tracing::info!(flood_min = flo, flood_max = fhi, scarcity_min = slo, scarcity_max = shi, "Score ranges");
    }

    let mut report = BatchReport::build(&scores, rank_by)?;
    report.write_csv(&output_csv)?;

    tracing::info!(
        units = report.len(),
        rank_by = ?rank_by,
        load_ms = load_time.as_millis() as u64,
        score_ms = score_time.as_millis() as u64,
        output = %output_csv.display(),
        "Batch run complete"
    );

    Ok(())
}
