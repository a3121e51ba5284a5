//! Ranked batch report
//!
//! Turns batch scores into the ranked CSV the reporting path ships:
//! `Rank, Panchayat, FloodRisk, FloodRiskLevel, ScarcityRisk, ScarcityRiskLevel`.

use crate::classify::{RiskLevel, ThresholdScheme};
use crate::explanation::generator::round2;
use crate::scorer::UnitScore;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Sort key for the ranked report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    Flood,
    Scarcity,
    /// Higher of the two scores
    #[default]
    Combined,
}

impl RankBy {
    pub fn key(&self, score: &UnitScore) -> f64 {
        match self {
            RankBy::Flood => score.flood_score,
            RankBy::Scarcity => score.scarcity_score,
            RankBy::Combined => score.flood_score.max(score.scarcity_score),
        }
    }
}

impl FromStr for RankBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "flood" => Ok(RankBy::Flood),
            "scarcity" => Ok(RankBy::Scarcity),
            "combined" => Ok(RankBy::Combined),
            other => anyhow::bail!("Unknown rank key '{}' (expected flood, scarcity or combined)", other),
        }
    }
}

/// Count of units per level, for each score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
    pub flood: Vec<(RiskLevel, usize)>,
    pub scarcity: Vec<(RiskLevel, usize)>,
    pub flood_range: Option<(f64, f64)>,
    pub scarcity_range: Option<(f64, f64)>,
}

impl ScoreDistribution {
    pub fn from_scores(scores: &[UnitScore], scheme: ThresholdScheme) -> Self {
        let count = |pick: fn(&UnitScore) -> RiskLevel| -> Vec<(RiskLevel, usize)> {
            scheme
                .levels()
                .iter()
                .map(|level| (*level, scores.iter().filter(|s| pick(s) == *level).count()))
                .collect()
        };

        let range = |pick: fn(&UnitScore) -> f64| -> Option<(f64, f64)> {
            scores.iter().map(pick).fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
        };

        ScoreDistribution {
            flood: count(|s| s.flood_level),
            scarcity: count(|s| s.scarcity_level),
            flood_range: range(|s| s.flood_score),
            scarcity_range: range(|s| s.scarcity_score),
        }
    }
}

/// Batch scores ranked into a DataFrame
pub struct BatchReport {
    pub frame: DataFrame,
}

impl BatchReport {
    /// Rank descending by `rank_by`; ties keep input order
    pub fn build(scores: &[UnitScore], rank_by: RankBy) -> Result<Self> {
        let mut ordered: Vec<&UnitScore> = scores.iter().collect();
        ordered.sort_by(|a, b| rank_by.key(b).total_cmp(&rank_by.key(a)));

        let ranks: Vec<u32> = (1..=ordered.len() as u32).collect();
        let names: Vec<&str> = ordered.iter().map(|s| s.name.as_str()).collect();
        let flood: Vec<f64> = ordered.iter().map(|s| round2(s.flood_score)).collect();
        let flood_level: Vec<&str> = ordered.iter().map(|s| s.flood_level.as_str()).collect();
        let scarcity: Vec<f64> = ordered.iter().map(|s| round2(s.scarcity_score)).collect();
        let scarcity_level: Vec<&str> = ordered.iter().map(|s| s.scarcity_level.as_str()).collect();

        let frame = df!(
            "Rank" => ranks,
            "Panchayat" => names,
            "FloodRisk" => flood,
            "FloodRiskLevel" => flood_level,
            "ScarcityRisk" => scarcity,
            "ScarcityRiskLevel" => scarcity_level,
        )
        .with_context(|| "Failed to build report DataFrame")?;

        Ok(Self { frame })
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn write_csv(&mut self, path: &Path) -> Result<()> {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut self.frame)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        tracing::info!(rows = self.frame.height(), path = %path.display(), "Wrote ranked report");
        Ok(())
    }
}
