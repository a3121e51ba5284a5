//! Batch scoring benchmarks
//!
//! Sequential vs Rayon scoring over synthetic snapshots of increasing size.
//!
//! Run with: `cargo bench --bench batch_scoring`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cwras_scorer::{BatchReport, RankBy, RiskData, RiskScorer, ScoringProfile, UnitRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deterministic spread of rainfall, groundwater and land-use values
fn synthetic_units(count: usize) -> Vec<UnitRecord> {
    (0..count)
        .map(|i| UnitRecord {
            name: format!("Panchayat {}", i),
            rainfall_normal: 1800.0 + (i % 13) as f64 * 50.0,
            rainfall_current: 900.0 + (i % 29) as f64 * 70.0,
            groundwater_last: Some(4.0 + (i % 11) as f64 * 0.5),
            groundwater_current: if i % 17 == 0 { None } else { Some(3.0 + (i % 7) as f64 * 0.8) },
            urban_percent: Some((i % 10) as f64 * 9.0),
            forest_percent: Some((i % 8) as f64 * 11.0),
            water_body_percent: if i % 5 == 0 { None } else { Some((i % 6) as f64 * 4.0) },
        })
        .collect()
}

fn scorer_for(count: usize) -> RiskScorer {
    let data = RiskData::from_records(synthetic_units(count), vec![]);
    match RiskScorer::new(data, ScoringProfile::moderated_v3()) {
        Ok(scorer) => scorer,
        Err(e) => panic!("benchmark profile rejected: {}", e),
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_batch_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_scoring");

    for &count in &[100usize, 1_000, 10_000] {
        let scorer = scorer_for(count);

        group.bench_with_input(BenchmarkId::new("sequential", count), &scorer, |b, scorer| {
            b.iter(|| black_box(scorer.score_all().unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("parallel", count), &scorer, |b, scorer| {
            b.iter(|| black_box(scorer.score_all_parallel().unwrap()))
        });
    }

    group.finish();
}

fn bench_report_build(c: &mut Criterion) {
    let scorer = scorer_for(10_000);
    let scores = scorer.score_all_parallel().unwrap();

    c.bench_function("report_build_10k", |b| {
        b.iter(|| black_box(BatchReport::build(&scores, RankBy::Combined).unwrap()))
    });
}

criterion_group!(benches, bench_batch_scoring, bench_report_build);
criterion_main!(benches);
