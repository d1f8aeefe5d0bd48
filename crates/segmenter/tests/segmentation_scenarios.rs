//! Segmentation over synthetic error regimes

use blocks_core::{BlockType, ErrorObservation};
use blocks_segmenter::{BlockDetector, BlockSegmenter, SegmenterConfig};
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Concatenate regimes of (length, mean, std) into one observation series
fn synthetic_errors(seed: u64, regimes: &[(usize, f64, f64)]) -> Vec<ErrorObservation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
    let mut out = Vec::new();

    for &(len, mean, std) in regimes {
        let dist = Normal::new(mean, std).unwrap();
        for _ in 0..len {
            let i = out.len() as i64;
            let actual = 100.0;
            let error = dist.sample(&mut rng);
            out.push(
                ErrorObservation::new(t0 + Duration::hours(i), "balanced", actual + error, actual)
                    .with_volatility(0.02)
                    .with_confidence(0.8),
            );
        }
    }
    out
}

#[test]
fn test_three_regimes_yield_multiple_blocks() {
    let _ = env_logger::builder().is_test(true).try_init();

    let errors = synthetic_errors(42, &[(100, 0.3, 0.1), (100, 1.5, 0.5), (100, 0.8, 0.2)]);
    let segmenter = BlockSegmenter::default();
    let blocks = segmenter.detect_block_boundaries(&errors, 1.5, 50, 50);

    assert!(blocks.len() >= 2, "expected at least 2 blocks, got {}", blocks.len());
    assert_eq!(blocks[0].block_type, BlockType::LowErrorStable);

    // The first block stays inside the calm regime
    assert!(blocks[0].end_index <= 100);
    assert!(blocks[0].statistics.mean_error < 0.5);
}

#[test]
fn test_default_config_matches_explicit_arguments() {
    let errors = synthetic_errors(7, &[(100, 0.3, 0.1), (100, 1.5, 0.5)]);
    let segmenter = BlockSegmenter::new(SegmenterConfig::default());

    assert_eq!(
        segmenter.detect(&errors),
        segmenter.detect_block_boundaries(&errors, 1.5, 50, 50)
    );
}

#[test]
fn test_boundary_invariants_hold_for_random_series() {
    let segmenter = BlockSegmenter::default();

    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let regimes: Vec<(usize, f64, f64)> = (0..rng.gen_range(1..5))
            .map(|_| {
                (
                    rng.gen_range(10..150),
                    rng.gen_range(0.1..3.0),
                    rng.gen_range(0.01..1.0),
                )
            })
            .collect();
        let errors = synthetic_errors(seed, &regimes);
        let min_block_size = 20 + (seed as usize % 4) * 10;
        let blocks = segmenter.detect_block_boundaries(&errors, 1.5, 40, min_block_size);

        let mut previous_end = 0;
        for block in &blocks {
            assert!(block.start_index < block.end_index);
            assert!(block.end_index - block.start_index >= min_block_size);
            assert!(block.start_index >= previous_end, "blocks overlap");
            assert!(block.end_index <= errors.len());
            assert!(block.is_well_formed());
            assert!((0.0..=1.0).contains(&block.confidence));
            previous_end = block.end_index;
        }
    }
}

#[test]
fn test_higher_threshold_never_adds_blocks_on_flat_data() {
    let errors = synthetic_errors(3, &[(200, 0.3, 0.05)]);
    let segmenter = BlockSegmenter::default();

    let blocks = segmenter.detect_block_boundaries(&errors, 100.0, 50, 50);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].prediction_count(), 200);
}
