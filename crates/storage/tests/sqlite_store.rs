//! SQLite store persistence across reopen

use blocks_core::{
    Block, BlockId, BlockType, ErrorObservation, ErrorStatistics, FormulaBlockParameters,
    MarketRegime, OptimizationRecord, ParameterSet, keys,
};
use blocks_ports::{
    BlockQuery, BlockReader, BlockWriter, ErrorQuery, ErrorStream, ErrorStreamWriter,
    OptimizationLog, ParameterReader, ParameterWriter,
};
use blocks_storage::SqliteStore;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
}

fn block(offset_hours: i64, block_type: BlockType) -> Block {
    let start = t0() + Duration::hours(offset_hours);
    Block {
        start_time: start,
        end_time: start + Duration::minutes(50),
        start_index: 0,
        end_index: 51,
        block_type,
        confidence: 0.35,
        statistics: ErrorStatistics {
            mean_error: 0.42,
            std_error: 0.11,
            max_error: 0.9,
            min_error: 0.01,
            error_trend: -0.002,
            volatility: 0.015,
            prediction_count: 51,
        },
    }
}

#[test]
fn test_blocks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocks.db");

    let ids = {
        let store = SqliteStore::open(&path).unwrap();
        store
            .save_blocks(&[block(0, BlockType::LowErrorStable), block(2, BlockType::Normal)])
            .unwrap()
    };
    assert_eq!(ids, vec![BlockId(1), BlockId(2)]);

    let store = SqliteStore::open(&path).unwrap();
    let first = store.get_block(BlockId(1)).unwrap().unwrap();
    assert_eq!(first.block, block(0, BlockType::LowErrorStable));

    let latest = store.latest_block().unwrap().unwrap();
    assert_eq!(latest.id, BlockId(2));

    let normal = store
        .list_blocks(&BlockQuery {
            block_type: Some(BlockType::Normal),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(normal.len(), 1);

    let since = store.list_blocks(&BlockQuery::since(t0() + Duration::hours(1))).unwrap();
    assert_eq!(since.iter().map(|b| b.id).collect::<Vec<_>>(), vec![BlockId(2)]);

    assert!(store.get_block(BlockId(99)).unwrap().is_none());
}

#[test]
fn test_error_stream_queries() {
    let store = SqliteStore::open_in_memory().unwrap();
    let observations: Vec<ErrorObservation> = (0..20)
        .map(|i| {
            let formula = if i % 2 == 0 { "balanced" } else { "basis_dominant" };
            ErrorObservation::new(t0() + Duration::minutes(i), formula, 100.0 + i as f64 * 0.01, 100.0)
                .with_volatility(0.02)
        })
        .collect();
    assert_eq!(store.append_errors(&observations).unwrap(), 20);

    let all = store.read_errors(&ErrorQuery::default()).unwrap();
    assert_eq!(all, observations);

    let window = store
        .read_errors(&ErrorQuery::between(t0() + Duration::minutes(5), t0() + Duration::minutes(9)))
        .unwrap();
    assert_eq!(window.len(), 5);

    let latest = store.read_errors(&ErrorQuery::latest(4).for_formula("balanced")).unwrap();
    let minutes: Vec<i64> = latest.iter().map(|o| (o.timestamp - t0()).num_minutes()).collect();
    assert_eq!(minutes, vec![12, 14, 16, 18]);

    // Optional fields survive as NULL
    store
        .append_errors(&[ErrorObservation::new(t0() + Duration::hours(5), "raw", 1.0, 0.0)])
        .unwrap();
    let raw = store.read_errors(&ErrorQuery::default().for_formula("raw")).unwrap();
    assert_eq!(raw[0].volatility, None);
    assert_eq!(raw[0].confidence, None);
}

#[test]
fn test_missing_actual_round_trips_as_nan() {
    let store = SqliteStore::open_in_memory().unwrap();
    let gap = ErrorObservation::new(t0(), "balanced", 100.2, f64::NAN).with_volatility(0.02);
    let next = ErrorObservation::new(t0() + Duration::minutes(1), "balanced", 100.1, 100.0);

    assert_eq!(store.append_errors(&[gap, next.clone()]).unwrap(), 2);

    let read = store.read_errors(&ErrorQuery::default()).unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].prediction, 100.2);
    assert!(read[0].actual.is_nan());
    assert!(read[0].error_absolute.is_nan());
    assert!(read[0].error_normalized.is_nan());
    assert_eq!(read[0].volatility, Some(0.02));
    assert_eq!(read[1], next);
}

#[test]
fn test_parameter_cache_upsert_and_invalidate() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut row = FormulaBlockParameters {
        formula_id: "volatility_focused".to_string(),
        block_id: BlockId(3),
        market_regime: MarketRegime::Stable,
        parameters: ParameterSet::from_pairs([(keys::THRESHOLD, 0.5), (keys::IV_WEIGHT, 1.1)]),
        performance_score: 0.81,
        created_at: t0(),
    };
    store.upsert_parameters(&row).unwrap();

    row.performance_score = 0.5;
    store.upsert_parameters(&row).unwrap();

    let rows = store.list_parameters("volatility_focused").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], row);

    assert!(store.invalidate_parameters("volatility_focused", BlockId(3)).unwrap());
    assert!(store.get_parameters("volatility_focused", BlockId(3)).unwrap().is_none());
}

#[test]
fn test_optimization_log_is_append_only() {
    let store = SqliteStore::open_in_memory().unwrap();
    for score in [0.4, 0.7] {
        store
            .record_optimization(&OptimizationRecord {
                formula_id: "balanced".to_string(),
                market_regime: MarketRegime::Trending,
                optimization_method: "grid_search".to_string(),
                best_parameters: ParameterSet::from_pairs([(keys::THRESHOLD, 0.5)]),
                score,
                timestamp: t0(),
            })
            .unwrap();
    }

    let history = store.optimization_history("balanced").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].score, 0.7);
    assert!(store.optimization_history("basis_dominant").unwrap().is_empty());
}

#[test]
fn test_open_in_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("blocks.db");
    assert!(SqliteStore::open(path).is_err());
}
