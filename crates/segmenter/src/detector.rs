//! Block detection
//!
//! [`BlockDetector`] is the extension point; [`BlockSegmenter`] is the
//! change-point implementation.

use crate::config::SegmenterConfig;
use crate::rolling::{RollingRecord, RollingWindow};
use blocks_core::stats;
use blocks_core::{Block, ErrorObservation, ErrorStatistics};
use log::{debug, info, warn};

/// Block detection interface
///
/// Implementations must be pure: the same observations always yield the
/// same blocks, and nothing is persisted.
pub trait BlockDetector: Send + Sync {
    /// Segment a window of observations into blocks
    fn detect(&self, errors: &[ErrorObservation]) -> Vec<Block>;

    /// Get the model name for logging/debugging
    fn name(&self) -> &str;
}

/// Change-point block segmenter
pub struct BlockSegmenter {
    config: SegmenterConfig,
}

impl BlockSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        Self::new(SegmenterConfig::default())
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `errors` into blocks
    ///
    /// Observations may arrive in any order; they are stable-sorted by
    /// timestamp first and block indices refer to the sorted order.
    pub fn detect_block_boundaries(
        &self,
        errors: &[ErrorObservation],
        threshold: f64,
        window: usize,
        min_block_size: usize,
    ) -> Vec<Block> {
        // A block needs two distinct timestamps
        let min_block_size = min_block_size.max(2);
        if errors.len() < min_block_size {
            debug!(
                "[SEGMENTER] {} observations below minimum block size {}",
                errors.len(),
                min_block_size
            );
            return Vec::new();
        }

        let mut sorted: Vec<&ErrorObservation> = errors.iter().collect();
        sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let (values, repaired) =
            stats::sanitize(&sorted.iter().map(|o| o.error_absolute).collect::<Vec<_>>());
        if repaired > 0 {
            warn!(
                "[SEGMENTER] Replaced {} non-finite error values with 0.0",
                repaired
            );
        }
        let volatility: Vec<f64> = sorted
            .iter()
            .map(|o| match o.volatility {
                Some(v) if v.is_finite() => v,
                _ => self.config.default_volatility,
            })
            .collect();

        let records = RollingWindow::new(window).compute(&values, &volatility);
        let boundaries = change_points(&records, threshold, values.len());
        debug!(
            "[SEGMENTER] {} rolling records, {} boundaries",
            records.len(),
            boundaries.len()
        );

        let blocks: Vec<Block> = boundaries
            .windows(2)
            .filter(|pair| pair[1] - pair[0] >= min_block_size)
            .filter_map(|pair| self.build_block(&sorted, &values, &volatility, pair[0], pair[1]))
            .collect();

        info!(
            "[SEGMENTER] Detected {} blocks from {} observations",
            blocks.len(),
            errors.len()
        );
        blocks
    }

    fn build_block(
        &self,
        sorted: &[&ErrorObservation],
        values: &[f64],
        volatility: &[f64],
        start: usize,
        end: usize,
    ) -> Option<Block> {
        let start_time = sorted[start].timestamp;
        let end_time = sorted[end - 1].timestamp;
        if end_time <= start_time {
            warn!(
                "[SEGMENTER] Skipping span [{}, {}): no time elapsed between first and last observation",
                start, end
            );
            return None;
        }

        let span = &values[start..end];
        let statistics = ErrorStatistics {
            mean_error: stats::mean(span),
            std_error: stats::std_dev(span),
            max_error: stats::max(span),
            min_error: stats::min(span),
            error_trend: stats::slope(span),
            volatility: stats::mean(&volatility[start..end]),
            prediction_count: end - start,
        };

        Some(Block {
            start_time,
            end_time,
            start_index: start,
            end_index: end,
            block_type: self.config.rules.classify(&statistics),
            confidence: self.config.confidence.confidence(&statistics),
            statistics,
        })
    }
}

impl BlockDetector for BlockSegmenter {
    fn detect(&self, errors: &[ErrorObservation]) -> Vec<Block> {
        self.detect_block_boundaries(
            errors,
            self.config.threshold,
            self.config.window,
            self.config.min_block_size,
        )
    }

    fn name(&self) -> &str {
        "change_point"
    }
}

impl Default for BlockSegmenter {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Sorted, deduplicated boundaries: 0, every position whose shift score
/// exceeds `threshold`, and `len`
fn change_points(records: &[RollingRecord], threshold: f64, len: usize) -> Vec<usize> {
    let mut points = vec![0];
    points.extend(
        records
            .iter()
            .filter(|r| r.shift_score.is_some_and(|s| s > threshold))
            .map(|r| r.index),
    );
    points.push(len);
    points.sort_unstable();
    points.dedup();
    points
}
