use blocks_core::stats;
use blocks_core::{BlockType, MarketRegime, StoredBlock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view over a set of stored blocks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlocksSummary {
    /// Look-back period the summary covers, None for all blocks
    pub period_days: Option<i64>,
    pub total_blocks: usize,
    pub block_types: BTreeMap<BlockType, usize>,
    pub market_regimes: BTreeMap<MarketRegime, usize>,
    pub average_confidence: f64,
    pub average_error: f64,
    pub total_predictions: usize,
    /// Ties go to the first in enum order
    pub most_common_type: Option<BlockType>,
    pub most_common_regime: Option<MarketRegime>,
}

impl BlocksSummary {
    pub fn from_classified(period_days: Option<i64>, blocks: &[(StoredBlock, MarketRegime)]) -> Self {
        let mut block_types = BTreeMap::new();
        let mut market_regimes = BTreeMap::new();
        for (stored, regime) in blocks {
            *block_types.entry(stored.block.block_type).or_insert(0) += 1;
            *market_regimes.entry(*regime).or_insert(0) += 1;
        }

        let confidences: Vec<f64> = blocks.iter().map(|(b, _)| b.block.confidence).collect();
        let errors: Vec<f64> = blocks
            .iter()
            .map(|(b, _)| b.block.statistics.mean_error)
            .collect();

        Self {
            period_days,
            total_blocks: blocks.len(),
            most_common_type: most_common(&block_types),
            most_common_regime: most_common(&market_regimes),
            block_types,
            market_regimes,
            average_confidence: stats::mean(&confidences),
            average_error: stats::mean(&errors),
            total_predictions: blocks.iter().map(|(b, _)| b.block.prediction_count()).sum(),
        }
    }
}

fn most_common<K: Ord + Copy>(counts: &BTreeMap<K, usize>) -> Option<K> {
    counts
        .iter()
        .fold(None, |best: Option<(K, usize)>, (&k, &n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((k, n)),
        })
        .map(|(k, _)| k)
}
