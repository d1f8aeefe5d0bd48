//! Block analyzer
//!
//! Reads stored blocks and their member observations, then applies the
//! regime table and the assessment rules. Strict `try_*` operations return
//! storage failures to the caller; the plain variants degrade to an
//! `unknown` result and log the failure.

use crate::assessment::{assess_risk_level, performance_metrics, recommendations};
use crate::config::AnalyzerConfig;
use crate::regime_table::{RegimeClassification, RegimeTable};
use crate::statistics::{BlockStatistics, MemberMetrics};
use crate::summary::BlocksSummary;
use blocks_core::stats::clamp_unit;
use blocks_core::{BlockAnalysis, BlockId, MarketRegime, StoredBlock, Timestamp};
use blocks_ports::{BlockQuery, BlockReader, ErrorQuery, ErrorStream, StoreResult};
use chrono::{Duration, Utc};
use log::{debug, error, warn};
use std::sync::Arc;

pub struct BlockAnalyzer<B, E> {
    blocks: Arc<B>,
    errors: Arc<E>,
    regimes: RegimeTable,
    config: AnalyzerConfig,
}

impl<B, E> BlockAnalyzer<B, E>
where
    B: BlockReader,
    E: ErrorStream,
{
    pub fn new(blocks: Arc<B>, errors: Arc<E>, regimes: RegimeTable, config: AnalyzerConfig) -> Self {
        Self {
            blocks,
            errors,
            regimes,
            config,
        }
    }

    /// Create with the default regime table and thresholds
    pub fn with_defaults(blocks: Arc<B>, errors: Arc<E>) -> Self {
        Self::new(blocks, errors, RegimeTable::default(), AnalyzerConfig::default())
    }

    pub fn regimes(&self) -> &RegimeTable {
        &self.regimes
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn blocks(&self) -> &Arc<B> {
        &self.blocks
    }

    /// Stored block plus member metrics; Ok(None) if the block does not exist
    pub fn get_block_statistics(&self, block_id: BlockId) -> StoreResult<Option<BlockStatistics>> {
        let Some(block) = self.blocks.get_block(block_id)? else {
            warn!("[CLASSIFIER] Block {} not found", block_id);
            return Ok(None);
        };
        self.statistics_for(block).map(Some)
    }

    /// Member metrics for an already loaded block
    pub fn statistics_for(&self, block: StoredBlock) -> StoreResult<BlockStatistics> {
        let members = self.errors.read_errors(&ErrorQuery::between(
            block.block.start_time,
            block.block.end_time,
        ))?;
        debug!(
            "[CLASSIFIER] Block {} has {} member observations",
            block.id,
            members.len()
        );
        Ok(BlockStatistics {
            members: MemberMetrics::from_observations(&members),
            block,
        })
    }

    /// Regime of a loaded block
    pub fn classify_block(&self, block: &StoredBlock) -> RegimeClassification {
        self.regimes.classify(&block.block.statistics)
    }

    pub fn try_classify_market_regime(&self, block_id: BlockId) -> StoreResult<RegimeClassification> {
        Ok(match self.blocks.get_block(block_id)? {
            Some(block) => self.classify_block(&block),
            None => {
                warn!("[CLASSIFIER] Block {} not found, regime unknown", block_id);
                RegimeClassification::unknown()
            }
        })
    }

    /// Regime label for a block; unknown when missing or unreadable
    pub fn classify_market_regime(&self, block_id: BlockId) -> MarketRegime {
        match self.try_classify_market_regime(block_id) {
            Ok(result) => result.regime,
            Err(e) => {
                error!("[CLASSIFIER] Failed to classify block {}: {}", block_id, e);
                MarketRegime::Unknown
            }
        }
    }

    pub fn try_analyze_block(&self, block_id: BlockId) -> StoreResult<BlockAnalysis> {
        match self.get_block_statistics(block_id)? {
            Some(stats) => Ok(self.analyze_statistics(&stats)),
            None => Ok(BlockAnalysis::unknown(block_id)),
        }
    }

    /// Full analysis of a block; the unknown analysis when missing or unreadable
    pub fn analyze_block(&self, block_id: BlockId) -> BlockAnalysis {
        self.try_analyze_block(block_id).unwrap_or_else(|e| {
            error!("[CLASSIFIER] Failed to analyze block {}: {}", block_id, e);
            BlockAnalysis::unknown(block_id)
        })
    }

    /// Analysis of already computed statistics
    pub fn analyze_statistics(&self, stats: &BlockStatistics) -> BlockAnalysis {
        let block = &stats.block.block;
        let classification = self.classify_block(&stats.block);
        let regime = classification.regime;

        let count_term = if self.config.count_saturation > 0.0 {
            (block.prediction_count() as f64 / self.config.count_saturation).min(1.0)
        } else {
            1.0
        };
        let confidence =
            clamp_unit((block.confidence + count_term + classification.score) / 3.0);

        BlockAnalysis {
            block_id: stats.block.id,
            block_type: block.block_type,
            market_regime: regime,
            confidence,
            performance_metrics: performance_metrics(
                &self.config,
                &block.statistics,
                stats.members.as_ref(),
            ),
            recommendations: recommendations(&self.config.advice, &block.statistics, regime),
            risk_level: assess_risk_level(&self.config.risk, &block.statistics, regime),
        }
    }

    /// Summary of blocks starting within the last `days` days
    pub fn get_blocks_summary(&self, days: i64) -> StoreResult<BlocksSummary> {
        self.blocks_summary_since(Utc::now() - Duration::days(days), Some(days))
    }

    pub fn blocks_summary_since(
        &self,
        since: Timestamp,
        period_days: Option<i64>,
    ) -> StoreResult<BlocksSummary> {
        let blocks = self.blocks.list_blocks(&BlockQuery::since(since))?;
        let classified: Vec<(StoredBlock, MarketRegime)> = blocks
            .into_iter()
            .map(|b| {
                let regime = self.classify_block(&b).regime;
                (b, regime)
            })
            .collect();
        Ok(BlocksSummary::from_classified(period_days, &classified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_core::{Block, BlockType, ErrorStatistics, RiskLevel};
    use blocks_ports::StoreError;

    struct FailingStore;

    impl BlockReader for FailingStore {
        fn get_block(&self, _id: BlockId) -> StoreResult<Option<StoredBlock>> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn list_blocks(&self, _query: &BlockQuery) -> StoreResult<Vec<StoredBlock>> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn latest_block(&self) -> StoreResult<Option<StoredBlock>> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }
    }

    impl ErrorStream for FailingStore {
        fn read_errors(&self, _query: &ErrorQuery) -> StoreResult<Vec<blocks_core::ErrorObservation>> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }
    }

    fn analyzer() -> BlockAnalyzer<FailingStore, FailingStore> {
        BlockAnalyzer::with_defaults(Arc::new(FailingStore), Arc::new(FailingStore))
    }

    #[test]
    fn test_storage_failure_degrades_to_unknown() {
        let analyzer = analyzer();

        assert_eq!(analyzer.classify_market_regime(BlockId(1)), MarketRegime::Unknown);
        let analysis = analyzer.analyze_block(BlockId(1));
        assert_eq!(analysis.risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn test_storage_failure_is_reported_by_strict_variants() {
        let analyzer = analyzer();

        assert!(analyzer.try_classify_market_regime(BlockId(1)).is_err());
        assert!(analyzer.get_block_statistics(BlockId(1)).is_err());
        assert!(analyzer.get_blocks_summary(30).is_err());
    }

    #[test]
    fn test_analysis_without_members() {
        let analyzer = analyzer();
        let start = Utc::now();
        let stats = BlockStatistics {
            block: StoredBlock::new(
                BlockId(9),
                Block {
                    start_time: start,
                    end_time: start + Duration::hours(2),
                    start_index: 0,
                    end_index: 200,
                    block_type: BlockType::LowErrorStable,
                    confidence: 0.1,
                    statistics: ErrorStatistics {
                        mean_error: 0.1,
                        std_error: 0.05,
                        max_error: 0.3,
                        min_error: 0.0,
                        error_trend: 0.0,
                        volatility: 0.02,
                        prediction_count: 200,
                    },
                },
            ),
            members: None,
        };

        let analysis = analyzer.analyze_statistics(&stats);
        assert_eq!(analysis.market_regime, MarketRegime::Stable);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        // (0.1 + 1.0 + 1.0) / 3
        assert!((analysis.confidence - 0.7).abs() < 1e-12);
        assert_eq!(analysis.performance_metrics.stability, 0.0);
    }
}
