//! Regime parameter store
//!
//! Resolution order for `(formula_id, block_id, regime)`:
//!
//! 1. formula without a template: `{threshold: fallback}`
//! 2. no block: the template's base parameters
//! 3. cached row for the pair: returned verbatim
//! 4. block not stored: regime parameters, nothing cached
//! 5. otherwise: regime parameters (regime derived from the block when not
//!    given), block optimization when enough member observations exist,
//!    then the row is cached together with the block performance score
//!
//! The cache check runs before the regime is derived: a cached row is
//! returned unchanged whatever the regime, and derivation has no side
//! effects.

use crate::config::ParameterStoreConfig;
use crate::error::{ParameterError, ParameterResult};
use crate::optimizer::BlockOptimizer;
use crate::template::FormulaTemplates;
use blocks_classifier::BlockAnalyzer;
use blocks_core::stats;
use blocks_core::{
    BlockId, BlockType, FormulaBlockParameters, MarketRegime, OptimizationRecord, ParameterSet,
    RiskLevel, keys,
};
use blocks_ports::{BlockQuery, BlockReader, ErrorStream, OptimizationLog, ParameterRepository};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Aggregate performance of cached parameter sets in one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimePerformance {
    pub average_score: f64,
    pub max_score: f64,
    pub block_count: usize,
}

/// Parameters for the most recent block, with its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBlockParameters {
    pub formula_id: String,
    pub block_id: Option<BlockId>,
    pub parameters: ParameterSet,
    pub market_regime: MarketRegime,
    pub confidence: f64,
    pub block_type: BlockType,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

pub struct RegimeParameterStore<B, E, P> {
    analyzer: Arc<BlockAnalyzer<B, E>>,
    repository: Arc<P>,
    templates: FormulaTemplates,
    optimizer: BlockOptimizer,
    config: ParameterStoreConfig,
}

impl<B, E, P> RegimeParameterStore<B, E, P>
where
    B: BlockReader,
    E: ErrorStream,
    P: ParameterRepository + OptimizationLog,
{
    pub fn new(
        analyzer: Arc<BlockAnalyzer<B, E>>,
        repository: Arc<P>,
        templates: FormulaTemplates,
        config: ParameterStoreConfig,
    ) -> Self {
        Self {
            analyzer,
            repository,
            templates,
            optimizer: BlockOptimizer::new(config.optimizer),
            config,
        }
    }

    /// Create with the built-in templates and default configuration
    pub fn with_defaults(analyzer: Arc<BlockAnalyzer<B, E>>, repository: Arc<P>) -> Self {
        Self::new(
            analyzer,
            repository,
            FormulaTemplates::default(),
            ParameterStoreConfig::default(),
        )
    }

    pub fn templates(&self) -> &FormulaTemplates {
        &self.templates
    }

    pub fn analyzer(&self) -> &Arc<BlockAnalyzer<B, E>> {
        &self.analyzer
    }

    fn fallback(&self) -> ParameterSet {
        ParameterSet::from_pairs([(keys::THRESHOLD, self.config.fallback_threshold)])
    }

    /// Base parameters of a formula, the fallback set when it has no template
    pub fn base_parameters(&self, formula_id: &str) -> ParameterSet {
        self.templates
            .get(formula_id)
            .map(|t| t.base.clone())
            .unwrap_or_else(|| self.fallback())
    }

    /// Resolve the parameter set for a formula inside a block
    pub fn get_formula_parameters(
        &self,
        formula_id: &str,
        block_id: Option<BlockId>,
        market_regime: Option<MarketRegime>,
    ) -> ParameterResult<ParameterSet> {
        let Some(template) = self.templates.get(formula_id) else {
            warn!("[PARAMS] Unknown formula {}, using fallback parameters", formula_id);
            return Ok(self.fallback());
        };
        let Some(block_id) = block_id else {
            return Ok(template.base.clone());
        };

        if let Some(cached) = self.repository.get_parameters(formula_id, block_id)? {
            debug!(
                "[PARAMS] Cache hit for {} in block {}",
                formula_id, block_id
            );
            return Ok(cached.parameters);
        }

        let Some(block_stats) = self.analyzer.get_block_statistics(block_id)? else {
            warn!(
                "[PARAMS] Block {} not found, {} uses regime parameters uncached",
                block_id, formula_id
            );
            return Ok(template.resolve(market_regime.unwrap_or_default()));
        };

        let regime = market_regime
            .unwrap_or_else(|| self.analyzer.classify_block(&block_stats.block).regime);
        let block = &block_stats.block.block;

        let mut params = template.resolve(regime);
        let samples = block_stats.members.map_or(0, |m| m.sample_count);
        if self.optimizer.has_enough_samples(samples) {
            params = self.optimizer.optimize(params, &block.statistics);
        } else {
            debug!(
                "[PARAMS] Block {} has {} member observations, skipping optimization",
                block_id, samples
            );
        }

        let row = FormulaBlockParameters {
            formula_id: formula_id.to_string(),
            block_id,
            market_regime: regime,
            parameters: params,
            performance_score: self
                .optimizer
                .performance_score(&block.statistics, block.confidence),
            created_at: Utc::now(),
        };
        if let Err(source) = self.repository.upsert_parameters(&row) {
            error!(
                "[PARAMS] Failed to cache {} parameters for block {}: {}",
                formula_id, block_id, source
            );
            return Err(ParameterError::PersistFailed {
                formula_id: formula_id.to_string(),
                parameters: row.parameters,
                source,
            });
        }
        info!(
            "[PARAMS] Cached {} parameters for block {} ({}, score {:.3})",
            formula_id, block_id, regime, row.performance_score
        );

        Ok(row.parameters)
    }

    /// Drop the cached row so the next resolution recomputes it
    pub fn invalidate_parameters(&self, formula_id: &str, block_id: BlockId) -> ParameterResult<bool> {
        let removed = self.repository.invalidate_parameters(formula_id, block_id)?;
        if removed {
            info!(
                "[PARAMS] Invalidated {} parameters for block {}",
                formula_id, block_id
            );
        }
        Ok(removed)
    }

    /// Best parameter set over every stored block classified as `regime`
    ///
    /// The run is appended to the optimization log. With no block in the
    /// regime the base parameters are returned and nothing is logged.
    pub fn optimize_parameters_for_regime(
        &self,
        formula_id: &str,
        regime: MarketRegime,
    ) -> ParameterResult<ParameterSet> {
        if self.templates.get(formula_id).is_none() {
            warn!("[PARAMS] Unknown formula {}, nothing to optimize", formula_id);
            return Ok(self.fallback());
        }

        let blocks = self.analyzer.blocks().list_blocks(&BlockQuery::default())?;
        let mut best = (self.base_parameters(formula_id), 0.0);
        let mut considered = 0;

        for stored in blocks
            .iter()
            .filter(|b| self.analyzer.classify_block(b).regime == regime)
        {
            considered += 1;
            let params = self.get_formula_parameters(formula_id, Some(stored.id), Some(regime))?;
            let score = self
                .optimizer
                .performance_score(&stored.block.statistics, stored.block.confidence);
            if score > best.1 {
                best = (params, score);
            }
        }

        let (best_parameters, score) = best;
        if considered == 0 {
            debug!(
                "[PARAMS] No {} blocks for {}, keeping base parameters",
                regime, formula_id
            );
            return Ok(best_parameters);
        }

        let record = OptimizationRecord {
            formula_id: formula_id.to_string(),
            market_regime: regime,
            optimization_method: self.config.optimization_method.clone(),
            best_parameters,
            score,
            timestamp: Utc::now(),
        };
        if let Err(source) = self.repository.record_optimization(&record) {
            error!(
                "[PARAMS] Failed to log optimization of {} for {}: {}",
                formula_id, regime, source
            );
            return Err(ParameterError::PersistFailed {
                formula_id: formula_id.to_string(),
                parameters: record.best_parameters,
                source,
            });
        }
        info!(
            "[PARAMS] Optimized {} for {} over {} blocks (best score {:.3})",
            formula_id, regime, considered, score
        );

        Ok(record.best_parameters)
    }

    /// Cached performance scores of a formula grouped by regime
    pub fn get_formula_performance_by_regime(
        &self,
        formula_id: &str,
    ) -> ParameterResult<BTreeMap<MarketRegime, RegimePerformance>> {
        let mut scores: BTreeMap<MarketRegime, Vec<f64>> = BTreeMap::new();
        for row in self.repository.list_parameters(formula_id)? {
            scores
                .entry(row.market_regime)
                .or_default()
                .push(row.performance_score);
        }

        Ok(scores
            .into_iter()
            .map(|(regime, s)| {
                (
                    regime,
                    RegimePerformance {
                        average_score: stats::mean(&s),
                        max_score: stats::max(&s),
                        block_count: s.len(),
                    },
                )
            })
            .collect())
    }

    /// Parameters and analysis for the most recent stored block
    pub fn get_current_block_parameters(&self, formula_id: &str) -> ParameterResult<CurrentBlockParameters> {
        let Some(latest) = self.analyzer.blocks().latest_block()? else {
            return Ok(CurrentBlockParameters {
                formula_id: formula_id.to_string(),
                block_id: None,
                parameters: self.get_formula_parameters(formula_id, None, None)?,
                market_regime: MarketRegime::Unknown,
                confidence: 0.0,
                block_type: BlockType::Unknown,
                risk_level: RiskLevel::Unknown,
                recommendations: Vec::new(),
            });
        };

        let analysis = self.analyzer.try_analyze_block(latest.id)?;
        let parameters =
            self.get_formula_parameters(formula_id, Some(latest.id), Some(analysis.market_regime))?;

        Ok(CurrentBlockParameters {
            formula_id: formula_id.to_string(),
            block_id: Some(latest.id),
            parameters,
            market_regime: analysis.market_regime,
            confidence: analysis.confidence,
            block_type: analysis.block_type,
            risk_level: analysis.risk_level,
            recommendations: analysis.recommendations,
        })
    }
}
