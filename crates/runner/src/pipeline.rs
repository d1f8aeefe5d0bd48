//! One adaptation cycle over the error stream
//!
//! ```text
//!   read latest N errors ─▶ detect blocks ─▶ keep blocks after newest stored
//!                                                  │ save
//!                                                  ▼
//!                         per formula: parameters for the latest block
//! ```
//!
//! Detection runs over a sliding window, so blocks overlapping what a
//! previous cycle stored are dropped instead of saved twice.

use crate::config::{BlocksConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::report::{self, ComprehensiveReport};
use blocks_classifier::BlockAnalyzer;
use blocks_core::{Block, BlockId, keys};
use blocks_parameters::{CurrentBlockParameters, RegimeParameterStore};
use blocks_ports::{
    BlockQuery, BlockRepository, ErrorQuery, ErrorStream, OptimizationLog, ParameterRepository,
};
use blocks_segmenter::{BlockDetector, BlockSegmenter};
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a cycle did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub observations: usize,
    pub detected_blocks: usize,
    pub saved_blocks: Vec<BlockId>,
    pub latest_block: Option<BlockId>,
    pub current: Vec<CurrentBlockParameters>,
}

pub struct AdaptiveBlocksPipeline<B, E, P> {
    errors: Arc<E>,
    blocks: Arc<B>,
    segmenter: BlockSegmenter,
    store: RegimeParameterStore<B, E, P>,
    config: PipelineConfig,
}

impl<B, E, P> AdaptiveBlocksPipeline<B, E, P>
where
    B: BlockRepository,
    E: ErrorStream,
    P: ParameterRepository + OptimizationLog,
{
    pub fn new(blocks: Arc<B>, errors: Arc<E>, parameters: Arc<P>, config: &BlocksConfig) -> Self {
        let analyzer = Arc::new(BlockAnalyzer::new(
            blocks.clone(),
            errors.clone(),
            config.classifier.regimes.clone(),
            config.classifier.analyzer,
        ));
        let store = RegimeParameterStore::new(
            analyzer,
            parameters,
            config.parameters.templates.clone(),
            config.parameters.store.clone(),
        );

        Self {
            errors,
            blocks,
            segmenter: BlockSegmenter::new(config.segmenter),
            store,
            config: config.pipeline.clone(),
        }
    }

    pub fn store(&self) -> &RegimeParameterStore<B, E, P> {
        &self.store
    }

    pub fn analyzer(&self) -> &Arc<BlockAnalyzer<B, E>> {
        self.store.analyzer()
    }

    /// Segment the recent errors, persist new blocks, resolve parameters
    pub fn run_cycle(&self) -> PipelineResult<CycleReport> {
        let observations = self
            .errors
            .read_errors(&ErrorQuery::latest(self.config.lookback))?;
        let detected = self.segmenter.detect(&observations);
        debug!(
            "[PIPELINE] {} observations, {} blocks detected",
            observations.len(),
            detected.len()
        );

        let newest_end = self.blocks.latest_block()?.map(|b| b.block.end_time);
        let fresh: Vec<Block> = detected
            .iter()
            .filter(|b| newest_end.is_none_or(|end| b.start_time > end))
            .cloned()
            .collect();
        if fresh.len() < detected.len() {
            debug!(
                "[PIPELINE] Skipped {} blocks already covered by storage",
                detected.len() - fresh.len()
            );
        }

        let saved_blocks = if fresh.is_empty() {
            Vec::new()
        } else {
            self.blocks.save_blocks(&fresh)?
        };

        let latest_block = self.blocks.latest_block()?.map(|b| b.id);
        let mut current = Vec::with_capacity(self.config.formulas.len());
        for formula_id in &self.config.formulas {
            let resolved = self.store.get_current_block_parameters(formula_id)?;
            resolved
                .parameters
                .validate(&[keys::THRESHOLD])
                .map_err(|source| PipelineError::InvalidParameters {
                    formula_id: formula_id.clone(),
                    source,
                })?;
            current.push(resolved);
        }

        info!(
            "[PIPELINE] Cycle done: {} observations, {} detected, {} saved, latest block {:?}",
            observations.len(),
            detected.len(),
            saved_blocks.len(),
            latest_block.map(|id| id.value())
        );

        Ok(CycleReport {
            observations: observations.len(),
            detected_blocks: detected.len(),
            saved_blocks,
            latest_block,
            current,
        })
    }

    /// Summary, analyses and formula performance over the configured period
    pub fn comprehensive_report(&self) -> PipelineResult<ComprehensiveReport> {
        let days = self.config.summary_days;
        let since = Utc::now() - Duration::days(days);
        let analyzer = self.analyzer();

        let summary = analyzer.blocks_summary_since(since, Some(days))?;
        let mut analyses = Vec::new();
        for block in self.blocks.list_blocks(&BlockQuery::since(since))? {
            analyses.push(analyzer.try_analyze_block(block.id)?);
        }

        let mut performance = BTreeMap::new();
        for formula_id in self.store.templates().formula_ids() {
            let by_regime = self.store.get_formula_performance_by_regime(formula_id)?;
            if by_regime.is_empty() {
                warn!("[PIPELINE] No cached parameters yet for {}", formula_id);
            }
            performance.insert(formula_id.to_string(), by_regime);
        }

        Ok(report::build_report(summary, &analyses, performance))
    }
}
