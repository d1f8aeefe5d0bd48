use crate::classify::{BlockTypeRules, ConfidenceScales};
use serde::{Deserialize, Serialize};

/// Configuration for block segmentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Standardized mean shift that marks a change point
    pub threshold: f64,
    /// Rolling window size (observations)
    pub window: usize,
    /// Shortest block kept (observations)
    pub min_block_size: usize,
    /// Volatility assumed for observations that carry none
    pub default_volatility: f64,
    pub rules: BlockTypeRules,
    pub confidence: ConfidenceScales,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            window: 50,
            min_block_size: 50,
            default_volatility: 0.01,
            rules: BlockTypeRules::default(),
            confidence: ConfidenceScales::default(),
        }
    }
}
