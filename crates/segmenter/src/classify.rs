//! Provisional block typing and classification confidence

use blocks_core::stats::clamp_unit;
use blocks_core::{BlockType, ErrorStatistics};
use serde::{Deserialize, Serialize};

/// Decision table for block types (first matching rule wins)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTypeRules {
    /// mean below this (with low std) = low_error_stable
    pub low_mean: f64,
    pub low_std: f64,
    /// mean above this (with high std) = high_error_volatile
    pub high_mean: f64,
    pub high_std: f64,
    /// |trend| above this = increasing/decreasing errors
    pub trend: f64,
    /// volatility above this = high_volatility
    pub volatility: f64,
}

impl Default for BlockTypeRules {
    fn default() -> Self {
        Self {
            low_mean: 0.5,
            low_std: 0.3,
            high_mean: 2.0,
            high_std: 1.0,
            trend: 0.1,
            volatility: 0.05, // 5% market volatility
        }
    }
}

impl BlockTypeRules {
    pub fn classify(&self, stats: &ErrorStatistics) -> BlockType {
        if stats.mean_error < self.low_mean && stats.std_error < self.low_std {
            BlockType::LowErrorStable
        } else if stats.mean_error > self.high_mean && stats.std_error > self.high_std {
            BlockType::HighErrorVolatile
        } else if stats.error_trend > self.trend {
            BlockType::IncreasingErrors
        } else if stats.error_trend < -self.trend {
            BlockType::DecreasingErrors
        } else if stats.volatility > self.volatility {
            BlockType::HighVolatility
        } else {
            BlockType::Normal
        }
    }
}

/// Scales that saturate each confidence term at 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceScales {
    pub mean: f64,
    pub std: f64,
    pub trend: f64,
}

impl Default for ConfidenceScales {
    fn default() -> Self {
        Self {
            mean: 2.0,
            std: 1.0,
            trend: 0.2,
        }
    }
}

impl ConfidenceScales {
    /// Mean of the three saturated terms, in [0, 1]
    pub fn confidence(&self, stats: &ErrorStatistics) -> f64 {
        let term = |value: f64, scale: f64| {
            if scale > 0.0 {
                clamp_unit(value / scale)
            } else {
                0.0
            }
        };
        (term(stats.mean_error, self.mean)
            + term(stats.std_error, self.std)
            + term(stats.error_trend.abs(), self.trend))
            / 3.0
    }
}
