//! Block-level parameter optimization and block performance scoring

use blocks_core::stats::clamp_unit;
use blocks_core::{ErrorStatistics, ParameterSet, keys};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration for block-level optimization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Member observations required before a block is optimized
    pub min_samples: usize,
    /// Threshold gain per unit of std/mean above 1
    pub instability_gain: f64,
    /// std/mean is capped here before applying the gain
    pub max_instability_ratio: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    /// |trend| above this rescales the weights
    pub trend_gate: f64,
    /// Weight factor when errors are rising
    pub rising_weight_factor: f64,
    /// Weight factor when errors are falling
    pub falling_weight_factor: f64,
    /// Mean error at which the accuracy term of the score reaches zero
    pub score_mean_scale: f64,
    /// Error std at which the stability term of the score reaches zero
    pub score_std_scale: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            instability_gain: 0.3,
            max_instability_ratio: 2.0,
            threshold_min: 0.1,
            threshold_max: 2.0,
            trend_gate: 0.05,
            rising_weight_factor: 0.9,  // damp signals while errors grow
            falling_weight_factor: 1.1, // lean in while errors shrink
            score_mean_scale: 2.0,
            score_std_scale: 1.0,
        }
    }
}

/// Tunes regime parameters to the statistics of one block
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockOptimizer {
    config: OptimizerConfig,
}

impl BlockOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// True if a block with `samples` member observations may be optimized
    pub fn has_enough_samples(&self, samples: usize) -> bool {
        samples >= self.config.min_samples
    }

    /// Apply dispersion and trend rules to `params`
    ///
    /// - std/mean > 1 raises the threshold and clamps the raised value;
    ///   otherwise the threshold is left as resolved
    /// - a clear trend rescales the signal weights
    pub fn optimize(&self, mut params: ParameterSet, stats: &ErrorStatistics) -> ParameterSet {
        let c = &self.config;

        if let Some(threshold) = params.threshold() {
            let ratio = if stats.mean_error > 0.0 {
                stats.std_error / stats.mean_error
            } else {
                0.0
            };
            if ratio > 1.0 {
                let scaled =
                    threshold * (1.0 + c.instability_gain * (ratio.min(c.max_instability_ratio) - 1.0));
                let adjusted = scaled.clamp(c.threshold_min, c.threshold_max);
                debug!(
                    "[PARAMS] Threshold {:.4} -> {:.4} (std/mean {:.2})",
                    threshold, adjusted, ratio
                );
                params.set(keys::THRESHOLD, adjusted);
            }
        }

        if stats.error_trend.abs() > c.trend_gate {
            let factor = if stats.error_trend > 0.0 {
                c.rising_weight_factor
            } else {
                c.falling_weight_factor
            };
            for name in keys::WEIGHTS {
                params.scale(name, factor);
            }
        }

        params
    }

    /// Block performance score in [0, 1]
    ///
    /// Mean of accuracy (from the mean error), stability (from the error
    /// std) and the block's classification confidence.
    pub fn performance_score(&self, stats: &ErrorStatistics, confidence: f64) -> f64 {
        let c = &self.config;
        let term = |value: f64, scale: f64| {
            if scale > 0.0 {
                clamp_unit(1.0 - value / scale)
            } else {
                0.0
            }
        };
        (term(stats.mean_error, c.score_mean_scale)
            + term(stats.std_error, c.score_std_scale)
            + clamp_unit(confidence))
            / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(mean: f64, std: f64, trend: f64) -> ErrorStatistics {
        ErrorStatistics {
            mean_error: mean,
            std_error: std,
            error_trend: trend,
            ..Default::default()
        }
    }

    fn params() -> ParameterSet {
        ParameterSet::from_pairs([
            (keys::THRESHOLD, 0.5),
            (keys::IV_WEIGHT, 1.0),
            (keys::SKEW_WEIGHT, 0.5),
            (keys::BASIS_WEIGHT, -0.3),
        ])
    }

    #[test]
    fn test_calm_block_is_untouched() {
        let optimizer = BlockOptimizer::default();
        assert_eq!(optimizer.optimize(params(), &stats(0.3, 0.1, 0.0)), params());
    }

    #[test]
    fn test_dispersed_errors_raise_threshold() {
        let optimizer = BlockOptimizer::default();
        // ratio 1.5 -> 0.5 * (1 + 0.3 * 0.5)
        let out = optimizer.optimize(params(), &stats(1.0, 1.5, 0.0));
        assert_relative_eq!(out.threshold().unwrap(), 0.575, epsilon = 1e-12);

        // ratio capped at 2.0 -> 0.5 * 1.3
        let out = optimizer.optimize(params(), &stats(1.0, 10.0, 0.0));
        assert_relative_eq!(out.threshold().unwrap(), 0.65, epsilon = 1e-12);
    }

    #[test]
    fn test_raised_threshold_is_clamped() {
        let optimizer = BlockOptimizer::default();
        // ratio 2.0 -> 5.0 * 1.3, above the ceiling
        let mut p = params();
        p.set(keys::THRESHOLD, 5.0);
        assert_eq!(optimizer.optimize(p, &stats(0.3, 0.6, 0.0)).threshold(), Some(2.0));

        let mut p = params();
        p.set(keys::THRESHOLD, 0.01);
        assert_eq!(optimizer.optimize(p, &stats(0.3, 0.6, 0.0)).threshold(), Some(0.1));
    }

    #[test]
    fn test_threshold_outside_range_is_kept_without_dispersion() {
        let optimizer = BlockOptimizer::default();
        for threshold in [5.0, 0.01] {
            let mut p = params();
            p.set(keys::THRESHOLD, threshold);
            let calm = optimizer.optimize(p.clone(), &stats(0.3, 0.1, 0.0));
            assert_eq!(calm.threshold(), Some(threshold));
            // Zero mean error gives no ratio
            assert_eq!(optimizer.optimize(p, &stats(0.0, 0.4, 0.0)).threshold(), Some(threshold));
        }
    }

    #[test]
    fn test_trend_rescales_weights() {
        let optimizer = BlockOptimizer::default();

        let rising = optimizer.optimize(params(), &stats(0.3, 0.1, 0.08));
        assert_relative_eq!(rising.get(keys::IV_WEIGHT).unwrap(), 0.9, epsilon = 1e-12);
        assert_relative_eq!(rising.get(keys::BASIS_WEIGHT).unwrap(), -0.27, epsilon = 1e-12);
        assert_eq!(rising.threshold(), Some(0.5));

        let falling = optimizer.optimize(params(), &stats(0.3, 0.1, -0.08));
        assert_relative_eq!(falling.get(keys::SKEW_WEIGHT).unwrap(), 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_performance_score() {
        let optimizer = BlockOptimizer::default();
        // (0.85 + 0.9 + 0.6) / 3
        assert_relative_eq!(
            optimizer.performance_score(&stats(0.3, 0.1, 0.0), 0.6),
            2.35 / 3.0,
            epsilon = 1e-12
        );
        // Large errors floor at zero
        assert_relative_eq!(optimizer.performance_score(&stats(5.0, 3.0, 0.0), 0.0), 0.0);
    }

    #[test]
    fn test_min_samples() {
        let optimizer = BlockOptimizer::default();
        assert!(!optimizer.has_enough_samples(9));
        assert!(optimizer.has_enough_samples(10));
    }
}
