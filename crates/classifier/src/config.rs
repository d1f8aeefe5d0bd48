use serde::{Deserialize, Serialize};

/// Configuration for block analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Prediction count at which the count confidence term saturates
    pub count_saturation: f64,
    /// Mean error at which accuracy reaches zero
    pub accuracy_scale: f64,
    /// Volatility at which the volatility score reaches zero
    pub volatility_scale: f64,
    pub risk: RiskWeights,
    pub advice: AdviceThresholds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            count_saturation: 100.0,
            accuracy_scale: 2.0,
            volatility_scale: 0.1,
            risk: RiskWeights::default(),
            advice: AdviceThresholds::default(),
        }
    }
}

/// Additive risk factors and the cut-offs between risk levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub mean_error_above: f64,
    pub mean_error_weight: f64,
    pub std_error_above: f64,
    pub std_error_weight: f64,
    pub volatility_above: f64,
    pub volatility_weight: f64,
    /// Added for volatile and transition regimes
    pub adverse_regime_weight: f64,
    /// Scores below this are low risk
    pub medium_from: f64,
    /// Scores below this (and at least medium_from) are medium risk
    pub high_from: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            mean_error_above: 1.0,
            mean_error_weight: 0.3,
            std_error_above: 0.8,
            std_error_weight: 0.3,
            volatility_above: 0.05,
            volatility_weight: 0.2,
            adverse_regime_weight: 0.2,
            medium_from: 0.3,
            high_from: 0.6,
        }
    }
}

/// Thresholds that trigger recommendations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceThresholds {
    pub high_error: f64,
    pub low_error: f64,
    pub unstable: f64,
    pub very_stable: f64,
    pub high_volatility: f64,
    pub low_volatility: f64,
}

impl Default for AdviceThresholds {
    fn default() -> Self {
        Self {
            high_error: 1.5,
            low_error: 0.3,
            unstable: 1.0,
            very_stable: 0.2,
            high_volatility: 0.05,
            low_volatility: 0.01,
        }
    }
}
