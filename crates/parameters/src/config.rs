use crate::optimizer::OptimizerConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the parameter store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStoreConfig {
    /// Threshold returned for formulas without a template
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,

    /// Method name recorded for regime optimization runs
    #[serde(default = "default_optimization_method")]
    pub optimization_method: String,

    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

fn default_fallback_threshold() -> f64 {
    0.7
}

fn default_optimization_method() -> String {
    "grid_search".to_string()
}

impl Default for ParameterStoreConfig {
    fn default() -> Self {
        Self {
            fallback_threshold: default_fallback_threshold(),
            optimization_method: default_optimization_method(),
            optimizer: OptimizerConfig::default(),
        }
    }
}
