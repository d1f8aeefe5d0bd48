//! Configuration loading for the adaptive blocks runner
//!
//! One JSON document with a section per component:
//! - `segmenter`: change-point threshold, window, block size, type rules
//! - `classifier`: regime table and analysis thresholds
//! - `parameters`: formula templates and parameter store settings
//! - `pipeline`: lookback, formulas to resolve, database, report period
//!
//! Every section is optional and falls back to its defaults.

use blocks_classifier::{AnalyzerConfig, RegimeTable};
use blocks_parameters::{FormulaTemplates, ParameterStoreConfig};
use blocks_segmenter::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub parameters: ParametersConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Regime table plus analysis thresholds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Ordered regime profiles; ties go to the earlier entry
    #[serde(default)]
    pub regimes: RegimeTable,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

/// Formula templates plus parameter store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersConfig {
    #[serde(default)]
    pub templates: FormulaTemplates,

    #[serde(default)]
    pub store: ParameterStoreConfig,
}

/// Cycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Most recent observations read per cycle
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Formulas resolved for the latest block
    #[serde(default = "default_formulas")]
    pub formulas: Vec<String>,

    /// SQLite file; in-memory when absent
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Report period (days)
    #[serde(default = "default_summary_days")]
    pub summary_days: i64,
}

fn default_lookback() -> usize {
    1000
}

fn default_formulas() -> Vec<String> {
    vec![
        "volatility_focused".to_string(),
        "basis_dominant".to_string(),
        "balanced".to_string(),
    ]
}

fn default_summary_days() -> i64 {
    30
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            formulas: default_formulas(),
            database: None,
            summary_days: default_summary_days(),
        }
    }
}

impl BlocksConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the components cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seg = &self.segmenter;
        if !seg.threshold.is_finite() || seg.threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "segmenter.threshold must be positive, got {}",
                seg.threshold
            )));
        }
        if seg.window < 2 {
            return Err(ConfigError::Invalid(format!(
                "segmenter.window must be at least 2, got {}",
                seg.window
            )));
        }
        if self.pipeline.lookback == 0 {
            return Err(ConfigError::Invalid("pipeline.lookback must be positive".to_string()));
        }
        if self.pipeline.summary_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "pipeline.summary_days must be positive, got {}",
                self.pipeline.summary_days
            )));
        }
        if self.classifier.regimes.entries().is_empty() {
            return Err(ConfigError::Invalid("classifier.regimes is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
