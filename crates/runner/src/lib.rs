//! Adaptive Blocks Runner
//!
//! Wires the segmenter, classifier and parameter store to a storage
//! backend and drives them one cycle at a time:
//!
//! - **Config**: JSON configuration for every component
//! - **Import**: JSON error observations with derived fields rebuilt
//! - **Pipeline**: read recent errors, segment, persist new blocks,
//!   resolve parameters for the latest block
//! - **Report**: summary, per-block analyses, formula performance,
//!   insights and recommendations
//!
//! ## Architecture
//!
//! ```text
//!               ┌─────────────────┐
//!               │  Error Stream   │
//!               └────────┬────────┘
//!                        │ latest N observations
//!                        ▼
//!               ┌─────────────────┐
//!               │ Block Segmenter │
//!               └────────┬────────┘
//!                        │ new blocks
//!                        ▼
//!               ┌─────────────────┐        ┌──────────────────┐
//!               │ Block Repository│◀──────▶│ Block Classifier │
//!               └─────────────────┘        └────────┬─────────┘
//!                                                   │ regime
//!                                                   ▼
//!                                        ┌────────────────────┐
//!                                        │ Regime Parameter   │──▶ formula evaluator
//!                                        │ Store (+ cache)    │
//!                                        └────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod import;
pub mod pipeline;
pub mod report;

pub use config::{BlocksConfig, ConfigError, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use import::{ObservationRecord, parse_observations};
pub use pipeline::{AdaptiveBlocksPipeline, CycleReport};
pub use report::{BlockAnalysisRow, ComprehensiveReport};
