//! Regime Parameter Store
//!
//! Resolves the parameter set a formula should use inside a block:
//!
//! ```text
//!   formula template ──▶ base parameters
//!                            │ regime adjustment (set / scale per entry)
//!                            ▼
//!                        regime parameters
//!                            │ block optimization (dispersion, trend)
//!                            ▼
//!                        block parameters ──▶ cached per (formula, block)
//! ```
//!
//! Cached rows are returned verbatim until explicitly invalidated.

pub mod config;
pub mod error;
pub mod optimizer;
pub mod store;
pub mod template;

pub use config::ParameterStoreConfig;
pub use error::{ParameterError, ParameterResult};
pub use optimizer::{BlockOptimizer, OptimizerConfig};
pub use store::{CurrentBlockParameters, RegimeParameterStore, RegimePerformance};
pub use template::{Adjustment, FormulaTemplate, FormulaTemplates};
