//! Adaptive Blocks Core Domain
//!
//! Pure domain types for error-driven adaptive blocks.
//! This crate contains no I/O and is 100% unit testable.
//!
//! - **ErrorObservation**: one prediction error sample read from the error stream
//! - **Block**: a contiguous span of observations with homogeneous error behaviour
//! - **MarketRegime**: regime label and the ranges that define it
//! - **ParameterSet**: typed name → value mapping consumed by formula evaluators
//! - **stats**: sanitized descriptive statistics shared by every component

pub mod entities;
pub mod error;
pub mod stats;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Analysis
    BlockAnalysis,
    // Blocks
    Block,
    BlockType,
    // Observations
    ErrorObservation,
    ErrorStatistics,
    // Parameters
    FormulaBlockParameters,
    // Regimes
    MarketRegime,
    OptimizationRecord,
    ParameterSet,
    PerformanceMetrics,
    RegimeProfile,
    RegimeRange,
    RiskLevel,
    StoredBlock,
    keys,
};
pub use error::{DomainError, DomainResult};
pub use values::{BlockId, FormulaId, Timestamp};
