//! Block Classifier
//!
//! Turns a stored block into a regime label, a risk level, performance
//! metrics and recommendations.
//!
//! ## Architecture
//!
//! ```text
//!   BlockReader ──┐                    ┌──▶ MarketRegime (+ score)
//!                 ├──▶ BlockAnalyzer ──┼──▶ BlockAnalysis
//!   ErrorStream ──┘        │           └──▶ BlocksSummary
//!                          │
//!                 RegimeTable (injected lookup table)
//! ```
//!
//! Everything here is read-only. Analyses are recomputed on demand and
//! never cached.

pub mod analyzer;
pub mod assessment;
pub mod config;
pub mod regime_table;
pub mod statistics;
pub mod summary;

pub use analyzer::BlockAnalyzer;
pub use assessment::{assess_risk_level, performance_metrics, recommendations};
pub use config::{AdviceThresholds, AnalyzerConfig, RiskWeights};
pub use regime_table::{RegimeClassification, RegimeEntry, RegimeTable};
pub use statistics::{BlockStatistics, MemberMetrics};
pub use summary::BlocksSummary;
