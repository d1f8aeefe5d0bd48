//! Block Segmenter
//!
//! Splits a window of the prediction error stream into contiguous,
//! non-overlapping blocks at statistically meaningful change points.
//!
//! ## Pipeline
//!
//! ```text
//!   errors (any order)
//!        │ stable sort by timestamp
//!        ▼
//!   ┌──────────────────┐     one record per position with enough data
//!   │  Rolling window  │───▶ mean / std / trend / volatility / shift score
//!   └──────────────────┘
//!        │ shift score > threshold
//!        ▼
//!   ┌──────────────────┐     {0} ∪ change points ∪ {n}
//!   │  Change points   │───▶ consecutive pairs shorter than min_block_size dropped
//!   └──────────────────┘
//!        │
//!        ▼
//!   Block { statistics, block_type, confidence }
//! ```
//!
//! Detection is pure. Persisting blocks is a separate call on a
//! `BlockWriter`.

pub mod classify;
pub mod config;
pub mod detector;
pub mod rolling;

pub use classify::{BlockTypeRules, ConfidenceScales};
pub use config::SegmenterConfig;
pub use detector::{BlockDetector, BlockSegmenter};
pub use rolling::{RollingRecord, RollingWindow};
