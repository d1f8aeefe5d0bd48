use crate::error::DomainError;
use crate::values::{BlockId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provisional classification of a block's error behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Small and steady errors
    LowErrorStable,
    /// Large and dispersed errors
    HighErrorVolatile,
    /// Errors drifting upwards
    IncreasingErrors,
    /// Errors drifting downwards
    DecreasingErrors,
    /// Underlying market volatility is elevated
    HighVolatility,
    /// None of the above
    Normal,
    #[default]
    Unknown,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::LowErrorStable,
        BlockType::HighErrorVolatile,
        BlockType::IncreasingErrors,
        BlockType::DecreasingErrors,
        BlockType::HighVolatility,
        BlockType::Normal,
        BlockType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::LowErrorStable => "low_error_stable",
            BlockType::HighErrorVolatile => "high_error_volatile",
            BlockType::IncreasingErrors => "increasing_errors",
            BlockType::DecreasingErrors => "decreasing_errors",
            BlockType::HighVolatility => "high_volatility",
            BlockType::Normal => "normal",
            BlockType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownBlockType(s.to_string()))
    }
}

/// Error statistics summarising the observations inside a block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub mean_error: f64,
    /// Population standard deviation
    pub std_error: f64,
    pub max_error: f64,
    pub min_error: f64,
    /// Least-squares slope of the error against sample position
    pub error_trend: f64,
    /// Mean market volatility over the block
    pub volatility: f64,
    pub prediction_count: usize,
}

/// A contiguous span of the error stream with homogeneous error behaviour
///
/// Indices are positions in the window the block was detected from and
/// describe the half-open range `[start_index, end_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub start_index: usize,
    pub end_index: usize,
    pub block_type: BlockType,
    /// Classification confidence (0.0 - 1.0)
    pub confidence: f64,
    #[serde(flatten)]
    pub statistics: ErrorStatistics,
}

impl Block {
    pub fn prediction_count(&self) -> usize {
        self.statistics.prediction_count
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.end_index <= self.start_index
    }

    /// Check the structural invariants every persisted block must satisfy
    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
            && self.end_index > self.start_index
            && self.statistics.prediction_count == self.end_index - self.start_index
            && self.statistics.max_error >= self.statistics.min_error
            && self.statistics.min_error >= 0.0
    }

    /// True if the timestamp falls inside `[start_time, end_time]`
    pub fn covers(&self, ts: Timestamp) -> bool {
        ts >= self.start_time && ts <= self.end_time
    }
}

/// A block with the identifier assigned at persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: BlockId,
    #[serde(flatten)]
    pub block: Block,
}

impl StoredBlock {
    pub fn new(id: BlockId, block: Block) -> Self {
        Self { id, block }
    }
}
