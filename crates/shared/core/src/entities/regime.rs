//! Market Regime Types
//!
//! A regime is inferred from the error behaviour of a block. Each labelled
//! regime is described by closed ranges over mean error, error dispersion
//! and error trend.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market regime classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// Directional market, moderate errors
    Trending,
    /// Large, dispersed errors
    Volatile,
    /// Small, steady errors
    Stable,
    /// Moving between regimes
    Transition,
    /// Not enough information to decide
    #[default]
    Unknown,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 5] = [
        MarketRegime::Trending,
        MarketRegime::Volatile,
        MarketRegime::Stable,
        MarketRegime::Transition,
        MarketRegime::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegime::Trending => "trending",
            MarketRegime::Volatile => "volatile",
            MarketRegime::Stable => "stable",
            MarketRegime::Transition => "transition",
            MarketRegime::Unknown => "unknown",
        }
    }

    /// Check if this regime calls for more conservative risk handling
    pub fn is_adverse(&self) -> bool {
        matches!(self, MarketRegime::Volatile | MarketRegime::Transition)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MarketRegime::Unknown)
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketRegime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketRegime::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::UnknownRegime(s.to_string()))
    }
}

/// Closed range `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeRange {
    pub lo: f64,
    pub hi: f64,
}

impl RegimeRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    /// Distance-based fit of a value against this range, in [0, 1]
    ///
    /// 1.0 inside the range; outside, decays linearly with the distance to
    /// the nearest boundary relative to `denominator`.
    pub fn score(&self, value: f64, denominator: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        if self.contains(value) {
            return 1.0;
        }
        if !denominator.is_finite() || denominator <= 0.0 {
            return 0.0;
        }
        let distance = (value - self.lo).abs().min((value - self.hi).abs());
        (1.0 - distance / denominator).clamp(0.0, 1.0)
    }

    /// Largest boundary magnitude, used to scale signed dimensions
    pub fn magnitude(&self) -> f64 {
        self.lo.abs().max(self.hi.abs())
    }
}

/// Ranges describing one labelled regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeProfile {
    pub mean_error: RegimeRange,
    pub std_error: RegimeRange,
    pub error_trend: RegimeRange,
}

impl RegimeProfile {
    /// Mean of the three per-dimension scores, in [0, 1]
    pub fn score(&self, mean_error: f64, std_error: f64, error_trend: f64) -> f64 {
        let mean_score = self.mean_error.score(mean_error, self.mean_error.hi);
        let std_score = self.std_error.score(std_error, self.std_error.hi);
        let trend_score = self
            .error_trend
            .score(error_trend, self.error_trend.magnitude());

        (mean_score + std_score + trend_score) / 3.0
    }
}
