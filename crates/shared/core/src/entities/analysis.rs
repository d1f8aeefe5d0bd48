use super::block::BlockType;
use super::regime::MarketRegime;
use crate::error::DomainError;
use crate::values::BlockId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk assessment for a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "unknown" => Ok(RiskLevel::Unknown),
            other => Err(DomainError::UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Formula performance inside a block, every score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub stability: f64,
    pub consistency: f64,
    pub volatility_score: f64,
    pub trend_score: f64,
    pub overall_score: f64,
}

impl PerformanceMetrics {
    /// Build from the five component scores; overall is their mean
    pub fn from_components(
        accuracy: f64,
        stability: f64,
        consistency: f64,
        volatility_score: f64,
        trend_score: f64,
    ) -> Self {
        let unit = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (a, s, c, v, t) = (
            unit(accuracy),
            unit(stability),
            unit(consistency),
            unit(volatility_score),
            unit(trend_score),
        );
        Self {
            accuracy: a,
            stability: s,
            consistency: c,
            volatility_score: v,
            trend_score: t,
            overall_score: (a + s + c + v + t) / 5.0,
        }
    }
}

/// Derived analysis of a stored block (recomputed on demand, never cached)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAnalysis {
    pub block_id: BlockId,
    pub block_type: BlockType,
    pub market_regime: MarketRegime,
    pub confidence: f64,
    pub performance_metrics: PerformanceMetrics,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
}

impl BlockAnalysis {
    /// Analysis for a block that cannot be found
    pub fn unknown(block_id: BlockId) -> Self {
        Self {
            block_id,
            block_type: BlockType::Unknown,
            market_regime: MarketRegime::Unknown,
            confidence: 0.0,
            performance_metrics: PerformanceMetrics::default(),
            recommendations: Vec::new(),
            risk_level: RiskLevel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metrics_overall_is_mean_of_clamped_components() {
        let m = PerformanceMetrics::from_components(1.4, 0.5, -0.2, 0.5, f64::NAN);

        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.consistency, 0.0);
        assert_eq!(m.trend_score, 0.0);
        assert_relative_eq!(m.overall_score, 0.4);
    }

    #[test]
    fn test_labels_default_to_unknown() {
        assert_eq!(RiskLevel::default(), RiskLevel::Unknown);
        assert_eq!(BlockType::default(), BlockType::Unknown);
        assert_eq!(MarketRegime::default(), MarketRegime::Unknown);
    }

    #[test]
    fn test_unknown_analysis() {
        let analysis = BlockAnalysis::unknown(BlockId(3));
        assert_eq!(analysis.market_regime, MarketRegime::Unknown);
        assert_eq!(analysis.risk_level, RiskLevel::Unknown);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.recommendations.is_empty());
    }
}
