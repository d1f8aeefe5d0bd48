//! Pure assessment rules: performance metrics, risk level, recommendations

use crate::config::{AdviceThresholds, AnalyzerConfig, RiskWeights};
use crate::statistics::MemberMetrics;
use blocks_core::{ErrorStatistics, MarketRegime, PerformanceMetrics, RiskLevel};

/// Performance of the formula inside a block
///
/// Member-based components (stability, consistency, trend) are 0 when the
/// block has no member observations.
pub fn performance_metrics(
    config: &AnalyzerConfig,
    stats: &ErrorStatistics,
    members: Option<&MemberMetrics>,
) -> PerformanceMetrics {
    let accuracy = if config.accuracy_scale > 0.0 {
        1.0 - stats.mean_error / config.accuracy_scale
    } else {
        0.0
    };
    let volatility_score = if config.volatility_scale > 0.0 {
        1.0 - (stats.volatility / config.volatility_scale).min(1.0)
    } else {
        0.0
    };

    PerformanceMetrics::from_components(
        accuracy,
        members.map_or(0.0, |m| m.error_stability),
        members.map_or(0.0, |m| m.confidence_consistency),
        volatility_score,
        members.map_or(0.0, |m| m.trend_stability),
    )
}

/// Additive risk score mapped onto low / medium / high
pub fn assess_risk_level(
    weights: &RiskWeights,
    stats: &ErrorStatistics,
    regime: MarketRegime,
) -> RiskLevel {
    let mut score = 0.0;

    if stats.mean_error > weights.mean_error_above {
        score += weights.mean_error_weight;
    }
    if stats.std_error > weights.std_error_above {
        score += weights.std_error_weight;
    }
    if stats.volatility > weights.volatility_above {
        score += weights.volatility_weight;
    }
    if regime.is_adverse() {
        score += weights.adverse_regime_weight;
    }

    if score < weights.medium_from {
        RiskLevel::Low
    } else if score < weights.high_from {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Recommendations in order: error level, stability, regime, volatility
pub fn recommendations(
    advice: &AdviceThresholds,
    stats: &ErrorStatistics,
    regime: MarketRegime,
) -> Vec<String> {
    let mut out = Vec::new();

    if stats.mean_error > advice.high_error {
        out.push("High prediction errors: consider changing the formula parameters");
    } else if stats.mean_error < advice.low_error {
        out.push("Low prediction errors: the formula is performing well");
    }

    if stats.std_error > advice.unstable {
        out.push("High error instability: add volatility filters");
    } else if stats.std_error < advice.very_stable {
        out.push("High error stability: strategy aggressiveness can be increased");
    }

    match regime {
        MarketRegime::Volatile => out.push("Volatile regime: use conservative parameters"),
        MarketRegime::Stable => out.push("Stable regime: more aggressive parameters are acceptable"),
        MarketRegime::Trending => out.push("Trending regime: focus on trend-following signals"),
        MarketRegime::Transition => out.push("Transition regime: change parameters with care"),
        MarketRegime::Unknown => {}
    }

    if stats.volatility > advice.high_volatility {
        out.push("High market volatility: reduce position size");
    } else if stats.volatility < advice.low_volatility {
        out.push("Low market volatility: position size can be increased");
    }

    out.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(mean: f64, std: f64, volatility: f64) -> ErrorStatistics {
        ErrorStatistics {
            mean_error: mean,
            std_error: std,
            volatility,
            ..Default::default()
        }
    }

    #[test]
    fn test_risk_levels() {
        let w = RiskWeights::default();

        assert_eq!(assess_risk_level(&w, &stats(0.2, 0.1, 0.01), MarketRegime::Stable), RiskLevel::Low);
        // 0.3 + 0.2
        assert_eq!(
            assess_risk_level(&w, &stats(1.2, 0.1, 0.01), MarketRegime::Transition),
            RiskLevel::Medium
        );
        // 0.3 + 0.3 + 0.2 + 0.2
        assert_eq!(
            assess_risk_level(&w, &stats(2.0, 1.0, 0.08), MarketRegime::Volatile),
            RiskLevel::High
        );
    }

    #[test]
    fn test_recommendation_order() {
        let advice = AdviceThresholds::default();
        let recs = recommendations(&advice, &stats(2.0, 1.2, 0.08), MarketRegime::Volatile);

        assert_eq!(recs.len(), 4);
        assert!(recs[0].starts_with("High prediction errors"));
        assert!(recs[1].starts_with("High error instability"));
        assert!(recs[2].starts_with("Volatile regime"));
        assert!(recs[3].starts_with("High market volatility"));
    }

    #[test]
    fn test_middle_of_the_road_block_gets_few_recommendations() {
        let advice = AdviceThresholds::default();
        let recs = recommendations(&advice, &stats(0.8, 0.5, 0.03), MarketRegime::Unknown);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_performance_without_members() {
        let config = AnalyzerConfig::default();
        let m = performance_metrics(&config, &stats(1.0, 0.5, 0.05), None);

        assert_relative_eq!(m.accuracy, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.volatility_score, 0.5, epsilon = 1e-12);
        assert_eq!(m.stability, 0.0);
        assert_relative_eq!(m.overall_score, 0.2, epsilon = 1e-12);
    }
}
