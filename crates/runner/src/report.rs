//! Comprehensive report over stored blocks and cached parameters

use blocks_classifier::BlocksSummary;
use blocks_core::stats;
use blocks_core::{BlockAnalysis, BlockId, BlockType, MarketRegime, RiskLevel, Timestamp};
use blocks_parameters::RegimePerformance;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HIGH_PERFORMANCE: f64 = 0.7;
const LOW_PERFORMANCE: f64 = 0.5;
const WEAK_FORMULA: f64 = 0.6;

/// One line per analyzed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAnalysisRow {
    pub block_id: BlockId,
    pub block_type: BlockType,
    pub market_regime: MarketRegime,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub performance_score: f64,
    pub recommendations_count: usize,
}

impl From<&BlockAnalysis> for BlockAnalysisRow {
    fn from(analysis: &BlockAnalysis) -> Self {
        Self {
            block_id: analysis.block_id,
            block_type: analysis.block_type,
            market_regime: analysis.market_regime,
            confidence: analysis.confidence,
            risk_level: analysis.risk_level,
            performance_score: analysis.performance_metrics.overall_score,
            recommendations_count: analysis.recommendations.len(),
        }
    }
}

pub type FormulaPerformance = BTreeMap<String, BTreeMap<MarketRegime, RegimePerformance>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub generated_at: Timestamp,
    pub blocks_summary: BlocksSummary,
    pub block_analyses: Vec<BlockAnalysisRow>,
    pub formula_performance: FormulaPerformance,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn build_report(
    blocks_summary: BlocksSummary,
    analyses: &[BlockAnalysis],
    formula_performance: FormulaPerformance,
) -> ComprehensiveReport {
    let block_analyses: Vec<BlockAnalysisRow> = analyses.iter().map(BlockAnalysisRow::from).collect();
    let key_insights = key_insights(&blocks_summary, &block_analyses);
    let recommendations = report_recommendations(&block_analyses, &formula_performance);

    ComprehensiveReport {
        generated_at: Utc::now(),
        blocks_summary,
        block_analyses,
        formula_performance,
        key_insights,
        recommendations,
    }
}

fn high_risk_count(rows: &[BlockAnalysisRow]) -> usize {
    rows.iter().filter(|r| r.risk_level == RiskLevel::High).count()
}

fn key_insights(summary: &BlocksSummary, rows: &[BlockAnalysisRow]) -> Vec<String> {
    let mut insights = Vec::new();

    if summary.total_blocks > 0 {
        insights.push(format!(
            "Detected {} market regimes over the analyzed period",
            summary.total_blocks
        ));
    }
    if let Some(regime) = summary.most_common_regime.filter(|r| r.is_known()) {
        insights.push(format!("Most common market regime: {}", regime));
    }

    if !rows.is_empty() {
        let scores: Vec<f64> = rows.iter().map(|r| r.performance_score).collect();
        insights.push(format!("Average block performance: {:.3}", stats::mean(&scores)));

        let high = scores.iter().filter(|&&s| s > HIGH_PERFORMANCE).count();
        if high > 0 {
            insights.push(format!("High-performance blocks: {}", high));
        }
    }

    let risky = high_risk_count(rows);
    if risky > 0 {
        insights.push(format!("High-risk blocks: {}", risky));
    }

    insights
}

fn report_recommendations(rows: &[BlockAnalysisRow], performance: &FormulaPerformance) -> Vec<String> {
    let mut recs = Vec::new();

    if rows.iter().any(|r| r.performance_score < LOW_PERFORMANCE) {
        recs.push("Consider re-optimizing parameters for low-performance blocks".to_string());
    }
    if high_risk_count(rows) > 0 {
        recs.push("Trade high-risk blocks with extra caution".to_string());
    }

    for (formula_id, by_regime) in performance {
        if by_regime.is_empty() {
            continue;
        }
        let averages: Vec<f64> = by_regime.values().map(|p| p.average_score).collect();
        if stats::mean(&averages) < WEAK_FORMULA {
            recs.push(format!(
                "Formula {} underperforms: review its parameters",
                formula_id
            ));
        }
    }

    recs.push("Refresh formula parameters regularly as new data arrives".to_string());
    recs.push("Monitor market regime changes to adapt in time".to_string());
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_core::PerformanceMetrics;

    fn analysis(id: i64, overall: f64, risk: RiskLevel) -> BlockAnalysis {
        let mut a = BlockAnalysis::unknown(BlockId(id));
        a.market_regime = MarketRegime::Stable;
        a.risk_level = risk;
        a.performance_metrics = PerformanceMetrics::from_components(
            overall, overall, overall, overall, overall,
        );
        a.recommendations = vec!["keep going".to_string()];
        a
    }

    fn perf(average_score: f64) -> RegimePerformance {
        RegimePerformance {
            average_score,
            max_score: average_score,
            block_count: 1,
        }
    }

    #[test]
    fn test_empty_report_has_general_recommendations_only() {
        let report = build_report(BlocksSummary::default(), &[], FormulaPerformance::new());

        assert!(report.block_analyses.is_empty());
        assert!(report.key_insights.is_empty());
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn test_insights_and_recommendations() {
        let summary = BlocksSummary {
            total_blocks: 3,
            most_common_regime: Some(MarketRegime::Stable),
            ..Default::default()
        };
        let analyses = vec![
            analysis(1, 0.9, RiskLevel::Low),
            analysis(2, 0.4, RiskLevel::High),
            analysis(3, 0.8, RiskLevel::Medium),
        ];
        let mut performance = FormulaPerformance::new();
        performance.insert(
            "balanced".to_string(),
            BTreeMap::from([(MarketRegime::Stable, perf(0.9)), (MarketRegime::Volatile, perf(0.1))]),
        );
        performance.insert(
            "basis_dominant".to_string(),
            BTreeMap::from([(MarketRegime::Stable, perf(0.8))]),
        );
        performance.insert("volatility_focused".to_string(), BTreeMap::new());

        let report = build_report(summary, &analyses, performance);

        assert_eq!(report.block_analyses.len(), 3);
        assert_eq!(report.block_analyses[1].recommendations_count, 1);
        assert_eq!(
            report.key_insights,
            vec![
                "Detected 3 market regimes over the analyzed period".to_string(),
                "Most common market regime: stable".to_string(),
                "Average block performance: 0.700".to_string(),
                "High-performance blocks: 2".to_string(),
                "High-risk blocks: 1".to_string(),
            ]
        );

        // low performance + high risk + balanced (mean 0.5) + two general
        assert_eq!(report.recommendations.len(), 5);
        assert!(report.recommendations[2].contains("balanced"));
    }

    #[test]
    fn test_unknown_regime_is_not_an_insight() {
        let summary = BlocksSummary {
            total_blocks: 1,
            most_common_regime: Some(MarketRegime::Unknown),
            ..Default::default()
        };
        let report = build_report(summary, &[], FormulaPerformance::new());
        assert_eq!(report.key_insights.len(), 1);
    }
}
