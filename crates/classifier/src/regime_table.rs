//! Regime lookup table
//!
//! Ordered list of regime profiles. Classification picks the highest
//! scoring entry; ties go to the entry listed first, and a table where
//! nothing scores above zero yields `unknown`.

use blocks_core::{ErrorStatistics, MarketRegime, RegimeProfile, RegimeRange};
use serde::{Deserialize, Serialize};

/// One row of the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeEntry {
    pub regime: MarketRegime,
    #[serde(flatten)]
    pub profile: RegimeProfile,
}

/// Chosen regime and its score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub regime: MarketRegime,
    /// Score of the chosen regime (0.0 - 1.0)
    pub score: f64,
}

impl RegimeClassification {
    pub fn unknown() -> Self {
        Self {
            regime: MarketRegime::Unknown,
            score: 0.0,
        }
    }
}

/// Immutable regime lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegimeTable {
    entries: Vec<RegimeEntry>,
}

impl RegimeTable {
    pub fn new(entries: Vec<RegimeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RegimeEntry] {
        &self.entries
    }

    /// Score of one regime, None if the table has no entry for it
    pub fn score(&self, regime: MarketRegime, stats: &ErrorStatistics) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.regime == regime)
            .map(|e| e.profile.score(stats.mean_error, stats.std_error, stats.error_trend))
    }

    /// Scores for every entry, in table order
    pub fn scores(&self, stats: &ErrorStatistics) -> Vec<(MarketRegime, f64)> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.regime,
                    e.profile.score(stats.mean_error, stats.std_error, stats.error_trend),
                )
            })
            .collect()
    }

    pub fn classify(&self, stats: &ErrorStatistics) -> RegimeClassification {
        self.scores(stats)
            .into_iter()
            .fold(RegimeClassification::unknown(), |best, (regime, score)| {
                if score > best.score {
                    RegimeClassification { regime, score }
                } else {
                    best
                }
            })
    }
}

fn entry(
    regime: MarketRegime,
    mean_error: (f64, f64),
    std_error: (f64, f64),
    error_trend: (f64, f64),
) -> RegimeEntry {
    RegimeEntry {
        regime,
        profile: RegimeProfile {
            mean_error: RegimeRange::new(mean_error.0, mean_error.1),
            std_error: RegimeRange::new(std_error.0, std_error.1),
            error_trend: RegimeRange::new(error_trend.0, error_trend.1),
        },
    }
}

impl Default for RegimeTable {
    /// Stable is listed before trending: its ranges are a subset of
    /// trending's, so it must win the tie.
    fn default() -> Self {
        Self::new(vec![
            entry(MarketRegime::Stable, (0.0, 0.5), (0.0, 0.3), (-0.05, 0.05)),
            entry(MarketRegime::Trending, (0.0, 0.8), (0.0, 0.4), (-0.1, 0.1)),
            entry(MarketRegime::Transition, (0.5, 1.5), (0.3, 0.8), (-0.15, 0.15)),
            entry(MarketRegime::Volatile, (1.0, 3.0), (0.5, 2.0), (-0.2, 0.2)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(mean: f64, std: f64, trend: f64) -> ErrorStatistics {
        ErrorStatistics {
            mean_error: mean,
            std_error: std,
            error_trend: trend,
            ..Default::default()
        }
    }

    #[test]
    fn test_calm_block_is_stable() {
        let table = RegimeTable::default();
        let s = stats(0.1, 0.05, 0.0);

        let result = table.classify(&s);
        assert_eq!(result.regime, MarketRegime::Stable);
        assert_relative_eq!(result.score, 1.0);

        let stable = table.score(MarketRegime::Stable, &s).unwrap();
        let volatile = table.score(MarketRegime::Volatile, &s).unwrap();
        assert!(stable > volatile);
    }

    #[test]
    fn test_large_dispersed_errors_are_volatile() {
        let table = RegimeTable::default();
        assert_eq!(table.classify(&stats(2.0, 1.0, 0.0)).regime, MarketRegime::Volatile);
    }

    #[test]
    fn test_mid_errors_are_transition() {
        let table = RegimeTable::default();
        assert_eq!(table.classify(&stats(0.9, 0.6, 0.0)).regime, MarketRegime::Transition);
    }

    #[test]
    fn test_nothing_scores_is_unknown() {
        let table = RegimeTable::default();
        let result = table.classify(&stats(100.0, 100.0, 100.0));
        assert_eq!(result, RegimeClassification::unknown());

        let empty = RegimeTable::new(Vec::new());
        assert_eq!(empty.classify(&stats(0.1, 0.1, 0.0)).regime, MarketRegime::Unknown);
    }

    #[test]
    fn test_ties_go_to_first_entry() {
        let table = RegimeTable::new(vec![
            entry(MarketRegime::Trending, (0.0, 1.0), (0.0, 1.0), (-1.0, 1.0)),
            entry(MarketRegime::Stable, (0.0, 1.0), (0.0, 1.0), (-1.0, 1.0)),
        ]);
        assert_eq!(table.classify(&stats(0.5, 0.5, 0.0)).regime, MarketRegime::Trending);
    }

    #[test]
    fn test_table_deserializes_in_order() {
        let json = r#"[
            {"regime": "volatile",
             "mean_error": {"lo": 1.0, "hi": 3.0},
             "std_error": {"lo": 0.5, "hi": 2.0},
             "error_trend": {"lo": -0.2, "hi": 0.2}}
        ]"#;
        let table: RegimeTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].regime, MarketRegime::Volatile);
    }
}
