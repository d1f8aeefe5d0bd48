//! Formula templates
//!
//! A template holds the base parameters of a formula and, per regime, a set
//! of adjustments applied on top of them.

use blocks_core::{MarketRegime, ParameterSet, keys};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Adjustment of one parameter for a regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Override the value
    Set(f64),
    /// Multiply the base value
    Scale(f64),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormulaTemplate {
    pub base: ParameterSet,
    #[serde(default)]
    pub regime_adjustments: BTreeMap<MarketRegime, BTreeMap<String, Adjustment>>,
}

impl FormulaTemplate {
    pub fn new(base: ParameterSet) -> Self {
        Self {
            base,
            regime_adjustments: BTreeMap::new(),
        }
    }

    pub fn with_adjustments<'a>(
        mut self,
        regime: MarketRegime,
        adjustments: impl IntoIterator<Item = (&'a str, Adjustment)>,
    ) -> Self {
        self.regime_adjustments.insert(
            regime,
            adjustments
                .into_iter()
                .map(|(k, a)| (k.to_string(), a))
                .collect(),
        );
        self
    }

    /// Base parameters with the regime's adjustments applied
    pub fn resolve(&self, regime: MarketRegime) -> ParameterSet {
        let mut params = self.base.clone();
        if let Some(adjustments) = self.regime_adjustments.get(&regime) {
            for (name, adjustment) in adjustments {
                match *adjustment {
                    Adjustment::Set(value) => params.set(name.clone(), value),
                    Adjustment::Scale(factor) => {
                        if !params.scale(name, factor) {
                            debug!("[PARAMS] Cannot scale missing parameter {}", name);
                        }
                    }
                }
            }
        }
        params
    }
}

/// Immutable table of formula templates keyed by formula ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaTemplates(BTreeMap<String, FormulaTemplate>);

impl FormulaTemplates {
    pub fn new(templates: BTreeMap<String, FormulaTemplate>) -> Self {
        Self(templates)
    }

    pub fn get(&self, formula_id: &str) -> Option<&FormulaTemplate> {
        self.0.get(formula_id)
    }

    pub fn formula_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FormulaTemplates {
    fn default() -> Self {
        use Adjustment::Set;
        use MarketRegime::{Stable, Transition, Trending, Volatile};

        let volatility_focused = FormulaTemplate::new(ParameterSet::from_pairs([
            (keys::IV_WEIGHT, 1.0),
            (keys::SKEW_WEIGHT, 0.5),
            (keys::BASIS_WEIGHT, -0.3),
            (keys::THRESHOLD, 0.7),
        ]))
        .with_adjustments(Trending, [(keys::IV_WEIGHT, Set(1.2)), (keys::THRESHOLD, Set(0.6))])
        .with_adjustments(Volatile, [(keys::IV_WEIGHT, Set(0.8)), (keys::THRESHOLD, Set(0.9))])
        .with_adjustments(Stable, [(keys::IV_WEIGHT, Set(1.1)), (keys::THRESHOLD, Set(0.5))])
        .with_adjustments(Transition, [(keys::IV_WEIGHT, Set(0.9)), (keys::THRESHOLD, Set(0.8))]);

        let basis_dominant = FormulaTemplate::new(ParameterSet::from_pairs([
            (keys::BASIS_WEIGHT, 1.0),
            (keys::IV_WEIGHT, 0.3),
            (keys::SKEW_WEIGHT, 0.2),
            (keys::THRESHOLD, 0.5),
        ]))
        .with_adjustments(Trending, [(keys::BASIS_WEIGHT, Set(1.3)), (keys::THRESHOLD, Set(0.4))])
        .with_adjustments(Volatile, [(keys::BASIS_WEIGHT, Set(0.7)), (keys::THRESHOLD, Set(0.7))])
        .with_adjustments(Stable, [(keys::BASIS_WEIGHT, Set(1.1)), (keys::THRESHOLD, Set(0.3))])
        .with_adjustments(Transition, [(keys::BASIS_WEIGHT, Set(0.8)), (keys::THRESHOLD, Set(0.6))]);

        let balanced = FormulaTemplate::new(ParameterSet::from_pairs([
            (keys::IV_WEIGHT, 0.6),
            (keys::SKEW_WEIGHT, 0.6),
            (keys::BASIS_WEIGHT, 0.6),
            (keys::THRESHOLD, 0.6),
        ]))
        .with_adjustments(Trending, [(keys::THRESHOLD, Set(0.5))])
        .with_adjustments(Volatile, [(keys::THRESHOLD, Set(0.8))])
        .with_adjustments(Stable, [(keys::THRESHOLD, Set(0.4))])
        .with_adjustments(Transition, [(keys::THRESHOLD, Set(0.7))]);

        Self::new(BTreeMap::from([
            ("volatility_focused".to_string(), volatility_focused),
            ("basis_dominant".to_string(), basis_dominant),
            ("balanced".to_string(), balanced),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let templates = FormulaTemplates::default();
        assert_eq!(templates.len(), 3);

        let vf = templates.get("volatility_focused").unwrap();
        let stable = vf.resolve(MarketRegime::Stable);
        assert_eq!(stable.get(keys::IV_WEIGHT), Some(1.1));
        assert_eq!(stable.threshold(), Some(0.5));
        // Untouched entries keep their base value
        assert_eq!(stable.get(keys::SKEW_WEIGHT), Some(0.5));
    }

    #[test]
    fn test_unknown_regime_keeps_base() {
        let templates = FormulaTemplates::default();
        let balanced = templates.get("balanced").unwrap();
        assert_eq!(balanced.resolve(MarketRegime::Unknown), balanced.base);
    }

    #[test]
    fn test_scale_adjustment() {
        let template = FormulaTemplate::new(ParameterSet::from_pairs([(keys::THRESHOLD, 0.5)]))
            .with_adjustments(
                MarketRegime::Volatile,
                [(keys::THRESHOLD, Adjustment::Scale(1.5)), (keys::IV_WEIGHT, Adjustment::Scale(2.0))],
            );
        let params = template.resolve(MarketRegime::Volatile);

        assert_eq!(params.threshold(), Some(0.75));
        // Scaling a missing entry does not create it
        assert!(!params.contains(keys::IV_WEIGHT));
    }

    #[test]
    fn test_template_from_json() {
        let json = r#"{
            "momentum": {
                "base": {"threshold": 0.6, "iv_weight": 0.4},
                "regime_adjustments": {
                    "volatile": {"threshold": {"scale": 1.5}},
                    "stable": {"iv_weight": {"set": 0.9}}
                }
            }
        }"#;
        let templates: FormulaTemplates = serde_json::from_str(json).unwrap();
        let momentum = templates.get("momentum").unwrap();

        assert!((momentum.resolve(MarketRegime::Volatile).threshold().unwrap() - 0.9).abs() < 1e-12);
        assert_eq!(momentum.resolve(MarketRegime::Stable).get(keys::IV_WEIGHT), Some(0.9));
    }
}
