use super::regime::MarketRegime;
use crate::error::{DomainError, DomainResult};
use crate::values::{BlockId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Documented parameter names shared by the built-in formulas
pub mod keys {
    /// Signal threshold, present in every parameter set
    pub const THRESHOLD: &str = "threshold";
    pub const IV_WEIGHT: &str = "iv_weight";
    pub const SKEW_WEIGHT: &str = "skew_weight";
    pub const BASIS_WEIGHT: &str = "basis_weight";

    /// Weights rescaled by trend-based optimization
    pub const WEIGHTS: [&str; 3] = [IV_WEIGHT, SKEW_WEIGHT, BASIS_WEIGHT];
}

/// Parameter name → value mapping handed to a formula evaluator
///
/// Ordered so that equality and serialization are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, f64>);

impl ParameterSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Multiply an existing entry; returns false if the name is absent
    pub fn scale(&mut self, name: &str, factor: f64) -> bool {
        match self.0.get_mut(name) {
            Some(value) => {
                *value *= factor;
                true
            }
            None => false,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.get(keys::THRESHOLD)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate at the consumer boundary: required names present, all values finite
    pub fn validate(&self, required: &[&str]) -> DomainResult<()> {
        if let Some(missing) = required.iter().find(|name| !self.contains(name)) {
            return Err(DomainError::MissingParameter(missing.to_string()));
        }
        if let Some((name, value)) = self.0.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DomainError::NonFiniteParameter {
                name: name.clone(),
                value: *value,
            });
        }
        Ok(())
    }
}

/// Cached parameter set for one (formula, block) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaBlockParameters {
    pub formula_id: String,
    pub block_id: BlockId,
    pub market_regime: MarketRegime,
    pub parameters: ParameterSet,
    /// Block performance score (0.0 - 1.0)
    pub performance_score: f64,
    pub created_at: Timestamp,
}

/// Outcome of a regime-level optimization run (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub formula_id: String,
    pub market_regime: MarketRegime,
    pub optimization_method: String,
    pub best_parameters: ParameterSet,
    pub score: f64,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_existing_only() {
        let mut params = ParameterSet::from_pairs([(keys::THRESHOLD, 0.5)]);

        assert!(params.scale(keys::THRESHOLD, 2.0));
        assert!(!params.scale(keys::IV_WEIGHT, 2.0));
        assert_eq!(params.threshold(), Some(1.0));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_validate() {
        let mut params = ParameterSet::from_pairs([(keys::THRESHOLD, 0.7), (keys::IV_WEIGHT, 1.0)]);
        assert!(params.validate(&[keys::THRESHOLD]).is_ok());

        assert_eq!(
            params.validate(&[keys::BASIS_WEIGHT]),
            Err(DomainError::MissingParameter("basis_weight".to_string()))
        );

        params.set(keys::IV_WEIGHT, f64::INFINITY);
        assert!(matches!(
            params.validate(&[]),
            Err(DomainError::NonFiniteParameter { .. })
        ));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let params = ParameterSet::from_pairs([(keys::THRESHOLD, 0.7)]);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"threshold":0.7}"#);

        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
