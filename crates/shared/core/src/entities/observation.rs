use crate::values::Timestamp;
use serde::{Deserialize, Serialize};

/// One prediction error sample
///
/// The derived error fields are computed once at construction and never
/// change afterwards. Observations are immutable once written to the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObservation {
    pub timestamp: Timestamp,
    pub formula_id: String,
    pub prediction: f64,
    pub actual: f64,
    /// |prediction - actual|
    pub error_absolute: f64,
    /// error_absolute / actual, 0 when actual is 0
    pub error_relative: f64,
    /// error_absolute / volatility, error_absolute when volatility is absent or <= 0
    pub error_normalized: f64,
    pub volatility: Option<f64>,
    pub confidence: Option<f64>,
    /// Free-form tag describing how the prediction was produced
    pub method: String,
}

impl ErrorObservation {
    pub fn new(
        timestamp: Timestamp,
        formula_id: impl Into<String>,
        prediction: f64,
        actual: f64,
    ) -> Self {
        let mut observation = Self {
            timestamp,
            formula_id: formula_id.into(),
            prediction,
            actual,
            error_absolute: 0.0,
            error_relative: 0.0,
            error_normalized: 0.0,
            volatility: None,
            confidence: None,
            method: String::new(),
        };
        observation.derive_errors();
        observation
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self.derive_errors();
        self
    }

    /// Attach a model confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        });
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    fn derive_errors(&mut self) {
        self.error_absolute = (self.prediction - self.actual).abs();
        self.error_relative = if self.actual != 0.0 {
            self.error_absolute / self.actual
        } else {
            0.0
        };
        self.error_normalized = match self.volatility {
            Some(v) if v > 0.0 => self.error_absolute / v,
            _ => self.error_absolute,
        };
    }
}
