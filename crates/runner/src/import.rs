//! JSON import of error observations
//!
//! Only the measured fields are read. Derived error fields present in the
//! input are ignored and recomputed, so imported rows obey the same
//! invariants as observations built in code.

use blocks_core::{ErrorObservation, Timestamp};
use serde::Deserialize;

/// Measured fields of one imported observation
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRecord {
    pub timestamp: Timestamp,
    pub formula_id: String,
    pub prediction: f64,
    pub actual: f64,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub method: String,
}

impl From<ObservationRecord> for ErrorObservation {
    fn from(record: ObservationRecord) -> Self {
        let mut observation = ErrorObservation::new(
            record.timestamp,
            record.formula_id,
            record.prediction,
            record.actual,
        )
        .with_method(record.method);
        if let Some(volatility) = record.volatility {
            observation = observation.with_volatility(volatility);
        }
        if let Some(confidence) = record.confidence {
            observation = observation.with_confidence(confidence);
        }
        observation
    }
}

/// Parse a JSON array of observations, rebuilding the derived fields
pub fn parse_observations(json: &str) -> serde_json::Result<Vec<ErrorObservation>> {
    let records: Vec<ObservationRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(ErrorObservation::from).collect())
}
