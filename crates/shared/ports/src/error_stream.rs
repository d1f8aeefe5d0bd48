//! Port for the prediction error stream
//!
//! The stream is append-only and time-ordered. The block subsystem only
//! reads it; writers are the prediction evaluators feeding it.

use crate::error::StoreResult;
use blocks_core::{ErrorObservation, Timestamp};

/// Filter for reading observations
///
/// Time bounds are inclusive. With `limit`, only the most recent matching
/// observations are kept. Results are ordered by timestamp ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub formula_id: Option<String>,
    pub limit: Option<usize>,
}

impl ErrorQuery {
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// The most recent `limit` observations
    pub fn latest(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn for_formula(mut self, formula_id: impl Into<String>) -> Self {
        self.formula_id = Some(formula_id.into());
        self
    }

    /// Check whether an observation passes the time and formula filters
    pub fn matches(&self, obs: &ErrorObservation) -> bool {
        self.start.is_none_or(|s| obs.timestamp >= s)
            && self.end.is_none_or(|e| obs.timestamp <= e)
            && self
                .formula_id
                .as_deref()
                .is_none_or(|f| obs.formula_id == f)
    }
}

/// Read access to the error stream
pub trait ErrorStream: Send + Sync {
    fn read_errors(&self, query: &ErrorQuery) -> StoreResult<Vec<ErrorObservation>>;
}

/// Append access to the error stream
pub trait ErrorStreamWriter: Send + Sync {
    /// Append observations, returning how many were written
    fn append_errors(&self, observations: &[ErrorObservation]) -> StoreResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_query_matches() {
        let now = Utc::now();
        let obs = ErrorObservation::new(now, "balanced", 1.2, 1.0);

        assert!(ErrorQuery::default().matches(&obs));
        assert!(ErrorQuery::between(now - Duration::minutes(1), now).matches(&obs));
        assert!(!ErrorQuery::between(now + Duration::seconds(1), now + Duration::minutes(1)).matches(&obs));
        assert!(ErrorQuery::default().for_formula("balanced").matches(&obs));
        assert!(!ErrorQuery::default().for_formula("basis_dominant").matches(&obs));
    }
}
