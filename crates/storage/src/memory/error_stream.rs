//! In-memory error stream

use blocks_core::ErrorObservation;
use blocks_ports::{ErrorQuery, ErrorStream, ErrorStreamWriter, StoreResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only in-memory error stream
pub struct InMemoryErrorStream {
    observations: Arc<RwLock<Vec<ErrorObservation>>>,
}

impl InMemoryErrorStream {
    pub fn new() -> Self {
        Self {
            observations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.read().is_empty()
    }
}

impl Default for InMemoryErrorStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryErrorStream {
    fn clone(&self) -> Self {
        Self {
            observations: Arc::clone(&self.observations),
        }
    }
}

impl ErrorStream for InMemoryErrorStream {
    fn read_errors(&self, query: &ErrorQuery) -> StoreResult<Vec<ErrorObservation>> {
        let mut matching: Vec<ErrorObservation> = self
            .observations
            .read()
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order
        matching.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        if let Some(limit) = query.limit {
            let skip = matching.len().saturating_sub(limit);
            matching.drain(..skip);
        }
        Ok(matching)
    }
}

impl ErrorStreamWriter for InMemoryErrorStream {
    fn append_errors(&self, observations: &[ErrorObservation]) -> StoreResult<usize> {
        self.observations.write().extend_from_slice(observations);
        Ok(observations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_latest_keeps_most_recent_in_order() {
        let stream = InMemoryErrorStream::new();
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let obs: Vec<ErrorObservation> = (0..10)
            .rev()
            .map(|i| ErrorObservation::new(t0 + Duration::minutes(i), "f", i as f64, 0.0))
            .collect();
        stream.append_errors(&obs).unwrap();

        let latest = stream.read_errors(&ErrorQuery::latest(3)).unwrap();
        let predictions: Vec<f64> = latest.iter().map(|o| o.prediction).collect();
        assert_eq!(predictions, vec![7.0, 8.0, 9.0]);
        assert_eq!(stream.len(), 10);
    }

    #[test]
    fn test_shared_clone() {
        let stream = InMemoryErrorStream::new();
        let clone = stream.clone();
        clone
            .append_errors(&[ErrorObservation::new(Utc::now(), "f", 1.0, 0.5)])
            .unwrap();
        assert_eq!(stream.len(), 1);
    }
}
