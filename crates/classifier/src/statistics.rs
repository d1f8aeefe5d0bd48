use blocks_core::stats::{self, clamp_unit};
use blocks_core::{ErrorObservation, StoredBlock};
use serde::{Deserialize, Serialize};

/// Metrics computed from the observations that fall inside a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberMetrics {
    pub sample_count: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Mean relative error, in percent
    pub mape: f64,
    /// 1 - std/mean of the absolute errors
    pub error_stability: f64,
    pub error_trend: f64,
    /// 1 - |drift over the block relative to the mean error|
    pub trend_stability: f64,
    pub volatility_mean: f64,
    pub volatility_consistency: f64,
    pub confidence_mean: f64,
    pub confidence_consistency: f64,
}

impl MemberMetrics {
    /// None when there are no observations
    pub fn from_observations(observations: &[ErrorObservation]) -> Option<Self> {
        if observations.is_empty() {
            return None;
        }

        let (errors, _) = stats::sanitize(
            &observations
                .iter()
                .map(|o| o.error_absolute)
                .collect::<Vec<_>>(),
        );
        let (relative, _) = stats::sanitize(
            &observations
                .iter()
                .map(|o| o.error_relative)
                .collect::<Vec<_>>(),
        );
        let volatility: Vec<f64> = observations
            .iter()
            .filter_map(|o| o.volatility.filter(|v| v.is_finite()))
            .collect();
        let confidence: Vec<f64> = observations
            .iter()
            .filter_map(|o| o.confidence.filter(|c| c.is_finite()))
            .collect();

        let mae = stats::mean(&errors);
        let error_trend = stats::slope(&errors);

        Some(Self {
            sample_count: observations.len(),
            mae,
            rmse: stats::rms(&errors),
            mape: stats::mean(&relative) * 100.0,
            error_stability: stats::dispersion_stability(&errors),
            error_trend,
            trend_stability: trend_stability(error_trend, errors.len(), mae),
            volatility_mean: stats::mean(&volatility),
            volatility_consistency: stats::dispersion_stability(&volatility),
            confidence_mean: stats::mean(&confidence),
            confidence_consistency: stats::dispersion_stability(&confidence),
        })
    }
}

/// A flat series scores 1; a series that drifts by its own mean or more scores 0
fn trend_stability(slope: f64, n: usize, mean: f64) -> f64 {
    if n < 2 {
        return 1.0;
    }
    if mean <= 0.0 {
        return if slope == 0.0 { 1.0 } else { 0.0 };
    }
    let drift = slope * (n - 1) as f64 / mean;
    clamp_unit(1.0 - drift.abs())
}

/// Stored block plus the metrics of its member observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatistics {
    #[serde(flatten)]
    pub block: StoredBlock,
    /// None when no observations fall inside the block's time range
    pub members: Option<MemberMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, Utc};

    fn observations(errors: &[f64]) -> Vec<ErrorObservation> {
        let t0 = Utc::now();
        errors
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                ErrorObservation::new(t0 + Duration::minutes(i as i64), "balanced", 10.0 + e, 10.0)
                    .with_volatility(0.02)
                    .with_confidence(0.8)
            })
            .collect()
    }

    #[test]
    fn test_empty_members() {
        assert!(MemberMetrics::from_observations(&[]).is_none());
    }

    #[test]
    fn test_constant_errors() {
        let m = MemberMetrics::from_observations(&observations(&[0.5; 20])).unwrap();

        assert_eq!(m.sample_count, 20);
        assert_relative_eq!(m.mae, 0.5, epsilon = 1e-9);
        assert_relative_eq!(m.rmse, 0.5, epsilon = 1e-9);
        assert_relative_eq!(m.mape, 5.0, epsilon = 1e-7);
        assert_relative_eq!(m.error_stability, 1.0, epsilon = 1e-6);
        assert_relative_eq!(m.trend_stability, 1.0, epsilon = 1e-6);
        assert_relative_eq!(m.volatility_mean, 0.02);
        assert_relative_eq!(m.confidence_consistency, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drifting_errors_lower_trend_stability() {
        // Errors climbing from 0.5 to 1.5: drift equals the mean
        let errors: Vec<f64> = (0..11).map(|i| 0.5 + 0.1 * i as f64).collect();
        let m = MemberMetrics::from_observations(&observations(&errors)).unwrap();

        assert_relative_eq!(m.error_trend, 0.1, epsilon = 1e-6);
        assert!(m.trend_stability < 0.05);
    }

    #[test]
    fn test_missing_optional_fields() {
        let t0 = Utc::now();
        let obs = vec![
            ErrorObservation::new(t0, "f", 1.0, 0.5),
            ErrorObservation::new(t0 + Duration::minutes(1), "f", 1.5, 0.5),
        ];
        let m = MemberMetrics::from_observations(&obs).unwrap();

        assert_eq!(m.volatility_mean, 0.0);
        assert_eq!(m.volatility_consistency, 0.0);
        assert_eq!(m.confidence_mean, 0.0);
    }
}
