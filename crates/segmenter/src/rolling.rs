//! Explicit sliding-window statistics over an error series
//!
//! For each position `i` the window is split at `i` into a "before" half
//! `[i - h, i)` and an "after" half `[i, i + h)` with `h = window / 2`,
//! clipped to the series. Positions whose clipped window holds fewer than
//! `min_periods = window / 2` samples, or whose halves are too thin to
//! estimate a dispersion, produce no record.

use blocks_core::stats;

/// Statistics at one position of the series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingRecord {
    /// Position in the (sorted) series
    pub index: usize,
    /// Mean over the whole window
    pub mean: f64,
    /// Population standard deviation over the whole window
    pub std: f64,
    /// Least-squares slope over the whole window
    pub trend: f64,
    /// Mean volatility over the whole window
    pub volatility: f64,
    pub mean_before: f64,
    pub mean_after: f64,
    /// |mean_after - mean_before| / pooled std; None when the pooled std is zero
    pub shift_score: Option<f64>,
}

/// Sliding window definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    window: usize,
}

impl RollingWindow {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn half(&self) -> usize {
        self.window / 2
    }

    pub fn min_periods(&self) -> usize {
        self.window / 2
    }

    /// Samples required on each side of the split
    fn min_half(&self) -> usize {
        (self.min_periods() / 2).max(2)
    }

    /// One pass over the series
    ///
    /// `errors` and `volatility` must have the same length and contain only
    /// finite values.
    pub fn compute(&self, errors: &[f64], volatility: &[f64]) -> Vec<RollingRecord> {
        let n = errors.len();
        let h = self.half();
        let mut records = Vec::new();

        for i in 0..n {
            let lo = i.saturating_sub(h);
            let hi = (i + h).min(n);
            if hi - lo < self.min_periods() || i - lo < self.min_half() || hi - i < self.min_half()
            {
                continue;
            }

            let window = &errors[lo..hi];
            let before = &errors[lo..i];
            let after = &errors[i..hi];

            let mean_before = stats::mean(before);
            let mean_after = stats::mean(after);
            let sd_before = stats::std_dev(before);
            let sd_after = stats::std_dev(after);
            let pooled = ((sd_before * sd_before + sd_after * sd_after) / 2.0).sqrt();

            let shift_score = if pooled > f64::EPSILON {
                Some((mean_after - mean_before).abs() / pooled)
            } else {
                None
            };

            records.push(RollingRecord {
                index: i,
                mean: stats::mean(window),
                std: stats::std_dev(window),
                trend: stats::slope(window),
                volatility: stats::mean(&volatility[lo..hi]),
                mean_before,
                mean_after,
                shift_score,
            });
        }

        records
    }
}
