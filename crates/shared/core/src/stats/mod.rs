//! Sanitized descriptive statistics
//!
//! Every function is total: empty input and non-finite values never
//! propagate, they resolve to 0.0. Callers that need to know whether a
//! repair happened use [`sanitize`], which reports the number of values
//! replaced.
//!
//! # Conventions
//!
//! - Standard deviation is the population form (divides by n)
//! - Trend is the least-squares slope against sample position 0..n

/// Replace a non-finite value with `fallback`
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Clamp to [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Copy of `values` with non-finite entries replaced by 0.0,
/// together with the number of entries replaced
pub fn sanitize(values: &[f64]) -> (Vec<f64>, usize) {
    let mut replaced = 0;
    let clean = values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                v
            } else {
                replaced += 1;
                0.0
            }
        })
        .collect();
    (clean, replaced)
}

/// Arithmetic mean, 0 for empty input
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite_or(values.iter().sum::<f64>() / values.len() as f64, 0.0)
}

/// Population standard deviation, 0 for fewer than two values
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    finite_or(var.max(0.0).sqrt(), 0.0)
}

/// Root mean square, 0 for empty input
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite_or(
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt(),
        0.0,
    )
}

/// Least-squares slope of `values` against their index
///
/// `(nΣxy - ΣxΣy) / (nΣx² - (Σx)²)`, 0 when the denominator vanishes.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }
    let denom = nf * sxx - sx * sx;
    if denom == 0.0 {
        return 0.0;
    }
    finite_or((nf * sxy - sx * sy) / denom, 0.0)
}

/// Minimum, 0 for empty input
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Maximum, 0 for empty input
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// `1 - std/mean` clamped to [0, 1]; 0 when the mean is not positive
pub fn dispersion_stability(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    clamp_unit(1.0 - std_dev(values) / m)
}
