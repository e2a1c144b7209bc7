//! Per-channel descriptive statistics, computed once when a group closes.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl MetricSummary {
    /// Summarize a non-empty sample buffer.
    ///
    /// * median: empirical-CDF quantile at 0.5, no interpolation (the
    ///   lower middle sample for even lengths)
    /// * mean: kept within [min, max]; summation rounding can push it out
    ///   for constant buffers
    /// * std: sample standard deviation (N - 1); a single sample or a
    ///   constant buffer gives 0.0
    pub fn compute(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples);
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let min = sorted[0];
        let max = sorted[n - 1];
        let median = sorted[(n + 1) / 2 - 1];

        // NaN compares false on both sides and passes through
        let raw_mean = sorted.iter().sum::<f64>() / n as f64;
        let mean = if raw_mean < min {
            min
        } else if raw_mean > max {
            max
        } else {
            raw_mean
        };

        let std = if n > 1 && min != max {
            let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Ok(MetricSummary {
            mean,
            median,
            min,
            max,
            std,
        })
    }
}
