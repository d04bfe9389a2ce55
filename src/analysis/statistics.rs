//! Summary statistics of a camera's deviation series.
//!
//! The mean separates a systematic offset from jitter; the standard
//! deviation and maximum absolute value describe the jitter.

use serde::Serialize;

/// Summary of one camera's deviations from the cross-camera mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationSummary {
    /// Camera identifier.
    pub camera: String,
    /// Number of deviations summarized.
    pub samples: usize,
    /// Mean deviation (systematic offset), seconds.
    pub mean: f64,
    /// Largest absolute deviation, seconds.
    pub max_abs: f64,
    /// Population standard deviation, seconds.
    pub std_dev: f64,
}

impl DeviationSummary {
    /// Summarizes a deviation series. All fields are zero when empty.
    pub fn compute(camera: impl Into<String>, deviations: &[f64]) -> Self {
        Self {
            camera: camera.into(),
            samples: deviations.len(),
            mean: Self::compute_mean(deviations),
            max_abs: deviations.iter().fold(0.0, |acc: f64, d| acc.max(d.abs())),
            std_dev: Self::compute_variance(deviations).sqrt(),
        }
    }

    fn compute_mean(data: &[f64]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        data.iter().sum::<f64>() / data.len() as f64
    }

    fn compute_variance(data: &[f64]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }

        let n = data.len() as f64;
        let mean = Self::compute_mean(data);
        data.iter().map(|&d| (d - mean).powi(2)).sum::<f64>() / n
    }

    /// True if the deviations look like a fixed offset rather than jitter.
    pub fn is_systematic(&self, tolerance: f64) -> bool {
        self.samples > 0 && self.std_dev <= tolerance && self.mean.abs() > tolerance
    }
}
