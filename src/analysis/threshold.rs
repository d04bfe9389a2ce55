//! Drop-detection thresholds.
//!
//! A frame interval is flagged as a drop when it exceeds a multiple of
//! the running median of the intervals before it. The right multiple
//! depends on the recording's frame rate and jitter, so both the
//! multiple and the median window are configuration.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Thresholds for flagging anomalous frame intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropThresholds {
    /// Multiple of the trailing median above which an interval is a drop.
    pub threshold_multiple: f64,
    /// Number of previous intervals in the trailing median, or `None` for
    /// every interval observed so far.
    pub window: Option<usize>,
}

impl Default for DropThresholds {
    fn default() -> Self {
        Self {
            threshold_multiple: 1.5,
            window: None,
        }
    }
}

impl DropThresholds {
    /// Thresholds with a fixed trailing window.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window),
            ..Default::default()
        }
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold_multiple.is_finite() || self.threshold_multiple <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold_multiple));
        }
        if self.window == Some(0) {
            return Err(ConfigError::InvalidWindow);
        }
        Ok(())
    }

    /// True if `duration` exceeds the threshold for the given median.
    #[inline]
    pub fn is_drop(&self, duration: f64, median: f64) -> bool {
        duration > self.threshold_multiple * median
    }
}
