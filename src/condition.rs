//! Non-fatal conditions found while decoding and analyzing a series.
//!
//! Dropped frames and timestamp anomalies are the subject of the analysis,
//! so they are carried as values through to the final report rather than
//! raised as errors.

use crate::timestamp::{MalformedTimestamp, TimerField};
use serde::Serialize;
use std::fmt;

/// A non-fatal condition attached to one camera's results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// The source log had no data rows.
    NoData,
    /// Every decoded value is exactly zero; embedding was likely disabled
    /// at capture time.
    AllZeroTimestamps { frames: usize },
    /// A decoded value is earlier than the one before it.
    NonMonotonicTimestamp {
        frame: usize,
        previous: f64,
        current: f64,
    },
    /// A reading failed to decode and was skipped.
    DecodeFailure {
        frame: usize,
        field: TimerField,
        value: i64,
    },
    /// The embedded frame counter jumped by more than one.
    FrameCounterGap { frame: usize, missing: u64 },
}

impl Condition {
    /// Frame the condition refers to, if it is frame-specific.
    pub fn frame(&self) -> Option<usize> {
        match self {
            Condition::NoData | Condition::AllZeroTimestamps { .. } => None,
            Condition::NonMonotonicTimestamp { frame, .. }
            | Condition::DecodeFailure { frame, .. }
            | Condition::FrameCounterGap { frame, .. } => Some(*frame),
        }
    }

    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::NoData => "no_data",
            Condition::AllZeroTimestamps { .. } => "all_zero_timestamps",
            Condition::NonMonotonicTimestamp { .. } => "non_monotonic_timestamp",
            Condition::DecodeFailure { .. } => "decode_failure",
            Condition::FrameCounterGap { .. } => "frame_counter_gap",
        }
    }

    /// Emits the condition as a warning event.
    pub fn log(&self, camera: &str) {
        match self.frame() {
            Some(frame) => tracing::warn!(camera, frame, kind = self.kind(), "{}", self),
            None => tracing::warn!(camera, kind = self.kind(), "{}", self),
        }
    }
}

impl From<&MalformedTimestamp> for Condition {
    fn from(err: &MalformedTimestamp) -> Self {
        Condition::DecodeFailure {
            frame: err.frame,
            field: err.field,
            value: err.value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::NoData => write!(f, "source contains no frames"),
            Condition::AllZeroTimestamps { frames } => write!(
                f,
                "all {frames} timestamps are zero (timestamp embedding likely disabled)"
            ),
            Condition::NonMonotonicTimestamp {
                previous, current, ..
            } => write!(
                f,
                "timestamp {current:.6} s is earlier than previous {previous:.6} s"
            ),
            Condition::DecodeFailure { field, value, .. } => {
                write!(f, "{field} = {value} out of range (limit {})", field.limit())
            }
            Condition::FrameCounterGap { missing, .. } => {
                write!(f, "frame counter skipped {missing} frame(s)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_specific_conditions() {
        assert_eq!(Condition::NoData.frame(), None);
        assert_eq!(Condition::AllZeroTimestamps { frames: 3 }.frame(), None);
        assert_eq!(
            Condition::FrameCounterGap { frame: 7, missing: 2 }.frame(),
            Some(7)
        );
    }

    #[test]
    fn test_from_malformed() {
        let err = MalformedTimestamp {
            camera: "cam0".into(),
            frame: 4,
            field: TimerField::CycleOffset,
            value: 4000,
        };
        let condition = Condition::from(&err);
        assert_eq!(condition.kind(), "decode_failure");
        assert_eq!(condition.frame(), Some(4));
        assert_eq!(condition.to_string(), "cycle_offset = 4000 out of range (limit 3072)");
    }
}
