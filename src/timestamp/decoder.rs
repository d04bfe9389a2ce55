//! Cycle-timer decoding and wraparound tracking.
//!
//! The 7-bit second counter wraps every 128 seconds. Decoding keeps a
//! small per-camera state: the previous raw second count and the
//! accumulated unwrap offset. A wrap is detected only by comparing raw
//! second counts of consecutive readings.

use super::raw::{RawCycleTimestamp, TimerField, WRAP_PERIOD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A reading with a field outside its valid range.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("malformed timestamp for camera {camera} at frame {frame}: {field} = {value} (limit {limit})", limit = .field.limit())]
pub struct MalformedTimestamp {
    /// Camera the reading belongs to.
    pub camera: String,
    /// Zero-based frame index within the camera's log.
    pub frame: usize,
    /// First field found out of range.
    pub field: TimerField,
    /// Offending value.
    pub value: i64,
}

/// What to do with a malformed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Record the frame as a decode failure and keep going.
    #[default]
    Skip,
    /// Fail the whole series.
    Abort,
}

/// A decoded reading: frame index plus unwrapped seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedTimestamp {
    pub frame: usize,
    pub seconds: f64,
}

/// Running unwrap state for one camera.
///
/// `step` is a pure function: the same state and reading always give the
/// same output and next state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderState {
    previous_second: Option<i64>,
    unwrap_offset: u64,
}

impl DecoderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one well-formed reading and returns the next state.
    ///
    /// The caller is responsible for validating `raw` first.
    ///
    /// Any decrease of the raw second count counts as a wrap, including a
    /// clock stepped back by a few seconds: `[10, 11, 9, 12]` decodes to
    /// `[10, 11, 137, 140]`. Such a step never shows up as a non-monotonic
    /// value, only as one long interval for the drop detector.
    pub fn step(self, raw: &RawCycleTimestamp) -> (f64, DecoderState) {
        let mut unwrap_offset = self.unwrap_offset;
        if let Some(previous) = self.previous_second {
            if raw.second_count < previous {
                unwrap_offset += WRAP_PERIOD;
            }
        }

        let seconds = unwrap_offset as f64 + raw.second_count as f64 + raw.cycle_seconds();
        let next = DecoderState {
            previous_second: Some(raw.second_count),
            unwrap_offset,
        };
        (seconds, next)
    }

    /// Seconds added so far by wraparounds.
    pub fn unwrap_offset(&self) -> u64 {
        self.unwrap_offset
    }

    /// Raw second count of the last decoded reading.
    pub fn previous_second(&self) -> Option<i64> {
        self.previous_second
    }
}

/// Stateful decoder for one camera's readings, fed in frame order.
#[derive(Debug, Clone)]
pub struct CycleDecoder {
    camera: String,
    state: DecoderState,
    next_frame: usize,
}

impl CycleDecoder {
    pub fn new(camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            state: DecoderState::new(),
            next_frame: 0,
        }
    }

    /// Decodes the next frame's reading.
    ///
    /// The frame index advances even when the reading is malformed, but
    /// the unwrap state does not.
    pub fn decode(&mut self, raw: RawCycleTimestamp) -> Result<DecodedTimestamp, MalformedTimestamp> {
        let frame = self.next_frame;
        self.next_frame += 1;

        raw.validate().map_err(|(field, value)| MalformedTimestamp {
            camera: self.camera.clone(),
            frame,
            field,
            value,
        })?;

        let (seconds, next) = self.state.step(&raw);
        if next.unwrap_offset != self.state.unwrap_offset {
            tracing::debug!(
                camera = %self.camera,
                frame,
                unwrap_offset = next.unwrap_offset,
                "Second counter wrapped"
            );
        }
        self.state = next;

        Ok(DecodedTimestamp { frame, seconds })
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of readings fed so far, malformed ones included.
    pub fn frames_seen(&self) -> usize {
        self.next_frame
    }
}
