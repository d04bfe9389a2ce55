//! Decoded per-camera timestamp series.

use super::decoder::{CycleDecoder, DecodedTimestamp, MalformedPolicy, MalformedTimestamp};
use super::raw::RawCycleTimestamp;
use crate::condition::Condition;
use serde::Serialize;

/// Ordered decoded timestamps of one camera within one recording.
///
/// `timestamps` is sorted by frame index. Frames that failed to decode are
/// absent from it and listed in `failures`.
#[derive(Debug, Clone, Serialize)]
pub struct CameraSeries {
    /// Camera identifier.
    pub camera: String,
    /// Number of frames (log rows) in the source, decoded or not.
    pub frame_count: usize,
    /// Successfully decoded frames.
    pub timestamps: Vec<DecodedTimestamp>,
    /// Frames skipped because their reading was malformed.
    pub failures: Vec<MalformedTimestamp>,
    /// Warnings found while decoding.
    pub conditions: Vec<Condition>,
}

impl CameraSeries {
    /// A series for a camera whose source held no frames.
    pub fn empty(camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            frame_count: 0,
            timestamps: Vec::new(),
            failures: Vec::new(),
            conditions: vec![Condition::NoData],
        }
    }

    /// Decodes a camera's readings in frame order.
    ///
    /// With [`MalformedPolicy::Abort`] the first malformed reading fails
    /// the whole series.
    pub fn decode<I>(
        camera: impl Into<String>,
        readings: I,
        policy: MalformedPolicy,
    ) -> Result<Self, MalformedTimestamp>
    where
        I: IntoIterator<Item = RawCycleTimestamp>,
    {
        let mut decoder = CycleDecoder::new(camera);
        let mut timestamps = Vec::new();
        let mut failures = Vec::new();

        for raw in readings {
            match decoder.decode(raw) {
                Ok(ts) => timestamps.push(ts),
                Err(err) => match policy {
                    MalformedPolicy::Abort => return Err(err),
                    MalformedPolicy::Skip => {
                        tracing::debug!(error = %err, "Skipping malformed reading");
                        failures.push(err);
                    }
                },
            }
        }

        let mut series = Self {
            camera: decoder.camera().to_string(),
            frame_count: decoder.frames_seen(),
            timestamps,
            failures,
            conditions: Vec::new(),
        };
        series.conditions = series.check();

        tracing::debug!(
            camera = %series.camera,
            frames = series.frame_count,
            decoded = series.timestamps.len(),
            failures = series.failures.len(),
            "Decoded series"
        );
        Ok(series)
    }

    /// Finds the all-zero and non-monotonic warnings.
    fn check(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();

        if !self.timestamps.is_empty() && self.timestamps.iter().all(|ts| ts.seconds == 0.0) {
            conditions.push(Condition::AllZeroTimestamps {
                frames: self.timestamps.len(),
            });
        }

        for pair in self.timestamps.windows(2) {
            if pair[1].seconds < pair[0].seconds {
                conditions.push(Condition::NonMonotonicTimestamp {
                    frame: pair[1].frame,
                    previous: pair[0].seconds,
                    current: pair[1].seconds,
                });
            }
        }

        conditions
    }

    /// Decoded seconds at a frame, if that frame decoded.
    pub fn seconds_at(&self, frame: usize) -> Option<f64> {
        self.timestamps
            .binary_search_by_key(&frame, |ts| ts.frame)
            .ok()
            .map(|idx| self.timestamps[idx].seconds)
    }

    /// Decoded values indexed by frame, `None` where decoding failed.
    pub fn dense(&self) -> Vec<Option<f64>> {
        let mut dense = vec![None; self.frame_count];
        for ts in &self.timestamps {
            dense[ts.frame] = Some(ts.seconds);
        }
        dense
    }

    /// Decoded values in frame order.
    pub fn seconds(&self) -> Vec<f64> {
        self.timestamps.iter().map(|ts| ts.seconds).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// True when the all-zero warning was raised.
    pub fn is_all_zero(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Condition::AllZeroTimestamps { .. }))
    }

    /// Frame indices of non-monotonic decoded values.
    pub fn non_monotonic_frames(&self) -> Vec<usize> {
        self.conditions
            .iter()
            .filter_map(|c| match c {
                Condition::NonMonotonicTimestamp { frame, .. } => Some(*frame),
                _ => None,
            })
            .collect()
    }

    /// Frame indices that failed to decode.
    pub fn failed_frames(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.frame).collect()
    }

    /// Decode warnings plus one entry per decode failure, ordered by frame.
    pub fn all_conditions(&self) -> Vec<Condition> {
        let mut all: Vec<Condition> = self.conditions.clone();
        all.extend(self.failures.iter().map(Condition::from));
        all.sort_by_key(|c| c.frame().map_or(0, |f| f + 1));
        all
    }
}
