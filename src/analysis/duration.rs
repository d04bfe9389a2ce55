//! Inter-frame durations and dropped-frame flags.
//!
//! Durations are taken between consecutive decoded frames. A duration is
//! flagged when it exceeds a multiple of the running median of the
//! durations before it. Flags are the only output; missing frames are
//! never interpolated.

use super::median::RunningMedian;
use super::threshold::DropThresholds;
use crate::condition::Condition;
use crate::timestamp::CameraSeries;
use serde::Serialize;

/// Per-frame durations and drop flags, parallel to a series' decoded
/// timestamps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameDurations {
    /// Frame index of each decoded timestamp.
    pub frames: Vec<usize>,
    /// Time since the previous decoded frame; `None` for the first.
    pub durations: Vec<Option<f64>>,
    /// Whether the interval ending at this frame looks like a drop.
    pub dropped: Vec<bool>,
}

impl FrameDurations {
    /// Computes durations and drop flags for one camera.
    pub fn from_series(series: &CameraSeries, thresholds: &DropThresholds) -> Self {
        let frames: Vec<usize> = series.timestamps.iter().map(|ts| ts.frame).collect();
        let intervals: Vec<f64> = series
            .timestamps
            .windows(2)
            .map(|pair| pair[1].seconds - pair[0].seconds)
            .collect();
        let flags = flag_drops(&intervals, thresholds);

        let mut durations = Vec::with_capacity(frames.len());
        let mut dropped = Vec::with_capacity(frames.len());
        if !frames.is_empty() {
            durations.push(None);
            dropped.push(false);
        }
        durations.extend(intervals.iter().copied().map(Some));
        dropped.extend(flags);

        let result = Self {
            frames,
            durations,
            dropped,
        };

        tracing::debug!(
            camera = %series.camera,
            intervals = intervals.len(),
            drops = result.drop_count(),
            "Computed frame durations"
        );
        result
    }

    /// Frames whose preceding interval was flagged.
    pub fn drop_frames(&self) -> Vec<usize> {
        self.frames
            .iter()
            .zip(&self.dropped)
            .filter(|&(_, &dropped)| dropped)
            .map(|(&frame, _)| frame)
            .collect()
    }

    pub fn drop_count(&self) -> usize {
        self.dropped.iter().filter(|&&d| d).count()
    }

    /// The defined durations, without the leading `None`.
    pub fn intervals(&self) -> Vec<f64> {
        self.durations.iter().flatten().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Flags each interval against the running median of the intervals
/// before it. The first interval has no history and is never flagged.
pub fn flag_drops(intervals: &[f64], thresholds: &DropThresholds) -> Vec<bool> {
    let mut median = RunningMedian::new(thresholds.window);
    intervals
        .iter()
        .map(|&duration| {
            let flagged = median
                .median()
                .is_some_and(|m| thresholds.is_drop(duration, m));
            if flagged {
                tracing::trace!(duration, median = median.median(), "Interval exceeds threshold");
            }
            median.push(duration);
            flagged
        })
        .collect()
}

/// Reports jumps of the embedded frame counter between consecutive rows.
///
/// Rows without a counter are skipped over; a counter that goes backwards
/// (e.g. a 32-bit rollover) is not reported.
pub fn frame_counter_gaps(counters: &[Option<u64>]) -> Vec<Condition> {
    let mut gaps = Vec::new();
    let mut previous: Option<u64> = None;

    for (frame, counter) in counters.iter().enumerate() {
        let Some(counter) = *counter else {
            continue;
        };
        if let Some(prev) = previous {
            if prev.checked_add(1).is_some_and(|next| counter > next) {
                gaps.push(Condition::FrameCounterGap {
                    frame,
                    missing: counter - prev - 1,
                });
            }
        }
        previous = Some(counter);
    }

    gaps
}
