//! Cross-camera synchrony.
//!
//! Series are compared by frame index over the range every camera covers.
//! For each frame the mean decoded time across cameras is the reference,
//! and each camera's deviation is its own time minus that mean.

use super::statistics::DeviationSummary;
use crate::timestamp::CameraSeries;
use serde::Serialize;

/// Deviations at one frame index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDeviation {
    pub frame: usize,
    /// Mean decoded time across cameras that decoded this frame.
    pub mean: Option<f64>,
    /// One entry per camera, in recording order. `None` where the camera's
    /// frame failed to decode.
    pub deviations: Vec<Option<f64>>,
}

/// Synchrony of a recording over its common frame range.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynchronyTable {
    /// Camera ids in column order.
    pub cameras: Vec<String>,
    /// Number of frames in the common range.
    pub common_frames: usize,
    /// One row per frame in the common range.
    pub frames: Vec<FrameDeviation>,
    /// Per-camera deviation summaries, in column order.
    pub summaries: Vec<DeviationSummary>,
}

impl SynchronyTable {
    /// Compares the series of one recording.
    ///
    /// The common range is `0..min(frame_count)`; it is empty when there
    /// are no series or any series is empty. A single camera is valid and
    /// gives all-zero deviations.
    pub fn compute(series: &[CameraSeries]) -> Self {
        let cameras: Vec<String> = series.iter().map(|s| s.camera.clone()).collect();
        let common_frames = series.iter().map(|s| s.frame_count).min().unwrap_or(0);
        let dense: Vec<Vec<Option<f64>>> = series.iter().map(CameraSeries::dense).collect();

        let frames: Vec<FrameDeviation> = (0..common_frames)
            .map(|frame| {
                let values: Vec<Option<f64>> = dense.iter().map(|d| d[frame]).collect();
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                let mean = if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                };
                let deviations = values
                    .iter()
                    .map(|v| Some(v.as_ref()? - mean?))
                    .collect();
                FrameDeviation {
                    frame,
                    mean,
                    deviations,
                }
            })
            .collect();

        let summaries = cameras
            .iter()
            .enumerate()
            .map(|(idx, camera)| {
                let deviations: Vec<f64> = frames.iter().filter_map(|f| f.deviations[idx]).collect();
                DeviationSummary::compute(camera.clone(), &deviations)
            })
            .collect();

        if series.len() > 1 {
            tracing::debug!(
                cameras = cameras.len(),
                common_frames,
                "Computed cross-camera deviations"
            );
        }

        Self {
            cameras,
            common_frames,
            frames,
            summaries,
        }
    }

    /// Deviation series of one camera over the common range.
    pub fn camera_deviations(&self, camera: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.cameras.iter().position(|c| c == camera)?;
        Some(self.frames.iter().map(|f| f.deviations[idx]).collect())
    }

    /// Summary of one camera.
    pub fn summary(&self, camera: &str) -> Option<&DeviationSummary> {
        self.summaries.iter().find(|s| s.camera == camera)
    }

    /// Largest absolute deviation of any camera.
    pub fn max_abs_deviation(&self) -> f64 {
        self.summaries.iter().fold(0.0, |acc, s| acc.max(s.max_abs))
    }
}
