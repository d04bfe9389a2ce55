//! Row types of the report tables.

use crate::analysis::{CameraReport, SynchronyReport};
use serde::Serialize;

/// One decoded frame of one camera.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampRow<'a> {
    pub camera: &'a str,
    pub frame: usize,
    pub seconds: f64,
    pub duration: Option<f64>,
    pub dropped: bool,
}

impl<'a> TimestampRow<'a> {
    pub fn from_camera(camera: &'a CameraReport) -> Vec<Self> {
        camera
            .series
            .timestamps
            .iter()
            .zip(camera.durations.durations.iter().zip(&camera.durations.dropped))
            .map(|(ts, (&duration, &dropped))| TimestampRow {
                camera: &camera.camera,
                frame: ts.frame,
                seconds: ts.seconds,
                duration,
                dropped,
            })
            .collect()
    }
}

/// Per-camera summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<'a> {
    pub camera: &'a str,
    pub schema: Option<String>,
    pub frames: usize,
    pub decoded: usize,
    pub decode_failures: usize,
    pub drops: usize,
    pub non_monotonic: usize,
    pub common_frames: usize,
    pub mean_deviation: f64,
    pub max_abs_deviation: f64,
    pub std_deviation: f64,
}

impl<'a> SummaryRow<'a> {
    pub fn from_report(report: &'a SynchronyReport) -> Vec<Self> {
        report
            .cameras
            .iter()
            .map(|camera| {
                let summary = report.synchrony.summary(&camera.camera);
                SummaryRow {
                    camera: &camera.camera,
                    schema: camera.schema.map(|s| s.to_string()),
                    frames: camera.series.frame_count,
                    decoded: camera.series.timestamps.len(),
                    decode_failures: camera.failure_count(),
                    drops: camera.drop_count(),
                    non_monotonic: camera.non_monotonic_count(),
                    common_frames: report.synchrony.common_frames,
                    mean_deviation: summary.map_or(0.0, |s| s.mean),
                    max_abs_deviation: summary.map_or(0.0, |s| s.max_abs),
                    std_deviation: summary.map_or(0.0, |s| s.std_dev),
                }
            })
            .collect()
    }
}

/// One non-fatal condition. Drops are included as conditions of kind
/// `dropped_frame` so the table lists every anomaly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionRow<'a> {
    pub camera: &'a str,
    pub frame: Option<usize>,
    pub kind: &'static str,
    pub detail: String,
}

impl<'a> ConditionRow<'a> {
    pub fn from_report(report: &'a SynchronyReport) -> Vec<Self> {
        let mut rows = Vec::new();
        for camera in &report.cameras {
            rows.extend(camera.conditions.iter().map(|c| ConditionRow {
                camera: &camera.camera,
                frame: c.frame(),
                kind: c.kind(),
                detail: c.to_string(),
            }));

            for (idx, frame) in camera.durations.frames.iter().enumerate() {
                if !camera.durations.dropped[idx] {
                    continue;
                }
                let duration = camera.durations.durations[idx].unwrap_or_default();
                rows.push(ConditionRow {
                    camera: &camera.camera,
                    frame: Some(*frame),
                    kind: "dropped_frame",
                    detail: format!("interval of {duration:.6} s exceeds drop threshold"),
                });
            }
        }
        rows.sort_by_key(|r| (r.camera, r.frame.map_or(0, |f| f + 1)));
        rows
    }
}

/// One row of the `decode` command output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRow {
    pub frame: usize,
    pub second_count: i64,
    pub cycle_count: i64,
    pub cycle_offset: i64,
    pub seconds: Option<f64>,
    /// Host arrival time, for writer logs.
    pub host_time: Option<f64>,
}
