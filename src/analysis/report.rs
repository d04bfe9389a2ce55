//! Per-recording analysis results.

use super::duration::FrameDurations;
use super::synchrony::SynchronyTable;
use super::threshold::DropThresholds;
use crate::condition::Condition;
use crate::loader::SchemaKind;
use crate::timestamp::CameraSeries;
use serde::Serialize;

/// A named group of camera series captured in one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recording {
    pub name: String,
    pub series: Vec<CameraSeries>,
    /// Schema each series was loaded with, parallel to `series`; `None`
    /// for series built in memory or from an empty source.
    #[serde(skip)]
    pub schemas: Vec<Option<SchemaKind>>,
}

impl Recording {
    pub fn new(name: impl Into<String>, series: Vec<CameraSeries>) -> Self {
        let schemas = vec![None; series.len()];
        Self {
            name: name.into(),
            series,
            schemas,
        }
    }

    /// Runs duration, drop and synchrony analysis.
    pub fn analyze(&self, thresholds: &DropThresholds) -> SynchronyReport {
        SynchronyReport::build(self, thresholds)
    }
}

/// Everything derived for one camera.
#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    pub camera: String,
    pub schema: Option<SchemaKind>,
    pub series: CameraSeries,
    pub durations: FrameDurations,
    /// All non-fatal conditions, ordered by frame.
    pub conditions: Vec<Condition>,
}

impl CameraReport {
    pub fn drop_count(&self) -> usize {
        self.durations.drop_count()
    }

    pub fn failure_count(&self) -> usize {
        self.series.failures.len()
    }

    pub fn non_monotonic_count(&self) -> usize {
        self.conditions
            .iter()
            .filter(|c| matches!(c, Condition::NonMonotonicTimestamp { .. }))
            .count()
    }
}

/// Analysis output for one recording.
#[derive(Debug, Clone, Serialize)]
pub struct SynchronyReport {
    pub recording: String,
    pub thresholds: DropThresholds,
    pub cameras: Vec<CameraReport>,
    pub synchrony: SynchronyTable,
}

impl SynchronyReport {
    /// Builds the report. Pure function of the recording and thresholds.
    pub fn build(recording: &Recording, thresholds: &DropThresholds) -> Self {
        let cameras: Vec<CameraReport> = recording
            .series
            .iter()
            .enumerate()
            .map(|(idx, series)| {
                let durations = FrameDurations::from_series(series, thresholds);
                CameraReport {
                    camera: series.camera.clone(),
                    schema: recording.schemas.get(idx).copied().flatten(),
                    conditions: series.all_conditions(),
                    series: series.clone(),
                    durations,
                }
            })
            .collect();

        let synchrony = SynchronyTable::compute(&recording.series);

        let report = Self {
            recording: recording.name.clone(),
            thresholds: *thresholds,
            cameras,
            synchrony,
        };

        tracing::info!(
            recording = %report.recording,
            cameras = report.cameras.len(),
            common_frames = report.synchrony.common_frames,
            drops = report.total_drops(),
            conditions = report.total_conditions(),
            "Analyzed recording"
        );
        report
    }

    pub fn camera(&self, camera: &str) -> Option<&CameraReport> {
        self.cameras.iter().find(|c| c.camera == camera)
    }

    pub fn total_drops(&self) -> usize {
        self.cameras.iter().map(CameraReport::drop_count).sum()
    }

    pub fn total_conditions(&self) -> usize {
        self.cameras.iter().map(|c| c.conditions.len()).sum()
    }

    /// Logs every non-fatal condition at warn level.
    pub fn log_conditions(&self) {
        for camera in &self.cameras {
            for condition in &camera.conditions {
                condition.log(&camera.camera);
            }
        }
    }
}
