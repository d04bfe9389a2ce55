//! Metrics collection and registry.

use crate::analysis::SynchronyReport;
use prometheus::{Encoder, GaugeVec, IntCounter, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("failed to write metrics: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts taken from one finished report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Input frames over all cameras.
    pub frames: u64,
    /// Frames that decoded.
    pub frames_decoded: u64,
    /// Frames skipped as malformed.
    pub decode_failures: u64,
    /// Intervals flagged as drops.
    pub drops: u64,
    /// Non-monotonic decoded frames.
    pub non_monotonic: u64,
    /// Frames in the common cross-camera range.
    pub common_frames: u64,
    /// Largest absolute deviation per camera.
    pub max_abs_deviation: Vec<(String, f64)>,
}

impl MetricsSnapshot {
    /// Creates a snapshot from a recording's report.
    pub fn from_report(report: &SynchronyReport) -> Self {
        let mut snapshot = Self {
            common_frames: report.synchrony.common_frames as u64,
            ..Default::default()
        };
        for camera in &report.cameras {
            snapshot.frames += camera.series.frame_count as u64;
            snapshot.frames_decoded += camera.series.timestamps.len() as u64;
            snapshot.decode_failures += camera.failure_count() as u64;
            snapshot.drops += camera.drop_count() as u64;
            snapshot.non_monotonic += camera.non_monotonic_count() as u64;
        }
        snapshot.max_abs_deviation = report
            .synchrony
            .summaries
            .iter()
            .map(|s| (s.camera.clone(), s.max_abs))
            .collect();
        snapshot
    }
}

/// Prometheus metrics registry for a batch of analyses.
pub struct MetricsRegistry {
    registry: Registry,

    recordings_analyzed: IntCounter,
    recordings_failed: IntCounter,

    frames_total: IntCounter,
    frames_decoded_total: IntCounter,
    decode_failures_total: IntCounter,
    dropped_frames_total: IntCounter,
    non_monotonic_total: IntCounter,

    common_frames: IntGaugeVec,
    max_abs_deviation: GaugeVec,
}

impl MetricsRegistry {
    /// Creates a new registry with all metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let recordings_analyzed = IntCounter::new(
            "cycle_sync_recordings_analyzed_total",
            "Recordings analyzed successfully",
        )?;
        let recordings_failed = IntCounter::new(
            "cycle_sync_recordings_failed_total",
            "Recordings whose analysis was aborted",
        )?;

        let frames_total = IntCounter::new("cycle_sync_frames_total", "Input frames read")?;
        let frames_decoded_total =
            IntCounter::new("cycle_sync_frames_decoded_total", "Frames decoded")?;
        let decode_failures_total = IntCounter::new(
            "cycle_sync_decode_failures_total",
            "Frames skipped because of malformed timestamps",
        )?;
        let dropped_frames_total = IntCounter::new(
            "cycle_sync_dropped_frames_total",
            "Frame intervals flagged as drops",
        )?;
        let non_monotonic_total = IntCounter::new(
            "cycle_sync_non_monotonic_total",
            "Decoded timestamps earlier than their predecessor",
        )?;

        let common_frames = IntGaugeVec::new(
            Opts::new(
                "cycle_sync_common_frames",
                "Frames in the common cross-camera range",
            ),
            &["recording"],
        )?;
        let max_abs_deviation = GaugeVec::new(
            Opts::new(
                "cycle_sync_max_abs_deviation_seconds",
                "Largest absolute deviation from the cross-camera mean",
            ),
            &["recording", "camera"],
        )?;

        registry.register(Box::new(recordings_analyzed.clone()))?;
        registry.register(Box::new(recordings_failed.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(frames_decoded_total.clone()))?;
        registry.register(Box::new(decode_failures_total.clone()))?;
        registry.register(Box::new(dropped_frames_total.clone()))?;
        registry.register(Box::new(non_monotonic_total.clone()))?;
        registry.register(Box::new(common_frames.clone()))?;
        registry.register(Box::new(max_abs_deviation.clone()))?;

        Ok(Self {
            registry,
            recordings_analyzed,
            recordings_failed,
            frames_total,
            frames_decoded_total,
            decode_failures_total,
            dropped_frames_total,
            non_monotonic_total,
            common_frames,
            max_abs_deviation,
        })
    }

    /// Adds one analyzed recording.
    pub fn update(&self, recording: &str, snapshot: &MetricsSnapshot) {
        self.recordings_analyzed.inc();
        self.frames_total.inc_by(snapshot.frames);
        self.frames_decoded_total.inc_by(snapshot.frames_decoded);
        self.decode_failures_total.inc_by(snapshot.decode_failures);
        self.dropped_frames_total.inc_by(snapshot.drops);
        self.non_monotonic_total.inc_by(snapshot.non_monotonic);

        self.common_frames
            .with_label_values(&[recording])
            .set(snapshot.common_frames as i64);
        for (camera, max_abs) in &snapshot.max_abs_deviation {
            self.max_abs_deviation
                .with_label_values(&[recording, camera.as_str()])
                .set(*max_abs);
        }
    }

    /// Adds one analyzed recording from its report.
    pub fn observe(&self, report: &SynchronyReport) {
        self.update(&report.recording, &MetricsSnapshot::from_report(report));
    }

    /// Counts an aborted recording.
    pub fn record_failure(&self) {
        self.recordings_failed.inc();
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the text encoding to a file.
    pub fn write_to(&self, path: impl AsRef<std::path::Path>) -> Result<(), MetricsError> {
        std::fs::write(path, self.encode()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DropThresholds, Recording};
    use crate::timestamp::{CameraSeries, MalformedPolicy, RawCycleTimestamp};

    fn report() -> SynchronyReport {
        let readings = vec![
            RawCycleTimestamp::new(1, 0, 0),
            RawCycleTimestamp::new(1, 267, 0),
            RawCycleTimestamp::new(1, 534, 0),
            RawCycleTimestamp::new(1, 3000, 0),
            RawCycleTimestamp::new(1, 9999, 0),
        ];
        let series = CameraSeries::decode("cam0", readings, MalformedPolicy::Skip).unwrap();
        Recording::new("r1", vec![series]).analyze(&DropThresholds::default())
    }

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_snapshot_from_report() {
        let snapshot = MetricsSnapshot::from_report(&report());
        assert_eq!(snapshot.frames, 5);
        assert_eq!(snapshot.frames_decoded, 4);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.drops, 1);
        assert_eq!(snapshot.common_frames, 5);
        assert_eq!(snapshot.max_abs_deviation, vec![("cam0".to_string(), 0.0)]);
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();
        registry.observe(&report());
        registry.record_failure();

        let output = registry.encode().unwrap();
        assert!(output.contains("cycle_sync_recordings_analyzed_total 1"));
        assert!(output.contains("cycle_sync_recordings_failed_total 1"));
        assert!(output.contains("cycle_sync_frames_total 5"));
        assert!(output.contains("cycle_sync_dropped_frames_total 1"));
        assert!(output.contains("cycle_sync_common_frames{recording=\"r1\"} 5"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("cycle_sync_frames_total"));
        assert!(output.contains("cycle_sync_decode_failures_total"));
    }
}
