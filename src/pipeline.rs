//! Loading, decoding and analyzing recordings.
//!
//! ```text
//! log rows → decode → durations/drops → synchrony → report
//! ```
//!
//! Per-frame problems stay local to their series. A structural failure
//! (unreadable log, unknown schema, or a malformed reading under the abort
//! policy) aborts its recording but never the rest of a batch.

use crate::analysis::{frame_counter_gaps, Recording, SynchronyReport};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::loader::{CameraSource, RecordingSource, SchemaKind};
use crate::timestamp::CameraSeries;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs the analysis with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Loads and decodes one camera's log.
    ///
    /// An empty source yields an empty series carrying a `NoData`
    /// condition rather than an error.
    pub fn load_camera(&self, source: &CameraSource) -> Result<(CameraSeries, Option<SchemaKind>)> {
        let log = match source.load() {
            Ok(log) => log,
            Err(err) if err.is_no_data() => {
                tracing::warn!(camera = %source.camera, error = %err, "Empty timestamp log");
                return Ok((CameraSeries::empty(&source.camera), None));
            }
            Err(err) => return Err(err.into()),
        };

        let mut series =
            CameraSeries::decode(&log.camera, log.readings(), self.config.decode.on_malformed)?;
        series.conditions.extend(frame_counter_gaps(&log.frame_counters()));
        Ok((series, Some(log.schema)))
    }

    /// Loads and decodes every camera of a recording.
    pub fn load_recording(&self, source: &RecordingSource) -> Result<Recording> {
        #[cfg(feature = "parallel")]
        let cameras = source.cameras.par_iter();
        #[cfg(not(feature = "parallel"))]
        let cameras = source.cameras.iter();

        let loaded: Vec<(CameraSeries, Option<SchemaKind>)> = cameras
            .map(|camera| self.load_camera(camera))
            .collect::<Result<_>>()?;
        let (series, schemas) = loaded.into_iter().unzip();

        Ok(Recording {
            name: source.name.clone(),
            series,
            schemas,
        })
    }

    /// Loads and analyzes one recording.
    pub fn analyze(&self, source: &RecordingSource) -> Result<SynchronyReport> {
        tracing::info!(
            recording = %source.name,
            cameras = source.cameras.len(),
            "Analyzing recording"
        );
        let recording = self
            .load_recording(source)
            .map_err(|e| e.in_recording(&source.name))?;
        let report = recording.analyze(&self.config.drops);
        report.log_conditions();
        Ok(report)
    }

    /// Analyzes every recording; one failure does not stop the others.
    pub fn analyze_batch(&self, sources: &[RecordingSource]) -> BatchOutcome {
        #[cfg(feature = "parallel")]
        let iter = sources.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = sources.iter();

        let results = iter
            .map(|source| {
                let result = self.analyze(source);
                if let Err(ref err) = result {
                    tracing::error!(recording = %source.name, error = %err, "Recording failed");
                }
                (source.name.clone(), result)
            })
            .collect();

        BatchOutcome { results }
    }
}

/// Per-recording results of a batch, in input order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<(String, Result<SynchronyReport>)>,
}

impl BatchOutcome {
    pub fn reports(&self) -> impl Iterator<Item = &SynchronyReport> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `Err(BatchFailed)` if any recording failed.
    pub fn check(&self) -> Result<()> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(Error::BatchFailed {
                failed,
                total: self.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::config::DecodeConfig;
    use crate::loader::LoadError;
    use crate::timestamp::MalformedPolicy;
    use std::path::Path;

    fn write(dir: &Path, name: &str, text: &str) -> CameraSource {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        CameraSource::new(path)
    }

    #[test]
    fn test_empty_source_becomes_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "cam0.csv", "");

        let (series, schema) = Pipeline::default().load_camera(&source).unwrap();
        assert!(series.is_empty());
        assert_eq!(schema, None);
        assert_eq!(series.conditions, vec![Condition::NoData]);
    }

    #[test]
    fn test_frame_counter_gaps_attached() {
        let dir = tempfile::tempdir().unwrap();
        let text = "\
timestamp.second_count,timestamp.cycle_count,timestamp.cycle_offset,frameCounter
1,0,0,100
1,267,0,101
1,801,0,103
";
        let source = write(dir.path(), "cam0.csv", text);
        let (series, schema) = Pipeline::default().load_camera(&source).unwrap();

        assert_eq!(schema, Some(SchemaKind::Extractor));
        assert!(series
            .conditions
            .contains(&Condition::FrameCounterGap { frame: 2, missing: 1 }));
    }

    #[test]
    fn test_abort_policy_fails_recording() {
        let dir = tempfile::tempdir().unwrap();
        let recording = RecordingSource::new("bad")
            .with_camera(write(dir.path(), "cam0.csv", "cycleSeconds,cycleCount,cycleOffset\n1,0,0\n1,9000,0\n"));

        let pipeline = Pipeline::new(AnalysisConfig {
            decode: DecodeConfig {
                on_malformed: MalformedPolicy::Abort,
            },
            ..Default::default()
        });
        match pipeline.analyze(&recording) {
            Err(Error::Recording { recording, source }) => {
                assert_eq!(recording, "bad");
                assert!(matches!(*source, Error::Malformed(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let report = Pipeline::default().analyze(&recording).unwrap();
        assert_eq!(report.cameras[0].series.failed_frames(), vec![1]);
    }

    #[test]
    fn test_negative_reading_skipped_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let recording = RecordingSource::new("r").with_camera(write(
            dir.path(),
            "cam0.csv",
            "cycleSeconds,cycleCount,cycleOffset\n1,0,0\n1,-1,0\n1,534,0\n",
        ));

        let report = Pipeline::default().analyze(&recording).unwrap();
        let camera = &report.cameras[0];
        assert_eq!(camera.series.failed_frames(), vec![1]);
        assert_eq!(camera.series.timestamps.len(), 2);
        assert_eq!(camera.series.failures[0].value, -1);
        assert_eq!(report.synchrony.common_frames, 3);
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = RecordingSource::new("good")
            .with_camera(write(dir.path(), "a.csv", "cycleSeconds,cycleCount,cycleOffset\n1,0,0\n1,267,0\n"))
            .with_camera(write(dir.path(), "b.csv", "cycleSeconds,cycleCount,cycleOffset\n1,8,0\n1,275,0\n"));
        let broken = RecordingSource::new("broken")
            .with_camera(write(dir.path(), "c.csv", "x,y\n1,2\n"));
        let missing = RecordingSource::new("missing")
            .with_camera(CameraSource::new(dir.path().join("nope.csv")));

        let outcome = Pipeline::default().analyze_batch(&[broken, good, missing]);

        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.failed_count(), 2);
        let reports: Vec<_> = outcome.reports().collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].recording, "good");
        assert_eq!(reports[0].synchrony.common_frames, 2);

        let (name, err) = outcome.failures().next().unwrap();
        assert_eq!(name, "broken");
        match err {
            Error::Recording { source, .. } => {
                assert!(matches!(**source, Error::Load(LoadError::UnknownSchema { .. })))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            outcome.check(),
            Err(Error::BatchFailed { failed: 2, total: 3 })
        ));
    }
}
