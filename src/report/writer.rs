//! Writing report tables to disk.

use super::tables::{ConditionRow, DecodedRow, SummaryRow, TimestampRow};
use crate::analysis::SynchronyReport;
use crate::loader::CameraLog;
use crate::timestamp::CameraSeries;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Writes recording reports as CSV tables into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    directory: PathBuf,
}

impl ReportWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes the four tables of one recording and returns their paths.
    pub fn write(&self, report: &SynchronyReport) -> Result<Vec<PathBuf>, ReportError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| ReportError::CreateDir {
            path: self.directory.clone(),
            source,
        })?;

        let stem = file_stem(&report.recording);
        let timestamps = self.directory.join(format!("{stem}-timestamps.csv"));
        let deviations = self.directory.join(format!("{stem}-deviations.csv"));
        let summary = self.directory.join(format!("{stem}-summary.csv"));
        let conditions = self.directory.join(format!("{stem}-conditions.csv"));

        let rows: Vec<TimestampRow<'_>> = report
            .cameras
            .iter()
            .flat_map(TimestampRow::from_camera)
            .collect();
        write_rows(&timestamps, &rows)?;
        write_deviations(&deviations, report)
            .map_err(|source| ReportError::Csv {
                path: deviations.clone(),
                source,
            })?;
        write_rows(&summary, &SummaryRow::from_report(report))?;
        write_rows(&conditions, &ConditionRow::from_report(report))?;

        tracing::info!(
            recording = %report.recording,
            directory = %self.directory.display(),
            "Wrote report tables"
        );
        Ok(vec![timestamps, deviations, summary, conditions])
    }

    /// Writes every report, continuing past failures.
    ///
    /// Returns the recordings whose tables could not be written.
    pub fn write_all<'a, I>(&self, reports: I) -> Vec<(String, ReportError)>
    where
        I: IntoIterator<Item = &'a SynchronyReport>,
    {
        let mut failures = Vec::new();
        for report in reports {
            if let Err(err) = self.write(report) {
                tracing::error!(recording = %report.recording, error = %err, "Failed to write report");
                failures.push((report.recording.clone(), err));
            }
        }
        failures
    }
}

/// Writes one log's decoded readings, one row per input frame.
pub fn write_decoded<W: Write>(
    log: &CameraLog,
    series: &CameraSeries,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (frame, (row, seconds)) in log.rows.iter().zip(series.dense()).enumerate() {
        wtr.serialize(DecodedRow {
            frame,
            second_count: row.raw.second_count,
            cycle_count: row.raw.cycle_count,
            cycle_offset: row.raw.cycle_offset,
            seconds,
            host_time: row.host_time,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| csv_err(e.into()))?;
    Ok(())
}

fn write_deviations(path: &Path, report: &SynchronyReport) -> Result<(), csv::Error> {
    let table = &report.synchrony;
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["frame".to_string(), "mean".to_string()];
    header.extend(table.cameras.iter().cloned());
    wtr.write_record(&header)?;

    for row in &table.frames {
        let mut record = vec![row.frame.to_string(), format_opt(row.mean)];
        record.extend(row.deviations.iter().map(|d| format_opt(*d)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Recording names become file name prefixes.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DropThresholds, Recording};
    use crate::loader::read_log;
    use crate::timestamp::{MalformedPolicy, RawCycleTimestamp};

    fn series(camera: &str, offset: i64) -> CameraSeries {
        let readings = (0..5).map(|i| RawCycleTimestamp::new(1, offset + 267 * i, 0));
        CameraSeries::decode(camera, readings, MalformedPolicy::Skip).unwrap()
    }

    #[test]
    fn test_file_stem_sanitized() {
        assert_eq!(file_stem("day 1/session:2"), "day_1_session_2");
        assert_eq!(file_stem("run-3_a.b"), "run-3_a.b");
    }

    #[test]
    fn test_write_report_tables() {
        let dir = tempfile::tempdir().unwrap();
        let recording = Recording::new("session 1", vec![series("cam0", 0), series("cam1", 8)]);
        let report = recording.analyze(&DropThresholds::default());

        let paths = ReportWriter::new(dir.path()).write(&report).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));

        let deviations = std::fs::read_to_string(dir.path().join("session_1-deviations.csv")).unwrap();
        let mut lines = deviations.lines();
        assert_eq!(lines.next(), Some("frame,mean,cam0,cam1"));
        assert_eq!(lines.count(), 5);

        let timestamps = std::fs::read_to_string(dir.path().join("session_1-timestamps.csv")).unwrap();
        let mut lines = timestamps.lines();
        assert_eq!(lines.next(), Some("camera,frame,seconds,duration,dropped"));
        assert!(lines.next().unwrap().starts_with("cam0,0,1.0,,false"));

        let summary = std::fs::read_to_string(dir.path().join("session_1-summary.csv")).unwrap();
        assert_eq!(summary.lines().count(), 3);
    }

    #[test]
    fn test_write_all_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a table file should go makes that write fail
        std::fs::create_dir(dir.path().join("first-timestamps.csv")).unwrap();

        let thresholds = DropThresholds::default();
        let first = Recording::new("first", vec![series("cam0", 0)]).analyze(&thresholds);
        let second = Recording::new("second", vec![series("cam0", 0)]).analyze(&thresholds);

        let failures = ReportWriter::new(dir.path()).write_all([&first, &second]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "first");
        assert!(matches!(failures[0].1, ReportError::Csv { .. }));
        assert!(dir.path().join("second-summary.csv").exists());
    }

    #[test]
    fn test_conditions_table_lists_drops_and_failures() {
        let readings = vec![
            RawCycleTimestamp::new(1, 0, 0),
            RawCycleTimestamp::new(1, 267, 0),
            RawCycleTimestamp::new(1, 534, 0),
            RawCycleTimestamp::new(1, 3000, 0),
            RawCycleTimestamp::new(1, 9999, 0),
        ];
        let series = CameraSeries::decode("cam0", readings, MalformedPolicy::Skip).unwrap();
        let report = Recording::new("r", vec![series]).analyze(&DropThresholds::default());

        let rows = ConditionRow::from_report(&report);
        let kinds: Vec<_> = rows.iter().map(|r| (r.frame, r.kind)).collect();
        assert_eq!(
            kinds,
            vec![(Some(3), "dropped_frame"), (Some(4), "decode_failure")]
        );
    }

    #[test]
    fn test_write_decoded() {
        let text = "cycleSeconds,cycleCount,cycleOffset\n1,4000,0\n1,8000,0\n";
        let log = read_log("cam0", text.as_bytes(), None, Path::new("cam0.csv")).unwrap();
        let series = CameraSeries::decode("cam0", log.readings(), MalformedPolicy::Skip).unwrap();

        let mut out = Vec::new();
        write_decoded(&log, &series, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "frame,second_count,cycle_count,cycle_offset,seconds,host_time");
        assert_eq!(lines[1], "0,1,4000,0,1.5,");
        assert_eq!(lines[2], "1,1,8000,0,,");
    }

    #[test]
    fn test_write_decoded_keeps_host_time_and_negative_fields() {
        let text = "seconds,microSeconds,cycleSeconds,cycleCount,cycleOffset\n\
10,500000,1,4000,0\n\
10,250000,1,-1,0\n";
        let log = read_log("cam0", text.as_bytes(), None, Path::new("cam0.csv")).unwrap();
        let series = CameraSeries::decode("cam0", log.readings(), MalformedPolicy::Skip).unwrap();

        let mut out = Vec::new();
        write_decoded(&log, &series, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "0,1,4000,0,1.5,10.5");
        assert_eq!(lines[2], "1,1,-1,0,,10.25");
    }
}
