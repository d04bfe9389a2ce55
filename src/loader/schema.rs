//! Log schemas and their normalization into [`LogRow`]s.
//!
//! Two upstream producers write per-frame timestamp logs with different
//! columns: the capture-side video writer and the embedded-pixel
//! extractor. Each gets one [`LogSchema`] adapter; everything downstream
//! only sees [`LogRow`].

use crate::timestamp::RawCycleTimestamp;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which producer wrote a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Timestamps logged by the video writer alongside each recorded frame.
    Writer,
    /// Timestamps extracted from the pixel data of a recorded video.
    Extractor,
}

impl SchemaKind {
    /// The adapter for this schema.
    pub fn schema(self) -> &'static dyn LogSchema {
        match self {
            SchemaKind::Writer => &WriterLog,
            SchemaKind::Extractor => &ExtractorLog,
        }
    }

    /// Picks the first schema whose required columns are all present.
    pub fn detect(header: &Header) -> Option<SchemaKind> {
        [SchemaKind::Extractor, SchemaKind::Writer]
            .into_iter()
            .find(|kind| kind.schema().matches(header))
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Writer => f.write_str("writer"),
            SchemaKind::Extractor => f.write_str("extractor"),
        }
    }
}

/// One normalized log row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogRow {
    /// The three cycle-timer fields.
    pub raw: RawCycleTimestamp,
    /// Embedded frame counter, when the log carries one.
    pub frame_counter: Option<u64>,
    /// Host arrival time in seconds, when the log carries one.
    pub host_time: Option<f64>,
}

/// A field that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub column: String,
    pub value: String,
}

/// Column positions of a log's header row.
#[derive(Debug, Clone, Default)]
pub struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    pub fn from_record(record: &StringRecord) -> Self {
        let columns = record
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        Self { columns }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.columns.contains_key(*name))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn parse<T: FromStr>(&self, record: &StringRecord, name: &str) -> Result<Option<T>, FieldError> {
        let Some(value) = self.position(name).and_then(|idx| record.get(idx)) else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some).map_err(|_| FieldError {
            column: name.to_string(),
            value: value.to_string(),
        })
    }

    fn require<T: FromStr>(&self, record: &StringRecord, name: &str) -> Result<T, FieldError> {
        self.parse(record, name)?.ok_or_else(|| FieldError {
            column: name.to_string(),
            value: String::new(),
        })
    }
}

/// Adapter from one producer's columns to [`LogRow`].
pub trait LogSchema: Send + Sync {
    /// Which schema this is.
    fn kind(&self) -> SchemaKind;

    /// Columns that must be present.
    fn required_columns(&self) -> &'static [&'static str];

    /// True when the header carries every required column.
    fn matches(&self, header: &Header) -> bool {
        header.has_all(self.required_columns())
    }

    /// Converts one data row.
    fn normalize(&self, header: &Header, record: &StringRecord) -> Result<LogRow, FieldError>;
}

/// Log written by the video writer, one row per recorded frame.
///
/// `cycleSeconds` holds the 7-bit second count; `seconds` and
/// `microSeconds` are the host arrival time.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterLog;

impl WriterLog {
    const SECOND_COUNT: &'static str = "cycleSeconds";
    const CYCLE_COUNT: &'static str = "cycleCount";
    const CYCLE_OFFSET: &'static str = "cycleOffset";
    const HOST_SECONDS: &'static str = "seconds";
    const HOST_MICROS: &'static str = "microSeconds";
}

impl LogSchema for WriterLog {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Writer
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[Self::SECOND_COUNT, Self::CYCLE_COUNT, Self::CYCLE_OFFSET]
    }

    fn normalize(&self, header: &Header, record: &StringRecord) -> Result<LogRow, FieldError> {
        let raw = RawCycleTimestamp::new(
            header.require(record, Self::SECOND_COUNT)?,
            header.require(record, Self::CYCLE_COUNT)?,
            header.require(record, Self::CYCLE_OFFSET)?,
        );

        // Host time is informational; an unreadable value only drops it
        let seconds: Option<u64> = header.parse(record, Self::HOST_SECONDS).unwrap_or_default();
        let micros: Option<u64> = header.parse(record, Self::HOST_MICROS).unwrap_or_default();
        let host_time = seconds.map(|s| s as f64 + micros.unwrap_or(0) as f64 / 1e6);

        Ok(LogRow {
            raw,
            frame_counter: None,
            host_time,
        })
    }
}

/// Log produced by the embedded-pixel extractor.
///
/// Timestamp fields are prefixed with `timestamp.`; other embedded
/// properties may appear as extra columns, of which only `frameCounter`
/// is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorLog;

impl ExtractorLog {
    const SECOND_COUNT: &'static str = "timestamp.second_count";
    const CYCLE_COUNT: &'static str = "timestamp.cycle_count";
    const CYCLE_OFFSET: &'static str = "timestamp.cycle_offset";
    const FRAME_COUNTER: &'static str = "frameCounter";
}

impl LogSchema for ExtractorLog {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Extractor
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[Self::SECOND_COUNT, Self::CYCLE_COUNT, Self::CYCLE_OFFSET]
    }

    fn normalize(&self, header: &Header, record: &StringRecord) -> Result<LogRow, FieldError> {
        Ok(LogRow {
            raw: RawCycleTimestamp::new(
                header.require(record, Self::SECOND_COUNT)?,
                header.require(record, Self::CYCLE_COUNT)?,
                header.require(record, Self::CYCLE_OFFSET)?,
            ),
            frame_counter: header.parse(record, Self::FRAME_COUNTER)?,
            host_time: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_detect_writer() {
        let header = Header::from_record(&record(&[
            "seconds",
            "microSeconds",
            "cycleSeconds",
            "cycleCount",
            "cycleOffset",
        ]));
        assert_eq!(SchemaKind::detect(&header), Some(SchemaKind::Writer));
    }

    #[test]
    fn test_detect_extractor() {
        let header = Header::from_record(&record(&[
            "timestamp.second_count",
            "timestamp.cycle_count",
            "timestamp.cycle_offset",
            "timestamp.cycle_seconds",
            "frameCounter",
        ]));
        assert_eq!(SchemaKind::detect(&header), Some(SchemaKind::Extractor));
    }

    #[test]
    fn test_detect_unknown() {
        let header = Header::from_record(&record(&["a", "b", "c"]));
        assert_eq!(SchemaKind::detect(&header), None);
    }

    #[test]
    fn test_writer_normalize() {
        let header = Header::from_record(&record(&[
            "seconds",
            "microSeconds",
            "cycleSeconds",
            "cycleCount",
            "cycleOffset",
        ]));
        let row = WriterLog
            .normalize(&header, &record(&["1600000000", "250000", "12", "400", "17"]))
            .unwrap();
        assert_eq!(row.raw, RawCycleTimestamp::new(12, 400, 17));
        assert_eq!(row.frame_counter, None);
        assert!((row.host_time.unwrap() - 1_600_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn test_extractor_normalize_reordered_columns() {
        let header = Header::from_record(&record(&[
            "frameCounter",
            "timestamp.cycle_offset",
            "timestamp.second_count",
            "timestamp.cycle_count",
        ]));
        let row = ExtractorLog
            .normalize(&header, &record(&["42", "17", "12", "400"]))
            .unwrap();
        assert_eq!(row.raw, RawCycleTimestamp::new(12, 400, 17));
        assert_eq!(row.frame_counter, Some(42));
    }

    #[test]
    fn test_invalid_field() {
        let header = Header::from_record(&record(&["cycleSeconds", "cycleCount", "cycleOffset"]));
        let err = WriterLog
            .normalize(&header, &record(&["12", "4.5", "17"]))
            .unwrap_err();
        assert_eq!(err.column, "cycleCount");
        assert_eq!(err.value, "4.5");
    }

    #[test]
    fn test_negative_timer_field_is_kept() {
        let header = Header::from_record(&record(&["cycleSeconds", "cycleCount", "cycleOffset"]));
        let row = WriterLog.normalize(&header, &record(&["1", "-1", "0"])).unwrap();
        assert_eq!(row.raw, RawCycleTimestamp::new(1, -1, 0));
        assert!(row.raw.validate().is_err());
    }

    #[test]
    fn test_unreadable_host_time_is_dropped() {
        let header = Header::from_record(&record(&[
            "seconds",
            "microSeconds",
            "cycleSeconds",
            "cycleCount",
            "cycleOffset",
        ]));
        let row = WriterLog
            .normalize(&header, &record(&["n/a", "0", "12", "400", "17"]))
            .unwrap();
        assert_eq!(row.raw, RawCycleTimestamp::new(12, 400, 17));
        assert_eq!(row.host_time, None);
    }

    #[test]
    fn test_missing_required_value() {
        let header = Header::from_record(&record(&["cycleSeconds", "cycleCount", "cycleOffset"]));
        let err = WriterLog.normalize(&header, &record(&["12", "", "17"])).unwrap_err();
        assert_eq!(err.column, "cycleCount");
    }
}
