//! Reading per-camera timestamp logs from CSV.

use super::schema::{FieldError, Header, LogRow, SchemaKind};
use crate::timestamp::RawCycleTimestamp;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a log from being loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: source contains no frames", .path.display())]
    NoData { path: PathBuf },
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read csv from {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}: header matches neither the writer nor the extractor log schema", .path.display())]
    UnknownSchema { path: PathBuf },
    #[error("{}: header does not match the {schema} log schema", .path.display())]
    SchemaMismatch { path: PathBuf, schema: SchemaKind },
    #[error("{}, line {line}: invalid value {value:?} in column {column}", .path.display())]
    InvalidField {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

impl LoadError {
    /// True for the empty-source case, which callers treat as an empty
    /// series rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, LoadError::NoData { .. })
    }
}

/// One camera's log file and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSource {
    /// Camera identifier. Inferred from the file stem when not configured.
    #[serde(default, rename = "id")]
    pub camera: String,
    /// Path to the CSV log.
    pub path: PathBuf,
    /// Schema to use; detected from the header when absent.
    #[serde(default)]
    pub schema: Option<SchemaKind>,
}

impl CameraSource {
    /// A source whose camera id is the file stem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let camera = camera_id_from_path(&path);
        Self {
            camera,
            path,
            schema: None,
        }
    }

    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = camera.into();
        self
    }

    pub fn with_schema(mut self, schema: SchemaKind) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Fills an empty camera id from the file stem.
    pub fn resolve_camera(&mut self) {
        if self.camera.is_empty() {
            self.camera = camera_id_from_path(&self.path);
        }
    }

    /// Opens and reads the log.
    pub fn load(&self) -> Result<CameraLog, LoadError> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        read_log(&self.camera, file, self.schema, &self.path)
    }
}

/// Infers a camera id from a log path's file stem.
pub fn camera_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// A loaded log: rows in input order.
#[derive(Debug, Clone)]
pub struct CameraLog {
    pub camera: String,
    pub schema: SchemaKind,
    pub rows: Vec<LogRow>,
}

impl CameraLog {
    /// The raw readings in frame order.
    pub fn readings(&self) -> impl Iterator<Item = RawCycleTimestamp> + '_ {
        self.rows.iter().map(|row| row.raw)
    }

    /// Embedded frame counters, parallel to the rows.
    pub fn frame_counters(&self) -> Vec<Option<u64>> {
        self.rows.iter().map(|row| row.frame_counter).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a log from any reader. `path` is only used in error messages.
///
/// Row order is preserved; rows are never reordered or deduplicated.
pub fn read_log<R: Read>(
    camera: &str,
    reader: R,
    schema: Option<SchemaKind>,
    path: &Path,
) -> Result<CameraLog, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = Header::from_record(rdr.headers().map_err(csv_err)?);
    if header.is_empty() {
        return Err(LoadError::NoData {
            path: path.to_path_buf(),
        });
    }

    let kind = match schema {
        Some(kind) if kind.schema().matches(&header) => kind,
        Some(kind) => {
            return Err(LoadError::SchemaMismatch {
                path: path.to_path_buf(),
                schema: kind,
            })
        }
        None => SchemaKind::detect(&header).ok_or_else(|| LoadError::UnknownSchema {
            path: path.to_path_buf(),
        })?,
    };
    let adapter = kind.schema();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        let row = adapter
            .normalize(&header, &record)
            .map_err(|FieldError { column, value }| LoadError::InvalidField {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |p| p.line()),
                column,
                value,
            })?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LoadError::NoData {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(
        camera,
        schema = %kind,
        frames = rows.len(),
        path = %path.display(),
        "Loaded timestamp log"
    );

    Ok(CameraLog {
        camera: camera.to_string(),
        schema: kind,
        rows,
    })
}
