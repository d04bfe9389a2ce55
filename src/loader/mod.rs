//! Timestamp log ingestion.
//!
//! Loads per-camera CSV logs written by either upstream producer and
//! normalizes them into ordered rows of raw cycle-timer readings.
//! Recordings are grouped by an explicit caller-supplied label; nothing
//! is inferred from file names except a default camera id.

mod schema;
mod source;

pub use schema::{ExtractorLog, FieldError, Header, LogRow, LogSchema, SchemaKind, WriterLog};
pub use source::{camera_id_from_path, read_log, CameraLog, CameraSource, LoadError};

use serde::{Deserialize, Serialize};

/// A labelled group of camera logs captured in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSource {
    /// Recording label.
    pub name: String,
    /// One source per camera.
    #[serde(default, rename = "camera")]
    pub cameras: Vec<CameraSource>,
}

impl RecordingSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cameras: Vec::new(),
        }
    }

    pub fn with_camera(mut self, camera: CameraSource) -> Self {
        self.cameras.push(camera);
        self
    }
}
