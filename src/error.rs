//! Crate-level error type for recording and batch processing.

use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::metrics::MetricsError;
use crate::report::ReportError;
use crate::timestamp::MalformedTimestamp;

/// Result type used by the pipeline and the binary.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a recording or a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Malformed(#[from] MalformedTimestamp),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("recording {recording:?}: {source}")]
    Recording {
        recording: String,
        #[source]
        source: Box<Error>,
    },
    #[error("{failed} of {total} recordings failed")]
    BatchFailed { failed: usize, total: usize },
    #[error("failed to write {failed} of {total} reports")]
    ReportsFailed { failed: usize, total: usize },
}

impl Error {
    /// Attaches the recording name.
    pub fn in_recording(self, recording: impl Into<String>) -> Self {
        Error::Recording {
            recording: recording.into(),
            source: Box::new(self),
        }
    }
}
