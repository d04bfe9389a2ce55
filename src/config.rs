//! Analysis configuration.
//!
//! Settings come from an optional TOML file; every section has defaults.
//! Relative log paths in the file are resolved against the file's
//! directory.

use crate::analysis::DropThresholds;
use crate::loader::RecordingSource;
use crate::timestamp::MalformedPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid drop threshold multiple {0} (must be finite and positive)")]
    InvalidThreshold(f64),
    #[error("invalid drop window (must be at least 1 interval)")]
    InvalidWindow,
    #[error("recording name must not be empty")]
    EmptyRecordingName,
    #[error("recording {0:?} is listed more than once")]
    DuplicateRecording(String),
    #[error("recording {recording:?} lists camera {camera:?} more than once")]
    DuplicateCamera { recording: String, camera: String },
    #[error("no recordings to analyze")]
    NoRecordings,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Decoding settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Skip malformed readings (default) or abort the series.
    pub on_malformed: MalformedPolicy,
}

/// Settings that affect analysis results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub drops: DropThresholds,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drops.validate()
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the report tables are written to.
    pub directory: PathBuf,
    /// Also write `metrics.prom` with batch counters.
    pub metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("sync-report"),
            metrics: false,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub drops: DropThresholds,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "recording")]
    pub recordings: Vec<RecordingSource>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let mut config = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(
            path = %path.display(),
            recordings = config.recordings.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        for recording in &mut config.recordings {
            for camera in &mut recording.cameras {
                camera.resolve_camera();
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Joins relative log paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for camera in self.recordings.iter_mut().flat_map(|r| r.cameras.iter_mut()) {
            if camera.path.is_relative() {
                camera.path = base.join(&camera.path);
            }
        }
    }

    /// The settings that affect analysis results.
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            decode: self.decode,
            drops: self.drops,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drops.validate()?;

        let mut names = HashSet::new();
        for recording in &self.recordings {
            if recording.name.is_empty() {
                return Err(ConfigError::EmptyRecordingName);
            }
            if !names.insert(recording.name.as_str()) {
                return Err(ConfigError::DuplicateRecording(recording.name.clone()));
            }

            let mut cameras = HashSet::new();
            for camera in &recording.cameras {
                if !cameras.insert(camera.camera.as_str()) {
                    return Err(ConfigError::DuplicateCamera {
                        recording: recording.name.clone(),
                        camera: camera.camera.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SchemaKind;

    const EXAMPLE: &str = r#"
[decode]
on_malformed = "abort"

[drops]
threshold_multiple = 2.0
window = 30

[output]
directory = "out"
metrics = true

[[recording]]
name = "session-1"

[[recording.camera]]
id = "left"
path = "left.csv"
schema = "writer"

[[recording.camera]]
path = "logs/right.csv"
"#;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis(), AnalysisConfig::default());
        assert_eq!(config.output.directory, PathBuf::from("sync-report"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = FileConfig::parse(EXAMPLE).unwrap();

        assert_eq!(config.decode.on_malformed, MalformedPolicy::Abort);
        assert_eq!(config.drops.threshold_multiple, 2.0);
        assert_eq!(config.drops.window, Some(30));
        assert!(config.output.metrics);

        let recording = &config.recordings[0];
        assert_eq!(recording.name, "session-1");
        assert_eq!(recording.cameras[0].camera, "left");
        assert_eq!(recording.cameras[0].schema, Some(SchemaKind::Writer));
        assert_eq!(recording.cameras[1].camera, "right");
        assert_eq!(recording.cameras[1].schema, None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_partial_drops_section() {
        let config = FileConfig::parse("[drops]\nwindow = 10\n").unwrap();
        assert_eq!(config.drops.threshold_multiple, 1.5);
        assert_eq!(config.drops.window, Some(10));
    }

    #[test]
    fn test_round_trip() {
        let config = FileConfig::parse(EXAMPLE).unwrap();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(FileConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_duplicate_camera_rejected() {
        let text = r#"
[[recording]]
name = "s"
[[recording.camera]]
path = "a/cam0.csv"
[[recording.camera]]
path = "b/cam0.csv"
"#;
        assert!(matches!(
            FileConfig::parse(text),
            Err(ConfigError::DuplicateCamera { .. })
        ));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(matches!(
            FileConfig::parse("[drops]\nthreshold_multiple = -1.0\n"),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.recordings[0].cameras[0].path, dir.path().join("left.csv"));
        assert_eq!(
            config.recordings[0].cameras[1].path,
            dir.path().join("logs/right.csv")
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfig::from_file("/nonexistent/sync.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
