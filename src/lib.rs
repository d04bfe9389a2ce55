//! Cycle Sync Library
//!
//! Decodes the bus cycle-timer timestamps that multi-camera rigs embed in
//! every frame, detects dropped frames from inter-frame intervals, and
//! measures how far each camera strays from the cross-camera mean.
//!
//! # Architecture
//!
//! ```text
//! loader → timestamp (decode) → analysis → report
//!                                   ↓
//!                                metrics
//! ```
//!
//! # Design Principles
//!
//! - **Local failures**: a malformed reading fails its frame, an empty log
//!   yields an empty series, and only unreadable logs abort a recording
//! - **Batch isolation**: one failed recording never stops the others
//! - **Pure analysis**: reports are a function of the input logs and the
//!   configuration, nothing else
//!
//! # Example
//!
//! ```no_run
//! use cycle_sync::{
//!     config::AnalysisConfig,
//!     loader::{CameraSource, RecordingSource},
//!     pipeline::Pipeline,
//!     report::ReportWriter,
//! };
//!
//! let recording = RecordingSource::new("session-1")
//!     .with_camera(CameraSource::new("logs/cam0.csv"))
//!     .with_camera(CameraSource::new("logs/cam1.csv"));
//!
//! let pipeline = Pipeline::new(AnalysisConfig::default());
//! let report = pipeline.analyze(&recording).unwrap();
//!
//! for summary in &report.synchrony.summaries {
//!     println!("{}: max |dev| = {:.6} s", summary.camera, summary.max_abs);
//! }
//!
//! ReportWriter::new("sync-report").write(&report).unwrap();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod condition;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod timestamp;

// Re-export commonly used types at crate root
pub use analysis::{DropThresholds, Recording, SynchronyReport, SynchronyTable};
pub use condition::Condition;
pub use config::{AnalysisConfig, FileConfig};
pub use error::{Error, Result};
pub use loader::{CameraSource, RecordingSource, SchemaKind};
pub use pipeline::{BatchOutcome, Pipeline};
pub use timestamp::{CameraSeries, CycleDecoder, MalformedPolicy, RawCycleTimestamp};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
