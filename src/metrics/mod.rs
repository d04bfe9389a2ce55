//! Prometheus metrics for batch analysis runs.
//!
//! Counters accumulate over every recording analyzed in one invocation
//! and are exported in Prometheus text format, ready for a node exporter
//! textfile collector.
//!
//! # Metrics Exposed
//!
//! - `cycle_sync_recordings_analyzed_total` / `cycle_sync_recordings_failed_total`
//! - `cycle_sync_frames_total` - input frames read
//! - `cycle_sync_frames_decoded_total` - frames decoded
//! - `cycle_sync_decode_failures_total` - malformed readings skipped
//! - `cycle_sync_dropped_frames_total` - intervals flagged as drops
//! - `cycle_sync_non_monotonic_total` - decoded timestamps going backwards
//! - `cycle_sync_common_frames{recording}` - frames in the common range
//! - `cycle_sync_max_abs_deviation_seconds{recording,camera}`
//!
//! # Example
//!
//! ```no_run
//! use cycle_sync::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     frames: 1200,
//!     frames_decoded: 1199,
//!     decode_failures: 1,
//!     drops: 2,
//!     non_monotonic: 0,
//!     common_frames: 600,
//!     max_abs_deviation: vec![("cam0".into(), 0.0004), ("cam1".into(), 0.0004)],
//! };
//!
//! registry.update("session-1", &snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
