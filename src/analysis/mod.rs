//! Frame-duration, drop and cross-camera synchrony analysis.
//!
//! Every function here is a pure computation over decoded series. Nothing
//! is corrected or interpolated; anomalies are flagged and reported.

mod duration;
mod median;
mod report;
mod statistics;
mod synchrony;
mod threshold;

pub use duration::{flag_drops, frame_counter_gaps, FrameDurations};
pub use median::RunningMedian;
pub use report::{CameraReport, Recording, SynchronyReport};
pub use statistics::DeviationSummary;
pub use synchrony::{FrameDeviation, SynchronyTable};
pub use threshold::DropThresholds;
