//! Tabular output of analysis results.
//!
//! Each recording is written as four CSV tables into the output
//! directory: decoded timestamps with durations and drop flags, the
//! per-frame deviation table, per-camera summaries, and every non-fatal
//! condition.

mod tables;
mod writer;

pub use tables::{ConditionRow, DecodedRow, SummaryRow, TimestampRow};
pub use writer::{write_decoded, ReportError, ReportWriter};
