//! Cycle-timer readings and their decoding into seconds.
//!
//! Readings come from the camera's bus cycle timer as three fields
//! (second count, cycle count, cycle offset). This module validates them,
//! unwraps the 7-bit second counter and assembles decoded per-camera
//! series.

mod decoder;
mod raw;
mod series;

pub use decoder::{CycleDecoder, DecodedTimestamp, DecoderState, MalformedPolicy, MalformedTimestamp};
pub use raw::{
    RawCycleTimestamp, TimerField, CYCLES_PER_SECOND, OFFSETS_PER_CYCLE, SECOND_COUNT_LIMIT,
    WRAP_PERIOD,
};
pub use series::CameraSeries;
