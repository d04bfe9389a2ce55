//! Raw cycle-timer readings as recorded by the camera.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exclusive upper bound of the 7-bit second counter.
pub const SECOND_COUNT_LIMIT: u32 = 127;
/// Cycles per second of the bus cycle timer.
pub const CYCLES_PER_SECOND: u32 = 8000;
/// Offset ticks per cycle.
pub const OFFSETS_PER_CYCLE: u32 = 3072;
/// Amount added to the unwrapped second count on every wrap.
pub const WRAP_PERIOD: u64 = 128;

/// One of the three cycle-timer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerField {
    SecondCount,
    CycleCount,
    CycleOffset,
}

impl TimerField {
    /// Exclusive upper bound of valid values.
    pub fn limit(self) -> u32 {
        match self {
            TimerField::SecondCount => SECOND_COUNT_LIMIT,
            TimerField::CycleCount => CYCLES_PER_SECOND,
            TimerField::CycleOffset => OFFSETS_PER_CYCLE,
        }
    }
}

impl fmt::Display for TimerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerField::SecondCount => "second_count",
            TimerField::CycleCount => "cycle_count",
            TimerField::CycleOffset => "cycle_offset",
        };
        f.write_str(name)
    }
}

/// One hardware timer reading for one frame.
///
/// Fields are stored as read from the log, signed so that negative values
/// survive loading and fail per frame. A reading is only known to be well
/// formed after [`RawCycleTimestamp::validate`] succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawCycleTimestamp {
    /// Seconds, wrapping 7-bit counter.
    pub second_count: i64,
    /// 1/8000 s cycles within the second.
    pub cycle_count: i64,
    /// 1/3072 cycle ticks within the cycle.
    pub cycle_offset: i64,
}

impl RawCycleTimestamp {
    pub fn new(second_count: i64, cycle_count: i64, cycle_offset: i64) -> Self {
        Self {
            second_count,
            cycle_count,
            cycle_offset,
        }
    }

    /// Unpacks the 32-bit word the camera embeds in the first pixels of a
    /// frame: 7 bits of second count, 13 bits of cycle count and 12 bits
    /// of cycle offset, most significant first.
    ///
    /// The 7-bit second field can hold 127, which [`validate`](Self::validate)
    /// rejects.
    pub fn from_embedded(word: u32) -> Self {
        Self {
            second_count: i64::from(word >> 25),
            cycle_count: i64::from((word >> 12) & 0x1FFF),
            cycle_offset: i64::from(word & 0x0FFF),
        }
    }

    /// Same as [`from_embedded`](Self::from_embedded) for the four
    /// big-endian bytes as they appear in the pixel row.
    pub fn from_embedded_bytes(bytes: [u8; 4]) -> Self {
        Self::from_embedded(u32::from_be_bytes(bytes))
    }

    /// Checks every field against its range.
    ///
    /// Returns the first offending field and its value.
    pub fn validate(&self) -> Result<(), (TimerField, i64)> {
        for (field, value) in [
            (TimerField::SecondCount, self.second_count),
            (TimerField::CycleCount, self.cycle_count),
            (TimerField::CycleOffset, self.cycle_offset),
        ] {
            if value < 0 || value >= i64::from(field.limit()) {
                return Err((field, value));
            }
        }
        Ok(())
    }

    /// Sub-second part of the reading in seconds.
    #[inline]
    pub fn cycle_seconds(&self) -> f64 {
        self.cycle_count as f64 / CYCLES_PER_SECOND as f64
            + self.cycle_offset as f64 / (OFFSETS_PER_CYCLE as f64 * CYCLES_PER_SECOND as f64)
    }

    /// True for the (0, 0, 0) reading.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.second_count == 0 && self.cycle_count == 0 && self.cycle_offset == 0
    }
}
