//! Static per-actuator pulse-width bounds.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::SERVO_OUTPUTS;

/// Inclusive pulse-width bounds of one actuator, in microseconds.
///
/// `min_pulse_us < max_pulse_us` always holds; deserialisation goes through
/// [`CalibrationRange::new`] so a bad table never gets past config loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct CalibrationRange {
    min_pulse_us: u16,
    max_pulse_us: u16,
}

#[derive(Serialize, Deserialize)]
struct RawRange {
    min_pulse_us: u16,
    max_pulse_us: u16,
}

impl TryFrom<RawRange> for CalibrationRange {
    type Error = ConfigError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.min_pulse_us, raw.max_pulse_us)
    }
}

impl From<CalibrationRange> for RawRange {
    fn from(r: CalibrationRange) -> Self {
        Self {
            min_pulse_us: r.min_pulse_us,
            max_pulse_us: r.max_pulse_us,
        }
    }
}

impl CalibrationRange {
    pub const fn new(min_pulse_us: u16, max_pulse_us: u16) -> Result<Self, ConfigError> {
        if min_pulse_us >= max_pulse_us {
            return Err(ConfigError::EmptyRange {
                min: min_pulse_us,
                max: max_pulse_us,
            });
        }
        Ok(Self {
            min_pulse_us,
            max_pulse_us,
        })
    }

    pub const fn min(&self) -> u16 {
        self.min_pulse_us
    }

    pub const fn max(&self) -> u16 {
        self.max_pulse_us
    }

    /// Width of the range in microseconds (always > 0).
    pub const fn span(&self) -> u16 {
        self.max_pulse_us - self.min_pulse_us
    }

    /// Midpoint, rounded down.
    pub const fn mid(&self) -> u16 {
        self.min_pulse_us + self.span() / 2
    }

    pub fn clamp(&self, pulse_us: i32) -> u16 {
        // Both bounds fit in u16, so the clamped value does too.
        pulse_us.clamp(i32::from(self.min_pulse_us), i32::from(self.max_pulse_us)) as u16
    }
}

/// The full range of a standard hobby servo.
pub const FULL_SWING: CalibrationRange = CalibrationRange {
    min_pulse_us: 500,
    max_pulse_us: 2500,
};

/// Ordered calibration table, one entry per actuator index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationTable {
    ranges: Vec<CalibrationRange, SERVO_OUTPUTS>,
}

impl CalibrationTable {
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// `count` copies of `range`.
    pub fn uniform(range: CalibrationRange, count: usize) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for _ in 0..count {
            table.push(range)?;
        }
        Ok(table)
    }

    pub fn from_slice(ranges: &[CalibrationRange]) -> Result<Self, ConfigError> {
        let ranges = Vec::from_slice(ranges).map_err(|()| ConfigError::TableFull)?;
        Ok(Self { ranges })
    }

    pub fn push(&mut self, range: CalibrationRange) -> Result<(), ConfigError> {
        self.ranges.push(range).map_err(|_| ConfigError::TableFull)
    }

    /// Replace the entry at `index`.  Returns `false` if there is none.
    pub fn set(&mut self, index: usize, range: CalibrationRange) -> bool {
        match self.ranges.get_mut(index) {
            Some(slot) => {
                *slot = range;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&CalibrationRange> {
        self.ranges.get(index)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalibrationRange> {
        self.ranges.iter()
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::new()
    }
}
