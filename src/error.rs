//! Unified error types for the servo bridge firmware.
//!
//! Only [`Error::CalibrationTableMismatch`] is fatal.  Everything else
//! degrades to "no command this cycle" inside the serving loop.  All variants
//! are `Copy` so they pass through the dispatcher without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A serial frame failed validation.
    Frame(FrameRejected),
    /// The active bus could not be read.
    Bus(BusError),
    /// A command addressed an actuator that does not exist.
    IndexOutOfRange { index: u8, count: usize },
    /// The static calibration table does not cover every actuator.
    CalibrationTableMismatch { expected: usize, actual: usize },
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame rejected: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::IndexOutOfRange { index, count } => {
                write!(f, "actuator index {index} out of range (count {count})")
            }
            Self::CalibrationTableMismatch { expected, actual } => write!(
                f,
                "calibration table has {actual} entries, expected {expected}"
            ),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Frame rejections
// ---------------------------------------------------------------------------

/// Why a serial buffer was not accepted as a frame.
///
/// Listed in validation order; the first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRejected {
    /// Buffer length is not exactly one frame.
    SizeMismatch,
    /// First byte is not `0xFF`.
    BadSentinel,
    /// Last byte is not `0x0A`.
    BadTerminator,
    /// Bytes 1..5 are not the magic header.
    BadHeader,
    /// Bytes 5..7 are not the servo-position command code.
    BadCommand,
}

impl fmt::Display for FrameRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch => write!(f, "size mismatch"),
            Self::BadSentinel => write!(f, "bad sentinel"),
            Self::BadTerminator => write!(f, "bad terminator"),
            Self::BadHeader => write!(f, "bad header"),
            Self::BadCommand => write!(f, "bad command code"),
        }
    }
}

impl From<FrameRejected> for Error {
    fn from(e: FrameRejected) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// UART framing, parity, overrun or break condition.
    SerialFault,
    /// The I2C controller reported a read fault.
    I2cReadFault,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialFault => write!(f, "serial read failed"),
            Self::I2cReadFault => write!(f, "I2C read failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A calibration range has `min >= max`.
    EmptyRange { min: u16, max: u16 },
    /// Actuator count is zero or exceeds the board's outputs.
    ActuatorCount(usize),
    /// Reference actuator index is not below the actuator count.
    ReferenceActuator(u8),
    /// I2C slave address does not fit in 7 bits.
    I2cAddress(u16),
    /// GPIO number does not exist on the RP2040.
    Pin(u8),
    /// Table holds more ranges than the board has outputs.
    TableFull,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange { min, max } => write!(f, "empty range {min}..{max}us"),
            Self::ActuatorCount(n) => write!(f, "unsupported actuator count {n}"),
            Self::ReferenceActuator(i) => write!(f, "reference actuator {i} out of range"),
            Self::I2cAddress(a) => write!(f, "I2C address 0x{a:x} is not 7-bit"),
            Self::Pin(p) => write!(f, "GPIO{p} does not exist"),
            Self::TableFull => write!(f, "calibration table full"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
