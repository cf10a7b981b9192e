//! Wire-level command types shared by both buses.

pub mod frame;

use serde::{Deserialize, Serialize};

/// One position command: which actuator, and where to put it (0–255).
///
/// Produced by the serial [`frame`] decoder or by pairing bytes drained from
/// the I2C slave.  The index is *not* validated here; the dispatcher checks
/// it against the actuator count and drops commands that miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub index: u8,
    pub raw_value: u8,
}

impl ActuatorCommand {
    pub const fn new(index: u8, raw_value: u8) -> Self {
        Self { index, raw_value }
    }
}
