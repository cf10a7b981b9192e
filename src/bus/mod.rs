//! Command buses: framed serial and register-level I2C slave.

pub mod i2c_slave;
pub mod registers;
pub mod serial;

use serde::{Deserialize, Serialize};

use i2c_slave::I2cSlaveConfig;
use serial::SerialConfig;

/// Which bus commands arrive on.  Exactly one is active per boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusConfig {
    Serial(SerialConfig),
    I2c(I2cSlaveConfig),
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::Serial(SerialConfig::default())
    }
}
