//! Digital reads from the analog sensor headers.
//!
//! The board has no digital inputs to spare, so jumpers and buttons sit on the
//! muxed sensor headers and count as "on" above a voltage threshold.

use serde::{Deserialize, Serialize};

use crate::app::ports::AnalogMuxPort;
use crate::pins::{
    SENSOR_1_ADDR, SENSOR_2_ADDR, SENSOR_3_ADDR, SENSOR_4_ADDR, SENSOR_5_ADDR, SENSOR_6_ADDR,
};

pub const DEFAULT_THRESHOLD_V: f32 = 3.0;

/// Mux channels of the boot jumpers and calibration buttons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorChannels {
    /// High disables all motor output for this boot.
    pub motor_disable: u8,
    /// High enters manual calibration (only if motors are enabled).
    pub calibration_select: u8,
    pub plus_small: u8,
    pub minus_small: u8,
    pub plus_large: u8,
    pub minus_large: u8,
    /// Volts; a channel reads high strictly above this.
    pub threshold_v: f32,
}

impl Default for SensorChannels {
    fn default() -> Self {
        Self {
            motor_disable: SENSOR_6_ADDR,
            calibration_select: SENSOR_1_ADDR,
            plus_small: SENSOR_2_ADDR,
            minus_small: SENSOR_3_ADDR,
            plus_large: SENSOR_4_ADDR,
            minus_large: SENSOR_5_ADDR,
            threshold_v: DEFAULT_THRESHOLD_V,
        }
    }
}

/// Volts → millivolts, rounded half away from zero.
fn to_millivolts(volts: f32) -> i32 {
    let scaled = volts * 1000.0;
    if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    }
}

/// Sample `channel` and compare at millivolt resolution.
pub fn is_high(mux: &mut impl AnalogMuxPort, channel: u8, threshold_v: f32) -> bool {
    mux.select(channel);
    to_millivolts(mux.read_voltage()) > to_millivolts(threshold_v)
}

/// The two jumpers sampled once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootFlags {
    pub motors_enabled: bool,
    pub calibration_requested: bool,
}

pub fn read_boot_flags(mux: &mut impl AnalogMuxPort, ch: &SensorChannels) -> BootFlags {
    let motors_enabled = !is_high(mux, ch.motor_disable, ch.threshold_v);
    let calibration_requested = is_high(mux, ch.calibration_select, ch.threshold_v);
    BootFlags {
        motors_enabled,
        calibration_requested,
    }
}
