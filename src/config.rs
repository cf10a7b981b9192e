//! System configuration parameters
//!
//! Every tunable of the servo bridge.  Defaults are the values the board
//! ships with (12 servos on a Grogu-style head, serial bus).  Motor-enable
//! and calibration-mode are not here: they are jumpers read at boot.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::bus::BusConfig;
use crate::calibration::mapper::MappingPolicy;
use crate::calibration::table::{CalibrationRange, CalibrationTable, FULL_SWING};
use crate::drivers::boot_sensors::SensorChannels;
use crate::drivers::status_indicator::DEFAULT_BRIGHTNESS;
use crate::error::ConfigError;
use crate::pins::SERVO_OUTPUTS;

/// Maximum number of per-servo PWM frequency overrides.
pub const MAX_FREQUENCY_OVERRIDES: usize = 4;

// Actuator indices on the default head.
pub const SERVO_MOUTH: usize = 0;
pub const SERVO_EYE_BL: usize = 2;
pub const SERVO_EYE_BR: usize = 3;
pub const SERVO_EYE_TL: usize = 4;
pub const SERVO_EYE_TR: usize = 5;
pub const SERVO_EAR_BL: usize = 6;
pub const SERVO_EAR_BR: usize = 7;
pub const SERVO_EAR_TL: usize = 8;
pub const SERVO_EAR_TR: usize = 9;

const DEFAULT_ACTUATORS: usize = 12;

/// Run one servo at a non-default PWM frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyOverride {
    pub index: u8,
    pub hz: u32,
}

/// Fixed waits, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delays {
    /// After enabling or centring each servo during homing.
    pub homing_step_ms: u32,
    /// After the whole group has been enabled or centred.
    pub homing_settle_ms: u32,
    /// After each calibration pulse change.
    pub calibration_step_ms: u32,
    /// Back-off after a bus read failure.
    pub bus_error_cooldown_ms: u32,
    /// Between LEDs while the alarm pattern sweeps the bar.
    pub alarm_step_ms: u32,
    /// Between alarm sweeps.
    pub alarm_pause_ms: u32,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            homing_step_ms: 100,
            homing_settle_ms: 2000,
            calibration_step_ms: 100,
            bus_error_cooldown_ms: 2000,
            alarm_step_ms: 100,
            alarm_pause_ms: 1000,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Actuators ---
    /// Servos in use, starting at output 1.
    pub actuator_count: usize,
    /// One range per actuator.  Its length must equal `actuator_count`;
    /// a mismatch is fatal at boot.
    pub calibration: CalibrationTable,
    /// Actuator adjusted in calibration mode.
    pub reference_actuator: u8,
    pub mapping_policy: MappingPolicy,
    pub frequency_overrides: Vec<FrequencyOverride, MAX_FREQUENCY_OVERRIDES>,

    // --- Bus ---
    pub bus: BusConfig,

    // --- Inputs ---
    pub sensors: SensorChannels,

    // --- Timing ---
    pub delays: Delays,

    // --- Indicators ---
    /// LED bar brightness, 0.0–1.0.
    pub led_brightness: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            actuator_count: DEFAULT_ACTUATORS,
            calibration: default_calibration(),
            reference_actuator: SERVO_MOUTH as u8,
            mapping_policy: MappingPolicy::PerActuator,
            frequency_overrides: Vec::from_slice(&[FrequencyOverride {
                index: SERVO_MOUTH as u8,
                hz: 300,
            }])
            .unwrap_or_default(),
            bus: BusConfig::default(),
            sensors: SensorChannels::default(),
            delays: Delays::default(),
            led_brightness: DEFAULT_BRIGHTNESS,
        }
    }
}

/// Full swing everywhere except the servos that were measured on the head.
pub fn default_calibration() -> CalibrationTable {
    const MEASURED: [(usize, u16, u16); 9] = [
        (SERVO_MOUTH, 1380, 1480),
        (SERVO_EYE_BL, 1280, 1720),
        (SERVO_EYE_BR, 1400, 1760),
        (SERVO_EYE_TL, 1200, 1720),
        (SERVO_EYE_TR, 1440, 1760),
        (SERVO_EAR_BL, 1280, 1660),
        (SERVO_EAR_BR, 1240, 1620),
        (SERVO_EAR_TL, 1300, 2140),
        (SERVO_EAR_TR, 940, 1820),
    ];

    let mut table = CalibrationTable::uniform(FULL_SWING, DEFAULT_ACTUATORS).unwrap_or_default();
    for (index, min, max) in MEASURED {
        if let Ok(range) = CalibrationRange::new(min, max) {
            table.set(index, range);
        }
    }
    table
}

impl BridgeConfig {
    /// Check every field that can be checked without touching hardware.
    ///
    /// The calibration table length is not checked here: the dispatcher
    /// raises a mismatch at boot, with the alarm pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actuator_count == 0 || self.actuator_count > SERVO_OUTPUTS {
            return Err(ConfigError::ActuatorCount(self.actuator_count));
        }
        if usize::from(self.reference_actuator) >= self.actuator_count {
            return Err(ConfigError::ReferenceActuator(self.reference_actuator));
        }
        if let MappingPolicy::Universal {
            min_pulse_us,
            max_pulse_us,
        } = self.mapping_policy
        {
            CalibrationRange::new(min_pulse_us, max_pulse_us)?;
        }
        if let BusConfig::I2c(i2c) = &self.bus {
            i2c.validate()?;
        }
        Ok(())
    }
}
