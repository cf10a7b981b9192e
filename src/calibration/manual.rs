//! Interactive calibration of the reference actuator.
//!
//! ```text
//!   Idle ──start()──▶ Adjusting ──terminate()──▶ Terminated
//!                      │    ▲
//!                      └────┘ step(inputs)
//! ```
//!
//! The operator nudges one actuator with four buttons on the sensor headers
//! and reads the resulting pulse widths off the log.  [`ManualCalibrationFsm`]
//! is the pure state machine; [`run_manual_calibration`] drives it against
//! the board until the user button is pressed.

use embedded_hal::delay::DelayNs;
use log::info;

use super::table::CalibrationRange;
use crate::app::ports::{AnalogMuxPort, ButtonPort, ServoPort};
use crate::drivers::boot_sensors::{SensorChannels, is_high};

/// Small step is 1/100 of the range, large step 1/20.
pub const SMALL_STEP_DIVISOR: u16 = 100;
pub const LARGE_STEP_DIVISOR: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Idle,
    Adjusting { pulse_us: u16 },
    Terminated,
}

/// Buttons held during one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInputs {
    pub plus_small: bool,
    pub minus_small: bool,
    pub plus_large: bool,
    pub minus_large: bool,
}

impl StepInputs {
    pub fn sample(mux: &mut impl AnalogMuxPort, ch: &SensorChannels) -> Self {
        Self {
            plus_small: is_high(mux, ch.plus_small, ch.threshold_v),
            minus_small: is_high(mux, ch.minus_small, ch.threshold_v),
            plus_large: is_high(mux, ch.plus_large, ch.threshold_v),
            minus_large: is_high(mux, ch.minus_large, ch.threshold_v),
        }
    }
}

/// What the operator copies into the static table afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationReport {
    pub last_pulse_us: u16,
    pub lowest_pulse_us: u16,
    pub highest_pulse_us: u16,
}

pub struct ManualCalibrationFsm {
    range: CalibrationRange,
    small_step: i32,
    large_step: i32,
    state: CalibrationState,
    lowest: u16,
    highest: u16,
}

impl ManualCalibrationFsm {
    pub fn new(range: CalibrationRange) -> Self {
        // Steps are at least 1us.
        let small_step = (range.span() / SMALL_STEP_DIVISOR).max(1);
        let large_step = (range.span() / LARGE_STEP_DIVISOR).max(1);
        Self {
            range,
            small_step: i32::from(small_step),
            large_step: i32::from(large_step),
            state: CalibrationState::Idle,
            lowest: range.mid(),
            highest: range.mid(),
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn small_step(&self) -> u16 {
        self.small_step as u16
    }

    pub fn large_step(&self) -> u16 {
        self.large_step as u16
    }

    /// Idle → Adjusting at the range midpoint.  Returns the starting pulse.
    pub fn start(&mut self) -> Option<u16> {
        match self.state {
            CalibrationState::Idle => {
                let mid = self.range.mid();
                self.state = CalibrationState::Adjusting { pulse_us: mid };
                self.lowest = mid;
                self.highest = mid;
                Some(mid)
            }
            _ => None,
        }
    }

    /// Apply one sample.  Returns the new pulse width if it changed.
    ///
    /// Held buttons add up; opposing buttons cancel.  The result is clamped
    /// to the range.  Outside `Adjusting` this does nothing.
    pub fn step(&mut self, inputs: StepInputs) -> Option<u16> {
        let CalibrationState::Adjusting { pulse_us } = self.state else {
            return None;
        };

        let mut delta = 0;
        if inputs.plus_small {
            delta += self.small_step;
        }
        if inputs.minus_small {
            delta -= self.small_step;
        }
        if inputs.plus_large {
            delta += self.large_step;
        }
        if inputs.minus_large {
            delta -= self.large_step;
        }

        let next = self.range.clamp(i32::from(pulse_us) + delta);
        if next == pulse_us {
            return None;
        }
        self.state = CalibrationState::Adjusting { pulse_us: next };
        self.lowest = self.lowest.min(next);
        self.highest = self.highest.max(next);
        Some(next)
    }

    /// Enter `Terminated`.  Returns the report once; `None` if the FSM never
    /// started or already finished.
    pub fn terminate(&mut self) -> Option<CalibrationReport> {
        let CalibrationState::Adjusting { pulse_us } = self.state else {
            self.state = CalibrationState::Terminated;
            return None;
        };
        self.state = CalibrationState::Terminated;
        Some(CalibrationReport {
            last_pulse_us: pulse_us,
            lowest_pulse_us: self.lowest,
            highest_pulse_us: self.highest,
        })
    }
}

/// Adjust actuator `index` until the button is pressed.
///
/// Each change is written to the servo and followed by `settle_ms`.
pub fn run_manual_calibration<H, D>(
    hw: &mut H,
    delay: &mut D,
    index: usize,
    range: CalibrationRange,
    channels: &SensorChannels,
    settle_ms: u32,
) -> Option<CalibrationReport>
where
    H: ServoPort + AnalogMuxPort + ButtonPort,
    D: DelayNs,
{
    let mut fsm = ManualCalibrationFsm::new(range);
    fsm.start();
    info!(
        "calibrating actuator {}: {}..{}us, steps {}/{}us",
        index,
        range.min(),
        range.max(),
        fsm.small_step(),
        fsm.large_step()
    );

    while !hw.is_pressed() {
        let inputs = StepInputs::sample(hw, channels);
        if let Some(pulse) = fsm.step(inputs) {
            hw.set_pulse_us(index, pulse);
            info!("calibration pulse {}us", pulse);
            delay.delay_ms(settle_ms);
        }
    }

    let report = fsm.terminate();
    if let Some(r) = report {
        info!(
            "calibration done: last={}us lowest={}us highest={}us",
            r.last_pulse_us, r.lowest_pulse_us, r.highest_pulse_us
        );
    }
    report
}
