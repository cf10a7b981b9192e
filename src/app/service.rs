//! Actuator dispatcher: the hexagonal core.
//!
//! [`ActuatorDispatcher`] owns the board ports, the command bus, the delay
//! source and every piece of runtime state.  There are no globals; the
//! integration tests drive it with a recording mock.
//!
//! ```text
//!  CommandBus ──▶ ┌────────────────────────────┐ ──▶ ServoPort
//!                 │     ActuatorDispatcher      │
//!  BoardPort  ◀──▶│  phases · mapper · status   │ ──▶ IndicatorPort
//!                 └────────────────────────────┘
//! ```
//!
//! Phases run strictly in order:
//!
//! ```text
//!   Boot ──▶ Homing ──▶ Calibrating ──▶ Shutdown
//!    │         │    └─▶ Serving ─────▶ Shutdown
//!    └─▶ Alarm (table mismatch; returns Err once the button is pressed)
//! ```
//!
//! Homing is skipped when the motor-disable jumper is set.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, error, info, warn};

use super::ports::{BoardPort, CommandBus};
use crate::calibration::manual::{CalibrationReport, run_manual_calibration};
use crate::calibration::mapper::ValueMapper;
use crate::config::BridgeConfig;
use crate::drivers::boot_sensors::{BootFlags, read_boot_flags};
use crate::drivers::status_indicator::{BusHealth, COLOUR_FAULT, COLOUR_OFF, StatusIndicator};
use crate::error::{ConfigError, Error, Result};
use crate::pins::SERVO_OUTPUTS;
use crate::protocol::ActuatorCommand;

// ───────────────────────────────────────────────────────────────
// Phase / state types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Boot,
    Homing,
    Calibrating,
    Serving,
    Shutdown,
    Alarm,
}

/// What the dispatcher last told one output to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorState {
    pub enabled: bool,
    pub current_pulse_us: Option<u16>,
}

/// How a successful [`ActuatorDispatcher::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Served commands until the button was pressed.
    Served,
    /// Ran manual calibration instead of serving.
    Calibrated(Option<CalibrationReport>),
}

/// Counters for the serving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub written: u32,
    pub out_of_range: u32,
    /// Valid commands not written because motors are disabled.
    pub suppressed: u32,
    pub bus_errors: u32,
}

// ───────────────────────────────────────────────────────────────
// ActuatorDispatcher
// ───────────────────────────────────────────────────────────────

pub struct ActuatorDispatcher<H, B, D> {
    hw: H,
    bus: B,
    delay: D,
    config: BridgeConfig,
    mapper: ValueMapper,
    status: StatusIndicator,
    actuators: Vec<ActuatorState, SERVO_OUTPUTS>,
    phase: Phase,
    flags: BootFlags,
    stats: DispatchStats,
}

impl<H, B, D> ActuatorDispatcher<H, B, D>
where
    H: BoardPort,
    B: CommandBus,
    D: DelayNs,
{
    /// Validate `config` and take ownership of the ports.
    ///
    /// Nothing is written to the hardware until [`run`](Self::run).
    pub fn new(config: BridgeConfig, hw: H, bus: B, delay: D) -> Result<Self> {
        config.validate()?;
        if hw.servo_count() < config.actuator_count {
            return Err(ConfigError::ActuatorCount(config.actuator_count).into());
        }
        let mapper = ValueMapper::new(config.mapping_policy, config.calibration.clone())?;

        let mut actuators = Vec::new();
        for _ in 0..config.actuator_count {
            actuators
                .push(ActuatorState::default())
                .map_err(|_| ConfigError::ActuatorCount(config.actuator_count))?;
        }

        Ok(Self {
            hw,
            bus,
            delay,
            status: StatusIndicator::new(config.led_brightness),
            config,
            mapper,
            actuators,
            phase: Phase::Boot,
            flags: BootFlags {
                motors_enabled: false,
                calibration_requested: false,
            },
            stats: DispatchStats::default(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot, home, then either calibrate or serve until the button is
    /// pressed, and finally shut down.
    ///
    /// Returns `Err(CalibrationTableMismatch)` after the alarm has been
    /// acknowledged.  Bus errors never surface here.
    pub fn run(&mut self) -> Result<RunOutcome> {
        self.boot()?;

        if self.flags.motors_enabled {
            self.home();
        }

        let outcome = if self.flags.calibration_requested && self.flags.motors_enabled {
            RunOutcome::Calibrated(self.calibrate())
        } else {
            self.serve();
            RunOutcome::Served
        };

        self.shutdown();
        Ok(outcome)
    }

    fn boot(&mut self) -> Result<()> {
        self.enter(Phase::Boot);
        self.status.power_on(&mut self.hw);

        let actual = self.config.calibration.len();
        let expected = self.config.actuator_count;
        if actual != expected {
            error!(
                "calibration table has {} entries for {} actuators",
                actual, expected
            );
            self.alarm();
            return Err(Error::CalibrationTableMismatch { expected, actual });
        }

        for o in &self.config.frequency_overrides {
            let index = usize::from(o.index);
            if index < expected {
                self.hw.set_frequency(index, o.hz);
                debug!("servo {} at {}Hz", index, o.hz);
            } else {
                warn!("frequency override for missing servo {}", index);
            }
        }

        self.flags = read_boot_flags(&mut self.hw, &self.config.sensors);
        info!(
            "boot: motors {}, calibration {}",
            if self.flags.motors_enabled { "enabled" } else { "DISABLED" },
            if self.flags.calibration_requested { "requested" } else { "off" }
        );
        if self.flags.calibration_requested {
            self.status.calibration_mode(&mut self.hw);
        }
        Ok(())
    }

    /// Enable every servo, then centre every servo, settling between steps.
    fn home(&mut self) {
        self.enter(Phase::Homing);
        let step = self.config.delays.homing_step_ms;
        let settle = self.config.delays.homing_settle_ms;

        for (i, state) in self.actuators.iter_mut().enumerate() {
            self.hw.enable(i);
            state.enabled = true;
            self.delay.delay_ms(step);
        }
        self.delay.delay_ms(settle);

        for (i, state) in self.actuators.iter_mut().enumerate() {
            if let Some(range) = self.config.calibration.get(i) {
                let mid = range.mid();
                self.hw.set_pulse_us(i, mid);
                state.current_pulse_us = Some(mid);
            }
            self.delay.delay_ms(step);
        }
        self.delay.delay_ms(settle);
    }

    fn calibrate(&mut self) -> Option<CalibrationReport> {
        self.enter(Phase::Calibrating);
        let index = usize::from(self.config.reference_actuator);
        let range = *self.config.calibration.get(index)?;

        let report = run_manual_calibration(
            &mut self.hw,
            &mut self.delay,
            index,
            range,
            &self.config.sensors,
            self.config.delays.calibration_step_ms,
        );
        if let Some(r) = report {
            self.actuators[index].current_pulse_us = Some(r.last_pulse_us);
        }
        report
    }

    fn serve(&mut self) {
        self.enter(Phase::Serving);
        self.status.startup_complete(&mut self.hw);
        while self.serve_once() {}
    }

    /// One serving iteration.  Returns `false` once the button is pressed.
    pub fn serve_once(&mut self) -> bool {
        if self.hw.is_pressed() {
            return false;
        }

        self.status.bus_health(&mut self.hw, BusHealth::Reading);
        match self.bus.poll() {
            Ok(Some(cmd)) => {
                if let Err(e) = self.dispatch(cmd) {
                    debug!("dropped {:?}: {}", cmd, e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                self.stats.bus_errors = self.stats.bus_errors.saturating_add(1);
                self.status.bus_health(&mut self.hw, BusHealth::Fault);
                warn!("bus read failed: {}", e);
                self.delay.delay_ms(self.config.delays.bus_error_cooldown_ms);
            }
        }
        true
    }

    /// Apply one command.  Returns the pulse written, if any.
    ///
    /// Only the addressed actuator changes.
    pub fn dispatch(&mut self, cmd: ActuatorCommand) -> Result<Option<u16>> {
        let index = usize::from(cmd.index);
        let count = self.actuators.len();
        if index >= count {
            self.stats.out_of_range = self.stats.out_of_range.saturating_add(1);
            return Err(Error::IndexOutOfRange {
                index: cmd.index,
                count,
            });
        }

        if !self.flags.motors_enabled {
            self.stats.suppressed = self.stats.suppressed.saturating_add(1);
            info!("motors disabled, not moving servo {} to {}", index, cmd.raw_value);
            return Ok(None);
        }

        let Some(pulse) = self.mapper.map(index, cmd.raw_value) else {
            return Ok(None);
        };
        self.hw.set_pulse_us(index, pulse);
        self.actuators[index].current_pulse_us = Some(pulse);
        self.stats.written = self.stats.written.saturating_add(1);
        Ok(Some(pulse))
    }

    /// Disable everything and paint the bar red.
    pub fn shutdown(&mut self) {
        self.enter(Phase::Shutdown);
        self.hw.disable_all();
        for state in &mut self.actuators {
            state.enabled = false;
        }
        self.status.halted(&mut self.hw);
    }

    /// Sweep the bar red, then off, until the button is pressed.
    fn alarm(&mut self) {
        self.enter(Phase::Alarm);
        let step = self.config.delays.alarm_step_ms;
        let pause = self.config.delays.alarm_pause_ms;
        let leds = self.hw.led_count();

        while !self.hw.is_pressed() {
            for colour in [COLOUR_FAULT, COLOUR_OFF] {
                for i in 0..leds {
                    self.status.set(&mut self.hw, i, colour);
                    self.delay.delay_ms(step);
                }
                self.delay.delay_ms(pause);
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("{:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn actuators(&self) -> &[ActuatorState] {
        &self.actuators
    }

    pub fn boot_flags(&self) -> BootFlags {
        self.flags
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn mapper(&self) -> &ValueMapper {
        &self.mapper
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_parts(self) -> (H, B, D) {
        (self.hw, self.bus, self.delay)
    }
}
