//! Mock board, bus and delay for integration tests.
//!
//! Records every servo and LED call so tests can assert on the full
//! command history without touching real PWM/PIO registers.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;
use servobridge::app::ports::{AnalogMuxPort, ButtonPort, CommandBus, IndicatorPort, ServoPort};
use servobridge::drivers::status_indicator::Rgb;
use servobridge::error::BusError;
use servobridge::protocol::ActuatorCommand;

// ── Servo call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCall {
    Enable(usize),
    Disable(usize),
    Pulse(usize, u16),
    Frequency(usize, u32),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub servo_count: usize,
    pub calls: Vec<ServoCall>,
    pub led_writes: Vec<(usize, Rgb)>,
    pub leds: [Rgb; 6],
    /// Voltage per mux channel; unlisted channels read 0 V.
    pub voltages: HashMap<u8, f32>,
    pub selected: u8,
    /// `is_pressed` returns true from this poll on (`None`: never).
    pub press_after: Option<usize>,
    pub button_polls: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            servo_count: 16,
            calls: Vec::new(),
            led_writes: Vec::new(),
            leds: [(0, 0, 0); 6],
            voltages: HashMap::new(),
            selected: 0,
            press_after: Some(0),
            button_polls: 0,
        }
    }

    /// Button reads released for `polls` polls, then pressed.
    pub fn pressed_after(mut self, polls: usize) -> Self {
        self.press_after = Some(polls);
        self
    }

    pub fn with_voltage(mut self, channel: u8, volts: f32) -> Self {
        self.voltages.insert(channel, volts);
        self
    }

    pub fn pulses(&self) -> Vec<(usize, u16)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServoCall::Pulse(i, p) => Some((*i, *p)),
                _ => None,
            })
            .collect()
    }

    pub fn enabled(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServoCall::Enable(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn disabled(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServoCall::Disable(i) => Some(*i),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoPort for MockHardware {
    fn servo_count(&self) -> usize {
        self.servo_count
    }

    fn enable(&mut self, index: usize) {
        self.calls.push(ServoCall::Enable(index));
    }

    fn disable(&mut self, index: usize) {
        self.calls.push(ServoCall::Disable(index));
    }

    fn set_pulse_us(&mut self, index: usize, pulse_us: u16) {
        self.calls.push(ServoCall::Pulse(index, pulse_us));
    }

    fn set_frequency(&mut self, index: usize, hz: u32) {
        self.calls.push(ServoCall::Frequency(index, hz));
    }
}

impl IndicatorPort for MockHardware {
    fn led_count(&self) -> usize {
        self.leds.len()
    }

    fn set_colour(&mut self, index: usize, colour: Rgb) {
        self.leds[index] = colour;
        self.led_writes.push((index, colour));
    }
}

impl AnalogMuxPort for MockHardware {
    fn select(&mut self, channel: u8) {
        self.selected = channel;
    }

    fn read_voltage(&mut self) -> f32 {
        self.voltages.get(&self.selected).copied().unwrap_or(0.0)
    }
}

impl ButtonPort for MockHardware {
    fn is_pressed(&mut self) -> bool {
        let polls = self.button_polls;
        self.button_polls += 1;
        self.press_after.is_some_and(|n| polls >= n)
    }
}

// ── ScriptedBus ───────────────────────────────────────────────

/// Hands out a fixed script of poll results, then `Ok(None)` forever.
#[derive(Default)]
pub struct ScriptedBus {
    pub script: VecDeque<Result<Option<ActuatorCommand>, BusError>>,
    pub polls: usize,
}

#[allow(dead_code)]
impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, index: u8, raw_value: u8) -> Self {
        self.script
            .push_back(Ok(Some(ActuatorCommand::new(index, raw_value))));
        self
    }

    pub fn error(mut self, e: BusError) -> Self {
        self.script.push_back(Err(e));
        self
    }

    pub fn idle(mut self) -> Self {
        self.script.push_back(Ok(None));
        self
    }
}

impl CommandBus for ScriptedBus {
    fn poll(&mut self) -> Result<Option<ActuatorCommand>, BusError> {
        self.polls += 1;
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

// ── MockDelay ─────────────────────────────────────────────────

/// Records every millisecond wait; never sleeps.
#[derive(Default)]
pub struct MockDelay {
    pub waits_ms: Vec<u32>,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.waits_ms.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}
