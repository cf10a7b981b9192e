//! Status signalling on the LED bar.
//!
//! | LED   | Meaning            | Colour                          |
//! |-------|--------------------|---------------------------------|
//! | 0     | Power              | green                           |
//! | 1     | Startup complete   | purple                          |
//! | 2     | Bus health         | blue while reading, red on fault|
//! | 1..   | Calibration mode   | blue                            |
//! | all   | Halted             | red                             |
//! | all   | Alarm              | flashing red                    |
//!
//! Every colour passes through the brightness scale before it reaches the
//! port, so the constants below are full-intensity.

use crate::app::ports::IndicatorPort;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const POWER_LED: usize = 0;
pub const STARTUP_LED: usize = 1;
pub const BUS_LED: usize = 2;

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_POWER: Rgb = (0, 255, 0);
pub const COLOUR_STARTUP: Rgb = (200, 0, 255);
pub const COLOUR_BUS_READING: Rgb = (0, 0, 255);
pub const COLOUR_FAULT: Rgb = (255, 0, 0);
pub const COLOUR_CALIBRATION: Rgb = (0, 0, 200);

pub const DEFAULT_BRIGHTNESS: f32 = 0.3;

/// Bus-health LED state, remembered so the LED is only rewritten on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusHealth {
    Reading,
    Fault,
}

pub struct StatusIndicator {
    brightness: f32,
    bus: Option<BusHealth>,
}

impl StatusIndicator {
    /// `brightness` is clamped to `0.0..=1.0`.
    pub fn new(brightness: f32) -> Self {
        Self {
            brightness: brightness.clamp(0.0, 1.0),
            bus: None,
        }
    }

    /// Scale a full-intensity colour, truncating toward zero.
    pub fn scale(&self, (r, g, b): Rgb) -> Rgb {
        let s = |c: u8| (f32::from(c) * self.brightness) as u8;
        (s(r), s(g), s(b))
    }

    pub fn set(&self, leds: &mut impl IndicatorPort, index: usize, colour: Rgb) {
        if index < leds.led_count() {
            leds.set_colour(index, self.scale(colour));
        }
    }

    /// Paint LEDs `from..` with one colour.
    pub fn fill_from(&self, leds: &mut impl IndicatorPort, from: usize, colour: Rgb) {
        let scaled = self.scale(colour);
        for i in from..leds.led_count() {
            leds.set_colour(i, scaled);
        }
    }

    pub fn power_on(&self, leds: &mut impl IndicatorPort) {
        self.set(leds, POWER_LED, COLOUR_POWER);
    }

    pub fn startup_complete(&self, leds: &mut impl IndicatorPort) {
        self.set(leds, STARTUP_LED, COLOUR_STARTUP);
    }

    pub fn calibration_mode(&self, leds: &mut impl IndicatorPort) {
        self.fill_from(leds, STARTUP_LED, COLOUR_CALIBRATION);
    }

    pub fn halted(&self, leds: &mut impl IndicatorPort) {
        self.fill_from(leds, 0, COLOUR_FAULT);
    }

    pub fn bus_health(&mut self, leds: &mut impl IndicatorPort, health: BusHealth) {
        if self.bus == Some(health) {
            return;
        }
        self.bus = Some(health);
        let colour = match health {
            BusHealth::Reading => COLOUR_BUS_READING,
            BusHealth::Fault => COLOUR_FAULT,
        };
        self.set(leds, BUS_LED, colour);
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_BRIGHTNESS)
    }
}
