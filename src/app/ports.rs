//! Port traits: the hexagonal boundary between the dispatcher and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ActuatorDispatcher (domain)
//! ```
//!
//! `adapters::hardware` implements these over embassy-rp on target; the
//! integration tests implement them with a recording mock.  Delays come in
//! separately as an [`embedded_hal::delay::DelayNs`].

use crate::drivers::status_indicator::Rgb;
use crate::error::BusError;
use crate::protocol::ActuatorCommand;

// ───────────────────────────────────────────────────────────────
// Servo port (domain → PWM outputs)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the servo outputs.
///
/// Pulse bounds (min/mid/max) are not asked of the hardware; the
/// calibration table is the single place they live.
pub trait ServoPort {
    /// Number of outputs the adapter drives.
    fn servo_count(&self) -> usize;

    /// Start emitting pulses on `index`.
    fn enable(&mut self, index: usize);

    /// Stop emitting pulses on `index` (output held low, servo goes limp).
    fn disable(&mut self, index: usize);

    /// Set the pulse width of an enabled output.
    fn set_pulse_us(&mut self, index: usize, pulse_us: u16);

    /// Change the PWM frame rate of one output.
    fn set_frequency(&mut self, index: usize, hz: u32);

    /// Kill every output.
    fn disable_all(&mut self) {
        for i in 0..self.servo_count() {
            self.disable(i);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → LED bar)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn led_count(&self) -> usize;

    /// Set one LED.  The colour is already brightness-scaled.
    fn set_colour(&mut self, index: usize, colour: Rgb);
}

// ───────────────────────────────────────────────────────────────
// Analog mux port (sensor headers → domain)
// ───────────────────────────────────────────────────────────────

pub trait AnalogMuxPort {
    /// Route mux address `channel` to the shared ADC.
    fn select(&mut self, channel: u8);

    /// Voltage on the currently selected channel.
    fn read_voltage(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Button port
// ───────────────────────────────────────────────────────────────

pub trait ButtonPort {
    /// Raw, undebounced level of the user switch.
    fn is_pressed(&mut self) -> bool;
}

/// Everything the dispatcher drives directly.
pub trait BoardPort: ServoPort + IndicatorPort + AnalogMuxPort + ButtonPort {}

impl<T: ServoPort + IndicatorPort + AnalogMuxPort + ButtonPort> BoardPort for T {}

// ───────────────────────────────────────────────────────────────
// Command bus (serial or I2C → domain)
// ───────────────────────────────────────────────────────────────

/// One poll of the active command bus.
///
/// - `Ok(Some(cmd))`: a well-formed command arrived.
/// - `Ok(None)`: nothing usable this cycle (timeout, rejected frame, empty FIFO).
/// - `Err(_)`: the bus itself failed.
pub trait CommandBus {
    fn poll(&mut self) -> Result<Option<ActuatorCommand>, BusError>;
}

impl<B: CommandBus + ?Sized> CommandBus for &mut B {
    fn poll(&mut self) -> Result<Option<ActuatorCommand>, BusError> {
        (**self).poll()
    }
}

// ───────────────────────────────────────────────────────────────
// Serial line port (UART → serial frame source)
// ───────────────────────────────────────────────────────────────

/// Line-oriented serial input.
pub trait SerialLinePort {
    /// Read bytes into `buf` until `buf` is full, until the inter-byte
    /// timeout expires, or until (and including) a `\n` for which
    /// [`frame::newline_ends_read`] holds.  A newline inside a frame's payload
    /// does not end the read.  Returns the number of bytes read; `0` means
    /// nothing arrived.
    ///
    /// [`frame::newline_ends_read`]: crate::protocol::frame::newline_ends_read
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, BusError>;
}
