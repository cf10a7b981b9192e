//! Hardware adapter: bridges the RP2040 peripherals to the domain port traits.
//!
//! [`Board`] owns the servo PWM slices, the WS2812 LED bar, the sensor mux and
//! the user button, exposing them as [`BoardPort`](crate::app::ports::BoardPort).
//! [`UartLinePort`] adapts the buffered UART to [`SerialLinePort`].  This is
//! the only module that touches embassy-rp.

use embassy_futures::block_on;
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::gpio::{Input, Level, Output};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio_programs::ws2812::{Grb, PioWs2812};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::BufferedUart;
use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady};
use log::warn;
use smart_leds::RGB8;

use crate::app::ports::{AnalogMuxPort, ButtonPort, IndicatorPort, SerialLinePort, ServoPort};
use crate::drivers::status_indicator::Rgb;
use crate::error::BusError;
use crate::pins::NUM_LEDS;
use crate::protocol::frame;

/// PWM slices carrying servo outputs.  GPIO16/17 wrap back onto slice 0 and
/// double as the UART, so only outputs 1–16 are driven.
pub const SERVO_SLICES: usize = 8;
pub const DRIVEN_SERVOS: usize = 2 * SERVO_SLICES;

/// Standard servo frame: 50 Hz at 1 µs per tick.
const DEFAULT_FRAME_HZ: u32 = 50;
const TICK_HZ: u32 = 1_000_000;

/// ADC reference and resolution.
const ADC_VREF: f32 = 3.3;
const ADC_FULL_SCALE: f32 = 4096.0;

// ───────────────────────────────────────────────────────────────
// Servo bank
// ───────────────────────────────────────────────────────────────

/// Sixteen servo outputs on eight PWM slices, A channel = even GPIO.
///
/// A disabled output has its compare register at 0 (line held low); the
/// last requested pulse is kept and restored on enable.  Frame rate is per
/// slice, so a frequency override also applies to the output's neighbour.
pub struct ServoBank {
    slices: [Pwm<'static>; SERVO_SLICES],
    configs: [PwmConfig; SERVO_SLICES],
    pulses: [u16; DRIVEN_SERVOS],
    enabled: [bool; DRIVEN_SERVOS],
}

impl ServoBank {
    pub fn new(slices: [Pwm<'static>; SERVO_SLICES]) -> Self {
        let clk = embassy_rp::clocks::clk_sys_freq();
        let div = (clk / TICK_HZ).clamp(1, 255) as u8;

        let configs = core::array::from_fn(|_| {
            let mut cfg = PwmConfig::default();
            cfg.top = frame_top(DEFAULT_FRAME_HZ);
            cfg.phase_correct = false;
            cfg.divider = div.into();
            cfg.compare_a = 0;
            cfg.compare_b = 0;
            cfg.enable = true;
            cfg
        });

        let mut bank = Self {
            slices,
            configs,
            pulses: [0; DRIVEN_SERVOS],
            enabled: [false; DRIVEN_SERVOS],
        };
        for s in 0..SERVO_SLICES {
            bank.apply(s);
        }
        bank
    }

    fn apply(&mut self, slice: usize) {
        self.slices[slice].set_config(&self.configs[slice]);
    }

    fn set_compare(&mut self, index: usize, ticks: u16) {
        let slice = index / 2;
        let cfg = &mut self.configs[slice];
        if index % 2 == 0 {
            cfg.compare_a = ticks;
        } else {
            cfg.compare_b = ticks;
        }
        self.apply(slice);
    }
}

fn frame_top(hz: u32) -> u16 {
    (TICK_HZ / hz.max(16)).saturating_sub(1).min(u32::from(u16::MAX)) as u16
}

impl ServoPort for ServoBank {
    fn servo_count(&self) -> usize {
        DRIVEN_SERVOS
    }

    fn enable(&mut self, index: usize) {
        if index < DRIVEN_SERVOS {
            self.enabled[index] = true;
            self.set_compare(index, self.pulses[index]);
        }
    }

    fn disable(&mut self, index: usize) {
        if index < DRIVEN_SERVOS {
            self.enabled[index] = false;
            self.set_compare(index, 0);
        }
    }

    fn set_pulse_us(&mut self, index: usize, pulse_us: u16) {
        if index >= DRIVEN_SERVOS {
            return;
        }
        let top = self.configs[index / 2].top;
        let pulse = pulse_us.min(top);
        self.pulses[index] = pulse;
        if self.enabled[index] {
            self.set_compare(index, pulse);
        }
    }

    fn set_frequency(&mut self, index: usize, hz: u32) {
        if index >= DRIVEN_SERVOS {
            return;
        }
        let slice = index / 2;
        self.configs[slice].top = frame_top(hz);
        self.apply(slice);
    }
}

// ───────────────────────────────────────────────────────────────
// Board
// ───────────────────────────────────────────────────────────────

/// WS2812 bar on PIO0 state machine 0.
pub type LedBar = PioWs2812<'static, PIO0, 0, NUM_LEDS, Grb>;

pub struct Board {
    servos: ServoBank,
    leds: LedBar,
    frame: [RGB8; NUM_LEDS],
    mux_addr: [Output<'static>; 3],
    adc: Adc<'static, Blocking>,
    sensor: Channel<'static>,
    button: Input<'static>,
}

impl Board {
    pub fn new(
        servos: ServoBank,
        leds: LedBar,
        mux_addr: [Output<'static>; 3],
        adc: Adc<'static, Blocking>,
        sensor: Channel<'static>,
        button: Input<'static>,
    ) -> Self {
        Self {
            servos,
            leds,
            frame: [RGB8::default(); NUM_LEDS],
            mux_addr,
            adc,
            sensor,
            button,
        }
    }
}

impl ServoPort for Board {
    fn servo_count(&self) -> usize {
        self.servos.servo_count()
    }

    fn enable(&mut self, index: usize) {
        self.servos.enable(index);
    }

    fn disable(&mut self, index: usize) {
        self.servos.disable(index);
    }

    fn set_pulse_us(&mut self, index: usize, pulse_us: u16) {
        self.servos.set_pulse_us(index, pulse_us);
    }

    fn set_frequency(&mut self, index: usize, hz: u32) {
        self.servos.set_frequency(index, hz);
    }
}

impl IndicatorPort for Board {
    fn led_count(&self) -> usize {
        NUM_LEDS
    }

    fn set_colour(&mut self, index: usize, (r, g, b): Rgb) {
        if let Some(px) = self.frame.get_mut(index) {
            *px = RGB8::new(r, g, b);
            block_on(self.leds.write(&self.frame));
        }
    }
}

impl AnalogMuxPort for Board {
    fn select(&mut self, channel: u8) {
        for (bit, line) in self.mux_addr.iter_mut().enumerate() {
            line.set_level(Level::from(channel & (1 << bit) != 0));
        }
    }

    fn read_voltage(&mut self) -> f32 {
        match self.adc.blocking_read(&mut self.sensor) {
            Ok(raw) => f32::from(raw) * ADC_VREF / ADC_FULL_SCALE,
            Err(_) => {
                warn!("adc read failed");
                0.0
            }
        }
    }
}

impl ButtonPort for Board {
    fn is_pressed(&mut self) -> bool {
        // Active-low with pull-up.
        self.button.is_low()
    }
}

// ───────────────────────────────────────────────────────────────
// UART line reader
// ───────────────────────────────────────────────────────────────

/// Readline over the buffered UART.  Stops at a full buffer, when no byte
/// arrives for `timeout`, or at a `\n` that ends the frame being read.
pub struct UartLinePort {
    uart: BufferedUart,
    timeout: Duration,
}

impl UartLinePort {
    pub fn new(uart: BufferedUart, timeout_ms: u32) -> Self {
        Self {
            uart,
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }
}

impl SerialLinePort for UartLinePort {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, BusError> {
        let mut n = 0;
        let mut deadline = Instant::now() + self.timeout;

        while n < buf.len() {
            let ready = self.uart.read_ready().map_err(|_| BusError::SerialFault)?;
            if !ready {
                if Instant::now() >= deadline {
                    break;
                }
                continue;
            }
            let mut byte = [0u8; 1];
            if self.uart.read(&mut byte).map_err(|_| BusError::SerialFault)? == 0 {
                continue;
            }
            buf[n] = byte[0];
            n += 1;
            if byte[0] == b'\n' && frame::newline_ends_read(&buf[..n]) {
                break;
            }
            deadline = Instant::now() + self.timeout;
        }
        Ok(n)
    }
}
