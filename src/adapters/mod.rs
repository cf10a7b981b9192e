//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                                         | Connects to                  |
//! |------------|----------------------------------------------------|------------------------------|
//! | `hardware` | ServoPort, IndicatorPort, AnalogMuxPort, ButtonPort | RP2040 PWM, PIO, ADC, GPIO   |
//! |            | SerialLinePort                                     | UART0 (buffered)             |
//! | `logger`   | `log::Log`                                         | defmt over RTT               |
//!
//! The I2C bus needs no adapter here: `bus::registers::MmioRegisterFile`
//! already talks to the controller directly.

pub mod hardware;
pub mod logger;
