//! Application core: pure domain logic, zero I/O.
//!
//! The boot, homing, calibration and serving sequence lives in
//! [`service`].  All interaction with hardware happens through the port
//! traits in [`ports`], keeping this layer testable without real peripherals.

pub mod ports;
pub mod service;
