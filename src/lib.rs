//! Servo bridge firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the host
//! `servo-remote` tool.  Everything RP2040-specific sits behind the `rp2040`
//! feature in [`adapters`].

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod app;
pub mod bus;
pub mod calibration;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod protocol;

#[cfg(feature = "rp2040")]
pub mod adapters;

pub use error::{Error, Result};
