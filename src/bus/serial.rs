//! Framed serial command source.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::{CommandBus, SerialLinePort};
use crate::error::{BusError, FrameRejected};
use crate::protocol::ActuatorCommand;
use crate::protocol::frame::{self, FRAME_SIZE};

/// Receive buffer size: ten frames.
pub const LINE_BUFFER_SIZE: usize = 10 * FRAME_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Inter-byte timeout of one line read.
    pub timeout_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            timeout_ms: 100,
        }
    }
}

/// Reads one line per poll and decodes it as a frame.
///
/// The port keeps reading past a `0x0A` in a frame's payload, so every index
/// and value is reachable.  A read that has diverged from a frame ends at its
/// first newline and is rejected on its own.
pub struct SerialFrameSource<P> {
    port: P,
    buf: [u8; LINE_BUFFER_SIZE],
    rejected: u32,
    last_rejection: Option<FrameRejected>,
}

impl<P: SerialLinePort> SerialFrameSource<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            buf: [0; LINE_BUFFER_SIZE],
            rejected: 0,
            last_rejection: None,
        }
    }

    /// Frames discarded since boot.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    pub fn last_rejection(&self) -> Option<FrameRejected> {
        self.last_rejection
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P: SerialLinePort> CommandBus for SerialFrameSource<P> {
    fn poll(&mut self) -> Result<Option<ActuatorCommand>, BusError> {
        let n = self.port.read_line(&mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        match frame::decode(&self.buf[..n]) {
            Ok(cmd) => Ok(Some(cmd)),
            Err(reason) => {
                debug!("serial: frame rejected ({}), {} bytes", reason, n);
                self.rejected = self.rejected.saturating_add(1);
                self.last_rejection = Some(reason);
                Ok(None)
            }
        }
    }
}
