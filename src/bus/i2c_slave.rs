//! Register-level I2C slave on the RP2040 DesignWare controller.
//!
//! The HAL only offers an async slave; this drives the block directly so the
//! serving loop can poll it without an executor.  The controller hardware
//! ACKs on its own; we only ever drain the RX FIFO.
//!
//! There is no backpressure: the FIFO is 16 bytes deep and anything the
//! controller sends past that between two polls is lost.

use heapless::{Deque, Vec};
use log::debug;
use serde::{Deserialize, Serialize};

use super::registers::{
    GPIO_FUNCSEL_I2C, GPIO_FUNCSEL_MASK, IC_CLR_RD_REQ, IC_CLR_TX_ABRT, IC_CON,
    IC_CON_SLAVE_MASK, IC_DATA_CMD, IC_DATA_MASK, IC_ENABLE, IC_ENABLE_ENABLE, IC_INTR_RD_REQ,
    IC_RAW_INTR_STAT, IC_SAR, IC_SAR_MASK, IC_STATUS, IC_STATUS_RFNE, PAD_IE, PAD_PUE,
    RESETS_BASE, RESETS_DONE, RESETS_RESET, RegisterBank, RegisterFile, gpio_ctrl, pad_ctrl,
    reset_bit,
};
use crate::app::ports::CommandBus;
use crate::error::{BusError, ConfigError};
use crate::pins::{I2C_SCL_GPIO, I2C_SDA_GPIO, MAX_GPIO};
use crate::protocol::ActuatorCommand;

/// Largest I2C address accepted (7-bit addressing only).
pub const MAX_ADDRESS: u16 = 0x7F;
pub const DEFAULT_ADDRESS: u16 = 0x08;

/// Polls of `RESET_DONE` before giving up on the controller.
const RESET_SPIN_LIMIT: u32 = 10_000;

/// Maximum bytes returned from one [`I2cSlaveDriver::drain`].
pub const DRAIN_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct I2cSlaveConfig {
    pub address: u16,
    pub sda_pin: u8,
    pub scl_pin: u8,
}

impl Default for I2cSlaveConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            sda_pin: I2C_SDA_GPIO,
            scl_pin: I2C_SCL_GPIO,
        }
    }
}

impl I2cSlaveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > MAX_ADDRESS {
            return Err(ConfigError::I2cAddress(self.address));
        }
        for pin in [self.sda_pin, self.scl_pin] {
            if pin > MAX_GPIO {
                return Err(ConfigError::Pin(pin));
            }
        }
        Ok(())
    }
}

/// Slave-mode driver over one controller's [`RegisterBank`].
pub struct I2cSlaveDriver<F> {
    bank: RegisterBank<F>,
}

impl<F: RegisterFile> I2cSlaveDriver<F> {
    pub fn new(bank: RegisterBank<F>) -> Self {
        Self { bank }
    }

    /// Take the controller out of reset.  The HAL has not touched it, so it is
    /// still held in reset after boot.  Returns `false` if it never came out.
    pub fn release_reset(&mut self) -> bool {
        let bit = reset_bit(self.bank.base());
        self.bank.clear_abs(RESETS_BASE + RESETS_RESET, bit);
        (0..RESET_SPIN_LIMIT).any(|_| self.bank.read_abs(RESETS_BASE + RESETS_DONE) & bit != 0)
    }

    /// Put the controller into slave mode at `cfg.address` with pull-ups on
    /// both pins.  Safe to call again; the controller is disabled while the
    /// address and mode change.
    pub fn configure(&mut self, cfg: &I2cSlaveConfig) {
        self.bank.clear(IC_ENABLE, IC_ENABLE_ENABLE);

        self.bank.clear(IC_SAR, IC_SAR_MASK);
        self.bank.set(IC_SAR, u32::from(cfg.address) & IC_SAR_MASK);

        self.bank.clear(IC_CON, IC_CON_SLAVE_MASK);

        for pin in [cfg.sda_pin, cfg.scl_pin] {
            self.bank.clear_abs(gpio_ctrl(pin), GPIO_FUNCSEL_MASK);
            self.bank.set_abs(gpio_ctrl(pin), GPIO_FUNCSEL_I2C);
            self.bank.set_abs(pad_ctrl(pin), PAD_PUE | PAD_IE);
        }

        self.bank.set(IC_ENABLE, IC_ENABLE_ENABLE);
        debug!(
            "i2c slave at 0x{:02x} (sda={}, scl={})",
            cfg.address, cfg.sda_pin, cfg.scl_pin
        );
    }

    /// RX FIFO holds at least one byte.
    pub fn has_data(&mut self) -> bool {
        self.bank.read(IC_STATUS) & IC_STATUS_RFNE != 0
    }

    /// Pop everything currently in the RX FIFO.
    pub fn drain(&mut self) -> Vec<u8, DRAIN_CAPACITY> {
        let mut out = Vec::new();
        while !out.is_full() && self.has_data() {
            let byte = (self.bank.read(IC_DATA_CMD) & IC_DATA_MASK) as u8;
            let _ = out.push(byte);
        }
        out
    }

    /// Clear a pending transmit abort (read-to-clear).
    pub fn ack_abort(&mut self) {
        let _ = self.bank.read(IC_CLR_TX_ABRT);
    }

    /// The controller is waiting for us to supply a byte.
    pub fn read_requested(&mut self) -> bool {
        self.bank.read(IC_RAW_INTR_STAT) & IC_INTR_RD_REQ != 0
    }

    /// Answer a read request with `byte`.
    pub fn respond(&mut self, byte: u8) {
        self.ack_abort();
        let _ = self.bank.read(IC_CLR_RD_REQ);
        self.bank.write(IC_DATA_CMD, u32::from(byte));
    }

    pub fn bank(&self) -> &RegisterBank<F> {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut RegisterBank<F> {
        &mut self.bank
    }
}

// ---------------------------------------------------------------------------
// Command source
// ---------------------------------------------------------------------------

/// Turns drained bytes into `(index, value)` pairs, in arrival order.
///
/// A drain may yield several commands at once; the extras are queued and
/// handed out on later polls before the FIFO is read again.  A poll can land
/// between the two bytes of one write, so an odd byte left over at the end
/// of a drain is held and paired with the first byte of the next.
pub struct I2cCommandSource<F> {
    driver: I2cSlaveDriver<F>,
    pending: Deque<ActuatorCommand, { DRAIN_CAPACITY / 2 }>,
    carry: Option<u8>,
}

impl<F: RegisterFile> I2cCommandSource<F> {
    pub fn new(driver: I2cSlaveDriver<F>) -> Self {
        Self {
            driver,
            pending: Deque::new(),
            carry: None,
        }
    }

    /// Index byte still waiting for its value.
    pub fn carry(&self) -> Option<u8> {
        self.carry
    }

    pub fn driver(&self) -> &I2cSlaveDriver<F> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut I2cSlaveDriver<F> {
        &mut self.driver
    }

    fn refill(&mut self) {
        let bytes = self.driver.drain();
        for byte in bytes {
            match self.carry.take() {
                Some(index) => {
                    let _ = self.pending.push_back(ActuatorCommand::new(index, byte));
                }
                None => self.carry = Some(byte),
            }
        }
        if let Some(index) = self.carry {
            debug!("i2c: holding index byte 0x{:02x} for the next drain", index);
        }
    }
}

impl<F: RegisterFile> CommandBus for I2cCommandSource<F> {
    fn poll(&mut self) -> Result<Option<ActuatorCommand>, BusError> {
        if self.pending.is_empty() {
            self.refill();
        }
        Ok(self.pending.pop_front())
    }
}
