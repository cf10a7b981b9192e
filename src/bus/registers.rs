//! Memory-mapped register access for the RP2040 I2C slave path.
//!
//! [`RegisterBank`] names the DesignWare APB I2C registers and exposes the
//! RP2040's atomic XOR/SET/CLR write aliases.  It is generic over a
//! [`RegisterFile`]: [`MmioRegisterFile`] does volatile accesses on target,
//! [`SimRegisterFile`] emulates the block (FIFO, read-to-clear flags, alias
//! writes) so the driver is testable on the host.

use heapless::{Deque, FnvIndexMap, Vec};

// ---------------------------------------------------------------------------
// Peripheral base addresses
// ---------------------------------------------------------------------------

pub const I2C0_BASE: usize = 0x4004_4000;
pub const I2C1_BASE: usize = 0x4004_8000;
pub const IO_BANK0_BASE: usize = 0x4001_4000;
pub const PADS_BANK0_BASE: usize = 0x4001_C000;
pub const RESETS_BASE: usize = 0x4000_C000;

// ---------------------------------------------------------------------------
// Atomic write aliases (offset added to the register address)
// ---------------------------------------------------------------------------

pub const ALIAS_XOR: usize = 0x1000;
pub const ALIAS_SET: usize = 0x2000;
pub const ALIAS_CLR: usize = 0x3000;
const ALIAS_MASK: usize = 0x3000;

// ---------------------------------------------------------------------------
// I2C register offsets
// ---------------------------------------------------------------------------

pub const IC_CON: usize = 0x00;
pub const IC_SAR: usize = 0x08;
pub const IC_DATA_CMD: usize = 0x10;
pub const IC_RAW_INTR_STAT: usize = 0x34;
pub const IC_CLR_RD_REQ: usize = 0x50;
pub const IC_CLR_TX_ABRT: usize = 0x54;
pub const IC_ENABLE: usize = 0x6C;
pub const IC_STATUS: usize = 0x70;

// ---------------------------------------------------------------------------
// Bit fields
// ---------------------------------------------------------------------------

/// `IC_CON`: MASTER_MODE | IC_10BITADDR_SLAVE | IC_SLAVE_DISABLE.
pub const IC_CON_SLAVE_MASK: u32 = 0b0100_1001;
/// `IC_SAR` address field width.
pub const IC_SAR_MASK: u32 = 0x3FF;
pub const IC_ENABLE_ENABLE: u32 = 1 << 0;
/// `IC_STATUS.RFNE`: receive FIFO not empty.
pub const IC_STATUS_RFNE: u32 = 1 << 3;
pub const IC_INTR_RD_REQ: u32 = 1 << 5;
pub const IC_INTR_TX_ABRT: u32 = 1 << 6;
pub const IC_DATA_MASK: u32 = 0xFF;

/// `GPIOn_CTRL.FUNCSEL`.
pub const GPIO_FUNCSEL_MASK: u32 = 0x1F;
pub const GPIO_FUNCSEL_I2C: u32 = 3;
/// Pad control: pull-up enable.
pub const PAD_PUE: u32 = 1 << 3;
/// Pad control: input enable.
pub const PAD_IE: u32 = 1 << 6;

/// `RESETS.RESET` / `RESETS.RESET_DONE`.
pub const RESETS_RESET: usize = 0x00;
pub const RESETS_DONE: usize = 0x08;

/// RESETS bit of the I2C controller at `base`.
pub const fn reset_bit(base: usize) -> u32 {
    if base == I2C1_BASE { 1 << 4 } else { 1 << 3 }
}

/// Address of `GPIOn_CTRL` in IO_BANK0.
pub const fn gpio_ctrl(pin: u8) -> usize {
    IO_BANK0_BASE + 0x04 + 8 * pin as usize
}

/// Address of pad control `GPIOn` in PADS_BANK0.
pub const fn pad_ctrl(pin: u8) -> usize {
    PADS_BANK0_BASE + 0x04 + 4 * pin as usize
}

// ---------------------------------------------------------------------------
// RegisterFile
// ---------------------------------------------------------------------------

/// Raw 32-bit word access at absolute addresses.
///
/// Reads take `&mut self` because some registers have read side effects
/// (FIFO pops, read-to-clear flags).
pub trait RegisterFile {
    fn read(&mut self, addr: usize) -> u32;
    fn write(&mut self, addr: usize, value: u32);
}

impl<F: RegisterFile + ?Sized> RegisterFile for &mut F {
    fn read(&mut self, addr: usize) -> u32 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: usize, value: u32) {
        (**self).write(addr, value);
    }
}

// ---------------------------------------------------------------------------
// RegisterBank
// ---------------------------------------------------------------------------

/// One I2C controller instance viewed through a [`RegisterFile`].
pub struct RegisterBank<F> {
    file: F,
    base: usize,
}

impl<F: RegisterFile> RegisterBank<F> {
    pub fn new(file: F, base: usize) -> Self {
        Self { file, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Read an I2C register by offset.
    pub fn read(&mut self, reg: usize) -> u32 {
        self.file.read(self.base + reg)
    }

    pub fn write(&mut self, reg: usize, value: u32) {
        self.file.write(self.base + reg, value);
    }

    /// Atomically set `mask` bits (SET alias).
    pub fn set(&mut self, reg: usize, mask: u32) {
        self.file.write(self.base + reg + ALIAS_SET, mask);
    }

    /// Atomically clear `mask` bits (CLR alias).
    pub fn clear(&mut self, reg: usize, mask: u32) {
        self.file.write(self.base + reg + ALIAS_CLR, mask);
    }

    /// Atomically flip `mask` bits (XOR alias).
    pub fn toggle(&mut self, reg: usize, mask: u32) {
        self.file.write(self.base + reg + ALIAS_XOR, mask);
    }

    /// Read-modify-write.  Not atomic; only for multi-bit fields.
    pub fn modify(&mut self, reg: usize, f: impl FnOnce(u32) -> u32) {
        let v = self.read(reg);
        self.write(reg, f(v));
    }

    /// Access registers outside this controller (IO_BANK0, PADS_BANK0).
    pub fn read_abs(&mut self, addr: usize) -> u32 {
        self.file.read(addr)
    }

    pub fn set_abs(&mut self, addr: usize, mask: u32) {
        self.file.write(addr + ALIAS_SET, mask);
    }

    pub fn clear_abs(&mut self, addr: usize, mask: u32) {
        self.file.write(addr + ALIAS_CLR, mask);
    }

    pub fn file(&self) -> &F {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut F {
        &mut self.file
    }

    pub fn into_inner(self) -> F {
        self.file
    }
}

// ---------------------------------------------------------------------------
// MMIO backend
// ---------------------------------------------------------------------------

/// Volatile accesses to the real peripheral address space.
pub struct MmioRegisterFile {
    _private: (),
}

impl MmioRegisterFile {
    /// # Safety
    ///
    /// The caller must own the I2C controller and the pins it will touch.
    /// Nothing else (HAL drivers included) may drive them concurrently.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterFile for MmioRegisterFile {
    fn read(&mut self, addr: usize) -> u32 {
        // SAFETY: constructing `MmioRegisterFile` asserted exclusive access,
        // and every address passed in is a word-aligned RP2040 register.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write(&mut self, addr: usize, value: u32) {
        // SAFETY: as for `read`.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

/// Depth of the emulated RX FIFO (matches the RP2040's 16-entry FIFO).
pub const SIM_FIFO_DEPTH: usize = 16;

/// Emulation of one DesignWare I2C block plus plain-memory GPIO/pad registers.
///
/// - `RESETS.RESET_DONE` reads as the complement of `RESETS.RESET`.
/// - `IC_DATA_CMD` reads pop the RX FIFO; writes append to the TX log.
/// - `IC_STATUS.RFNE` tracks the FIFO.
/// - `IC_CLR_RD_REQ` / `IC_CLR_TX_ABRT` reads clear their raw interrupt bit.
/// - Writes at alias offsets apply XOR/SET/CLR to the underlying register.
///
/// Every write lands in a log so tests can check ordering.
pub struct SimRegisterFile {
    base: usize,
    regs: FnvIndexMap<usize, u32, 64>,
    rx_fifo: Deque<u8, SIM_FIFO_DEPTH>,
    tx: Vec<u8, SIM_FIFO_DEPTH>,
    writes: Vec<(usize, u32), 128>,
}

impl SimRegisterFile {
    pub fn new(base: usize) -> Self {
        Self {
            base,
            regs: FnvIndexMap::new(),
            rx_fifo: Deque::new(),
            tx: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Controller writes `bytes` to us.  Bytes beyond FIFO depth are lost,
    /// as on hardware.  Returns how many were accepted.
    pub fn receive(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.rx_fifo.push_back(b).is_ok())
            .count()
    }

    /// Controller issues a read to us.
    pub fn request_read(&mut self) {
        self.or_raw(IC_RAW_INTR_STAT, IC_INTR_RD_REQ);
    }

    /// A previous transmit was aborted.
    pub fn raise_tx_abort(&mut self) {
        self.or_raw(IC_RAW_INTR_STAT, IC_INTR_TX_ABRT);
    }

    /// Bytes written to `IC_DATA_CMD`.
    pub fn transmitted(&self) -> &[u8] {
        &self.tx
    }

    pub fn rx_pending(&self) -> usize {
        self.rx_fifo.len()
    }

    /// Current value of the register at `addr`, without side effects.
    pub fn peek(&self, addr: usize) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Seed a register value, bypassing the write log.
    pub fn poke(&mut self, addr: usize, value: u32) {
        self.store(addr, value);
    }

    /// Every write issued so far, as `(address incl. alias, value)`.
    pub fn writes(&self) -> &[(usize, u32)] {
        &self.writes
    }

    fn or_raw(&mut self, reg: usize, bits: u32) {
        let addr = self.base + reg;
        let v = self.peek(addr) | bits;
        self.store(addr, v);
    }

    fn store(&mut self, addr: usize, value: u32) {
        // The map only overflows if a test touches > 64 distinct registers.
        let _ = self.regs.insert(addr, value);
    }
}

impl RegisterFile for SimRegisterFile {
    fn read(&mut self, addr: usize) -> u32 {
        if addr == RESETS_BASE + RESETS_DONE {
            return !self.peek(RESETS_BASE + RESETS_RESET);
        }
        let Some(reg) = addr.checked_sub(self.base).filter(|off| *off < 0x100) else {
            return self.peek(addr);
        };
        match reg {
            IC_DATA_CMD => self.rx_fifo.pop_front().map_or(0, u32::from),
            IC_STATUS => {
                let rfne = if self.rx_fifo.is_empty() { 0 } else { IC_STATUS_RFNE };
                (self.peek(addr) & !IC_STATUS_RFNE) | rfne
            }
            IC_CLR_RD_REQ => {
                let raw = self.peek(self.base + IC_RAW_INTR_STAT);
                self.store(self.base + IC_RAW_INTR_STAT, raw & !IC_INTR_RD_REQ);
                u32::from(raw & IC_INTR_RD_REQ != 0)
            }
            IC_CLR_TX_ABRT => {
                let raw = self.peek(self.base + IC_RAW_INTR_STAT);
                self.store(self.base + IC_RAW_INTR_STAT, raw & !IC_INTR_TX_ABRT);
                u32::from(raw & IC_INTR_TX_ABRT != 0)
            }
            _ => self.peek(addr),
        }
    }

    fn write(&mut self, addr: usize, value: u32) {
        let _ = self.writes.push((addr, value));

        let target = addr & !ALIAS_MASK;
        let current = self.peek(target);
        let next = match addr & ALIAS_MASK {
            ALIAS_XOR => current ^ value,
            ALIAS_SET => current | value,
            ALIAS_CLR => current & !value,
            _ => {
                if target == self.base + IC_DATA_CMD {
                    let _ = self.tx.push((value & IC_DATA_MASK) as u8);
                    return;
                }
                value
            }
        };
        self.store(target, next);
    }
}
