//! `log` facade → defmt.
//!
//! The library logs through `log` so host tests stay plain; on target each
//! record is formatted into a fixed buffer and handed to defmt-rtt.

use core::fmt::Write;

use heapless::String;
use log::{Level, LevelFilter, Log, Metadata, Record};

const LINE_CAPACITY: usize = 160;

struct DefmtLogger;

static LOGGER: DefmtLogger = DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut line: String<LINE_CAPACITY> = String::new();
        // Overlong lines are cut at the buffer.
        let _ = write!(line, "{}", record.args());
        let target = record.target();
        match record.level() {
            Level::Error => defmt::error!("[{=str}] {=str}", target, line.as_str()),
            Level::Warn => defmt::warn!("[{=str}] {=str}", target, line.as_str()),
            Level::Info => defmt::info!("[{=str}] {=str}", target, line.as_str()),
            Level::Debug => defmt::debug!("[{=str}] {=str}", target, line.as_str()),
            Level::Trace => defmt::trace!("[{=str}] {=str}", target, line.as_str()),
        }
    }

    fn flush(&self) {}
}

/// Install the bridge.  Call once, first thing in `main`, before interrupts
/// are enabled.
pub fn init(level: LevelFilter) {
    // SAFETY: thumbv6m has no atomic CAS, so the racy setters are the only
    // ones available.  Called once from the entry point before anything else
    // can log.
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(level);
    }
}
