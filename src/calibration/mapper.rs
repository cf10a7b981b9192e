//! Raw wire byte → pulse width.

use serde::{Deserialize, Serialize};

use super::table::{CalibrationRange, CalibrationTable};
use crate::error::ConfigError;

/// Which bounds a raw byte is scaled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MappingPolicy {
    /// Each actuator's own calibrated range.  A zero result is treated as
    /// "no pulse" and discarded.
    #[default]
    PerActuator,
    /// One range for every actuator; the calibration table is ignored.
    Universal { min_pulse_us: u16, max_pulse_us: u16 },
}

/// Linear `0..=255 → [min, max]` scaler over the calibration table.
#[derive(Debug, Clone)]
pub struct ValueMapper {
    policy: MappingPolicy,
    universal: Option<CalibrationRange>,
    table: CalibrationTable,
}

impl ValueMapper {
    pub fn new(policy: MappingPolicy, table: CalibrationTable) -> Result<Self, ConfigError> {
        let universal = match policy {
            MappingPolicy::PerActuator => None,
            MappingPolicy::Universal {
                min_pulse_us,
                max_pulse_us,
            } => Some(CalibrationRange::new(min_pulse_us, max_pulse_us)?),
        };
        Ok(Self {
            policy,
            universal,
            table,
        })
    }

    pub fn policy(&self) -> MappingPolicy {
        self.policy
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// Bounds a command for `index` is scaled into, if `index` has any.
    pub fn range(&self, index: usize) -> Option<CalibrationRange> {
        match self.universal {
            Some(r) => Some(r),
            None => self.table.get(index).copied(),
        }
    }

    /// Pulse width for `raw` on actuator `index`, rounded to the nearest
    /// microsecond and clamped to the active range.
    ///
    /// `None` when `index` has no calibration entry, or when the per-actuator
    /// result is zero.
    pub fn map(&self, index: usize, raw: u8) -> Option<u16> {
        let range = self.range(index)?;
        let pulse = scale(range, raw);
        if self.universal.is_none() && pulse == 0 {
            return None;
        }
        Some(pulse)
    }
}

/// `min + raw/255 * (max - min)` in integer arithmetic, round-half-up.
pub fn scale(range: CalibrationRange, raw: u8) -> u16 {
    let span = u32::from(range.span());
    let offset = (u32::from(raw) * span + 127) / 255;
    range.clamp((u32::from(range.min()) + offset) as i32)
}
