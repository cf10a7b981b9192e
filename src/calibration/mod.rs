//! Calibration: per-actuator pulse bounds, byte→pulse mapping, and the
//! interactive adjustment mode.

pub mod manual;
pub mod mapper;
pub mod table;

pub use mapper::{MappingPolicy, ValueMapper};
pub use table::{CalibrationRange, CalibrationTable};
