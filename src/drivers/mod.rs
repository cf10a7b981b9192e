//! Board-level helpers built on the port traits.

pub mod boot_sensors;
pub mod status_indicator;
