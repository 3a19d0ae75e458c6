//! Configuration types
//!
//! Settings arrive from an external store as loosely typed `key = value`
//! options and are validated into typed calibration settings here.

pub mod options;
pub mod settings;

pub use options::{Applied, ConfigError, OptionValue};
pub use settings::*;
