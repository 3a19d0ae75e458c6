//! Board-agnostic core logic for the tx3e telemetry driver
//!
//! This crate contains everything that does not touch the serial link:
//!
//! - Calibration and identity settings, and how option values apply to them
//! - The telemetry record handed to the downstream consumer
//! - The per-session calibration state machine

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod record;
pub mod session;

pub use config::{
    Applied, CalibrationSettings, ChannelCalibration, ConfigError, NodeIdentity, OptionValue,
};
pub use record::{RecordError, TelemetryRecord, MAX_FIELDS};
pub use session::{SessionEvent, SessionState};
