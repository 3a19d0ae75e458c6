//! Serial driver for emonTx TX3e energy-monitoring nodes
//!
//! Ties the line protocol, the calibration settings and the serial HAL
//! together:
//!
//! ```text
//! SerialRx ─▶ LineAccumulator ─▶ parse_line ─▶ TelemetryRecord ─▶ consumer
//!                                    │
//!                           first field parsed
//!                                    ▼
//! SerialTx ◀──────────── calibration handshake (once per session)
//! ```
//!
//! Logging goes through `defmt` or `log`, selected by crate feature.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Declared first so the logging macros are visible in every module
#[macro_use]
mod fmt;

pub mod handshake;
pub mod interfacer;

pub use handshake::{CommandOutcome, HandshakeSummary, CALIBRATION_SETTLE_MS};
pub use interfacer::{DriverError, Tx3eInterfacer, RX_CHUNK_SIZE};

pub use tx3e_core::{
    Applied, CalibrationSettings, ChannelCalibration, ConfigError, NodeIdentity, OptionValue,
    SessionState, TelemetryRecord,
};
pub use tx3e_hal::{Serial, SerialRx, SerialTx};
