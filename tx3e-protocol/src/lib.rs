//! Serial telemetry protocol for emonTx-style sensor nodes
//!
//! This crate defines the text protocol spoken over the UART between an
//! energy-monitoring node and the host driver. It is purely wire level:
//! no I/O, no state beyond the line reassembly buffer.
//!
//! # Protocol Overview
//!
//! The node streams one telemetry sample per line:
//! ```text
//! ct1:0,ct2:0,ct3:0,ct4:0,vrms:524,pulse:0\r\n
//! ```
//!
//! The driver calibrates the node by sending one command per channel and
//! waiting for the node to echo it back:
//! ```text
//! driver → node:  k1 60.00 0.50\n
//! node → driver:  Cal: k1 60.00 0.50\r\n
//! ```
//!
//! During its own startup the node also prints banner lines (`Settings:`,
//! `Calibration:`) that are never telemetry.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod telemetry;

pub use command::{
    is_ack, CalCommand, CommandError, CommandText, ACK_PREFIX, MAX_COMMAND_LEN, VOLTAGE_CHANNEL,
};
pub use line::{Line, LineAccumulator, LineError, Lines, LINE_TERMINATOR, MAX_LINE_LEN};
pub use telemetry::{
    fields, is_sentinel, is_valid_name, parse_field, FieldOutcome, FIELD_SEPARATOR, SENTINELS,
    VALUE_SEPARATOR,
};
