//! tx3e Hardware Abstraction Layer
//!
//! This crate defines the serial transport traits the telemetry driver is
//! written against. A host build implements them on top of an OS serial
//! port; a gateway MCU build implements them on its UART peripheral.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (tx3e-host, gateway fw)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tx3e-driver (Tx3eInterfacer)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tx3e-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialTx`], [`serial::SerialRx`] - Byte-oriented serial link

#![no_std]
#![deny(unsafe_code)]

pub mod serial;

pub use serial::{DataBits, Parity, Serial, SerialConfig, SerialRx, SerialTx, StopBits};
