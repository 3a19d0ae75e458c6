//! Per-session calibration state machine
//!
//! A session is one open serial connection. Calibration runs at most once
//! per session; reconnecting starts a new session from `Uncalibrated`.

pub mod events;
pub mod machine;

pub use events::SessionEvent;
pub use machine::SessionState;
