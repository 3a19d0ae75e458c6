//! Events that drive the session state machine

/// Events that can trigger session transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// A telemetry field was parsed successfully
    FieldParsed,
    /// The calibration handshake started sending commands
    HandshakeStarted,
    /// The calibration handshake sent its last command
    HandshakeFinished,
}
