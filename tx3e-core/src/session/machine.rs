//! Session state definition
//!
//! ```text
//! Uncalibrated ──FieldParsed──▶ CalibrationPending ──HandshakeStarted──▶ Calibrating
//!                                                                            │
//!                                         Calibrated ◀──HandshakeFinished───┘
//! ```
//!
//! `Calibrated` is terminal. Every other (state, event) pair is a no-op, so
//! no sequence of events can start the handshake twice.

use super::events::SessionEvent;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No telemetry parsed yet
    #[default]
    Uncalibrated,
    /// First telemetry seen; handshake due before the next read
    CalibrationPending,
    /// Handshake in progress (blocking the read path)
    Calibrating,
    /// Handshake done, whatever its per-command outcome
    Calibrated,
}

impl SessionState {
    /// Process an event and return the next state
    pub fn transition(self, event: SessionEvent) -> Self {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Uncalibrated, FieldParsed) => CalibrationPending,
            (CalibrationPending, HandshakeStarted) => Calibrating,
            (Calibrating, HandshakeFinished) => Calibrated,

            // Default: stay in current state
            _ => self,
        }
    }

    /// True once the first field of the session has been parsed
    pub fn initialized(&self) -> bool {
        !matches!(self, SessionState::Uncalibrated)
    }

    /// True when the handshake is due
    pub fn calibration_pending(&self) -> bool {
        matches!(self, SessionState::CalibrationPending)
    }

    /// True once the handshake has completed
    pub fn is_calibrated(&self) -> bool {
        matches!(self, SessionState::Calibrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_happy_path() {
        let state = SessionState::default();
        assert!(!state.initialized());

        let pending = state.transition(SessionEvent::FieldParsed);
        assert_eq!(pending, SessionState::CalibrationPending);
        assert!(pending.initialized());
        assert!(pending.calibration_pending());

        let calibrating = pending.transition(SessionEvent::HandshakeStarted);
        assert_eq!(calibrating, SessionState::Calibrating);

        let done = calibrating.transition(SessionEvent::HandshakeFinished);
        assert!(done.is_calibrated());
    }

    #[test]
    fn test_handshake_needs_telemetry_first() {
        let state = SessionState::Uncalibrated;
        assert_eq!(
            state.transition(SessionEvent::HandshakeStarted),
            SessionState::Uncalibrated
        );
    }

    #[test]
    fn test_calibrated_is_terminal() {
        let state = SessionState::Calibrated;
        for event in [
            SessionEvent::FieldParsed,
            SessionEvent::HandshakeStarted,
            SessionEvent::HandshakeFinished,
        ] {
            assert_eq!(state.transition(event), SessionState::Calibrated);
        }
    }

    #[test]
    fn test_more_telemetry_while_pending() {
        let state = SessionState::CalibrationPending;
        assert_eq!(
            state.transition(SessionEvent::FieldParsed),
            SessionState::CalibrationPending
        );
    }

    fn any_event() -> impl Strategy<Value = SessionEvent> {
        prop_oneof![
            Just(SessionEvent::FieldParsed),
            Just(SessionEvent::HandshakeStarted),
            Just(SessionEvent::HandshakeFinished),
        ]
    }

    proptest! {
        #[test]
        fn prop_handshake_starts_at_most_once(
            events in proptest::collection::vec(any_event(), 0..64),
        ) {
            let mut state = SessionState::default();
            let mut starts = 0;
            for event in events {
                let next = state.transition(event);
                if next == SessionState::Calibrating && state != SessionState::Calibrating {
                    starts += 1;
                }
                state = next;
            }
            prop_assert!(starts <= 1);
        }
    }
}
