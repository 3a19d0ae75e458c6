//! Calibration commands
//!
//! Command format (driver → node), newline terminated:
//! ```text
//! k<channel> <gain> <phase>
//! ```
//! Gain and phase are fixed two-decimal numbers. Channel 0 is the voltage
//! input; channels 1.. are the current inputs.
//!
//! The node acknowledges by echoing the command with an `ACK_PREFIX`:
//! ```text
//! Cal: k1 60.00 0.50
//! ```

use core::fmt::Write;

use heapless::String;

/// Prefix the node puts in front of an echoed command
pub const ACK_PREFIX: &str = "Cal: ";

/// Maximum encoded command length (without the newline)
pub const MAX_COMMAND_LEN: usize = 48;

/// Channel number used for the voltage calibration
pub const VOLTAGE_CHANNEL: u8 = 0;

/// Encoded command text
pub type CommandText = String<MAX_COMMAND_LEN>;

/// Errors that can occur while encoding a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Encoded text does not fit `MAX_COMMAND_LEN`
    TooLong,
}

/// A single calibration command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalCommand {
    /// Input channel (0 = voltage)
    pub channel: u8,
    /// Amplitude gain
    pub gain: f64,
    /// Phase correction
    pub phase: f64,
}

impl CalCommand {
    /// Voltage calibration (channel 0, no phase correction)
    pub const fn voltage(gain: f64) -> Self {
        Self {
            channel: VOLTAGE_CHANNEL,
            gain,
            phase: 0.0,
        }
    }

    /// Current calibration for a CT channel
    pub const fn current(channel: u8, gain: f64, phase: f64) -> Self {
        Self {
            channel,
            gain,
            phase,
        }
    }

    /// Encode the command text, without the trailing newline
    pub fn encode(&self) -> Result<CommandText, CommandError> {
        let mut text = CommandText::new();
        write!(text, "k{} {:.2} {:.2}", self.channel, self.gain, self.phase)
            .map_err(|_| CommandError::TooLong)?;
        Ok(text)
    }
}

/// Check a reply line against the acknowledgement expected for `command`
///
/// The reply must be exactly `ACK_PREFIX` followed by the command text.
pub fn is_ack(command: &str, reply: &str) -> bool {
    reply.strip_prefix(ACK_PREFIX) == Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_voltage() {
        let cmd = CalCommand::voltage(230.0);
        assert_eq!(cmd.encode().unwrap().as_str(), "k0 230.00 0.00");
    }

    #[test]
    fn test_encode_current_with_phase() {
        let cmd = CalCommand::current(1, 60.0, 0.5);
        assert_eq!(cmd.encode().unwrap().as_str(), "k1 60.00 0.50");
    }

    #[test]
    fn test_encode_rounds_to_two_decimals() {
        let cmd = CalCommand::current(12, 90.909, -1.234);
        assert_eq!(cmd.encode().unwrap().as_str(), "k12 90.91 -1.23");
    }

    #[test]
    fn test_encode_too_long() {
        let cmd = CalCommand::current(1, 1.0e60, 0.0);
        assert_eq!(cmd.encode(), Err(CommandError::TooLong));
    }

    #[test]
    fn test_ack_exact_match() {
        assert!(is_ack("k0 230.00 0.00", "Cal: k0 230.00 0.00"));
    }

    #[test]
    fn test_ack_mismatch() {
        assert!(!is_ack("k0 230.00 0.00", "Cal: k0 230.01 0.00"));
        assert!(!is_ack("k0 230.00 0.00", "k0 230.00 0.00"));
        assert!(!is_ack("k0 230.00 0.00", "Cal:k0 230.00 0.00"));
        assert!(!is_ack("k0 230.00 0.00", ""));
    }
}
