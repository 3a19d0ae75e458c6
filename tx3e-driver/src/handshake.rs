//! Online calibration handshake
//!
//! Sends every configured calibration command to the node, one at a time,
//! and checks that the node echoes each one back:
//!
//! ```text
//! driver → node:  k0 230.00 0.00\n
//!                 (wait CALIBRATION_SETTLE_MS)
//! node → driver:  Cal: k0 230.00 0.00\r\n
//! ```
//!
//! Every command is attempted exactly once. A missing or wrong echo is
//! logged and the handshake moves on to the next command.

use embedded_hal::delay::DelayNs;
use tx3e_core::CalibrationSettings;
use tx3e_hal::{Serial, SerialRx, SerialTx};
use tx3e_protocol::{is_ack, CalCommand, Line, LineAccumulator, MAX_LINE_LEN};

/// Time the node gets to apply a command before its echo is read
pub const CALIBRATION_SETTLE_MS: u32 = 100;

/// Upper bound on bytes consumed while waiting for one echo
const MAX_REPLY_BYTES: usize = MAX_LINE_LEN + 2;

/// Result of sending one calibration command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    /// Node echoed the command
    Acknowledged,
    /// Node replied with something else, or nothing before the timeout
    Mismatch,
    /// Command could not be written to the link
    WriteFailed,
    /// Command did not fit the command buffer
    EncodeFailed,
}

/// Tally of one handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandshakeSummary {
    /// Commands attempted
    pub sent: u8,
    /// Commands the node echoed back
    pub acknowledged: u8,
    /// Commands that were not confirmed
    pub failed: u8,
}

impl HandshakeSummary {
    /// True if every attempted command was confirmed
    pub fn all_acknowledged(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, outcome: CommandOutcome) {
        self.sent = self.sent.saturating_add(1);
        match outcome {
            CommandOutcome::Acknowledged => {
                self.acknowledged = self.acknowledged.saturating_add(1)
            }
            _ => self.failed = self.failed.saturating_add(1),
        }
    }
}

/// Run the handshake for `settings` over `transport`
///
/// Commands go out in `CalibrationSettings::commands` order: voltage first,
/// then current channels in the order they were configured.
pub fn run<T, D>(
    transport: &mut T,
    delay: &mut D,
    settings: &CalibrationSettings,
) -> HandshakeSummary
where
    T: Serial,
    D: DelayNs,
{
    let mut summary = HandshakeSummary::default();

    for command in settings.commands() {
        let outcome = send_command(transport, delay, &command);
        summary.record(outcome);
    }

    info!(
        "Calibration handshake done: {} sent, {} acknowledged, {} failed",
        summary.sent,
        summary.acknowledged,
        summary.failed
    );
    summary
}

/// Send one command and check its echo
pub fn send_command<T, D>(
    transport: &mut T,
    delay: &mut D,
    command: &CalCommand,
) -> CommandOutcome
where
    T: Serial,
    D: DelayNs,
{
    let text = match command.encode() {
        Ok(text) => text,
        Err(e) => {
            error!("Calibration command for channel {} not encoded: {:?}", command.channel, e);
            return CommandOutcome::EncodeFailed;
        }
    };

    if write_line(transport, text.as_bytes()).is_err() {
        error!("Calibration command error cmd:{}, write failed", text.as_str());
        return CommandOutcome::WriteFailed;
    }

    delay.delay_ms(CALIBRATION_SETTLE_MS);

    let reply = read_reply(transport);
    if is_ack(&text, &reply) {
        debug!("Calibration command sent successfully: {}", text.as_str());
        CommandOutcome::Acknowledged
    } else {
        error!(
            "Calibration command error cmd:{}, reply:{}",
            text.as_str(),
            reply.as_str()
        );
        CommandOutcome::Mismatch
    }
}

fn write_line<T: SerialTx>(transport: &mut T, text: &[u8]) -> Result<(), T::Error> {
    transport.write_blocking(text)?;
    transport.write_blocking(b"\n")?;
    transport.flush()
}

/// Read one reply line, stopping at the first newline or timeout
///
/// Reads byte by byte so telemetry following the echo stays in the
/// transport for the normal read path. A reply cut short by the timeout
/// is returned as far as it got; a failed read yields an empty reply.
fn read_reply<T: SerialRx>(transport: &mut T) -> Line {
    let mut accumulator = LineAccumulator::new();

    for _ in 0..MAX_REPLY_BYTES {
        match transport.read_byte() {
            Ok(Some(byte)) => match accumulator.push(byte) {
                Ok(Some(line)) => return line,
                Ok(None) => {}
                Err(e) => {
                    warn!("Calibration reply discarded: {:?}", e);
                    return Line::new();
                }
            },
            Ok(None) => break,
            Err(_) => {
                warn!("Calibration reply read failed");
                return Line::new();
            }
        }
    }

    accumulator.take_partial().ok().flatten().unwrap_or_default()
}
