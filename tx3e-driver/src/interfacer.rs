//! emonTx serial interfacer
//!
//! Owns the serial link for one node. Each `read` call pulls at most one
//! chunk from the transport, reassembles lines, and returns the first
//! telemetry record found. The first record of a session schedules the
//! calibration handshake. It runs at the start of a later `read`, once the
//! stream sits on a line boundary: no unread bytes in the chunk buffer and
//! no partial line in the accumulator. Until then `read` keeps draining
//! telemetry, so a command never goes out while a line is half received.

use embedded_hal::delay::DelayNs;
use tx3e_core::{
    Applied, CalibrationSettings, ConfigError, OptionValue, SessionEvent, SessionState,
    TelemetryRecord,
};
use tx3e_hal::{Serial, SerialRx};
use tx3e_protocol::{fields, is_sentinel, FieldOutcome, Line, LineAccumulator};

use crate::handshake::{self, HandshakeSummary};

/// Bytes pulled from the transport per `read`
pub const RX_CHUNK_SIZE: usize = 64;

/// Errors surfaced by `Tx3eInterfacer::read`
///
/// Only transport failures reach the caller. Malformed input and
/// calibration problems are logged and absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E> {
    /// The transport failed while reading
    Transport(E),
}

/// Driver for one emonTx node on a serial link
pub struct Tx3eInterfacer<T, D> {
    transport: Option<T>,
    delay: D,
    settings: CalibrationSettings,
    session: SessionState,
    accumulator: LineAccumulator,
    rx_buf: [u8; RX_CHUNK_SIZE],
    rx_pos: usize,
    rx_len: usize,
}

impl<T, D> Tx3eInterfacer<T, D>
where
    T: Serial,
    D: DelayNs,
{
    /// Create a connected interfacer with empty settings
    pub fn new(transport: T, delay: D) -> Self {
        let mut interfacer = Self::disconnected(delay);
        interfacer.connect(transport);
        interfacer
    }

    /// Create an interfacer with no transport yet
    pub fn disconnected(delay: D) -> Self {
        Self {
            transport: None,
            delay,
            settings: CalibrationSettings::new(),
            session: SessionState::default(),
            accumulator: LineAccumulator::new(),
            rx_buf: [0; RX_CHUNK_SIZE],
            rx_pos: 0,
            rx_len: 0,
        }
    }

    /// Attach a transport and start a new session
    ///
    /// Any partial line and unread bytes from the previous session are
    /// dropped, and calibration will run again after the first record.
    /// Returns the previous transport, if there was one.
    pub fn connect(&mut self, transport: T) -> Option<T> {
        let previous = self.transport.replace(transport);
        self.reset_session();
        info!("Serial link connected, new session");
        previous
    }

    /// Detach and return the transport
    pub fn disconnect(&mut self) -> Option<T> {
        let transport = self.transport.take();
        if transport.is_some() {
            self.reset_session();
            info!("Serial link disconnected");
        }
        transport
    }

    /// True while a transport is attached
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Current session state
    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Current settings snapshot
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Mutable access to the transport
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Apply one configuration option
    ///
    /// Rejected values are logged and leave the settings unchanged.
    /// Calibration changes made after the handshake take effect in the
    /// next session.
    pub fn set_option(
        &mut self,
        key: &str,
        value: OptionValue<'_>,
    ) -> Result<Applied, ConfigError> {
        let result = self.settings.apply(key, value);
        match result {
            Ok(Applied::Ignored) => trace!("Ignoring unknown option {}", key),
            Ok(applied) => {
                debug!("Option {} applied: {:?}", key, applied);
                if self.session.is_calibrated()
                    && matches!(applied, Applied::VoltageCalibration | Applied::Channel(_))
                {
                    info!("Calibration for {} changed, applies from next session", key);
                }
            }
            Err(e) => warn!("Option {} rejected: {:?}", key, e),
        }
        result
    }

    /// Apply a batch of options in order
    ///
    /// A rejected entry does not stop the remaining ones from applying.
    /// Returns the number of entries rejected.
    pub fn configure<'a, I>(&mut self, options: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, OptionValue<'a>)>,
    {
        let mut rejected = 0;
        for (key, value) in options {
            if self.set_option(key, value).is_err() {
                rejected += 1;
            }
        }
        rejected
    }

    /// Read the next telemetry record
    ///
    /// Runs a due calibration handshake first if the stream is at a line
    /// boundary, then consumes bytes left over from the previous chunk,
    /// then at most one new chunk. Returns `Ok(None)` when no complete
    /// telemetry line is available yet, or when no transport is attached.
    pub fn read(
        &mut self,
    ) -> Result<Option<TelemetryRecord>, DriverError<<T as SerialRx>::Error>> {
        if self.transport.is_none() {
            return Ok(None);
        }

        self.run_pending_calibration();

        if let Some(record) = self.drain_chunk() {
            return Ok(Some(record));
        }

        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };
        self.rx_len = transport
            .read_available(&mut self.rx_buf)
            .map_err(DriverError::Transport)?;
        self.rx_pos = 0;

        Ok(self.drain_chunk())
    }

    /// Run the calibration handshake if it is due
    ///
    /// Returns `None` when nothing was due, no transport is attached, or
    /// the stream is still inside a telemetry line. In the last case the
    /// handshake stays due and runs once `read` reaches a line boundary.
    pub fn run_pending_calibration(&mut self) -> Option<HandshakeSummary> {
        if !self.session.calibration_pending() {
            return None;
        }
        if !self.at_line_boundary() {
            trace!("Calibration deferred until the current line completes");
            return None;
        }
        let transport = self.transport.as_mut()?;

        self.session = self.session.transition(SessionEvent::HandshakeStarted);
        if !self.settings.has_calibration() {
            debug!("No calibration configured");
        }
        let summary = handshake::run(transport, &mut self.delay, &self.settings);
        self.session = self.session.transition(SessionEvent::HandshakeFinished);

        Some(summary)
    }

    /// Parse one cleaned line into a record
    ///
    /// Returns `None` for banner lines and for lines with no usable field.
    /// The first field parsed in a session schedules calibration.
    pub fn parse_line(&mut self, line: Line) -> Option<TelemetryRecord> {
        trace!("RX: {}", line.as_str());

        if is_sentinel(&line) {
            debug!("Ignoring banner line: {}", line.as_str());
            return None;
        }

        let mut record = TelemetryRecord::new(self.settings.node_identity(), line.clone());

        for outcome in fields(&line) {
            match outcome {
                FieldOutcome::Valid { .. } => {}
                FieldOutcome::ZeroSubstituted { name, raw } => {
                    debug!("Value of {} is not numeric: {}", name, raw);
                }
                FieldOutcome::InvalidName { name } => {
                    debug!("Invalid input name: {}", name);
                }
                FieldOutcome::Malformed { token } => {
                    trace!("Dropping malformed token: {}", token);
                }
            }

            let Some((name, value)) = outcome.field() else {
                continue;
            };
            match record.push(name, value) {
                Ok(()) => self.field_parsed(),
                Err(e) => warn!("Dropping field {}: {:?}", name, e),
            }
        }

        if record.is_empty() {
            debug!("No valid fields in line: {}", line.as_str());
            return None;
        }
        Some(record)
    }

    fn field_parsed(&mut self) {
        let next = self.session.transition(SessionEvent::FieldParsed);
        if next != self.session {
            info!("First telemetry received, calibration scheduled");
        }
        self.session = next;
    }

    /// Feed buffered bytes to the accumulator until a record comes out
    fn drain_chunk(&mut self) -> Option<TelemetryRecord> {
        while self.rx_pos < self.rx_len {
            let byte = self.rx_buf[self.rx_pos];
            self.rx_pos += 1;

            match self.accumulator.push(byte) {
                Ok(Some(line)) => {
                    if let Some(record) = self.parse_line(line) {
                        return Some(record);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Discarding line: {:?}", e),
            }
        }
        None
    }

    /// No unread chunk bytes and no partial line buffered
    fn at_line_boundary(&self) -> bool {
        self.rx_pos == self.rx_len && self.accumulator.is_empty()
    }

    fn reset_session(&mut self) {
        self.session = SessionState::default();
        self.accumulator.reset();
        self.rx_pos = 0;
        self.rx_len = 0;
    }
}
