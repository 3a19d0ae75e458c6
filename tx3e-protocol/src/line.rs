//! Line reassembly for the telemetry stream
//!
//! The node terminates every line with `\r\n`. Bytes arrive in arbitrary
//! chunks; the accumulator buffers a partial line until its line-feed shows
//! up, then hands back the trimmed text and starts over.

use heapless::{String, Vec};

/// Line terminator byte
pub const LINE_TERMINATOR: u8 = b'\n';

/// Maximum line length in bytes (excluding the terminator)
pub const MAX_LINE_LEN: usize = 256;

/// A completed, trimmed line
pub type Line = String<MAX_LINE_LEN>;

/// Room for a full line plus the carriage return that precedes its line-feed
const PENDING_CAPACITY: usize = MAX_LINE_LEN + 1;

/// Errors that can occur while reassembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded `MAX_LINE_LEN` before its terminator and was discarded
    TooLong,
    /// Line is not valid UTF-8 and was discarded
    InvalidUtf8,
}

/// Reassembles terminated lines from a byte stream
///
/// `pending` never holds a terminator: a line-feed always completes (or
/// discards) the buffered line and clears it.
#[derive(Debug, Clone, Default)]
pub struct LineAccumulator {
    pending: Vec<u8, PENDING_CAPACITY>,
    /// Current line overflowed; drop bytes until the next terminator
    overflowed: bool,
}

impl LineAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            overflowed: false,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.pending.clear();
        self.overflowed = false;
    }

    /// Bytes of the partial line buffered so far
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// True when no partial line is buffered
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && !self.overflowed
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when the byte completes a line, `Ok(None)`
    /// when more bytes are needed, or `Err` when the completed line had to
    /// be discarded. The accumulator is empty again after any non-`Ok(None)`
    /// result.
    pub fn push(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if byte == LINE_TERMINATOR {
            if self.overflowed {
                self.reset();
                return Err(LineError::TooLong);
            }
            return self.take().map(Some);
        }

        if self.overflowed {
            return Ok(None);
        }

        if self.pending.push(byte).is_err() {
            self.pending.clear();
            self.overflowed = true;
        }
        Ok(None)
    }

    /// Feed a chunk of bytes
    ///
    /// The returned iterator yields every line completed by `bytes`, in
    /// order. Bytes are consumed lazily: drive the iterator to the end or
    /// the unconsumed tail is lost.
    pub fn feed<'a, 'b>(&'a mut self, bytes: &'b [u8]) -> Lines<'a, 'b> {
        Lines {
            accumulator: self,
            bytes: bytes.iter(),
        }
    }

    /// Take the partial line without waiting for its terminator
    ///
    /// Used when the stream went quiet mid-line (a reply that timed out).
    /// Returns `Ok(None)` if nothing is buffered.
    pub fn take_partial(&mut self) -> Result<Option<Line>, LineError> {
        if self.overflowed {
            self.reset();
            return Err(LineError::TooLong);
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.take().map(Some)
    }

    /// Convert the buffered bytes into a trimmed line and clear the buffer
    fn take(&mut self) -> Result<Line, LineError> {
        let result = core::str::from_utf8(&self.pending)
            .map_err(|_| LineError::InvalidUtf8)
            .and_then(|text| {
                let mut line = Line::new();
                line.push_str(text.trim()).map_err(|_| LineError::TooLong)?;
                Ok(line)
            });
        self.reset();
        result
    }
}

/// Iterator over the lines completed by one chunk, see [`LineAccumulator::feed`]
pub struct Lines<'a, 'b> {
    accumulator: &'a mut LineAccumulator,
    bytes: core::slice::Iter<'b, u8>,
}

impl Iterator for Lines<'_, '_> {
    type Item = Result<Line, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            match self.accumulator.push(byte) {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
