//! Telemetry records
//!
//! One record per accepted telemetry line, handed straight to the consumer.
//!
//! Capacity follows the line: field names are packed into one buffer the
//! size of a line, and the field count is bounded by the densest line the
//! parser accepts (`a:,a:,...`, three bytes per field).

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeStruct, Serializer};

use tx3e_protocol::{Line, MAX_LINE_LEN};

use crate::config::NodeIdentity;

/// Maximum fields per record
pub const MAX_FIELDS: usize = (MAX_LINE_LEN + 1) / 3;

/// Errors when adding a field to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Record already holds `MAX_FIELDS` fields
    Full,
    /// Names would exceed `MAX_LINE_LEN` bytes in total
    NamesFull,
}

/// A parsed telemetry sample
///
/// `name_ends` and `values` always have the same length; field `i` is the
/// name ending at `name_ends[i]` paired with `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    node: NodeIdentity,
    /// Field names back to back
    names: String<MAX_LINE_LEN>,
    name_ends: Vec<u16, MAX_FIELDS>,
    values: Vec<f64, MAX_FIELDS>,
    /// The cleaned line the record was parsed from
    raw: Line,
}

impl TelemetryRecord {
    /// Create an empty record for `node`
    pub fn new(node: NodeIdentity, raw: Line) -> Self {
        Self {
            node,
            names: String::new(),
            name_ends: Vec::new(),
            values: Vec::new(),
            raw,
        }
    }

    /// Append a field
    pub fn push(&mut self, name: &str, value: f64) -> Result<(), RecordError> {
        if self.values.is_full() {
            return Err(RecordError::Full);
        }
        self.names.push_str(name).map_err(|_| RecordError::NamesFull)?;

        // Both vecs have the same length, so neither push can fail
        let _ = self.name_ends.push(self.names.len() as u16);
        let _ = self.values.push(value);
        Ok(())
    }

    /// Node identity
    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    /// Field names in line order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        let mut start = 0;
        self.name_ends.iter().map(move |&end| {
            let name = &self.names.as_str()[start..end as usize];
            start = end as usize;
            name
        })
    }

    /// Field values in line order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The cleaned source line
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no field survived parsing
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields as `(name, value)` pairs in line order
    pub fn fields(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names().zip(self.values.iter().copied())
    }

    /// Value of the first field called `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Serializes as `{node, names, values, raw}` with `names` a list of strings
#[cfg(feature = "serde")]
impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TelemetryRecord", 4)?;
        state.serialize_field("node", &self.node)?;
        state.serialize_field("names", &Names(self))?;
        state.serialize_field("values", self.values.as_slice())?;
        state.serialize_field("raw", self.raw.as_str())?;
        state.end()
    }
}

#[cfg(feature = "serde")]
struct Names<'a>(&'a TelemetryRecord);

#[cfg(feature = "serde")]
impl Serialize for Names<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.names())
    }
}
