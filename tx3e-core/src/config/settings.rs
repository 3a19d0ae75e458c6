//! Calibration and node identity settings
//!
//! Read once per session, at first telemetry, to build the calibration
//! handshake. Channels are sparse and kept in the order they were first
//! configured; the handshake sends them in that order.

use heapless::{LinearMap, String};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tx3e_protocol::CalCommand;

/// Lowest current channel number
pub const MIN_CHANNEL: u8 = 1;

/// Highest current channel number
pub const MAX_CHANNEL: u8 = 19;

/// Maximum number of configured current channels
pub const MAX_CHANNELS: usize = (MAX_CHANNEL - MIN_CHANNEL + 1) as usize;

/// Maximum node name length
pub const MAX_NODE_NAME_LEN: usize = 32;

/// Configured node name
pub type NodeName = String<MAX_NODE_NAME_LEN>;

/// Calibration of one current channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelCalibration {
    /// Amplitude gain only, phase correction left at zero
    Gain(f64),
    /// Amplitude gain and phase correction
    GainPhase { gain: f64, phase: f64 },
}

impl ChannelCalibration {
    /// Amplitude gain
    pub const fn gain(&self) -> f64 {
        match *self {
            ChannelCalibration::Gain(gain) => gain,
            ChannelCalibration::GainPhase { gain, .. } => gain,
        }
    }

    /// Phase correction (zero when only a gain was configured)
    pub const fn phase(&self) -> f64 {
        match *self {
            ChannelCalibration::Gain(_) => 0.0,
            ChannelCalibration::GainPhase { phase, .. } => phase,
        }
    }
}

/// Identity attached to every telemetry record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeIdentity {
    /// Configured node name (used as both display name and id)
    Name(NodeName),
    /// Numeric node id taken from the configured offset
    Id(u32),
}

impl NodeIdentity {
    /// The node name, if the identity is a name
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeIdentity::Name(name) => Some(name.as_str()),
            NodeIdentity::Id(_) => None,
        }
    }

    /// The numeric id, if the identity is numeric
    pub fn id(&self) -> Option<u32> {
        match self {
            NodeIdentity::Name(_) => None,
            NodeIdentity::Id(id) => Some(*id),
        }
    }
}

/// Calibration and identity settings for one node
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationSettings {
    /// Voltage gain (sent as channel 0)
    pub voltage_calibration: Option<f64>,
    /// Current channel calibrations, in the order first configured
    current_calibration: LinearMap<u8, ChannelCalibration, MAX_CHANNELS>,
    /// Node name; empty means "identify by `node_offset`"
    node_name: NodeName,
    /// Numeric identity used when no name is set
    pub node_offset: u32,
}

impl CalibrationSettings {
    /// Create empty settings (no calibration, numeric identity 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the calibration of a current channel
    ///
    /// Replacing keeps the channel's original position in the send order.
    /// Returns false if `channel` is outside `MIN_CHANNEL..=MAX_CHANNEL`.
    pub fn set_channel(&mut self, channel: u8, calibration: ChannelCalibration) -> bool {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return false;
        }
        // Capacity covers every valid channel, so insert cannot fail here
        self.current_calibration.insert(channel, calibration).is_ok()
    }

    /// Calibration of a current channel, if configured
    pub fn channel(&self, channel: u8) -> Option<ChannelCalibration> {
        self.current_calibration.get(&channel).copied()
    }

    /// Configured current channels in send order
    pub fn channels(&self) -> impl Iterator<Item = (u8, ChannelCalibration)> + '_ {
        self.current_calibration.iter().map(|(&ch, &cal)| (ch, cal))
    }

    /// Number of configured current channels
    pub fn channel_count(&self) -> usize {
        self.current_calibration.len()
    }

    /// Set the node name; an empty name selects the numeric identity
    ///
    /// Returns false (leaving the name unchanged) if it is too long.
    pub fn set_node_name(&mut self, name: &str) -> bool {
        let mut new_name = NodeName::new();
        if new_name.push_str(name).is_err() {
            return false;
        }
        self.node_name = new_name;
        true
    }

    /// Configured node name ("" when unset)
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Resolve the identity for outgoing records
    pub fn node_identity(&self) -> NodeIdentity {
        if self.node_name.is_empty() {
            NodeIdentity::Id(self.node_offset)
        } else {
            NodeIdentity::Name(self.node_name.clone())
        }
    }

    /// True if any calibration command would be sent
    pub fn has_calibration(&self) -> bool {
        self.voltage_calibration.is_some() || !self.current_calibration.is_empty()
    }

    /// Calibration commands in handshake order: voltage first, then each
    /// current channel in the order it was configured
    pub fn commands(&self) -> impl Iterator<Item = CalCommand> + '_ {
        self.voltage_calibration
            .map(CalCommand::voltage)
            .into_iter()
            .chain(
                self.channels()
                    .map(|(ch, cal)| CalCommand::current(ch, cal.gain(), cal.phase())),
            )
    }
}
