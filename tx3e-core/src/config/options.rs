//! Loosely typed configuration options
//!
//! Recognised keys:
//!
//! | Key          | Value                               | Effect                         |
//! |--------------|-------------------------------------|--------------------------------|
//! | `nodename`   | text                                | node name ("" = numeric id)    |
//! | `nodeoffset` | integer                             | numeric node id                |
//! | `vcal`       | number-like                         | voltage gain                   |
//! | `ical<N>`    | number-like, or `[gain, phase]`     | current channel N (1..=19)     |
//!
//! Anything else is ignored.

use super::settings::{CalibrationSettings, ChannelCalibration, MAX_CHANNEL, MIN_CHANNEL};

/// Key prefix for current channel calibration
const ICAL_PREFIX: &str = "ical";

/// A value as handed over by the settings store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue<'a> {
    /// Text (numbers stored as text are coerced where a number is expected)
    Text(&'a str),
    /// Floating point number
    Number(f64),
    /// Integer
    Integer(i64),
    /// Sequence of values
    List(&'a [OptionValue<'a>]),
}

impl OptionValue<'_> {
    /// Coerce to a floating point number
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            OptionValue::Text(text) => text.trim().parse().ok(),
            OptionValue::Number(n) => Some(n),
            OptionValue::Integer(i) => Some(i as f64),
            OptionValue::List(_) => None,
        }
    }

    /// Coerce to a node id
    pub fn as_node_id(&self) -> Option<u32> {
        match *self {
            OptionValue::Text(text) => text.trim().parse().ok(),
            // The cast saturates, so only whole numbers in range survive the round trip
            OptionValue::Number(n) if (n as u32) as f64 == n => Some(n as u32),
            OptionValue::Integer(i) => u32::try_from(i).ok(),
            _ => None,
        }
    }
}

/// What an option changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Applied {
    /// Node name set
    NodeName,
    /// Numeric node id set
    NodeOffset,
    /// Voltage calibration set
    VoltageCalibration,
    /// Current calibration set for this channel
    Channel(u8),
    /// Key not recognised; nothing changed
    Ignored,
}

/// Reasons a recognised option was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Value is not a number
    NotANumber,
    /// Value is not a valid node id
    InvalidNodeId,
    /// Node name is not text or too long
    InvalidNodeName,
    /// `ical<N>` list is not exactly `[gain, phase]`
    InvalidPair,
    /// `ical<N>` channel outside 1..=19
    ChannelOutOfRange,
}

impl CalibrationSettings {
    /// Apply one option
    ///
    /// A rejected option leaves the settings unchanged.
    pub fn apply(&mut self, key: &str, value: OptionValue<'_>) -> Result<Applied, ConfigError> {
        match key {
            "nodename" => {
                let OptionValue::Text(name) = value else {
                    return Err(ConfigError::InvalidNodeName);
                };
                if !self.set_node_name(name) {
                    return Err(ConfigError::InvalidNodeName);
                }
                Ok(Applied::NodeName)
            }
            "nodeoffset" => {
                self.node_offset = value.as_node_id().ok_or(ConfigError::InvalidNodeId)?;
                Ok(Applied::NodeOffset)
            }
            "vcal" => {
                self.voltage_calibration = Some(value.as_number().ok_or(ConfigError::NotANumber)?);
                Ok(Applied::VoltageCalibration)
            }
            _ => match parse_ical_key(key) {
                Some(channel) => self.apply_channel(channel, value),
                None => Ok(Applied::Ignored),
            },
        }
    }

    fn apply_channel(
        &mut self,
        channel: u8,
        value: OptionValue<'_>,
    ) -> Result<Applied, ConfigError> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(ConfigError::ChannelOutOfRange);
        }

        let calibration = match value {
            OptionValue::List(&[gain, phase]) => ChannelCalibration::GainPhase {
                gain: gain.as_number().ok_or(ConfigError::InvalidPair)?,
                phase: phase.as_number().ok_or(ConfigError::InvalidPair)?,
            },
            OptionValue::List(_) => return Err(ConfigError::InvalidPair),
            scalar => ChannelCalibration::Gain(scalar.as_number().ok_or(ConfigError::NotANumber)?),
        };

        self.set_channel(channel, calibration);
        Ok(Applied::Channel(channel))
    }
}

/// Extract the channel number from an `ical<N>` key
///
/// `N` must be written plainly (`ical1`, not `ical01` or `ical+1`).
fn parse_ical_key(key: &str) -> Option<u8> {
    let digits = key.strip_prefix(ICAL_PREFIX)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Out-of-range numbers still count as ical keys so they get reported
    Some(digits.parse().unwrap_or(u8::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeIdentity;

    #[test]
    fn test_vcal_number_and_text() {
        let mut settings = CalibrationSettings::new();
        assert_eq!(
            settings.apply("vcal", OptionValue::Number(230.0)),
            Ok(Applied::VoltageCalibration)
        );
        assert_eq!(settings.voltage_calibration, Some(230.0));

        settings.apply("vcal", OptionValue::Text("268.97")).unwrap();
        assert_eq!(settings.voltage_calibration, Some(268.97));

        settings.apply("vcal", OptionValue::Integer(240)).unwrap();
        assert_eq!(settings.voltage_calibration, Some(240.0));
    }

    #[test]
    fn test_vcal_rejects_garbage() {
        let mut settings = CalibrationSettings::new();
        settings.apply("vcal", OptionValue::Number(230.0)).unwrap();

        assert_eq!(
            settings.apply("vcal", OptionValue::Text("high")),
            Err(ConfigError::NotANumber)
        );
        assert_eq!(settings.voltage_calibration, Some(230.0));
    }

    #[test]
    fn test_ical_gain_only() {
        let mut settings = CalibrationSettings::new();
        assert_eq!(
            settings.apply("ical2", OptionValue::Number(90.9)),
            Ok(Applied::Channel(2))
        );
        assert_eq!(settings.channel(2), Some(ChannelCalibration::Gain(90.9)));
    }

    #[test]
    fn test_ical_gain_and_phase() {
        let mut settings = CalibrationSettings::new();
        let pair = [OptionValue::Number(60.0), OptionValue::Text("0.5")];
        settings.apply("ical1", OptionValue::List(&pair)).unwrap();

        assert_eq!(
            settings.channel(1),
            Some(ChannelCalibration::GainPhase {
                gain: 60.0,
                phase: 0.5
            })
        );
    }

    #[test]
    fn test_ical_wrong_list_shape_is_rejected() {
        let mut settings = CalibrationSettings::new();
        let triple = [
            OptionValue::Number(1.0),
            OptionValue::Number(2.0),
            OptionValue::Number(3.0),
        ];
        let non_numeric = [OptionValue::Number(1.0), OptionValue::Text("x")];

        assert_eq!(
            settings.apply("ical1", OptionValue::List(&triple)),
            Err(ConfigError::InvalidPair)
        );
        assert_eq!(
            settings.apply("ical1", OptionValue::List(&non_numeric)),
            Err(ConfigError::InvalidPair)
        );
        assert_eq!(settings.channel(1), None);
    }

    #[test]
    fn test_ical_out_of_range() {
        let mut settings = CalibrationSettings::new();
        assert_eq!(
            settings.apply("ical20", OptionValue::Number(1.0)),
            Err(ConfigError::ChannelOutOfRange)
        );
        assert_eq!(
            settings.apply("ical300", OptionValue::Number(1.0)),
            Err(ConfigError::ChannelOutOfRange)
        );
        assert_eq!(settings.channel_count(), 0);
    }

    #[test]
    fn test_unrecognised_keys_are_ignored() {
        let mut settings = CalibrationSettings::new();
        for key in ["baud", "ical", "ical01", "icalx", "ical+1", "Vcal"] {
            assert_eq!(
                settings.apply(key, OptionValue::Number(1.0)),
                Ok(Applied::Ignored),
                "{}",
                key
            );
        }
        assert!(!settings.has_calibration());
    }

    #[test]
    fn test_nodename_and_offset() {
        let mut settings = CalibrationSettings::new();
        settings.apply("nodeoffset", OptionValue::Integer(5)).unwrap();
        settings.apply("nodename", OptionValue::Text("")).unwrap();
        assert_eq!(settings.node_identity(), NodeIdentity::Id(5));

        settings.apply("nodename", OptionValue::Text("sensorA")).unwrap();
        assert_eq!(settings.node_identity().name(), Some("sensorA"));
    }

    #[test]
    fn test_nodeoffset_coercion() {
        let mut settings = CalibrationSettings::new();
        settings.apply("nodeoffset", OptionValue::Text("8")).unwrap();
        assert_eq!(settings.node_offset, 8);

        assert_eq!(
            settings.apply("nodeoffset", OptionValue::Integer(-1)),
            Err(ConfigError::InvalidNodeId)
        );
        assert_eq!(
            settings.apply("nodeoffset", OptionValue::Number(2.5)),
            Err(ConfigError::InvalidNodeId)
        );
        assert_eq!(settings.node_offset, 8);
    }

    #[test]
    fn test_node_id_from_number() {
        assert_eq!(OptionValue::Number(8.0).as_node_id(), Some(8));
        assert_eq!(OptionValue::Number(0.0).as_node_id(), Some(0));
        assert_eq!(OptionValue::Number(4294967295.0).as_node_id(), Some(u32::MAX));
        assert_eq!(OptionValue::Number(4294967296.0).as_node_id(), None);
        assert_eq!(OptionValue::Number(-1.0).as_node_id(), None);
        assert_eq!(OptionValue::Number(7.25).as_node_id(), None);
        assert_eq!(OptionValue::Number(f64::NAN).as_node_id(), None);
    }

    #[test]
    fn test_nodename_must_be_text() {
        let mut settings = CalibrationSettings::new();
        assert_eq!(
            settings.apply("nodename", OptionValue::Integer(7)),
            Err(ConfigError::InvalidNodeName)
        );
    }
}
