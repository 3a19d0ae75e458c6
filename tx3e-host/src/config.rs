//! Host configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyAMA0"
//! baudrate = 115200
//! timeout_ms = 1000
//!
//! [settings]
//! nodename = "emontx3e"
//! vcal = 268.97
//! ical1 = [90.9, 0.2]
//! ```
//!
//! `[settings]` entries are handed to the interfacer in file order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tx3e_core::OptionValue;
use tx3e_hal::SerialConfig;

/// Complete host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub serial: SerialSection,
    /// Interfacer options, kept as raw TOML so unknown keys pass through
    #[serde(default)]
    pub settings: toml::Table,
}

/// Serial port settings
#[derive(Debug, Clone, Deserialize)]
pub struct SerialSection {
    pub port: String,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

fn default_baudrate() -> u32 {
    SerialConfig::default().baudrate
}

fn default_timeout_ms() -> u32 {
    SerialConfig::default().timeout_ms
}

impl SerialSection {
    /// Line settings for the transport (8N1)
    pub fn line_config(&self) -> SerialConfig {
        SerialConfig {
            timeout_ms: self.timeout_ms,
            ..SerialConfig::with_baudrate(self.baudrate)
        }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            anyhow::bail!("serial.port must not be empty");
        }
        if self.serial.baudrate == 0 {
            anyhow::bail!("serial.baudrate must be greater than 0");
        }
        Ok(())
    }

    /// Interfacer options in file order
    pub fn options(&self) -> impl Iterator<Item = (&str, Setting)> + '_ {
        self.settings
            .iter()
            .map(|(key, value)| (key.as_str(), Setting::from(value)))
    }
}

/// Owned option value converted from TOML
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Text(String),
    Number(f64),
    Integer(i64),
    List(Vec<Setting>),
}

impl From<&toml::Value> for Setting {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Setting::Text(s.clone()),
            toml::Value::Float(f) => Setting::Number(*f),
            toml::Value::Integer(i) => Setting::Integer(*i),
            toml::Value::Array(items) => Setting::List(items.iter().map(Setting::from).collect()),
            other => Setting::Text(other.to_string()),
        }
    }
}

impl Setting {
    /// Call `f` with this setting viewed as an `OptionValue`
    ///
    /// Lists are one level deep; a nested list is passed as an empty list.
    pub fn with_value<R>(&self, f: impl FnOnce(OptionValue<'_>) -> R) -> R {
        match self {
            Setting::List(items) => {
                let values: Vec<OptionValue<'_>> = items.iter().map(Setting::scalar).collect();
                f(OptionValue::List(&values))
            }
            scalar => f(scalar.scalar()),
        }
    }

    fn scalar(&self) -> OptionValue<'_> {
        match self {
            Setting::Text(text) => OptionValue::Text(text),
            Setting::Number(n) => OptionValue::Number(*n),
            Setting::Integer(i) => OptionValue::Integer(*i),
            Setting::List(_) => OptionValue::List(&[]),
        }
    }
}
