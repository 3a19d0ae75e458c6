//! Downstream consumer: one JSON object per record
//!
//! ```text
//! {"time":1717171717.25,"node":{"Name":"emontx3e"},"names":["ct1","vrms"],"values":[12.5,240.1],"raw":"ct1:12.5,vrms:240.1"}
//! ```

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;
use tx3e_core::TelemetryRecord;

#[derive(Serialize)]
struct Stamped<'a> {
    /// Seconds since the Unix epoch when the record was received
    time: f64,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
}

/// Writes records as JSON lines
pub struct JsonLines<W> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write one record stamped with the current time
    pub fn emit(&mut self, record: &TelemetryRecord) -> Result<()> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.emit_at(time, record)
    }

    fn emit_at(&mut self, time: f64, record: &TelemetryRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, &Stamped { time, record })
            .context("Failed to serialize record")?;
        self.out.write_all(b"\n")?;
        self.out.flush().context("Failed to write record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tx3e_core::NodeIdentity;
    use tx3e_driver::{OptionValue, SerialRx, SerialTx, Tx3eInterfacer};

    struct OneLine(Option<&'static [u8]>);

    impl SerialTx for OneLine {
        type Error = ();

        fn write_blocking(&mut self, _data: &[u8]) -> Result<(), ()> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl SerialRx for OneLine {
        type Error = ();

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let Some(line) = self.0.take() else {
                return Ok(0);
            };
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    fn record(nodename: &str) -> TelemetryRecord {
        let mut tx = Tx3eInterfacer::new(
            OneLine(Some(b"ct1:12.5,vrms:240\r\n".as_slice())),
            crate::serial::StdDelay,
        );
        tx.set_option("nodename", OptionValue::Text(nodename)).unwrap();
        tx.read().unwrap().unwrap()
    }

    #[test]
    fn test_emit_json_line() {
        let mut out = JsonLines::new(Vec::new());
        out.emit_at(1.5, &record("emontx3e")).unwrap();

        let text = String::from_utf8(out.out).unwrap();
        assert!(text.ends_with('\n'));

        let json: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(json["time"], 1.5);
        assert_eq!(json["node"]["Name"], "emontx3e");
        assert_eq!(json["names"], serde_json::json!(["ct1", "vrms"]));
        assert_eq!(json["values"], serde_json::json!([12.5, 240.0]));
        assert_eq!(json["raw"], "ct1:12.5,vrms:240");
    }

    #[test]
    fn test_numeric_identity() {
        let record = record("");
        assert_eq!(record.node(), &NodeIdentity::Id(0));

        let mut out = JsonLines::new(Vec::new());
        out.emit(&record).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out.out).unwrap();
        assert_eq!(json["node"]["Id"], 0);
    }
}
