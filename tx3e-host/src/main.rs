//! tx3e host gateway
//!
//! Reads telemetry from an emonTx TX3e on a serial port and prints one
//! JSON object per record on stdout.
//!
//! Architecture: serial port → Tx3eInterfacer → JsonLines → stdout
//!
//! A lost port is reopened after a pause; each reopen is a new session,
//! so the node is calibrated again after its first telemetry line.

mod config;
mod output;
mod serial;

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use tx3e_driver::{DriverError, Tx3eInterfacer};

use config::HostConfig;
use output::JsonLines;
use serial::{PortTransport, StdDelay};

/// Command-line flags
#[derive(Debug, Parser)]
#[command(name = "tx3e-host", version, about = "emonTx TX3e serial telemetry gateway")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "tx3e.toml")]
    config: PathBuf,

    /// Serial port to open (overrides `serial.port`)
    #[arg(short, long)]
    port: Option<String>,

    /// Seconds to wait before reopening a lost port
    #[arg(long, default_value_t = 5)]
    reconnect_secs: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = HostConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.serial.port = port;
    }
    let line_config = config.serial.line_config();
    let reconnect_delay = Duration::from_secs(args.reconnect_secs);

    let mut interfacer: Tx3eInterfacer<PortTransport, StdDelay> =
        Tx3eInterfacer::disconnected(StdDelay);
    for (key, setting) in config.options() {
        // Rejections are logged by the interfacer
        let _ = setting.with_value(|value| interfacer.set_option(key, value));
    }

    let port = PortTransport::open(&config.serial.port, &line_config)?;
    info!(
        "Opened {} at {} baud",
        config.serial.port, line_config.baudrate
    );
    interfacer.connect(port);

    let mut output = JsonLines::new(io::stdout().lock());

    loop {
        if !interfacer.is_connected() {
            thread::sleep(reconnect_delay);
            match PortTransport::open(&config.serial.port, &line_config) {
                Ok(port) => {
                    info!("Reopened {}", config.serial.port);
                    interfacer.connect(port);
                }
                Err(e) => {
                    warn!("{:#}", e);
                    continue;
                }
            }
        }

        match interfacer.read() {
            Ok(Some(record)) => output.emit(&record)?,
            Ok(None) => {}
            Err(DriverError::Transport(e)) => {
                error!("Serial read failed on {}: {}", config.serial.port, e);
                interfacer.disconnect();
            }
        }
    }
}
