use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

use crate::config::types::Config;
use crate::device::types::ServiceSummary;
use crate::error::{DeviceError, ScanError};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about = "List nearby Bluetooth Low Energy devices. Type a line to filter the list.")]
pub struct Options {
    /// Initial filter, matched against device names and addresses
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Stop scanning after this long, for example "30s" or "2m"
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Do not list devices that advertise no name
    #[arg(long)]
    pub hide_unnamed: bool,

    /// Connect to the device with this address once it has been seen
    #[arg(short, long)]
    pub connect: Option<String>,

    /// Path to the config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective configuration to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}

impl Options {
    pub fn apply_to(&self, config: &mut Config) {
        if self.hide_unnamed {
            config.include_unnamed_devices = false;
        }
    }
}

#[derive(Debug)]
pub enum Message {
    QueryChanged(String),
    ScanEnded(Result<(), ScanError>),
    ConnectComplete(String, Result<Vec<ServiceSummary>, DeviceError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let options = Options::try_parse_from([
            "ble-device-list", "--query", "kitchen", "--duration", "30s", "--hide-unnamed", "--connect", "AA:BB:CC:DD:EE:FF",
        ]).expect("options should parse");

        assert_eq!(options.query, "kitchen");
        assert_eq!(options.duration, Some(Duration::from_secs(30)));
        assert!(options.hide_unnamed);
        assert_eq!(options.connect.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn hide_unnamed_overrides_the_config() {
        let options = Options::try_parse_from(["ble-device-list", "--hide-unnamed"]).unwrap();
        let mut config = Config::default();
        options.apply_to(&mut config);
        assert!(!config.include_unnamed_devices);

        let options = Options::try_parse_from(["ble-device-list"]).unwrap();
        let mut config = Config { include_unnamed_devices: false, ..Config::default() };
        options.apply_to(&mut config);
        assert!(!config.include_unnamed_devices);
    }
}
