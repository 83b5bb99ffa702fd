//! Config for usb-inspector binary
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

fn default_monitor_interval_ms() -> u64 {
    1000
}

fn default_descriptor_timeout_ms() -> u64 {
    1000
}

fn default_baud() -> u32 {
    115_200
}

/// Defaults for the binary, any of which a command line flag overrides
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Show every field in tables
    #[serde(default)]
    pub all_info: bool,
    /// Disable colour output
    #[serde(default)]
    pub no_colour: bool,
    /// Serial monitor poll interval
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
    /// Timeout for each USB string descriptor read
    #[serde(default = "default_descriptor_timeout_ms")]
    pub descriptor_timeout_ms: u64,
    /// Baud rate for reading a serial port
    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            all_info: false,
            no_colour: false,
            monitor_interval_ms: default_monitor_interval_ms(),
            descriptor_timeout_ms: default_descriptor_timeout_ms(),
            baud: default_baud(),
        }
    }
}

impl Config {
    /// Default new
    pub fn new() -> Config {
        Config {
            ..Default::default()
        }
    }

    /// Attempt to read from .json format config at `file_path`
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Config> {
        let file_path = file_path.as_ref();
        let f = File::open(file_path).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!("Failed to open config {}: {}", file_path.display(), e),
            )
        })?;
        let mut br = BufReader::new(f);
        let mut data = String::new();

        br.read_to_string(&mut data)?;
        serde_json::from_str::<Config>(&data).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!("Failed to parse config {}: {}", file_path.display(), e),
            )
        })
    }

    /// Serial monitor poll interval
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// USB string descriptor read timeout
    pub fn descriptor_timeout(&self) -> Duration {
        Duration::from_millis(self.descriptor_timeout_ms)
    }
}
