//! Replay a JSON export as a [`DeviceSource`]
//!
//! Any output of `--json` or `--save <file>.json` can be read back, which is how the integration tests run without USB hardware.
use std::fs;
use std::io::Read;
use std::path::Path;

use super::DeviceSource;
use crate::error::{Error, ErrorKind, Result};
use crate::normalize::RawDevice;
use crate::record::{DeviceRecord, Kind, RecordSet};

/// Reads a json dump at `file_path` with serde deserializer
pub fn read_json_dump<P: AsRef<Path>>(file_path: P) -> Result<RecordSet> {
    let file_path = file_path.as_ref();
    let mut file = fs::File::options().read(true).open(file_path)?;

    let mut data = String::new();
    file.read_to_string(&mut data)?;

    let json_dump: RecordSet = serde_json::from_str(&data).map_err(|e| {
        Error::new(
            ErrorKind::Parsing,
            &format!("Failed to parse dump at {:?}; Error({})", file_path, e),
        )
    })?;

    Ok(json_dump)
}

/// Source returning the records of a previously read dump
#[derive(Debug, Clone, Default)]
pub struct JsonDumpSource {
    records: RecordSet,
}

impl JsonDumpSource {
    /// Read dump at `file_path`
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        Ok(JsonDumpSource {
            records: read_json_dump(file_path)?,
        })
    }

    /// Use already loaded records
    pub fn from_records(records: RecordSet) -> Self {
        JsonDumpSource { records }
    }

    fn of_kind(&self, kind: Kind) -> Vec<RawDevice> {
        self.records
            .iter()
            .filter(|r| r.kind() == kind)
            .cloned()
            .map(RawDevice::Record)
            .collect()
    }
}

impl From<Vec<DeviceRecord>> for JsonDumpSource {
    fn from(records: Vec<DeviceRecord>) -> Self {
        JsonDumpSource::from_records(records)
    }
}

impl DeviceSource for JsonDumpSource {
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        Ok(self.of_kind(Kind::Usb))
    }

    fn serial_ports(&mut self) -> Result<Vec<RawDevice>> {
        Ok(self.of_kind(Kind::Serial))
    }
}
