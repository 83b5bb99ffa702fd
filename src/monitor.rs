//! Poll serial ports and report those added or removed since the previous poll
//!
//! [`SerialMonitor`] is an [`Iterator`] of [`MonitorEvent`]s that never ends; the first event is polled immediately and each following one after sleeping the interval.
use chrono::Local;
use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::Duration;

use crate::record::{DeviceRecord, RecordSet};
use crate::source::{discover, DeviceSource, DiscoverKind};

/// Default time between polls
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

const TIME_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// Ports added and removed between two polls, sorted by port name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDiff {
    /// Ports present now but not at the previous poll
    pub added: RecordSet,
    /// Ports present at the previous poll but not now
    pub removed: RecordSet,
}

impl PortDiff {
    /// No change
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Result of a single poll
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorEvent {
    /// When the poll completed
    pub timestamp: chrono::DateTime<Local>,
    /// Change since the previous poll
    pub diff: PortDiff,
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let time = self.timestamp.format(TIME_FORMAT);
        for r in &self.diff.added {
            writeln!(f, "C: {} {}", time, r.to_string().trim_end())?;
        }
        for r in &self.diff.removed {
            writeln!(f, "D: {} {}", time, r.to_string().trim_end())?;
        }
        Ok(())
    }
}

/// Serial port monitor over a [`DeviceSource`]
///
/// The ports seen by the last successful poll are held by the instance, keyed by port name.
pub struct SerialMonitor<S: DeviceSource> {
    source: S,
    interval: Duration,
    previous: BTreeMap<String, DeviceRecord>,
    polled: bool,
}

impl<S: DeviceSource> SerialMonitor<S> {
    /// Monitor of `source` polling every `interval`
    pub fn new(source: S, interval: Duration) -> Self {
        SerialMonitor {
            source,
            interval,
            previous: BTreeMap::new(),
            polled: false,
        }
    }

    /// Time between polls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ports seen by the last successful poll
    pub fn ports(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.previous.values()
    }

    /// Poll once and compare against the previous poll
    ///
    /// The first poll compares against nothing so every port present is added. A failed poll is logged and gives an empty diff, leaving the previous ports as they were.
    pub fn tick(&mut self) -> MonitorEvent {
        let diff = match discover(&mut self.source, DiscoverKind::Serial) {
            Ok(records) => self.update(records),
            Err(e) => {
                log::warn!("Serial port poll failed, retrying next interval: {}", e);
                PortDiff::default()
            }
        };

        MonitorEvent {
            timestamp: Local::now(),
            diff,
        }
    }

    fn update(&mut self, records: RecordSet) -> PortDiff {
        let current: BTreeMap<String, DeviceRecord> = records
            .into_iter()
            .filter_map(|r| Some((r.port_name()?.to_string(), r)))
            .collect();

        let added = current
            .iter()
            .filter(|(k, _)| !self.previous.contains_key(*k))
            .map(|(_, r)| r.clone())
            .collect();
        let removed = self
            .previous
            .iter()
            .filter(|(k, _)| !current.contains_key(*k))
            .map(|(_, r)| r.clone())
            .collect();
        let diff = PortDiff { added, removed };

        if !diff.is_empty() {
            log::debug!(
                "{} port(s) added, {} removed",
                diff.added.len(),
                diff.removed.len()
            );
        }
        self.previous = current;

        diff
    }
}

impl<S: DeviceSource> Iterator for SerialMonitor<S> {
    type Item = MonitorEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.polled {
            thread::sleep(self.interval);
        }
        self.polled = true;

        Some(self.tick())
    }
}
