//! Device discovery from the host USB and serial facilities
//!
//! Get a [`RecordSet`] of attached devices with [`discover`] and a [`DeviceSource`]. The USB backend is picked by feature, either `libusb` or `nusb` (libusb takes precedence when both are enabled); serial ports come from the `serial` feature. To replay a previous JSON export instead, use [`dump::JsonDumpSource`].
//!
//! ```no_run
//! use usb_inspector::source::{self, DiscoverKind, HostSource};
//!
//! let mut host = HostSource::new();
//! let records = source::discover(&mut host, DiscoverKind::All).unwrap();
//! println!("{} devices", records.len());
//! ```
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::normalize::{normalize, RawDevice};
use crate::record::RecordSet;

pub mod dump;
#[cfg(feature = "libusb")]
pub mod libusb;
#[cfg(feature = "nusb")]
pub mod nusb;
#[cfg(feature = "serial")]
pub mod serial;

/// Default timeout for a single string descriptor read
pub const DEFAULT_DESCRIPTOR_TIMEOUT: Duration = Duration::from_secs(1);

/// Which devices to discover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoverKind {
    /// USB devices only
    #[default]
    Usb,
    /// Serial ports only
    Serial,
    /// USB devices followed by serial ports
    All,
}

/// A facility that can list attached devices
///
/// Implementations return [`ErrorKind::DeviceAccess`] when the facility as a whole is unavailable. Per-device failures are carried inside the [`RawDevice`] rather than returned.
pub trait DeviceSource {
    /// List attached USB devices in enumeration order
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>>;
    /// List serial ports in enumeration order
    fn serial_ports(&mut self) -> Result<Vec<RawDevice>>;
}

impl<S: DeviceSource + ?Sized> DeviceSource for &mut S {
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        (**self).usb_devices()
    }

    fn serial_ports(&mut self) -> Result<Vec<RawDevice>> {
        (**self).serial_ports()
    }
}

impl<S: DeviceSource + ?Sized> DeviceSource for Box<S> {
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        (**self).usb_devices()
    }

    fn serial_ports(&mut self) -> Result<Vec<RawDevice>> {
        (**self).serial_ports()
    }
}

/// Discover devices of `kind` from `source` and normalize them
///
/// Fails only if the facility for `kind` is unavailable; with [`DiscoverKind::All`] either facility failing fails the call.
pub fn discover<S: DeviceSource + ?Sized>(source: &mut S, kind: DiscoverKind) -> Result<RecordSet> {
    let raw = match kind {
        DiscoverKind::Usb => source.usb_devices()?,
        DiscoverKind::Serial => source.serial_ports()?,
        DiscoverKind::All => {
            let mut raw = source.usb_devices()?;
            raw.extend(source.serial_ports()?);
            raw
        }
    };
    log::debug!("Discovered {} raw {:?} devices", raw.len(), kind);

    Ok(raw.into_iter().map(normalize).collect())
}

/// Live host devices using the backends enabled at compile time
#[derive(Debug, Clone)]
pub struct HostSource {
    descriptor_timeout: Duration,
}

impl Default for HostSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource {
    /// New with [`DEFAULT_DESCRIPTOR_TIMEOUT`]
    pub fn new() -> Self {
        HostSource {
            descriptor_timeout: DEFAULT_DESCRIPTOR_TIMEOUT,
        }
    }

    /// Set the timeout used for each string descriptor read
    pub fn with_descriptor_timeout(mut self, timeout: Duration) -> Self {
        self.descriptor_timeout = timeout;
        self
    }
}

impl DeviceSource for HostSource {
    #[cfg(feature = "libusb")]
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        libusb::list_devices(self.descriptor_timeout)
    }

    #[cfg(all(feature = "nusb", not(feature = "libusb")))]
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        nusb::list_devices(self.descriptor_timeout)
    }

    #[cfg(not(any(feature = "nusb", feature = "libusb")))]
    fn usb_devices(&mut self) -> Result<Vec<RawDevice>> {
        Err(Error::new(
            ErrorKind::Unsupported,
            "USB discovery requires the 'nusb' or 'libusb' feature",
        ))
    }

    #[cfg(feature = "serial")]
    fn serial_ports(&mut self) -> Result<Vec<RawDevice>> {
        serial::list_ports()
    }

    #[cfg(not(feature = "serial"))]
    fn serial_ports(&mut self) -> Result<Vec<RawDevice>> {
        Err(Error::new(
            ErrorKind::Unsupported,
            "Serial discovery requires the 'serial' feature",
        ))
    }
}

/// Wrap a host listing failure as [`ErrorKind::DeviceAccess`] naming the facility
pub(crate) fn access_error<E: std::fmt::Display>(facility: &str, error: E) -> Error {
    Error::new(
        ErrorKind::DeviceAccess,
        &format!(
            "Failed to list {} devices, check the driver layer is installed and the user has access permissions: {}",
            facility, error
        ),
    )
}
