//! Uses nusb (pure Rust) to list system USB devices. Requires 'nusb' feature.
//!
//! nusb caches the string descriptors the OS already knows (sysfs on Linux) so most devices are never opened. Only when a string is missing is the device opened to read it, and the handle is dropped before moving to the next device.
use std::time::Duration;

use ::nusb;

use super::access_error;
use crate::error::{Error, ErrorKind, Result};
use crate::normalize::{DescriptorStrings, RawDevice, RawUsbDevice};

const DESCRIPTOR_TYPE_DEVICE: u8 = 0x01;
const DEVICE_DESCRIPTOR_LEN: usize = 18;

/// String descriptor indexes from the device descriptor; zero means none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StringIndexes {
    pub manufacturer: u8,
    pub product: u8,
    pub serial_number: u8,
}

impl TryFrom<&[u8]> for StringIndexes {
    type Error = Error;

    fn try_from(v: &[u8]) -> Result<Self> {
        if v.len() < DEVICE_DESCRIPTOR_LEN {
            return Err(Error::new(
                ErrorKind::DescriptorRead,
                &format!(
                    "Device descriptor too short. Expected: {}, Got {}",
                    DEVICE_DESCRIPTOR_LEN,
                    v.len()
                ),
            ));
        }
        if v[1] != DESCRIPTOR_TYPE_DEVICE {
            return Err(Error::new(
                ErrorKind::DescriptorRead,
                &format!("Unexpected descriptor type 0x{:02x}", v[1]),
            ));
        }

        Ok(StringIndexes {
            manufacturer: v[14],
            product: v[15],
            serial_number: v[16],
        })
    }
}

/// Open device for reading string descriptors
///
/// The [`nusb::Device`] closes when this is dropped, on every return path of [`read_strings`].
struct UsbDevice {
    handle: nusb::Device,
    language: u16,
    timeout: Duration,
}

impl UsbDevice {
    fn open(device_info: &nusb::DeviceInfo, timeout: Duration) -> Result<Self> {
        let handle = device_info.open().map_err(|e| {
            Error::new(
                ErrorKind::DescriptorRead,
                &format!("Failed to open device, ensure user has USB access permissions: {}", e),
            )
        })?;
        // first language - probably US English
        let language = handle
            .get_string_descriptor_supported_languages(timeout)
            .ok()
            .and_then(|mut l| l.next())
            .unwrap_or(nusb::descriptors::language_id::US_ENGLISH);

        Ok(UsbDevice {
            handle,
            language,
            timeout,
        })
    }

    fn get_descriptor_string(&self, string_index: u8) -> Option<String> {
        if string_index == 0 {
            return None;
        }
        self.handle
            .get_string_descriptor(string_index, self.language, self.timeout)
            .map_err(|e| log::debug!("Failed to read string descriptor {}: {}", string_index, e))
            .ok()
    }

    fn string_indexes(&self) -> Result<StringIndexes> {
        let data = self
            .handle
            .get_descriptor(DESCRIPTOR_TYPE_DEVICE, 0x00, 0x00, self.timeout)
            .map_err(|e| {
                Error::new(
                    ErrorKind::DescriptorRead,
                    &format!("Failed to read device descriptor: {}", e),
                )
            })?;
        StringIndexes::try_from(data.as_slice())
    }
}

fn cached_strings(device_info: &nusb::DeviceInfo) -> DescriptorStrings {
    DescriptorStrings {
        manufacturer: device_info.manufacturer_string().map(|s| s.to_string()),
        product: device_info.product_string().map(|s| s.to_string()),
        serial_number: device_info.serial_number().map(|s| s.to_string()),
    }
}

/// Read the string descriptors the OS did not cache
fn read_strings(device_info: &nusb::DeviceInfo, timeout: Duration) -> Result<DescriptorStrings> {
    let device = UsbDevice::open(device_info, timeout)?;
    let indexes = device.string_indexes()?;

    Ok(DescriptorStrings {
        manufacturer: device.get_descriptor_string(indexes.manufacturer),
        product: device.get_descriptor_string(indexes.product),
        serial_number: device.get_descriptor_string(indexes.serial_number),
    })
}

/// Fill strings missing from `cached` with `read`, called only when some are missing
///
/// A read failure is an error only when nothing is cached, otherwise the cached strings are used.
fn resolve_strings<F>(cached: DescriptorStrings, read: F) -> Result<DescriptorStrings>
where
    F: FnOnce() -> Result<DescriptorStrings>,
{
    if cached.is_complete() {
        return Ok(cached);
    }

    match read() {
        Ok(read) => Ok(cached.merge(read)),
        Err(e) if cached.is_empty() => Err(e),
        Err(e) => {
            log::debug!("Using cached strings: {:#}", e);
            Ok(cached)
        }
    }
}

fn build_raw_device(device_info: &nusb::DeviceInfo, timeout: Duration) -> RawUsbDevice {
    log::trace!(
        "Building {:04x}:{:04x}",
        device_info.vendor_id(),
        device_info.product_id()
    );
    let strings = resolve_strings(cached_strings(device_info), || {
        read_strings(device_info, timeout)
    });

    RawUsbDevice {
        vendor_id: device_info.vendor_id(),
        product_id: device_info.product_id(),
        bus: Some(device_info.bus_number()),
        address: Some(device_info.device_address()),
        port_chain: Vec::new(),
        strings,
    }
}

/// List system USB devices with nusb
pub(crate) fn list_devices(timeout: Duration) -> Result<Vec<RawDevice>> {
    let devices = nusb::list_devices().map_err(|e| access_error("USB", e))?;

    Ok(devices
        .map(|d| RawDevice::Usb(build_raw_device(&d, timeout)))
        .collect())
}
