//! Uses rusb (upto date libusb fork) to list system USB devices - same lib as lsusb. Requires 'libusb' feature.
use std::time::Duration;

use rusb as libusb;

use super::access_error;
use crate::error::{Error, ErrorKind, Result};
use crate::normalize::{DescriptorStrings, RawDevice, RawUsbDevice};

/// Set log level for rusb
pub fn set_log_level(debug: u8) {
    let log_level = match debug {
        0 => rusb::LogLevel::None,
        1 => rusb::LogLevel::Warning,
        2 => rusb::LogLevel::Info,
        _ => rusb::LogLevel::Debug,
    };

    rusb::set_log_level(log_level);
}

impl From<libusb::Error> for Error {
    fn from(error: libusb::Error) -> Self {
        let kind = match error {
            libusb::Error::Access | libusb::Error::NoDevice | libusb::Error::NotSupported => {
                ErrorKind::DeviceAccess
            }
            _ => ErrorKind::DescriptorRead,
        };
        Error {
            kind,
            message: format!("libusb: Error({})", &error.to_string()),
        }
    }
}

/// Open device handle with the language used for string reads
///
/// The handle is closed by libusb when this is dropped.
struct UsbDevice<T: libusb::UsbContext> {
    handle: libusb::DeviceHandle<T>,
    language: Option<libusb::Language>,
    timeout: Duration,
}

impl<T: libusb::UsbContext> UsbDevice<T> {
    fn get_descriptor_string(&self, string_index: Option<u8>) -> Option<String> {
        let (language, index) = (self.language?, string_index?);
        self.handle
            .read_string_descriptor(language, index, self.timeout)
            .map_err(|e| log::debug!("Failed to read string descriptor {}: {}", index, e))
            .ok()
    }
}

fn read_strings<T: libusb::UsbContext>(
    device: &libusb::Device<T>,
    device_desc: &libusb::DeviceDescriptor,
    timeout: Duration,
) -> Result<DescriptorStrings> {
    let handle = device.open().map_err(|e| {
        Error::new(
            ErrorKind::DescriptorRead,
            &format!("Failed to open device, check permissions: {}", e),
        )
    })?;
    let language = handle
        .read_languages(timeout)
        .ok()
        .and_then(|l| l.first().copied());
    let usb_device = UsbDevice {
        handle,
        language,
        timeout,
    };

    Ok(DescriptorStrings {
        manufacturer: usb_device.get_descriptor_string(device_desc.manufacturer_string_index()),
        product: usb_device.get_descriptor_string(device_desc.product_string_index()),
        serial_number: usb_device.get_descriptor_string(device_desc.serial_number_string_index()),
    })
}

fn build_raw_device<T: libusb::UsbContext>(
    device: &libusb::Device<T>,
    timeout: Duration,
) -> Result<RawUsbDevice> {
    // device descriptor is cached by libusb, no IO
    let device_desc = device.device_descriptor()?;

    Ok(RawUsbDevice {
        vendor_id: device_desc.vendor_id(),
        product_id: device_desc.product_id(),
        bus: Some(device.bus_number()),
        address: Some(device.address()),
        port_chain: device.port_numbers().unwrap_or_default(),
        strings: read_strings(device, &device_desc, timeout),
    })
}

/// List system USB devices with libusb
pub(crate) fn list_devices(timeout: Duration) -> Result<Vec<RawDevice>> {
    let devices = libusb::devices().map_err(|e| access_error("USB", e))?;

    Ok(keep_readable(devices.iter().map(|device| {
        let raw = build_raw_device(&device, timeout);
        (device, raw)
    })))
}

/// Keep devices whose device descriptor was read, logging the rest
fn keep_readable<D: std::fmt::Debug>(
    built: impl Iterator<Item = (D, Result<RawUsbDevice>)>,
) -> Vec<RawDevice> {
    built
        .filter_map(|(device, raw)| match raw {
            Ok(raw) => Some(RawDevice::Usb(raw)),
            // only on libusb before 1.0.16, which read the device descriptor rather than caching it
            Err(e) => {
                log::warn!("Failed to get data for {:?}: {}", device, e);
                None
            }
        })
        .collect()
}
