//! Maps the raw per-backend device data into [`DeviceRecord`]
//!
//! Backends in [`crate::source`] produce a [`RawDevice`] tagged by kind. Nothing past [`normalize`] sees the raw variant and any per-device [`ErrorKind::DescriptorRead`] carried by it is absorbed here.
use crate::error::{Error, ErrorKind, Result};
use crate::record::DeviceRecord;

/// String descriptors read from a USB device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorStrings {
    /// iManufacturer
    pub manufacturer: Option<String>,
    /// iProduct
    pub product: Option<String>,
    /// iSerialNumber
    pub serial_number: Option<String>,
}

impl DescriptorStrings {
    /// All strings are known
    pub fn is_complete(&self) -> bool {
        self.manufacturer.is_some() && self.product.is_some() && self.serial_number.is_some()
    }

    /// No string is known
    pub fn is_empty(&self) -> bool {
        self.manufacturer.is_none() && self.product.is_none() && self.serial_number.is_none()
    }

    /// Fill strings missing in `self` from `other`
    pub fn merge(self, other: DescriptorStrings) -> DescriptorStrings {
        DescriptorStrings {
            manufacturer: self.manufacturer.or(other.manufacturer),
            product: self.product.or(other.product),
            serial_number: self.serial_number.or(other.serial_number),
        }
    }
}

/// USB device as reported by a USB backend
#[derive(Debug, Clone)]
pub struct RawUsbDevice {
    /// idVendor
    pub vendor_id: u16,
    /// idProduct
    pub product_id: u16,
    /// Bus number, if the backend has one
    pub bus: Option<u8>,
    /// Device address on the bus
    pub address: Option<u8>,
    /// Hub port chain from the root hub
    pub port_chain: Vec<u8>,
    /// Result of reading string descriptors; `Err` if the device could not be read
    pub strings: Result<DescriptorStrings>,
}

impl RawUsbDevice {
    /// Helper for a device whose string descriptors could not be read
    pub fn descriptor_failure(vendor_id: u16, product_id: u16, message: &str) -> Self {
        RawUsbDevice {
            vendor_id,
            product_id,
            bus: None,
            address: None,
            port_chain: Vec::new(),
            strings: Err(Error::new(ErrorKind::DescriptorRead, message)),
        }
    }
}

/// USB information of a serial port backed by a USB device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSerialUsbInfo {
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
    /// Manufacturer string
    pub manufacturer: Option<String>,
    /// Product string
    pub product: Option<String>,
    /// Serial number string
    pub serial_number: Option<String>,
}

/// Serial port as reported by the serial backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSerialPort {
    /// OS port name
    pub port_name: String,
    /// Present when the port is a USB device; PCI, Bluetooth and unknown ports have none
    pub usb: Option<RawSerialUsbInfo>,
}

/// Raw device data tagged by the backend that produced it
#[derive(Debug, Clone)]
pub enum RawDevice {
    /// From a USB backend
    Usb(RawUsbDevice),
    /// From the serial backend
    Serial(RawSerialPort),
    /// Already normalized, replayed from a dump
    Record(DeviceRecord),
}

/// Strip trailing NUL padding and surrounding whitespace some devices report in string descriptors
///
/// A string empty after cleaning stays `Some("")` so that an empty descriptor can be told apart from a missing one.
fn clean(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim_end_matches('\0').trim().to_string())
}

/// Bus location as "BBB:DDD" with the port chain appended when known
fn bus_location(bus: Option<u8>, address: Option<u8>, port_chain: &[u8]) -> Option<String> {
    let base = match (bus, address) {
        (Some(b), Some(a)) => format!("{:03}:{:03}", b, a),
        (Some(b), None) => format!("{:03}", b),
        (None, _) if !port_chain.is_empty() => String::new(),
        (None, _) => return None,
    };

    if port_chain.is_empty() {
        Some(base)
    } else {
        let ports = port_chain
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        if base.is_empty() {
            Some(format!("port {}", ports))
        } else {
            Some(format!("{} (port {})", base, ports))
        }
    }
}

/// Normalize raw backend data into a [`DeviceRecord`]
///
/// Never fails: a device whose descriptors could not be read keeps its IDs and location with string fields absent.
pub fn normalize(raw: RawDevice) -> DeviceRecord {
    match raw {
        RawDevice::Usb(d) => {
            let location = bus_location(d.bus, d.address, &d.port_chain);
            let strings = match d.strings {
                Ok(s) => s,
                Err(e) => {
                    log::warn!(
                        "Descriptor strings unavailable for {:04x}:{:04x}: {:#}",
                        d.vendor_id,
                        d.product_id,
                        e
                    );
                    DescriptorStrings::default()
                }
            };

            DeviceRecord::usb(d.vendor_id, d.product_id)
                .with_manufacturer(clean(strings.manufacturer))
                .with_product(clean(strings.product))
                .with_serial_number(clean(strings.serial_number))
                .with_bus_location(location)
        }
        RawDevice::Serial(p) => {
            let record = DeviceRecord::serial(p.port_name);
            match p.usb {
                Some(usb) => record
                    .with_ids(Some(usb.vendor_id), Some(usb.product_id))
                    .with_manufacturer(clean(usb.manufacturer))
                    .with_product(clean(usb.product))
                    .with_serial_number(clean(usb.serial_number)),
                None => record,
            }
        }
        RawDevice::Record(r) => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Kind;

    #[test]
    fn test_descriptor_failure_keeps_device() {
        let raw = RawUsbDevice {
            bus: Some(1),
            address: Some(4),
            ..RawUsbDevice::descriptor_failure(0x0483, 0x5740, "Access denied")
        };

        let record = normalize(RawDevice::Usb(raw));

        assert_eq!(record.kind(), Kind::Usb);
        assert_eq!(record.vendor_id(), Some(0x0483));
        assert_eq!(record.manufacturer(), None);
        assert_eq!(record.product(), None);
        assert_eq!(record.serial_number(), None);
        assert_eq!(record.bus_location(), Some("001:004"));
    }

    #[test]
    fn test_clean_strings() {
        let raw = RawUsbDevice {
            vendor_id: 0x2341,
            product_id: 0x804d,
            bus: Some(2),
            address: Some(3),
            port_chain: vec![1, 4],
            strings: Ok(DescriptorStrings {
                manufacturer: Some("Arduino LLC\0\0".into()),
                product: Some("  Arduino Zero ".into()),
                serial_number: Some(" ".into()),
            }),
        };

        let record = normalize(RawDevice::Usb(raw));

        assert_eq!(record.manufacturer(), Some("Arduino LLC"));
        assert_eq!(record.product(), Some("Arduino Zero"));
        assert_eq!(record.serial_number(), Some(""));
        assert_eq!(record.bus_location(), Some("002:003 (port 1.4)"));
    }

    #[test]
    fn test_serial_without_usb() {
        let record = normalize(RawDevice::Serial(RawSerialPort {
            port_name: "/dev/ttyS0".into(),
            usb: None,
        }));

        assert_eq!(record.kind(), Kind::Serial);
        assert_eq!(record.port_name(), Some("/dev/ttyS0"));
        assert_eq!(record.vendor_id(), None);
        assert_eq!(record.product(), None);
    }

    #[test]
    fn test_serial_with_usb() {
        let record = normalize(RawDevice::Serial(RawSerialPort {
            port_name: "/dev/ttyUSB0".into(),
            usb: Some(RawSerialUsbInfo {
                vendor_id: 0x0403,
                product_id: 0x6001,
                manufacturer: Some("FTDI".into()),
                product: Some("FT232R USB UART".into()),
                serial_number: None,
            }),
        }));

        assert_eq!(record.vendor_id(), Some(0x0403));
        assert_eq!(record.product_id(), Some(0x6001));
        assert_eq!(record.product(), Some("FT232R USB UART"));
        assert_eq!(record.serial_number(), None);
    }

    #[test]
    fn test_merge_prefers_self() {
        let cached = DescriptorStrings {
            manufacturer: Some("cached".into()),
            ..Default::default()
        };
        let read = DescriptorStrings {
            manufacturer: Some("read".into()),
            product: Some("product".into()),
            serial_number: None,
        };

        let merged = cached.merge(read);
        assert_eq!(merged.manufacturer.as_deref(), Some("cached"));
        assert_eq!(merged.product.as_deref(), Some("product"));
        assert!(!merged.is_complete());
    }

    #[test]
    fn test_bus_location_forms() {
        assert_eq!(bus_location(None, None, &[]), None);
        assert_eq!(bus_location(Some(3), None, &[]), Some("003".into()));
        assert_eq!(bus_location(None, None, &[2, 1]), Some("port 2.1".into()));
    }
}
