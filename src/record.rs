//! Normalized device records produced by discovery and consumed by filtering, display and export
//!
//! A [`DeviceRecord`] is built once by [`crate::normalize`] and never mutated afterwards; fields are private and only readable through accessors. The builder `with_` methods consume the record so they can only be used while it is being built.
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Ordered devices from one discovery call; order is the enumeration order of the host facility
pub type RecordSet = Vec<DeviceRecord>;

/// Which host facility a device was found through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    /// USB device from the USB backend
    Usb,
    /// Serial port from the serial backend
    Serial,
}

/// Every field of a [`DeviceRecord`] in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Field {
    /// [`Kind`] of device
    #[strum(to_string = "Kind")]
    Kind,
    /// Vendor ID
    #[strum(to_string = "VID")]
    VendorId,
    /// Product ID
    #[strum(to_string = "PID")]
    ProductId,
    /// Manufacturer string descriptor
    #[strum(to_string = "Manufacturer")]
    Manufacturer,
    /// Product string descriptor
    #[strum(to_string = "Product")]
    Product,
    /// Serial number string descriptor
    #[strum(to_string = "Serial")]
    SerialNumber,
    /// Bus and address or port path
    #[strum(to_string = "Location")]
    BusLocation,
    /// OS serial port name, /dev/ttyACM0 or COM3 for example
    #[strum(to_string = "Port")]
    PortName,
}

impl Field {
    /// All fields in display order
    pub fn all() -> Vec<Field> {
        Field::iter().collect()
    }
}

/// Format a vendor or product ID the way it is displayed and matched: `0x` followed by four lower-case hex digits
pub fn format_id(id: u16) -> String {
    format!("0x{:04x}", id)
}

/// One attached USB device or serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct DeviceRecord {
    kind: Kind,
    vendor_id: Option<u16>,
    product_id: Option<u16>,
    manufacturer: Option<String>,
    product: Option<String>,
    serial_number: Option<String>,
    bus_location: Option<String>,
    port_name: Option<String>,
}

/// Plain fields deserialized before the [`DeviceRecord`] invariants are checked
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordFields {
    kind: Kind,
    #[serde(default)]
    vendor_id: Option<u16>,
    #[serde(default)]
    product_id: Option<u16>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    bus_location: Option<String>,
    #[serde(default)]
    port_name: Option<String>,
}

impl TryFrom<RecordFields> for DeviceRecord {
    type Error = String;

    fn try_from(f: RecordFields) -> Result<Self, Self::Error> {
        let record = match f.kind {
            Kind::Usb => match (f.vendor_id, f.product_id, &f.port_name) {
                (Some(vid), Some(pid), None) => DeviceRecord::usb(vid, pid),
                (_, _, Some(_)) => return Err("usb record cannot have a port_name".into()),
                _ => return Err("usb record requires vendor_id and product_id".into()),
            },
            Kind::Serial => match f.port_name {
                Some(port) => DeviceRecord::serial(port).with_ids(f.vendor_id, f.product_id),
                None => return Err("serial record requires port_name".into()),
            },
        };

        Ok(record
            .with_manufacturer(f.manufacturer)
            .with_product(f.product)
            .with_serial_number(f.serial_number)
            .with_bus_location(f.bus_location))
    }
}

impl DeviceRecord {
    /// New USB device record; vendor and product ID are required for USB
    pub fn usb(vendor_id: u16, product_id: u16) -> Self {
        DeviceRecord {
            kind: Kind::Usb,
            vendor_id: Some(vendor_id),
            product_id: Some(product_id),
            manufacturer: None,
            product: None,
            serial_number: None,
            bus_location: None,
            port_name: None,
        }
    }

    /// New serial port record; port name is required for serial
    pub fn serial<S: Into<String>>(port_name: S) -> Self {
        DeviceRecord {
            kind: Kind::Serial,
            vendor_id: None,
            product_id: None,
            manufacturer: None,
            product: None,
            serial_number: None,
            bus_location: None,
            port_name: Some(port_name.into()),
        }
    }

    /// Set USB IDs of a serial port backed by a USB device
    ///
    /// Ignored for [`Kind::Usb`] records since their IDs are fixed at construction.
    pub fn with_ids(mut self, vendor_id: Option<u16>, product_id: Option<u16>) -> Self {
        if self.kind == Kind::Serial {
            self.vendor_id = vendor_id;
            self.product_id = product_id;
        }
        self
    }

    /// Set manufacturer string
    pub fn with_manufacturer(mut self, manufacturer: Option<String>) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    /// Set product string
    pub fn with_product(mut self, product: Option<String>) -> Self {
        self.product = product;
        self
    }

    /// Set serial number string
    pub fn with_serial_number(mut self, serial_number: Option<String>) -> Self {
        self.serial_number = serial_number;
        self
    }

    /// Set bus location
    pub fn with_bus_location(mut self, bus_location: Option<String>) -> Self {
        self.bus_location = bus_location;
        self
    }

    /// [`Kind`] of device
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Vendor ID; always present for USB
    pub fn vendor_id(&self) -> Option<u16> {
        self.vendor_id
    }

    /// Product ID; always present for USB
    pub fn product_id(&self) -> Option<u16> {
        self.product_id
    }

    /// Manufacturer string if known
    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    /// Product string if known
    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Serial number string if known
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Bus location if known
    pub fn bus_location(&self) -> Option<&str> {
        self.bus_location.as_deref()
    }

    /// Serial port name; always present for serial
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Textual form of `field` as displayed and matched by the filter; `None` when the field is absent
    pub fn field_text(&self, field: Field) -> Option<String> {
        match field {
            Field::Kind => Some(self.kind.to_string()),
            Field::VendorId => self.vendor_id.map(format_id),
            Field::ProductId => self.product_id.map(format_id),
            Field::Manufacturer => self.manufacturer.clone(),
            Field::Product => self.product.clone(),
            Field::SerialNumber => self.serial_number.clone(),
            Field::BusLocation => self.bus_location.clone(),
            Field::PortName => self.port_name.clone(),
        }
    }

    /// Whether `field` has a non-empty value
    pub fn has_value(&self, field: Field) -> bool {
        self.field_text(field).is_some_and(|s| !s.is_empty())
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            Kind::Serial => write!(
                f,
                "{} {}",
                self.port_name.as_deref().unwrap_or_default(),
                self.product.as_deref().unwrap_or_default()
            ),
            Kind::Usb => write!(
                f,
                "{}:{} {}",
                self.vendor_id.map(format_id).unwrap_or_default(),
                self.product_id.map(format_id).unwrap_or_default(),
                self.product.as_deref().unwrap_or_default()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_record_invariants() {
        let r = DeviceRecord::usb(0x1d6b, 0x0002);
        assert_eq!(r.kind(), Kind::Usb);
        assert_eq!(r.vendor_id(), Some(0x1d6b));
        assert_eq!(r.product_id(), Some(0x0002));
        assert_eq!(r.port_name(), None);
        // fixed at construction
        let r = r.with_ids(None, None);
        assert_eq!(r.vendor_id(), Some(0x1d6b));
    }

    #[test]
    fn test_field_text_id_hex() {
        let r = DeviceRecord::usb(0x1d6b, 0x0002);
        assert_eq!(r.field_text(Field::VendorId), Some("0x1d6b".to_string()));
        assert_eq!(r.field_text(Field::ProductId), Some("0x0002".to_string()));
        assert_eq!(r.field_text(Field::Kind), Some("usb".to_string()));
        assert_eq!(r.field_text(Field::Manufacturer), None);
    }

    /// Table text of kind is the same as its JSON name
    #[test]
    fn test_kind_text_matches_json() {
        for kind in [Kind::Usb, Kind::Serial] {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
    }

    #[test]
    fn test_has_value_empty_string() {
        let r = DeviceRecord::usb(1, 2).with_serial_number(Some(String::new()));
        assert!(!r.has_value(Field::SerialNumber));
        assert_eq!(r.serial_number(), Some(""));
    }

    #[test]
    fn test_deserialize_device() {
        let device_json = r#"{
            "kind": "usb",
            "vendor_id": 7531,
            "product_id": 2,
            "manufacturer": "Linux Foundation",
            "product": "2.0 root hub",
            "serial_number": null,
            "bus_location": "001:001",
            "port_name": null
        }"#;

        let device: DeviceRecord = serde_json::from_str(device_json).unwrap();

        assert_eq!(device.vendor_id(), Some(0x1d6b));
        assert_eq!(device.manufacturer(), Some("Linux Foundation"));
        assert_eq!(device.serial_number(), None);
        assert_eq!(device.bus_location(), Some("001:001"));
    }

    #[test]
    fn test_deserialize_rejects_broken_invariants() {
        assert!(serde_json::from_str::<DeviceRecord>(r#"{"kind": "usb", "vendor_id": 1}"#).is_err());
        assert!(serde_json::from_str::<DeviceRecord>(r#"{"kind": "serial"}"#).is_err());
        assert!(serde_json::from_str::<DeviceRecord>(
            r#"{"kind": "usb", "vendor_id": 1, "product_id": 2, "port_name": "COM1"}"#
        )
        .is_err());
    }

    #[test]
    fn test_field_order() {
        let fields = Field::all();
        assert_eq!(fields.first(), Some(&Field::Kind));
        assert_eq!(fields.last(), Some(&Field::PortName));
        assert_eq!(fields.len(), 8);
    }
}
