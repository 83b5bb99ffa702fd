//! Serial port enumeration with serialport. Requires 'serial' feature.
use serialport::{available_ports, SerialPortInfo, SerialPortType};

use super::access_error;
use crate::error::Result;
use crate::normalize::{RawDevice, RawSerialPort, RawSerialUsbInfo};

impl From<&SerialPortInfo> for RawSerialPort {
    fn from(info: &SerialPortInfo) -> Self {
        let usb = match &info.port_type {
            SerialPortType::UsbPort(usb) => Some(RawSerialUsbInfo {
                vendor_id: usb.vid,
                product_id: usb.pid,
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
                serial_number: usb.serial_number.clone(),
            }),
            SerialPortType::PciPort | SerialPortType::BluetoothPort | SerialPortType::Unknown => {
                None
            }
        };

        RawSerialPort {
            port_name: info.port_name.clone(),
            usb,
        }
    }
}

/// List serial ports available on the system
pub(crate) fn list_ports() -> Result<Vec<RawDevice>> {
    let ports = available_ports().map_err(|e| access_error("serial", e))?;
    log::debug!("Found {} serial port(s)", ports.len());

    Ok(ports
        .iter()
        .map(|p| RawDevice::Serial(RawSerialPort::from(p)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn test_serial_port_from_usb() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x0403,
                pid: 0x6001,
                serial_number: Some("A50285BI".to_string()),
                manufacturer: Some("FTDI".to_string()),
                product: Some("FT232R USB UART".to_string()),
            }),
        };

        let raw = RawSerialPort::from(&info);

        assert_eq!(raw.port_name, "/dev/ttyUSB0");
        let usb = raw.usb.unwrap();
        assert_eq!(usb.vendor_id, 0x0403);
        assert_eq!(usb.product_id, 0x6001);
        assert_eq!(usb.serial_number.as_deref(), Some("A50285BI"));
    }

    #[test]
    fn test_serial_port_from_pci() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::PciPort,
        };

        let raw = RawSerialPort::from(&info);
        assert_eq!(raw.port_name, "/dev/ttyS0");
        assert!(raw.usb.is_none());
    }
}
