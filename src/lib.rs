//! Inspect USB devices and serial ports attached to the host: list, filter, render as a table or JSON, export, browse interactively and watch serial ports come and go.
//!
//! Devices are discovered by a [`source::DeviceSource`], normalized into [`record::DeviceRecord`]s, narrowed with [`filter`] and rendered by [`display`].
//!
//! ```no_run
//! use usb_inspector::display::{self, Format, RenderSettings};
//! use usb_inspector::filter::{filter, FilterQuery};
//! use usb_inspector::source::{self, DiscoverKind, HostSource};
//!
//! let records = source::discover(&mut HostSource::new(), DiscoverKind::Usb).unwrap();
//! let records = filter(&records, &FilterQuery::new("stm").unwrap());
//! print!("{}", display::render(&records, Format::Table, &RenderSettings::default()).unwrap());
//! ```
#![warn(missing_docs)]
use simple_logger::SimpleLogger;

pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod inspect;
pub mod monitor;
pub mod normalize;
#[cfg(feature = "serial")]
pub mod reader;
pub mod record;
pub mod source;

/// Set usb-inspector module and binary log level
pub fn set_log_level(debug: u8) -> crate::error::Result<()> {
    match debug {
        // just use env if not passed
        0 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Error.to_level_filter())
            .env(),
        1 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Info.to_level_filter()),
        2 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Debug.to_level_filter()),
        _ => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Trace.to_level_filter()),
    }
    .init()
    .map_err(|e| {
        crate::error::Error::new(
            crate::error::ErrorKind::Other("simple_logger"),
            &format!("Failed to set log level: {}", e),
        )
    })?;

    #[cfg(feature = "libusb")]
    source::libusb::set_log_level(debug);

    Ok(())
}
