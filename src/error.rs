//! Error type used within crate with From for commonly used crate errors
use std::error;
use std::{fmt, io};

/// Result type used within crate
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit code for a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for a failure without a more specific code
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code for invalid arguments or argument combinations; same as clap usage errors
pub const EXIT_INVALID_ARG: i32 = 2;
/// Process exit code when the host device enumeration facility cannot be reached
pub const EXIT_DEVICE_ACCESS: i32 = 3;
/// Process exit code when writing an export failed
pub const EXIT_EXPORT: i32 = 4;

#[derive(Debug, PartialEq, Eq, Clone)]
/// Kind of error produced
pub enum ErrorKind {
    /// Host USB or serial enumeration is unavailable or denied - check driver layer and permissions
    DeviceAccess,
    /// Reading string descriptors from a single device failed; never fatal
    DescriptorRead,
    /// Malformed filter query
    Filter,
    /// Unable to write an export target
    Export,
    /// Backend required for the operation was not compiled in, libusb feature not enabled for example
    Unsupported,
    /// Error parsing a string into a value - used for json deserialization
    Parsing,
    /// Error parsing config file
    Config,
    /// [`std::io::Error`] probably not found when reading file to parse
    Io,
    /// Invalid arg for method or cli
    InvalidArg,
    /// Error From other crate without enum variant
    Other(&'static str),
}

impl ErrorKind {
    /// Process exit code for this kind of error
    ///
    /// [`ErrorKind::DeviceAccess`], [`ErrorKind::Export`] and [`ErrorKind::InvalidArg`] are distinct so that an external caller can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::DeviceAccess | ErrorKind::Unsupported => EXIT_DEVICE_ACCESS,
            ErrorKind::Export => EXIT_EXPORT,
            ErrorKind::InvalidArg | ErrorKind::Filter | ErrorKind::Config => EXIT_INVALID_ARG,
            _ => EXIT_FAILURE,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
/// Crate error which impl [`std::error`]
pub struct Error {
    /// The [`ErrorKind`]
    pub kind: ErrorKind,
    /// String description
    pub message: String,
}

impl Error {
    /// New error helper
    pub fn new(kind: ErrorKind, message: &str) -> Error {
        Error {
            kind,
            message: message.to_string(),
        }
    }

    /// The [`ErrorKind`]
    pub fn kind(&self) -> ErrorKind {
        self.kind.to_owned()
    }

    /// The description
    pub fn message(&self) -> &String {
        &self.message
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{:?} Error: {}", self.kind, self.message)
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parsing,
            message: error.to_string(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(val: Error) -> Self {
        io::Error::other(val.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct() {
        let access = ErrorKind::DeviceAccess.exit_code();
        let export = ErrorKind::Export.exit_code();
        let arg = ErrorKind::InvalidArg.exit_code();

        assert_ne!(access, export);
        assert_ne!(access, arg);
        assert_ne!(export, arg);
        assert!([access, export, arg].iter().all(|c| *c != EXIT_SUCCESS));
    }

    #[test]
    fn test_display_alternate_is_message_only() {
        let e = Error::new(ErrorKind::Export, "Failed to write out.json");
        assert_eq!(format!("{:#}", e), "Failed to write out.json");
        assert_eq!(format!("{}", e), "Export Error: Failed to write out.json");
    }

    #[test]
    fn test_from_io_error() {
        let e: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(e.kind(), ErrorKind::Io);
    }
}
