//! Keyword filtering of a [`RecordSet`]
//!
//! A [`FilterQuery`] matches a record if the text of any [`Field`] contains it, ignoring case. Vendor and product IDs are matched in their display form (`0x1d6b`) so a query of `1d6b` finds the device whichever column shows it.
//!
//! ```
//! use usb_inspector::filter::{filter, FilterQuery};
//! use usb_inspector::record::DeviceRecord;
//!
//! let records = vec![
//!     DeviceRecord::usb(0x1d6b, 0x0002).with_manufacturer(Some("Linux Foundation".into())),
//!     DeviceRecord::usb(0x046d, 0xc52b).with_manufacturer(Some("Logitech".into())),
//! ];
//! let query = FilterQuery::new("linux").unwrap();
//! assert_eq!(filter(&records, &query).len(), 1);
//! ```
use std::fmt;

use crate::error::{Error, ErrorKind, Result};
use crate::record::{DeviceRecord, Field, RecordSet};

/// Case-insensitive substring to match against every field of a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Lower-cased query
    pattern: String,
}

impl FilterQuery {
    /// New query from user input
    ///
    /// Returns [`ErrorKind::Filter`] if `query` contains control characters, which no displayed field can contain.
    pub fn new(query: &str) -> Result<Self> {
        if let Some(c) = query.chars().find(|c| c.is_control()) {
            return Err(Error::new(
                ErrorKind::Filter,
                &format!("Filter query contains control character {:?}", c),
            ));
        }

        Ok(FilterQuery {
            pattern: query.to_lowercase(),
        })
    }

    /// Query matching everything
    pub fn empty() -> Self {
        Default::default()
    }

    /// Whether the query is empty and so matches everything
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    fn string_match(&self, query: Option<&str>) -> bool {
        query.is_some_and(|q| q.to_lowercase().contains(self.pattern.as_str()))
    }

    /// Checks whether `record` passes through filter
    pub fn is_match(&self, record: &DeviceRecord) -> bool {
        self.is_empty()
            || Field::all()
                .into_iter()
                .any(|f| self.string_match(record.field_text(f).as_deref()))
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Records of `records` matching `query`, in their original order
///
/// `records` is not modified; an empty query returns every record.
pub fn filter(records: &[DeviceRecord], query: &FilterQuery) -> RecordSet {
    if query.is_empty() {
        return records.to_vec();
    }

    let ret: RecordSet = records
        .iter()
        .filter(|r| query.is_match(r))
        .cloned()
        .collect();
    log::debug!(
        "Filter '{}' retained {} of {} records",
        query,
        ret.len(),
        records.len()
    );

    ret
}
