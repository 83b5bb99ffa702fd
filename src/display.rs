//! Rendering of a [`RecordSet`] as a table or JSON, single record detail and writing exports
//!
//! Columns are [`Field`]s. Like blocks in `lsusb` style listings, each has a heading and a colour; column widths are worked out from the widest cell so rows line up, using display width rather than byte length.
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;
use usb_ids::{self, FromId};

use crate::error::{Error, ErrorKind, Result};
use crate::record::{DeviceRecord, Field};

/// Marker shown for a field with no value
pub const ABSENT: &str = "-";

/// Column separator
const GAP: &str = "  ";

/// Detail view separator line
const SEPARATOR: &str = "------------------------------------------------------------";

/// Output format of [`render`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Aligned text table
    #[default]
    Table,
    /// Pretty printed JSON array
    Json,
}

/// Settings for [`render`]
#[derive(Debug, Default, Clone)]
pub struct RenderSettings {
    /// Show every field even if no record has a value for it
    pub all_info: bool,
    /// Colour cells with ANSI escape codes; never set for file output
    pub colour: bool,
    /// Prefix rows with a 1-based `[n]` index for selection
    pub index: bool,
}

/// Heading and colouring of a table column
pub trait Block {
    /// Column heading
    fn heading(&self) -> String;
    /// Label used in the detail view
    fn label(&self) -> &'static str;
    /// Colour `s` for this block
    fn colour(&self, s: &str) -> ColoredString;
}

impl Block for Field {
    fn heading(&self) -> String {
        self.to_string()
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Kind => "Kind",
            Field::VendorId => "Vendor ID",
            Field::ProductId => "Product ID",
            Field::Manufacturer => "Manufacturer",
            Field::Product => "Product",
            Field::SerialNumber => "Serial Number",
            Field::BusLocation => "Bus Location",
            Field::PortName => "Port Name",
        }
    }

    fn colour(&self, s: &str) -> ColoredString {
        match self {
            Field::Kind => s.cyan(),
            Field::VendorId => s.bold().yellow(),
            Field::ProductId => s.yellow(),
            Field::Manufacturer => s.blue(),
            Field::Product => s.bold().blue(),
            Field::SerialNumber => s.green(),
            Field::BusLocation => s.magenta(),
            Field::PortName => s.bright_magenta(),
        }
    }
}

/// Columns to show for `records`
///
/// With `all_info` every [`Field`], otherwise only fields where at least one record has a non-empty value so that a mixed set has no all-empty columns.
pub fn columns(records: &[DeviceRecord], all_info: bool) -> Vec<Field> {
    Field::all()
        .into_iter()
        .filter(|f| all_info || records.iter().any(|r| r.has_value(*f)))
        .collect()
}

fn cell(record: &DeviceRecord, field: Field) -> String {
    record
        .field_text(field)
        .unwrap_or_else(|| ABSENT.to_string())
}

fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Render `records` as an aligned table with a heading row
pub fn render_table(records: &[DeviceRecord], settings: &RenderSettings) -> String {
    if records.is_empty() && !settings.all_info {
        return String::from("No devices found\n");
    }

    let cols = columns(records, settings.all_info);
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| cols.iter().map(|f| cell(r, *f)).collect())
        .collect();
    let widths: Vec<usize> = cols
        .iter()
        .enumerate()
        .map(|(i, f)| {
            rows.iter()
                .map(|row| UnicodeWidthStr::width(row[i].as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(f.heading().as_str())))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let index_width = if settings.index {
        format!("[{}]", records.len()).len()
    } else {
        0
    };
    log::trace!("Table columns {:?} widths {:?}", cols, widths);

    let mut ret = String::new();

    // heading
    let mut line: Vec<String> = Vec::with_capacity(cols.len() + 1);
    if settings.index {
        line.push(" ".repeat(index_width));
    }
    for (i, f) in cols.iter().enumerate() {
        let heading = if i + 1 == cols.len() {
            f.heading()
        } else {
            pad(&f.heading(), widths[i])
        };
        line.push(if settings.colour {
            heading.bold().to_string()
        } else {
            heading
        });
    }
    ret.push_str(line.join(GAP).trim_end());
    ret.push('\n');

    for (n, row) in rows.iter().enumerate() {
        let mut line: Vec<String> = Vec::with_capacity(cols.len() + 1);
        if settings.index {
            line.push(pad(&format!("[{}]", n + 1), index_width));
        }
        for (i, f) in cols.iter().enumerate() {
            let text = if i + 1 == cols.len() {
                row[i].to_string()
            } else {
                pad(&row[i], widths[i])
            };
            line.push(if settings.colour {
                f.colour(&text).to_string()
            } else {
                text
            });
        }
        ret.push_str(line.join(GAP).trim_end());
        ret.push('\n');
    }

    ret
}

/// Render `records` as a JSON array, IDs as integers and absent fields as `null`
pub fn render_json(records: &[DeviceRecord]) -> Result<String> {
    let mut ret = serde_json::to_string_pretty(records)?;
    ret.push('\n');
    Ok(ret)
}

/// Render `records` in `format`
///
/// Output only depends on the arguments so rendering the same set twice is byte-identical. `all_info` has no effect on JSON since it always has every field.
pub fn render(records: &[DeviceRecord], format: Format, settings: &RenderSettings) -> Result<String> {
    match format {
        Format::Table => Ok(render_table(records, settings)),
        Format::Json => render_json(records),
    }
}

/// Render every field of `record`, one per line, absent fields marked with [`ABSENT`]
///
/// USB IDs are also looked up in the usb-ids database when known.
pub fn render_detail(record: &DeviceRecord, colour: bool) -> String {
    let fields = Field::all();
    let label_width = fields.iter().map(|f| f.label().len()).max().unwrap_or(0) + 1;

    let mut ret = String::new();
    ret.push_str(SEPARATOR);
    ret.push('\n');

    for f in fields {
        let value = cell(record, f);
        let value = if colour {
            f.colour(&value).to_string()
        } else {
            value
        };
        ret.push_str(&format!(
            "{:width$} {}\n",
            format!("{}:", f.label()),
            value,
            width = label_width
        ));
    }

    if let (Some(vid), Some(pid)) = (record.vendor_id(), record.product_id()) {
        if let Some(vendor) = usb_ids::Vendor::from_id(vid) {
            ret.push_str(&format!(
                "{:width$} {}\n",
                "Vendor Name:",
                vendor.name(),
                width = label_width
            ));
        }
        if let Some(device) = usb_ids::Device::from_vid_pid(vid, pid) {
            ret.push_str(&format!(
                "{:width$} {}\n",
                "Device Name:",
                device.name(),
                width = label_width
            ));
        }
    }

    ret.push_str(SEPARATOR);
    ret.push('\n');
    ret
}

/// Format of a file export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON array as [`render_json`]
    Json,
    /// Plain table as [`render_table`] without colour
    Text,
}

impl From<ExportFormat> for Format {
    fn from(f: ExportFormat) -> Self {
        match f {
            ExportFormat::Json => Format::Json,
            ExportFormat::Text => Format::Table,
        }
    }
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => ExportFormat::Json,
            Format::Table => ExportFormat::Text,
        }
    }
}

/// File to export to and its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Path to write
    pub path: PathBuf,
    /// Format to write in
    pub format: ExportFormat,
}

impl ExportTarget {
    /// Target at `path`; format is `explicit` if given, otherwise JSON for a `.json` extension and text for anything else
    pub fn from_path<P: Into<PathBuf>>(path: P, explicit: Option<ExportFormat>) -> Self {
        let path = path.into();
        let format = explicit.unwrap_or_else(|| Self::infer_format(&path));
        ExportTarget { path, format }
    }

    fn infer_format(path: &Path) -> ExportFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }
}

/// Write `content` to `target`
///
/// Any failure is returned as [`ErrorKind::Export`].
pub fn write(content: &str, target: &ExportTarget) -> Result<()> {
    fs::write(&target.path, content).map_err(|e| {
        Error::new(
            ErrorKind::Export,
            &format!("Failed to write {}: {}", target.path.display(), e),
        )
    })?;
    log::info!("Saved output to {}", target.path.display());

    Ok(())
}

/// Render `records` in the format of `target` without colour and write it
pub fn export(records: &[DeviceRecord], target: &ExportTarget, all_info: bool) -> Result<()> {
    let settings = RenderSettings {
        all_info,
        ..Default::default()
    };
    let content = render(records, target.format.into(), &settings)?;
    write(&content, target)
}
