//! Stream text lines from a serial port. Requires 'serial' feature.
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Error, ErrorKind, Result};

/// Default baud rate for [`open_port`]
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default read timeout; reads that time out are retried
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Open serial port `name` at `baud`
///
/// Returns [`ErrorKind::DeviceAccess`] if the port cannot be opened. The port is closed when dropped.
pub fn open_port(name: &str, baud: u32, timeout: Duration) -> Result<Box<dyn SerialPort>> {
    log::info!("Opening {} at {} baud", name, baud);
    serialport::new(name, baud)
        .timeout(timeout)
        .open()
        .map_err(|e| {
            Error::new(
                ErrorKind::DeviceAccess,
                &format!("Failed to open serial port {}: {}", name, e),
            )
        })
}

fn write_line<W: Write>(bytes: &[u8], out: &mut W) -> Result<bool> {
    let line = String::from_utf8_lossy(bytes);
    if line.is_empty() {
        return Ok(false);
    }
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(true)
}

/// Longest line held before it is written without a line ending
pub const MAX_LINE_LEN: usize = 4096;

/// Write `pending` as a line if not empty and clear it; returns whether `limit` is reached
fn flush_pending<W: Write>(
    pending: &mut Vec<u8>,
    out: &mut W,
    count: &mut usize,
    limit: Option<usize>,
) -> Result<bool> {
    if write_line(pending, out)? {
        *count += 1;
    }
    pending.clear();
    Ok(limit.is_some_and(|l| *count >= l))
}

/// Read lines from `port` and write each non-empty one to `out`
///
/// Lines end with `\n` or `\r` and invalid UTF-8 is replaced. Data without a line ending is written once [`MAX_LINE_LEN`] bytes are held, and anything held is written before a read error is returned. Read timeouts are retried so this only returns at end of input, once `limit` lines have been written or on error. Returns the number of lines written.
pub fn read_lines<R: Read, W: Write>(
    mut port: R,
    out: &mut W,
    limit: Option<usize>,
) -> Result<usize> {
    let mut buf = [0u8; 256];
    let mut pending: Vec<u8> = Vec::with_capacity(MAX_LINE_LEN);
    let mut count = 0;

    if limit == Some(0) {
        return Ok(0);
    }

    loop {
        let n = match port.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(e) => {
                log::debug!("Read failed with {} bytes held: {}", pending.len(), e);
                flush_pending(&mut pending, out, &mut count, limit)?;
                return Err(e.into());
            }
        };
        log::trace!("Read {} bytes", n);

        for b in &buf[..n] {
            let done = match b {
                b'\n' | b'\r' => flush_pending(&mut pending, out, &mut count, limit)?,
                _ => {
                    pending.push(*b);
                    pending.len() >= MAX_LINE_LEN
                        && flush_pending(&mut pending, out, &mut count, limit)?
                }
            };
            if done {
                return Ok(count);
            }
        }
    }

    // unterminated last line
    flush_pending(&mut pending, out, &mut count, limit)?;

    Ok(count)
}
