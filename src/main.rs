//! Where the magic happens for `usb-inspector` binary!
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use usb_inspector::config::Config;
use usb_inspector::display::{self, ExportFormat, ExportTarget, Format, RenderSettings};
use usb_inspector::error::{Error, ErrorKind, Result};
use usb_inspector::filter::{filter, FilterQuery};
use usb_inspector::inspect::{Inspector, StdinInput};
use usb_inspector::monitor::SerialMonitor;
use usb_inspector::source::dump::JsonDumpSource;
use usb_inspector::source::{self, DeviceSource, DiscoverKind, HostSource};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, max_term_width=80)]
struct Args {
    /// Show every field, marking empty ones with '-'
    #[arg(short = 'a', long, default_value_t = false)]
    allinfo: bool,

    /// Show only devices with a field containing TEXT, ignoring case
    #[arg(short, long, value_name = "TEXT")]
    filter: Option<String>,

    /// Also write output to PATH; JSON with --json or a .json extension, otherwise text
    #[arg(short, long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Output as JSON rather than a table
    #[arg(short, long, default_value_t = false)]
    json: bool,

    /// Browse devices interactively, showing detail and exporting a single device
    #[arg(
        short,
        long,
        default_value_t = false,
        conflicts_with_all = ["json", "save", "monitor", "read"]
    )]
    inspect: bool,

    /// List serial ports rather than USB devices
    #[arg(short = 'S', long, default_value_t = false, conflicts_with = "all")]
    serial: bool,

    /// List USB devices and serial ports
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Watch for serial ports being added and removed until interrupted
    #[arg(
        short,
        long,
        default_value_t = false,
        conflicts_with_all = ["json", "allinfo", "save", "read", "all"]
    )]
    monitor: bool,

    /// Poll interval in milliseconds for --monitor [default: 1000]
    #[arg(long, value_name = "MS", requires = "monitor")]
    interval: Option<u64>,

    /// Print lines received on serial PORT until interrupted
    #[arg(
        short,
        long,
        value_name = "PORT",
        conflicts_with_all = ["filter", "save", "json", "allinfo", "from_json"]
    )]
    read: Option<String>,

    /// Baud rate for --read [default: 115200]
    #[arg(short, long, value_name = "RATE", requires = "read")]
    baud: Option<u32>,

    /// Stop --read after N lines
    #[arg(long, value_name = "N", requires = "read")]
    lines: Option<usize>,

    /// Read devices from a JSON export rather than the system
    #[arg(long, value_name = "PATH")]
    from_json: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable coloured output, can also use NO_COLOR environment variable
    #[arg(long, default_value_t = false)]
    no_colour: bool,

    /// Turn debugging information on. Alternatively can use RUST_LOG env: INFO, DEBUG, TRACE
    #[arg(short = 'z', long, action = clap::ArgAction::Count)]
    debug: u8,
}

impl Args {
    fn discover_kind(&self) -> DiscoverKind {
        if self.all {
            DiscoverKind::All
        } else if self.serial || self.monitor {
            DiscoverKind::Serial
        } else {
            DiscoverKind::Usb
        }
    }
}

fn device_source(args: &Args, config: &Config) -> Result<Box<dyn DeviceSource>> {
    match &args.from_json {
        Some(path) => {
            log::info!("Reading devices from {}", path.display());
            Ok(Box::new(JsonDumpSource::from_file(path)?))
        }
        None => Ok(Box::new(
            HostSource::new().with_descriptor_timeout(config.descriptor_timeout()),
        )),
    }
}

#[cfg(feature = "serial")]
fn read_port(port: &str, baud: u32, limit: Option<usize>) -> Result<()> {
    use usb_inspector::reader;

    let serial = reader::open_port(port, baud, reader::DEFAULT_READ_TIMEOUT)?;
    eprintln!("Listening to {} at {} baud, Ctrl-C to stop", port, baud);
    let count = reader::read_lines(serial, &mut io::stdout().lock(), limit)?;
    log::info!("Read {} lines from {}", count, port);

    Ok(())
}

#[cfg(not(feature = "serial"))]
fn read_port(_port: &str, _baud: u32, _limit: Option<usize>) -> Result<()> {
    Err(Error::new(
        ErrorKind::Unsupported,
        "Reading a serial port requires the 'serial' feature",
    ))
}

fn monitor(
    source: Box<dyn DeviceSource>,
    interval: Duration,
    query: Option<&FilterQuery>,
) -> Result<()> {
    let monitor = SerialMonitor::new(source, interval);
    eprintln!(
        "Monitoring serial ports every {} ms, Ctrl-C to stop",
        monitor.interval().as_millis()
    );
    let mut stdout = io::stdout().lock();

    for mut event in monitor {
        if let Some(q) = query {
            event.diff.added = filter(&event.diff.added, q);
            event.diff.removed = filter(&event.diff.removed, q);
        }
        if !event.diff.is_empty() {
            write!(stdout, "{}", event)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };
    log::debug!("{:?}", config);

    // just set the override for this process
    if args.no_colour || config.no_colour {
        colored::control::set_override(false);
    }

    if let Some(port) = &args.read {
        return read_port(port, args.baud.unwrap_or(config.baud), args.lines);
    }

    let query = args.filter.as_deref().map(FilterQuery::new).transpose()?;
    let mut source = device_source(&args, &config)?;

    if args.monitor {
        let interval = args
            .interval
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.monitor_interval());
        if interval.is_zero() {
            return Err(Error::new(
                ErrorKind::InvalidArg,
                "Monitor interval must be greater than 0",
            ));
        }
        return monitor(source, interval, query.as_ref());
    }

    let records = source::discover(&mut source, args.discover_kind())?;
    let records = match &query {
        Some(q) => filter(&records, q),
        None => records,
    };

    let settings = RenderSettings {
        all_info: args.allinfo || config.all_info,
        colour: !(args.no_colour || config.no_colour),
        index: false,
    };

    if args.inspect {
        return Inspector::new(records, StdinInput, io::stdout().lock(), settings).run();
    }

    let format = if args.json {
        Format::Json
    } else {
        Format::Table
    };
    print!("{}", display::render(&records, format, &settings)?);

    if let Some(path) = &args.save {
        let target = ExportTarget::from_path(path, args.json.then_some(ExportFormat::Json));
        display::export(&records, &target, settings.all_info)?;
        eprintln!("Output saved to {}", target.path.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = usb_inspector::set_log_level(args.debug) {
        eprintln!("{:#}", e);
    }

    if let Err(e) = run(args) {
        log::debug!("{}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(e.kind().exit_code());
    }
}
