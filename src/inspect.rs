//! Interactive inspection of a [`RecordSet`]
//!
//! [`Inspector`] is a small state machine: list the records with an index, select one to see every field, optionally export it to a file, then back to the list. Input comes from an [`InputSource`] so the loop can be driven by a terminal with [`StdinInput`] or a script with [`ScriptedInput`].
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::display::{self, ExportTarget, RenderSettings};
use crate::error::{ErrorKind, Result};
use crate::record::{DeviceRecord, Kind, RecordSet};

const SELECT_PROMPT: &str = "Select a device (number or port name, q to quit): ";
const DETAIL_PROMPT: &str = "[e]xport, [q]uit or Enter to return to list: ";
const EXPORT_PROMPT: &str = "Export to path (empty to cancel): ";

/// State of an [`Inspector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Print the indexed list
    Listing,
    /// Waiting for a selection
    Selecting,
    /// Showing record at index
    Detail(usize),
    /// Waiting for an export path for record at index
    ExportPrompt(usize),
    /// Finished; terminal
    Exited,
}

/// Line based user input
pub trait InputSource {
    /// Show `prompt` and read the next line without its line ending
    ///
    /// `None` at end of input.
    fn next_input(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads lines from stdin, writing prompts to stdout
#[derive(Debug, Default)]
pub struct StdinInput;

impl InputSource for StdinInput {
    fn next_input(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        }
    }
}

/// Pre-recorded input, ends once every line has been read
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    /// Prompts shown so far
    pub prompts: Vec<String>,
}

impl ScriptedInput {
    /// Script of `lines` to return in order
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn next_input(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input, "q" | "quit" | "exit")
}

/// Interactive loop over `records`
///
/// Records are never changed by the loop. Messages and rendered output go to `output`; prompts go through the [`InputSource`].
pub struct Inspector<I: InputSource, W: Write> {
    records: RecordSet,
    input: I,
    output: W,
    settings: RenderSettings,
    state: State,
}

impl<I: InputSource, W: Write> Inspector<I, W> {
    /// New inspector starting in [`State::Listing`]
    pub fn new(records: RecordSet, input: I, output: W, settings: RenderSettings) -> Self {
        Inspector {
            records,
            input,
            output,
            settings: RenderSettings {
                index: true,
                ..settings
            },
            state: State::Listing,
        }
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Records being inspected
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Output written so far
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Input source
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Run one transition and return the new state
    ///
    /// Export failures are reported on the output and the loop returns to [`State::Listing`]; other errors are returned.
    pub fn step(&mut self) -> Result<State> {
        self.state = match self.state {
            State::Listing => self.list()?,
            State::Selecting => self.select()?,
            State::Detail(i) => self.detail(i)?,
            State::ExportPrompt(i) => self.export(i)?,
            State::Exited => State::Exited,
        };
        log::trace!("Inspector state {:?}", self.state);

        Ok(self.state)
    }

    /// Step until [`State::Exited`]
    pub fn run(&mut self) -> Result<()> {
        while self.step()? != State::Exited {}
        Ok(())
    }

    fn list(&mut self) -> Result<State> {
        if self.records.is_empty() {
            writeln!(self.output, "No devices to inspect")?;
            return Ok(State::Exited);
        }

        write!(
            self.output,
            "{}",
            display::render_table(&self.records, &self.settings)
        )?;
        Ok(State::Selecting)
    }

    fn selection(&self, input: &str) -> Option<usize> {
        match input.parse::<usize>() {
            Ok(n) if (1..=self.records.len()).contains(&n) => Some(n - 1),
            Ok(_) => None,
            Err(_) => self
                .records
                .iter()
                .position(|r| r.kind() == Kind::Serial && r.port_name() == Some(input)),
        }
    }

    fn select(&mut self) -> Result<State> {
        let input = match self.input.next_input(SELECT_PROMPT)? {
            Some(l) => l,
            None => return Ok(State::Exited),
        };
        let input = input.trim();

        if is_quit(input) {
            return Ok(State::Exited);
        }

        match self.selection(input) {
            Some(i) => Ok(State::Detail(i)),
            None => {
                writeln!(
                    self.output,
                    "Invalid selection '{}': enter a number from 1 to {}",
                    input,
                    self.records.len()
                )?;
                Ok(State::Selecting)
            }
        }
    }

    fn detail(&mut self, index: usize) -> Result<State> {
        write!(
            self.output,
            "{}",
            display::render_detail(&self.records[index], self.settings.colour)
        )?;

        let input = match self.input.next_input(DETAIL_PROMPT)? {
            Some(l) => l,
            None => return Ok(State::Exited),
        };

        Ok(match input.trim() {
            "e" | "export" => State::ExportPrompt(index),
            i if is_quit(i) => State::Exited,
            _ => State::Listing,
        })
    }

    fn export(&mut self, index: usize) -> Result<State> {
        let path = match self.input.next_input(EXPORT_PROMPT)? {
            Some(l) => l,
            None => return Ok(State::Exited),
        };
        let path = path.trim();

        if path.is_empty() {
            writeln!(self.output, "Export cancelled")?;
            return Ok(State::Listing);
        }

        let target = ExportTarget::from_path(path, None);
        match display::export(
            &self.records[index..=index],
            &target,
            self.settings.all_info,
        ) {
            Ok(()) => writeln!(self.output, "Saved to {}", target.path.display())?,
            Err(e) if e.kind() == ErrorKind::Export => {
                log::debug!("Export from inspector failed: {}", e);
                writeln!(self.output, "Export failed: {:#}", e)?
            }
            Err(e) => return Err(e),
        }

        Ok(State::Listing)
    }
}
