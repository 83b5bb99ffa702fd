//! Runs tests using actual binary, apapted from 'fd' method: https://github.com/sharkdp/fd/blob/master/tests/testenv/mod.rs
#![allow(dead_code)]
use std::env;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

// if changing fields of DeviceRecord, update the test data with `--from-json RECORDS_DUMP --all --json > file.json`
/// Dump of USB devices and serial ports
pub const RECORDS_DUMP: &str = "./tests/data/records.json";

pub fn read_dump(file_name: &str) -> BufReader<File> {
    let f = File::open(file_name).expect("Unable to open json dump file");
    BufReader::new(f)
}

pub fn read_dump_to_string(file_name: &str) -> String {
    let mut ret = String::new();
    let mut br = read_dump(file_name);
    br.read_to_string(&mut ret)
        .unwrap_or_else(|_| panic!("Failed to read {}", file_name));
    ret
}

pub fn records_from_dump() -> Vec<usb_inspector::record::DeviceRecord> {
    usb_inspector::source::dump::read_json_dump(RECORDS_DUMP).unwrap()
}

/// Environment for the integration tests.
pub struct TestEnv {
    /// Path to the *usb-inspector* executable.
    exe: PathBuf,
    /// Data written to stdin of the process
    stdin: Option<String>,
}

/// Find the *usb-inspector* executable.
fn find_exe() -> PathBuf {
    // Tests exe is in target/debug/deps, the *usb-inspector* exe is in target/debug
    let root = env::current_exe()
        .expect("tests executable")
        .parent()
        .expect("tests executable directory")
        .parent()
        .expect("usb-inspector executable directory")
        .to_path_buf();

    let exe_name = if cfg!(windows) {
        "usb-inspector.exe"
    } else {
        "usb-inspector"
    };

    root.join(exe_name)
}

/// Format an error message for when *usb-inspector* did not exit as expected.
fn format_exit_error(args: &[&str], output: &process::Output) -> String {
    format!(
        "`usb-inspector {}` did not exit as expected ({}).\nstdout:\n---\n{}---\nstderr:\n---\n{}---",
        args.join(" "),
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Format an error message for when the output of *usb-inspector* did not match the expected output.
fn format_output_error(args: &[&str], expected: &str, actual: &str) -> String {
    // Generate diff text.
    let diff_text = diff::lines(expected, actual)
        .into_iter()
        .map(|diff| match diff {
            diff::Result::Left(l) => format!("-{}", l),
            diff::Result::Both(l, _) => format!(" {}", l),
            diff::Result::Right(r) => format!("+{}", r),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        concat!(
            "`usb-inspector {}` did not produce the expected output.\n",
            "Showing diff between expected and actual:\n{}\n"
        ),
        args.join(" "),
        diff_text
    )
}

impl TestEnv {
    pub fn new() -> TestEnv {
        TestEnv {
            exe: find_exe(),
            stdin: None,
        }
    }

    /// Write `input` to stdin of each run
    pub fn with_stdin(self, input: &str) -> TestEnv {
        TestEnv {
            exe: self.exe,
            stdin: Some(input.to_string()),
        }
    }

    /// Get the path of the executable.
    pub fn test_exe(&self) -> &PathBuf {
        &self.exe
    }

    /// Run with `args`, reading devices from `dump_file` if passed. Colour is always disabled.
    pub fn run(&self, dump_file: Option<&str>, args: &[&str]) -> process::Output {
        let mut cmd = process::Command::new(&self.exe);
        cmd.arg("--no-colour");
        if let Some(dump) = dump_file {
            cmd.arg("--from-json").arg(dump);
        }
        cmd.args(args)
            .stdin(process::Stdio::piped())
            .stdout(process::Stdio::piped())
            .stderr(process::Stdio::piped());

        let mut child = cmd.spawn().expect("usb-inspector spawn");
        {
            let mut stdin = child.stdin.take().expect("usb-inspector stdin");
            if let Some(input) = &self.stdin {
                // process may exit before reading everything
                let _ = stdin.write_all(input.as_bytes());
            }
        }

        child.wait_with_output().expect("usb-inspector output")
    }

    /// Assert that calling *usb-inspector* with the specified arguments succeeds and return the output.
    pub fn assert_success_and_get_output(
        &self,
        dump_file: Option<&str>,
        args: &[&str],
    ) -> process::Output {
        let output = self.run(dump_file, args);

        if !output.status.success() {
            panic!("{}", format_exit_error(args, &output));
        }

        output
    }

    /// Assert that calling *usb-inspector* with the specified arguments produces the expected output.
    pub fn assert_output(
        &self,
        dump_file: Option<&str>,
        args: &[&str],
        expected: &str,
        contains: bool,
    ) {
        let output = self.assert_success_and_get_output(dump_file, args);
        let actual = String::from_utf8_lossy(&output.stdout).to_string();

        if contains {
            if !actual.contains(expected) {
                panic!("{}", format_output_error(args, expected, &actual));
            }
        } else if expected != actual {
            panic!("{}", format_output_error(args, expected, &actual));
        }
    }

    /// Assert output parses as JSON equal to `expected`
    pub fn assert_output_json(
        &self,
        dump_file: Option<&str>,
        args: &[&str],
        expected: serde_json::Value,
    ) {
        let output = self.assert_success_and_get_output(dump_file, args);
        let actual: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("output is JSON");

        assert_json_diff::assert_json_eq!(actual, expected);
    }

    /// Assert that calling *usb-inspector* with the specified arguments exits with `code`
    /// and stderr starts with `expected` if passed.
    pub fn assert_failure_with_code(
        &self,
        dump_file: Option<&str>,
        args: &[&str],
        code: i32,
        expected: Option<&str>,
    ) {
        let output = self.run(dump_file, args);

        if output.status.code() != Some(code) {
            panic!("{}", format_exit_error(args, &output));
        }

        if let Some(expected) = expected {
            let actual_err = String::from_utf8_lossy(&output.stderr);
            if !actual_err.trim_start().starts_with(expected) {
                panic!("{}", format_output_error(args, expected, &actual_err));
            }
        }
    }

    /// Assert that calling *usb-inspector* with the specified arguments does not succeed.
    pub fn assert_failure(&self, dump_file: Option<&str>, args: &[&str]) {
        let output = self.run(dump_file, args);
        if output.status.success() {
            panic!("Failure did not occur as expected.");
        }
    }
}
