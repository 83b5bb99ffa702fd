mod common;

use serde_json::json;
use std::fs;
use std::io::Write;

/// Keyword matches the hex vendor ID, only non-empty columns shown
#[test]
fn test_filter_vendor_table() {
    let te = common::TestEnv::new();

    te.assert_output(
        Some(common::RECORDS_DUMP),
        &["--filter", "1d6b"],
        "\
Kind  VID     PID     Manufacturer      Product               Serial        Location
usb   0x1d6b  0x0002  Linux Foundation  xHCI Host Controller  0000:00:14.0  001:001
",
        false,
    );
}

#[test]
fn test_filter_no_match() {
    let te = common::TestEnv::new();

    te.assert_output(
        Some(common::RECORDS_DUMP),
        &["--filter", "nomatch"],
        "No devices found\n",
        false,
    );
}

#[test]
fn test_serial_table() {
    let te = common::TestEnv::new();

    te.assert_output(
        Some(common::RECORDS_DUMP),
        &["--serial"],
        "\
Kind    VID     PID     Manufacturer        Product                Serial        Port
serial  0x0483  0x5740  STMicroelectronics  STM32 Virtual ComPort  2061378E5453  /dev/ttyACM0
serial  -       -       -                   -                      -             /dev/ttyS0
",
        false,
    );
}

#[test]
fn test_serial_allinfo() {
    let te = common::TestEnv::new();

    te.assert_output(
        Some(common::RECORDS_DUMP),
        &["-S", "--allinfo"],
        "\
Kind    VID     PID     Manufacturer        Product                Serial        Location  Port
serial  0x0483  0x5740  STMicroelectronics  STM32 Virtual ComPort  2061378E5453  -         /dev/ttyACM0
serial  -       -       -                   -                      -             -         /dev/ttyS0
",
        false,
    );
}

#[test]
fn test_json_filter_all_kinds() {
    let te = common::TestEnv::new();

    te.assert_output_json(
        Some(common::RECORDS_DUMP),
        &["--all", "--json", "--filter", "ttyS"],
        json!([{
            "kind": "serial",
            "vendor_id": null,
            "product_id": null,
            "manufacturer": null,
            "product": null,
            "serial_number": null,
            "bus_location": null,
            "port_name": "/dev/ttyS0"
        }]),
    );
}

/// JSON output of every device can be read back and is identical
#[test]
fn test_json_round_trip() {
    let te = common::TestEnv::new();

    let output = te.assert_success_and_get_output(Some(common::RECORDS_DUMP), &["--all", "--json"]);
    let records: Vec<usb_inspector::record::DeviceRecord> =
        serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(records, common::records_from_dump());
}

/// Default lists USB devices only, in enumeration order
#[test]
fn test_json_usb_only() {
    let te = common::TestEnv::new();

    let output = te.assert_success_and_get_output(Some(common::RECORDS_DUMP), &["--json"]);
    let records: Vec<usb_inspector::record::DeviceRecord> =
        serde_json::from_slice(&output.stdout).unwrap();
    let expected: Vec<_> = common::records_from_dump()
        .into_iter()
        .filter(|r| r.kind() == usb_inspector::record::Kind::Usb)
        .collect();

    assert_eq!(records, expected);
}

#[test]
fn test_save_json() {
    let te = common::TestEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");

    te.assert_success_and_get_output(
        Some(common::RECORDS_DUMP),
        &["--filter", "stm", "--save", path.to_str().unwrap()],
    );

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved.as_array().unwrap().len(), 1);
    assert_eq!(saved[0]["vendor_id"], json!(1155));
}

#[test]
fn test_save_text_matches_console() {
    let te = common::TestEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let output = te.assert_success_and_get_output(
        Some(common::RECORDS_DUMP),
        &["--save", path.to_str().unwrap()],
    );

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        String::from_utf8_lossy(&output.stdout)
    );
}

/// Unwritable save path is an export error with its own exit code
#[test]
fn test_save_unwritable() {
    let te = common::TestEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.json");

    te.assert_failure_with_code(
        Some(common::RECORDS_DUMP),
        &["--save", path.to_str().unwrap()],
        usb_inspector::error::EXIT_EXPORT,
        Some("Error: Failed to write"),
    );
}

#[test]
fn test_invalid_combinations() {
    let te = common::TestEnv::new();

    for args in [
        vec!["--inspect", "--json"],
        vec!["--monitor", "--save", "out.txt"],
        vec!["--monitor", "--json"],
        vec!["--serial", "--all"],
        vec!["--interval", "10"],
    ] {
        te.assert_failure_with_code(
            Some(common::RECORDS_DUMP),
            &args,
            usb_inspector::error::EXIT_INVALID_ARG,
            None,
        );
    }
}

#[test]
fn test_filter_control_character() {
    let te = common::TestEnv::new();

    te.assert_failure_with_code(
        Some(common::RECORDS_DUMP),
        &["--filter", "a\tb"],
        usb_inspector::error::EXIT_INVALID_ARG,
        Some("Error: Filter query contains control character"),
    );
}

#[test]
fn test_missing_dump() {
    let te = common::TestEnv::new();

    te.assert_failure_with_code(
        Some("./tests/data/does_not_exist.json"),
        &[],
        usb_inspector::error::EXIT_FAILURE,
        None,
    );
}

#[test]
fn test_config_all_info() {
    let te = common::TestEnv::new();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config.write_all(br#"{"all-info": true}"#).unwrap();

    te.assert_output(
        Some(common::RECORDS_DUMP),
        &["-S", "--config", config.path().to_str().unwrap()],
        "Location  Port",
        true,
    );
}

#[test]
fn test_config_unknown_field() {
    let te = common::TestEnv::new();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config.write_all(br#"{"icons": {}}"#).unwrap();

    te.assert_failure_with_code(
        Some(common::RECORDS_DUMP),
        &["--config", config.path().to_str().unwrap()],
        usb_inspector::error::EXIT_INVALID_ARG,
        Some("Error: Failed to parse config"),
    );
}

/// Out of range selection re-prompts, then detail of second device and quit
#[test]
fn test_inspect_stdin() {
    let te = common::TestEnv::new().with_stdin("9\n2\nq\n");

    let output = te.assert_success_and_get_output(Some(common::RECORDS_DUMP), &["--inspect"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Invalid selection '9'"));
    assert!(stdout.contains("Serial Number: 2061378E5453"));
    assert!(stdout.contains("STM32 Virtual ComPort"));
}

#[test]
fn test_inspect_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");
    let te = common::TestEnv::new().with_stdin(&format!(
        "/dev/ttyS0\ne\n{}\nq\n",
        path.to_str().unwrap()
    ));

    te.assert_success_and_get_output(Some(common::RECORDS_DUMP), &["--inspect", "--serial"]);

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved[0]["port_name"], json!("/dev/ttyS0"));
}

/// End of input exits the loop successfully
#[test]
fn test_inspect_eof() {
    let te = common::TestEnv::new();

    te.assert_output(Some(common::RECORDS_DUMP), &["--inspect"], "[1]", true);
}
