// CLI integration tests for the demo and check-path flows.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_busobject");
    let mut command = Command::new(exe);
    command.env_remove("RUST_LOG");
    command
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn event_kinds(stdout: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .map(parse_json)
        .map(|value| {
            value
                .get("event")
                .and_then(|event| event.get("kind"))
                .and_then(|kind| kind.as_str())
                .expect("event kind")
                .to_string()
        })
        .collect()
}

#[test]
fn demo_default_action_traces_full_lifecycle() {
    let output = cmd()
        .args([
            "demo",
            "--path",
            "/org/example/Fan0",
            "--interface",
            "org.example.Fan",
            "--interface",
            "org.example.Speed",
        ])
        .output()
        .expect("demo");
    assert!(output.status.success());
    assert_eq!(
        event_kinds(&output.stdout),
        vec![
            "registered",
            "registered",
            "object_added",
            "object_removed",
            "unregistered",
            "unregistered",
        ]
    );

    let first = parse_json(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .expect("first line"),
    );
    let event = first.get("event").expect("event");
    assert_eq!(event.get("path").and_then(|v| v.as_str()), Some("/org/example/Fan0"));
    assert_eq!(
        event.get("interface").and_then(|v| v.as_str()),
        Some("org.example.Fan")
    );
}

#[test]
fn demo_deferred_without_emission_sends_no_signals() {
    let output = cmd()
        .args(["demo", "-i", "org.example.A", "--action", "defer-emit"])
        .output()
        .expect("demo");
    assert!(output.status.success());
    assert_eq!(event_kinds(&output.stdout), vec!["registered", "unregistered"]);
}

#[test]
fn demo_deferred_then_emitted_later_is_one_signal() {
    let output = cmd()
        .args(["demo", "-i", "org.example.A", "--action", "defer-emit", "--emit-later"])
        .output()
        .expect("demo");
    assert!(output.status.success());
    let kinds = event_kinds(&output.stdout);
    assert_eq!(kinds.iter().filter(|kind| *kind == "object_added").count(), 1);
    assert_eq!(kinds.iter().filter(|kind| *kind == "object_removed").count(), 1);
}

#[test]
fn demo_second_emission_is_a_no_op() {
    let output = cmd()
        .args([
            "demo",
            "-i",
            "org.example.A",
            "--action",
            "emit-object-added",
            "--emit-later",
        ])
        .output()
        .expect("demo");
    assert!(output.status.success());
    assert_eq!(
        event_kinds(&output.stdout),
        vec!["registered", "object_added", "object_removed", "unregistered"]
    );
}

#[test]
fn demo_interface_added_announces_each_interface() {
    let output = cmd()
        .args([
            "demo",
            "-i",
            "org.example.A",
            "-i",
            "org.example.B",
            "--action",
            "emit-interface-added",
        ])
        .output()
        .expect("demo");
    assert!(output.status.success());
    assert_eq!(
        event_kinds(&output.stdout),
        vec![
            "registered",
            "registered",
            "interfaces_added",
            "interfaces_added",
            "unregistered",
            "unregistered",
        ]
    );
}

#[test]
fn demo_registration_failure_rolls_back_and_exits_nonzero() {
    let output = cmd()
        .args([
            "demo",
            "-i",
            "org.example.A",
            "-i",
            "org.example.B",
            "-i",
            "org.example.C",
            "--fail-at",
            "org.example.C",
        ])
        .output()
        .expect("demo");
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(
        event_kinds(&output.stdout),
        vec!["registered", "registered", "unregistered", "unregistered"]
    );

    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    let inner = err.get("error").expect("error object");
    assert_eq!(inner.get("kind").and_then(|v| v.as_str()), Some("Registration"));
    assert_eq!(
        inner.get("interface").and_then(|v| v.as_str()),
        Some("org.example.C")
    );
}

#[test]
fn demo_teardown_failure_still_exits_zero() {
    let output = cmd()
        .args(["demo", "-i", "org.example.A", "--fail-removed"])
        .output()
        .expect("demo");
    assert!(output.status.success());
    assert_eq!(
        event_kinds(&output.stdout),
        vec!["registered", "object_added", "unregistered"]
    );
}

#[test]
fn check_path_reports_validity() {
    let ok = cmd()
        .args(["check-path", "/org/example/Thing"])
        .output()
        .expect("check-path");
    assert!(ok.status.success());
    let value = parse_json(String::from_utf8_lossy(&ok.stdout).trim());
    assert_eq!(value.get("valid").and_then(|v| v.as_bool()), Some(true));

    let bad = cmd()
        .args(["check-path", "/org//Thing"])
        .output()
        .expect("check-path");
    assert_eq!(bad.status.code(), Some(2));
    let err = parse_json(String::from_utf8_lossy(&bad.stderr).trim());
    assert_eq!(
        err.get("error")
            .and_then(|inner| inner.get("kind"))
            .and_then(|v| v.as_str()),
        Some("Usage")
    );
}
