#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Command-line argument handling of the `bytebridge` binary.

use std::process::{Command, Output};

fn bytebridge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bytebridge"))
        .args(args)
        .env_remove("BYTEBRIDGE_CONFIG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn no_arguments_exits_with_usage() {
    let output = bytebridge(&[]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("Argument must be provided."));
    assert!(out.contains("Usage:"));
}

#[test]
fn single_connection_exits_with_usage() {
    let output = bytebridge(&["ipclient:127.0.0.1:9001"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn unknown_connection_type_exits_with_usage() {
    let output = bytebridge(&["foo:bar:1", "ipclient:127.0.0.1:9002"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("invalid connection type \"foo\""));
    assert!(out.contains("ipserver"));
}

#[test]
fn duplicate_sniff_exits_with_usage() {
    let output = bytebridge(&[
        "ipclient:127.0.0.1:9001",
        "ipclient:127.0.0.1:9002",
        "1:ipclient:127.0.0.1:7001",
        "1:ipclient:127.0.0.1:7002",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("already has a sniff connection"));
}

#[test]
fn help_exits_successfully() {
    let output = bytebridge(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("portname:baudrate"));
}
