//! Integration tests for the distgen command line tool.

#![cfg(not(miri))]

use std::process::{Command, Output};

fn run_tool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_distgen"))
        .args(args)
        .output()
        .expect("failed to start the distgen binary")
}

#[test]
fn prints_report_for_small_run() {
    let output = run_tool(&["--no-pin", "-i", "2", "4K", "1K"]);

    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("index read on 1 threads, 2 iterations"),
        "unexpected report: {stdout}"
    );
}

#[test]
fn pattern_flags_select_chain_write() {
    let output = run_tool(&["--no-pin", "-d", "-w", "-p", "-c", "2", "-i", "1", "8K"]);

    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("chain read-modify-write on 2 threads, 1 iterations"),
        "unexpected report: {stdout}"
    );
}

#[test]
fn verbose_describes_layout_on_stderr() {
    let output = run_tool(&["--no-pin", "-v", "-i", "1", "64K", "4K"]);

    assert!(output.status.success(), "{output:?}");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("number of distances: 2"), "{stderr}");
    assert!(stderr.contains("traversals per iteration"), "{stderr}");
}

#[test]
fn missing_distances_fail() {
    let output = run_tool(&["--no-pin"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn malformed_size_is_rejected() {
    let output = run_tool(&["--no-pin", "12Q"]);

    assert!(!output.status.success());
}

#[test]
fn too_many_threads_fail() {
    let output = run_tool(&["--no-pin", "-c", "1000", "4K"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
