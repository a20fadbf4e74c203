//! Integration tests for the jobsh binary.
//!
//! These run the built binary with piped stdin, so the shell starts in
//! batch mode and never touches a terminal.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn jobsh() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jobsh"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Feed `script` on stdin and collect the result.
fn run_script(script: &str) -> Output {
    let mut child = jobsh()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn jobsh");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("failed to write script");

    child.wait_with_output().expect("failed to wait for jobsh")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn runs_lines_from_stdin() {
    let output = run_script("echo one\necho two | cat\n");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "one\ntwo\n");
}

#[test]
fn end_of_input_exits_zero_without_prompt() {
    let output = run_script("false\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[test]
fn exit_stops_reading() {
    let output = run_script("echo before\nexit 4\necho after\n");
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout(&output), "before\n");
}

#[test]
fn unknown_command_is_reported_and_shell_continues() {
    let output = run_script("no_such_program_jobsh_xyz\necho still here\n");
    assert!(output.status.success());
    assert!(stderr(&output).contains("no_such_program_jobsh_xyz: command not found"));
    assert_eq!(stdout(&output), "still here\n");
}

#[test]
fn background_job_is_acknowledged_and_listed() {
    let output = run_script("sleep 1 &\njobs\nexit\n");
    let out = stdout(&output);
    let mut lines = out.lines();

    let ack = lines.next().expect("acknowledgement line");
    assert!(ack.starts_with("[1] "), "ack: {:?}", ack);
    assert!(ack[4..].parse::<i32>().is_ok(), "ack: {:?}", ack);
    assert_eq!(lines.next(), Some("[1]\tRunning\t\tsleep 1 &"));
}

#[test]
fn dash_c_returns_line_status() {
    let output = jobsh().args(["-c", "false"]).output().expect("run jobsh -c");
    assert_eq!(output.status.code(), Some(1));

    let output = jobsh().args(["-c", "echo hi | cat"]).output().expect("run jobsh -c");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "hi\n");
}

#[test]
fn dash_c_requires_argument() {
    let output = jobsh().arg("-c").output().expect("run jobsh -c");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("-c requires a command argument"));
}

#[test]
fn version_and_help() {
    let output = jobsh().arg("--version").output().expect("run jobsh --version");
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("jobsh "));

    let output = jobsh().arg("--help").output().expect("run jobsh --help");
    assert!(stdout(&output).contains("Usage:"));
}
