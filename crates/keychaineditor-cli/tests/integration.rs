//! Integration tests for the `keychaineditor` binary.
//!
//! These run the compiled binary and only cover behavior that does not need
//! a real keychain.

use std::io::Write;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_keychaineditor"))
        .args(args)
        .env_remove("KEYCHAINEDITOR_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run keychaineditor")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn version_short_flag() {
    let output = run(&["-v"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("KeychainEditor Version = {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_subcommand_matches_flag() {
    assert_eq!(stdout(&run(&["version"])), stdout(&run(&["-v"])));
}

#[test]
fn help_lists_commands() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["search", "edit", "delete", "add", "version"] {
        assert!(text.contains(command), "help lacks {command}");
    }
}

#[test]
fn edit_without_data_is_a_usage_error() {
    let output = run(&["-e", "--account", "a", "--service", "s"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--data"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = run(&["-z"]);
    assert!(!output.status.success());
}

#[test]
fn invalid_config_file_fails_before_any_command() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[keychain]\nitem_class = \"certificate\"").unwrap();

    let output = run(&["--config", file.path().to_str().unwrap(), "-v"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid config file"));
}

#[cfg(not(target_vendor = "apple"))]
#[test]
fn dump_without_keychain_fails_cleanly() {
    let output = run(&[]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("keychain unavailable"));
}
