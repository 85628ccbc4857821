//! Basic CLI smoke tests.
//!
//! These exercise the argument surface only (help text), so they never touch
//! a real data directory.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "habitforge-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn help_lists_all_subsystems() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for subsystem in ["energy", "streak", "boss", "rewards"] {
        assert!(stdout.contains(subsystem), "missing {subsystem} in help");
    }
}

#[test]
fn energy_help_lists_operations() {
    let (stdout, _, code) = run_cli(&["energy", "--help"]);
    assert_eq!(code, 0);
    for op in ["show", "regen", "spend", "restore", "set-max"] {
        assert!(stdout.contains(op), "missing {op} in energy help");
    }
}

#[test]
fn streak_help_lists_operations() {
    let (stdout, _, code) = run_cli(&["streak", "--help"]);
    assert_eq!(code, 0);
    for op in ["show", "log", "freeze", "shield", "claim"] {
        assert!(stdout.contains(op), "missing {op} in streak help");
    }
}

#[test]
fn boss_help_lists_operations() {
    let (stdout, _, code) = run_cli(&["boss", "--help"]);
    assert_eq!(code, 0);
    for op in ["show", "hit", "heal", "history"] {
        assert!(stdout.contains(op), "missing {op} in boss help");
    }
}

#[test]
fn unknown_subcommand_fails() {
    let (_, _, code) = run_cli(&["dungeon"]);
    assert_ne!(code, 0);
}
