//! Integration tests for the bigmul-testgen CLI.

use bigmul_testgen::{parse_assembly, OperandGenerator};
use bigmul_unit as _;
use rand as _;
use rand_chacha as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use thiserror as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("bigmul-testgen")
}

#[test]
fn generate_writes_seeded_assembly() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("case.s");

    let result = Command::new(binary_path())
        .args(["generate", "--seed", "11", "-o", output.to_str().unwrap()])
        .output()
        .expect("failed to run bigmul-testgen");

    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("seed: 11"));
    assert!(stdout.contains("result[127] = 0x"));
    assert!(stdout.contains("Actual bit usage:"));

    let source = fs::read_to_string(&output).unwrap();
    let pair = parse_assembly(&source).unwrap();
    assert_eq!(pair, OperandGenerator::from_seed(11).pair());
}

#[test]
fn generate_defaults_to_bignum_data_in_cwd() {
    let temp_dir = tempfile::tempdir().unwrap();

    let status = Command::new(binary_path())
        .args(["generate", "--seed", "1"])
        .current_dir(temp_dir.path())
        .output()
        .expect("failed to run bigmul-testgen")
        .status;

    assert!(status.success());
    assert!(temp_dir.path().join("bignum_data.s").exists());
}

#[test]
fn verify_accepts_generated_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("roundtrip.s");

    let generated = Command::new(binary_path())
        .args(["generate", "--seed", "5", "-o", output.to_str().unwrap()])
        .status()
        .expect("failed to run bigmul-testgen");
    assert!(generated.success());

    let verified = Command::new(binary_path())
        .args([
            "verify",
            "--input",
            output.to_str().unwrap(),
            "--profile",
            "delay-queue",
        ])
        .output()
        .expect("failed to run bigmul-testgen");

    assert!(verified.status.success());
    let stdout = String::from_utf8(verified.stdout).unwrap();
    assert!(stdout.starts_with("ok   delay-queue"));
}

#[test]
fn verify_covers_every_profile_by_default() {
    let result = Command::new(binary_path())
        .args(["verify", "--seed", "3"])
        .output()
        .expect("failed to run bigmul-testgen");

    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert_eq!(stdout.lines().filter(|line| line.starts_with("ok")).count(), 5);
}

#[test]
fn verify_rejects_malformed_input() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("broken.s");
    fs::write(&input, "A:\n    dword 0xq\n").unwrap();

    let result = Command::new(binary_path())
        .args(["verify", "-i", input.to_str().unwrap()])
        .output()
        .expect("failed to run bigmul-testgen");

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("invalid dword literal"));
}

#[test]
fn unknown_command_prints_usage() {
    let result = Command::new(binary_path())
        .arg("frobnicate")
        .output()
        .expect("failed to run bigmul-testgen");

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("unknown command: frobnicate"));
    assert!(stderr.contains("Usage: bigmul-testgen"));
}
