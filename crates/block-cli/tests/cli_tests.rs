//! Integration tests for the `blocks` binary.
//!
//! These tests exercise the compiled binary using assert_cmd, with the
//! working and config directories pointed at a temporary directory.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PARAGRAPH: &str = "<!-- wp:paragraph -->\n<p>Hello</p>\n<!-- /wp:paragraph -->";

/// Get a Command for the blocks binary isolated in `dir`
fn blocks_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("blocks").expect("Failed to find blocks binary");
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("RUST_LOG")
        .env_remove("BLOCKS_CONFIG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("convert"));
}

#[test]
fn test_parse_from_stdin() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .arg("parse")
        .write_stdin(PARAGRAPH)
        .assert()
        .success()
        .stdout(predicate::str::contains("core/paragraph"))
        .stdout(predicate::str::contains("1 block(s)"));
}

#[test]
fn test_parse_json_round_trips_through_serialize() {
    let dir = TempDir::new().unwrap();
    let output = blocks_cmd(&dir)
        .args(["parse", "--json"])
        .write_stdin(PARAGRAPH)
        .output()
        .unwrap();
    assert!(output.status.success());

    blocks_cmd(&dir)
        .arg("serialize")
        .write_stdin(output.stdout)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{PARAGRAPH}\n")));
}

#[test]
fn test_validate_reports_invalid_block() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("post.html");
    fs::write(&path, "<!-- wp:paragraph -->\n<p>Hello <span>there</p>\n<!-- /wp:paragraph -->").unwrap();

    blocks_cmd(&dir)
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid core/paragraph"))
        .stderr(predicate::str::contains("1 of 1 block(s) are invalid"));
}

#[test]
fn test_validate_valid_document() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .args(["validate", "-"])
        .write_stdin(PARAGRAPH)
        .assert()
        .success()
        .stdout(predicate::str::contains("are valid"));
}

#[test]
fn test_convert_markdown() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .args(["convert", "--plain"])
        .write_stdin("# Title\n\n- one\n- two\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("<!-- wp:heading {\"level\":1} -->"))
        .stdout(predicate::str::contains("<!-- wp:list -->"));
}

#[test]
fn test_project_config_sets_mode() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blocks.toml"), "[raw]\nmode = \"blocks\"\n").unwrap();
    blocks_cmd(&dir)
        .arg("convert")
        .write_stdin("<em>inline</em> text")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!-- wp:paragraph -->"));
}

#[test]
fn test_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blocks.toml"), "[raw]\nmode = \"blocks\"\n").unwrap();
    blocks_cmd(&dir)
        .args(["convert", "--mode", "inline"])
        .write_stdin("<em>inline</em> text")
        .assert()
        .success()
        .stdout(predicate::str::diff("<em>inline</em> text\n"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blocks.toml"), "[raw]\nmode = \"sometimes\"\n").unwrap();
    blocks_cmd(&dir)
        .arg("types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_missing_explicit_config() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .args(["types", "--config", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

#[test]
fn test_types_json() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .args(["types", "--json", "--category", "media"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"core/image\""));
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    blocks_cmd(&dir)
        .args(["parse", "nope.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
