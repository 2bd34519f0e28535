// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the passdb binary against temporary vaults.
//!
//! These use the standard scrypt cost, so each command takes a moment.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn passdb(workdir: &Path, key: &str, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_passdb"))
        .args(args)
        .current_dir(workdir)
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"))
        .env("PASSDB_MASTER_KEY", key)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn add_get_find_and_wrong_key() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("creds.d");
    let dir_arg = dir.to_str().unwrap();

    let added = passdb(
        tmp.path(),
        "hunter2",
        &["-d", dir_arg, "add", "GitHub"],
        "alice\np1\nwork\n",
    );
    assert!(added.status.success(), "stderr: {}", stderr(&added));
    assert!(dir.join("lookup.json.enc").exists());

    let got = passdb(tmp.path(), "hunter2", &["-d", dir_arg, "get", "github"], "");
    assert!(got.status.success(), "stderr: {}", stderr(&got));
    assert_eq!(stdout(&got), "user=alice\npass=p1\nmeta=work\nurl=\n");

    let found = passdb(tmp.path(), "hunter2", &["find", "git", "--dir", dir_arg], "");
    assert!(found.status.success(), "stderr: {}", stderr(&found));
    assert_eq!(
        stdout(&found),
        "\ngithub\n=======================\nuser=alice\npass=p1\nmeta=work\nurl=\n"
    );

    let wrong = passdb(tmp.path(), "hunter3", &["-d", dir_arg, "get", "github"], "");
    assert_eq!(wrong.status.code(), Some(1));
    assert!(
        stderr(&wrong).contains("invalid master secret"),
        "stderr: {}",
        stderr(&wrong)
    );
}

#[test]
fn load_rejects_bad_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("creds.d");

    let output = passdb(
        tmp.path(),
        "hunter2",
        &["-d", dir.to_str().unwrap(), "load", "not-an-id"],
        "",
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not found"), "stderr: {}", stderr(&output));
}

#[test]
fn invalid_config_file_exits_with_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("bad.toml");
    std::fs::write(&config, "[vault]\ndri = \"x\"\n").unwrap();

    let output = passdb(
        tmp.path(),
        "hunter2",
        &["-c", config.to_str().unwrap(), "verify"],
        "",
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("creds.d").exists());
}
