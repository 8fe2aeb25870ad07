// crates/reload_commands/tests/cli.rs

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const TSCONFIG: &str = r#"{
  // Generated by tsc --init, then trimmed.
  "compilerOptions": {
    "target": "ES2020",
    "module": "commonjs",
    "esModuleInterop": true,
    "strict": true,
    "outDir": "./dist",
  },
  "include": ["src"],
}
"#;

/// Builds a bot project with two commands, one of them nested.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("tsconfig.json").write_str(TSCONFIG).unwrap();
    dir.child("src/commands/ping.ts")
        .write_str("export const x: number = 1;\n")
        .unwrap();
    dir.child("src/commands/admin/ban.ts")
        .write_str("interface Target { id: string }\nexport function ban(t: Target): string { return t.id; }\n")
        .unwrap();
    dir
}

fn reload(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reload_commands").unwrap();
    cmd.arg("--root").arg(root).env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_reload_single_command() {
    let dir = project();
    reload(dir.path())
        .args(["--command", "ping"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Done!"));

    let js = fs::read_to_string(dir.path().join("dist/commands/ping.js")).unwrap();
    assert!(js.contains("const x = 1;"));
    assert!(js.contains("exports.x = x;"));
    assert!(!js.contains(": number"));
}

#[test]
fn test_reload_nested_command_creates_directories() {
    let dir = project();
    reload(dir.path()).args(["--command", "ban"]).assert().success();

    let js = fs::read_to_string(dir.path().join("dist/commands/admin/ban.js")).unwrap();
    assert!(js.contains("function ban(t) { return t.id; }"));
    assert!(!js.contains("interface"));
}

#[test]
fn test_empty_selection_fails_without_writing() {
    let dir = project();
    reload(dir.path())
        .args(["--interactive", "false"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("You didn't give any commands to reload"));

    dir.child("dist").assert(predicate::path::missing());
}

#[test]
fn test_missing_command_fails() {
    let dir = project();
    reload(dir.path())
        .args(["--command", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"));

    dir.child("dist/commands/nope.js").assert(predicate::path::missing());
}

#[test]
fn test_missing_tsconfig_fails() {
    let dir = project();
    fs::remove_file(dir.path().join("tsconfig.json")).unwrap();
    reload(dir.path())
        .args(["--command", "ping"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tsconfig.json"));
}

#[test]
fn test_explicit_config_path() {
    let dir = project();
    let config = dir.path().join("tsconfig.esm.json");
    fs::write(&config, r#"{ compilerOptions: { target: "ES2022", module: "ES2022" } }"#).unwrap();

    reload(dir.path())
        .args(["--command", "ping", "--config"])
        .arg(&config)
        .assert()
        .success();

    let js = fs::read_to_string(dir.path().join("dist/commands/ping.js")).unwrap();
    assert_eq!(js, "export const x = 1;\n");
}

#[test]
fn test_runs_are_byte_identical() {
    let dir = project();
    let out = dir.path().join("dist/commands/admin/ban.js");

    reload(dir.path()).args(["--command", "ban,ping"]).assert().success();
    let first = fs::read(&out).unwrap();
    reload(dir.path()).args(["--command", "ban,ping"]).assert().success();
    let second = fs::read(&out).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_prompt_answer_from_stdin() {
    let dir = project();
    reload(dir.path())
        .write_stdin("1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Which commands should be reloaded?"))
        .stdout(predicate::str::contains("1) ban"))
        .stdout(predicate::str::contains("2) ping"));

    dir.child("dist/commands/admin/ban.js").assert(predicate::path::exists());
    dir.child("dist/commands/ping.js").assert(predicate::path::missing());
}

#[test]
fn test_prompt_repeats_on_unknown_answer() {
    let dir = project();
    reload(dir.path())
        .write_stdin("9\nping\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not a listed command: 9"));

    dir.child("dist/commands/ping.js").assert(predicate::path::exists());
}

#[test]
fn test_closed_stdin_cancels_prompt() {
    let dir = project();
    reload(dir.path())
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("selection cancelled"));
}

#[test]
fn test_help_shows_banner() {
    Command::cargo_bin("reload_commands")
        .unwrap()
        .arg("--help")
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Command Reloader"))
        .stdout(predicate::str::contains("--command <NAME>"));
}
