// crates/find_commands/tests/integration.rs

use std::fs;
use std::path::Path;
use tempfile::tempdir;
use find_commands::{discover_commands, locate_command, LocateError};

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_discover_returns_names_of_flat_commands() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "a.ts", "export const a = 1;");
    write(dir.path(), "b.ts", "export const b = 2;");

    let names = discover_commands(dir.path())?;
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    Ok(())
}

#[test]
fn test_discover_walks_subdirectories_and_ignores_other_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "admin/ban.ts", "");
    write(dir.path(), "admin/kick.ts", "");
    write(dir.path(), "ping.ts", "");
    write(dir.path(), "globals.d.ts", "");
    write(dir.path(), "notes.md", "");
    write(dir.path(), "legacy.js", "");

    let names = discover_commands(dir.path())?;
    assert_eq!(names, vec!["ban", "kick", "ping"]);
    Ok(())
}

#[test]
fn test_discover_keeps_duplicate_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "one/help.ts", "");
    write(dir.path(), "two/help.ts", "");

    let names = discover_commands(dir.path())?;
    assert_eq!(names, vec!["help", "help"]);
    Ok(())
}

#[test]
fn test_discover_fails_for_missing_directory() {
    let dir = tempdir().unwrap();
    let err = discover_commands(&dir.path().join("nope")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_locate_finds_nested_command() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "admin/ban.ts", "");
    write(dir.path(), "ping.ts", "");

    assert_eq!(locate_command(dir.path(), "ban")?, dir.path().join("admin/ban.ts"));
    assert_eq!(locate_command(dir.path(), "ping")?, dir.path().join("ping.ts"));
    Ok(())
}

#[test]
fn test_locate_first_match_wins_for_duplicate_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "b/help.ts", "");
    write(dir.path(), "a/help.ts", "");

    assert_eq!(locate_command(dir.path(), "help")?, dir.path().join("a/help.ts"));
    Ok(())
}

#[test]
fn test_locate_reports_missing_command() {
    let dir = tempdir().unwrap();
    write(dir.path(), "ping.ts", "");

    match locate_command(dir.path(), "pong") {
        Err(LocateError::NotFound { name, .. }) => assert_eq!(name, "pong"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_locate_treats_glob_characters_literally() {
    let dir = tempdir().unwrap();
    write(dir.path(), "ping.ts", "");

    assert!(matches!(
        locate_command(dir.path(), "*"),
        Err(LocateError::NotFound { .. })
    ));
}
