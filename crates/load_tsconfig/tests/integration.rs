// crates/load_tsconfig/tests/integration.rs

use std::fs;
use tempfile::tempdir;
use load_tsconfig::{load_tsconfig, ConfigError};

#[test]
fn test_load_tsconfig_from_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("tsconfig.json");
    fs::write(
        &path,
        r#"{
  // Generated by tsc --init, then trimmed.
  "compilerOptions": {
    "target": "ES2020",
    "module": "commonjs",
    "esModuleInterop": true,
    "outDir": "./dist",
  },
  "include": ["src"],
  "exclude": ["node_modules"]
}
"#,
    )?;

    let config = load_tsconfig(&path)?;
    assert_eq!(config.compiler_options.len(), 4);
    assert_eq!(config.compiler_options["module"], "commonjs");
    assert_eq!(config.include, vec!["src"]);
    Ok(())
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tsconfig.json");

    match load_tsconfig(&path) {
        Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a read error, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tsconfig.json");
    fs::write(&path, "{ \"compilerOptions\": { \"target\": } }").unwrap();

    let err = load_tsconfig(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("tsconfig.json"));
}

#[test]
fn test_extends_is_tolerated() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("tsconfig.json");
    fs::write(&path, r#"{ "extends": "./base.json", "compilerOptions": { "strict": true } }"#)?;

    let config = load_tsconfig(&path)?;
    assert_eq!(config.compiler_options["strict"], true);
    Ok(())
}
