// crates/load_tsconfig/src/lib.rs
//! `load_tsconfig`: reads the project-wide compiler configuration once and
//! hands out per-call option sets derived from it.
//!
//! `tsconfig.json` is JSON with comments and trailing commas, so the file is
//! parsed with `json5`.  Compiler options stay an untyped JSON object: the
//! transpiler decides which keys it understands, and unknown keys must survive
//! a merge untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw compiler options as they appear under `compilerOptions`.
pub type CompilerOptionsMap = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read compiler configuration {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse compiler configuration {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
}

/// The base configuration every transpile call starts from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptionsMap,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Kept only so we can tell the user it is not followed.
    #[serde(default)]
    extends: Option<Value>,
}

impl TsConfig {
    /// Parses configuration text.  Comments, trailing commas and unquoted
    /// keys are accepted.
    pub fn from_json5(text: &str) -> Result<Self, json5::Error> {
        json5::from_str(text)
    }

    /// Returns the base compiler options with `overrides` laid over them.
    ///
    /// The merge is shallow: a key present in `overrides` replaces the base
    /// value wholesale, nested objects included.  `self` is left untouched.
    pub fn merged_options(&self, overrides: Option<&CompilerOptionsMap>) -> CompilerOptionsMap {
        merge_compiler_options(&self.compiler_options, overrides)
    }
}

/// Loads and parses the configuration file at `path`.
pub fn load_tsconfig(path: &Path) -> Result<TsConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = TsConfig::from_json5(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(extends) = &config.extends {
        log::warn!(
            "{} extends {}; inherited options are not loaded",
            path.display(),
            extends
        );
    }
    log::debug!(
        "loaded {} compiler option(s) from {}",
        config.compiler_options.len(),
        path.display()
    );

    Ok(config)
}

/// Shallow merge of two option objects; keys from `overrides` win.
pub fn merge_compiler_options(
    base: &CompilerOptionsMap,
    overrides: Option<&CompilerOptionsMap>,
) -> CompilerOptionsMap {
    let mut merged = base.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> CompilerOptionsMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    #[test]
    fn parses_comments_and_trailing_commas() {
        let text = r#"
        {
            // line comment
            "compilerOptions": {
                "target": "ES2019", /* block comment */
                "module": "commonjs",
                "strict": true,
            },
            "include": ["src/**/*"],
            "exclude": ["node_modules", "dist",],
        }
        "#;
        let config = TsConfig::from_json5(text).unwrap();
        assert_eq!(config.compiler_options.get("target"), Some(&json!("ES2019")));
        assert_eq!(config.compiler_options.get("strict"), Some(&json!(true)));
        assert_eq!(config.include, vec!["src/**/*"]);
        assert_eq!(config.exclude, vec!["node_modules", "dist"]);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config = TsConfig::from_json5("{}").unwrap();
        assert!(config.compiler_options.is_empty());
        assert!(config.include.is_empty());
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let config =
            TsConfig::from_json5(r#"{ "references": [], "files": ["a.ts"], "compilerOptions": {} }"#)
                .unwrap();
        assert!(config.compiler_options.is_empty());
    }

    #[test]
    fn override_wins_over_base() {
        let config = TsConfig {
            compiler_options: object(json!({ "target": "ES5", "strict": true })),
            ..TsConfig::default()
        };
        let overrides = object(json!({ "target": "ES2020" }));

        let merged = config.merged_options(Some(&overrides));
        assert_eq!(merged.get("target"), Some(&json!("ES2020")));
        assert_eq!(merged.get("strict"), Some(&json!(true)));
        // The base is not mutated.
        assert_eq!(config.compiler_options.get("target"), Some(&json!("ES5")));
    }

    #[test]
    fn merge_is_shallow() {
        let base = object(json!({ "paths": { "@a/*": ["a/*"], "@b/*": ["b/*"] } }));
        let overrides = object(json!({ "paths": { "@c/*": ["c/*"] } }));

        let merged = merge_compiler_options(&base, Some(&overrides));
        assert_eq!(merged.get("paths"), Some(&json!({ "@c/*": ["c/*"] })));
    }

    #[test]
    fn no_overrides_returns_copy_of_base() {
        let base = object(json!({ "module": "commonjs" }));
        assert_eq!(merge_compiler_options(&base, None), base);
    }
}
