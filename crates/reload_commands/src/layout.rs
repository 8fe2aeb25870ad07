// crates/reload_commands/src/layout.rs

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

pub const SRC_SEGMENT: &str = "src";
pub const DIST_SEGMENT: &str = "dist";
pub const COMMANDS_DIR: &str = "commands";
pub const TSCONFIG_FILE: &str = "tsconfig.json";
pub const OUTPUT_EXTENSION: &str = "js";

/// Where things live inside a project.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/src/commands`
    pub fn commands_dir(&self) -> PathBuf {
        self.root.join(SRC_SEGMENT).join(COMMANDS_DIR)
    }

    /// `<root>/tsconfig.json`
    pub fn tsconfig_path(&self) -> PathBuf {
        self.root.join(TSCONFIG_FILE)
    }

    /// Output path for a source file: the first `src` segment below the root
    /// becomes `dist` and a `.ts` extension becomes `.js`.
    ///
    /// Only the part below the root is rewritten, so a root that itself sits
    /// under some `src` directory is left alone.
    pub fn dist_path_for(&self, source: &Path) -> PathBuf {
        let (base, relative) = match source.strip_prefix(&self.root) {
            Ok(relative) => (self.root.clone(), relative),
            Err(_) => (PathBuf::new(), source),
        };

        let mut replaced = false;
        let mut out = base;
        for component in relative.components() {
            match component {
                Component::Normal(segment) if !replaced && segment == OsStr::new(SRC_SEGMENT) => {
                    out.push(DIST_SEGMENT);
                    replaced = true;
                }
                other => out.push(other),
            }
        }

        if out.extension() == Some(OsStr::new(find_commands::SOURCE_EXTENSION)) {
            out.set_extension(OUTPUT_EXTENSION);
        }
        out
    }
}
