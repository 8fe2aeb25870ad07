// crates/find_commands/src/lib.rs

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension of a command source module.
pub const SOURCE_EXTENSION: &str = "ts";

/// Declaration files live next to commands but never compile to anything.
const DECLARATION_SUFFIX: &str = ".d.ts";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no source file found for command '{name}' under {}", .dir.display())]
    NotFound { name: String, dir: PathBuf },
    #[error("invalid lookup pattern for command '{name}'")]
    Pattern {
        name: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to read a directory while looking up a command")]
    Glob(#[from] glob::GlobError),
}

/// Walks `commands_dir` recursively and returns the logical name of every
/// command module (file name without directory and extension).
///
/// Entries are sorted by file name inside each directory so the order is
/// stable across runs. Names are not deduplicated.
pub fn discover_commands(commands_dir: &Path) -> io::Result<Vec<String>> {
    let finder = CommandFinder::new(commands_dir);
    finder.discover()
}

/// Finds the source file of the command called `name` by globbing for
/// `<commands_dir>/**/<name>.ts`. When several files share the name the first
/// match in glob order wins.
pub fn locate_command(commands_dir: &Path, name: &str) -> Result<PathBuf, LocateError> {
    let finder = CommandFinder::new(commands_dir);
    finder.locate(name)
}

// === Private Implementation === //

struct CommandFinder<'a> {
    commands_dir: &'a Path,
}

impl<'a> CommandFinder<'a> {
    fn new(commands_dir: &'a Path) -> Self {
        Self { commands_dir }
    }

    fn discover(&self) -> io::Result<Vec<String>> {
        if !self.commands_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("commands directory {} does not exist", self.commands_dir.display()),
            ));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(self.commands_dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = command_name(entry.path()) {
                names.push(name);
            }
        }

        log::debug!(
            "{} command(s) under {}",
            names.len(),
            self.commands_dir.display()
        );
        Ok(names)
    }

    fn locate(&self, name: &str) -> Result<PathBuf, LocateError> {
        let pattern = format!(
            "{}/**/{}.{}",
            glob::Pattern::escape(&self.commands_dir.to_string_lossy()),
            glob::Pattern::escape(name),
            SOURCE_EXTENSION
        );

        let entries = glob::glob(&pattern).map_err(|source| LocateError::Pattern {
            name: name.to_string(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry?;
            if path.is_file() {
                matches.push(path);
            }
        }

        if matches.len() > 1 {
            log::warn!(
                "{} files are named '{}'; using {}",
                matches.len(),
                name,
                matches[0].display()
            );
        }

        matches.into_iter().next().ok_or_else(|| LocateError::NotFound {
            name: name.to_string(),
            dir: self.commands_dir.to_path_buf(),
        })
    }
}

/// Returns the command name for a source path, or `None` when the file is not
/// a command module.
fn command_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.ends_with(DECLARATION_SUFFIX) {
        return None;
    }
    let stem = file_name.strip_suffix(SOURCE_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
