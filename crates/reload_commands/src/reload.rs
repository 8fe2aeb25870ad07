// crates/reload_commands/src/reload.rs

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use find_commands::locate_command;
use load_tsconfig::{CompilerOptionsMap, TsConfig};
use transpile_module::{transpile_module, TranspileOptions, TranspileOutput};

use crate::layout::Layout;

/// Recompiles commands against one base configuration.
pub struct Reloader {
    layout: Layout,
    config: TsConfig,
    overrides: Option<CompilerOptionsMap>,
}

impl Reloader {
    pub fn new(layout: Layout, config: TsConfig) -> Self {
        Self {
            layout,
            config,
            overrides: None,
        }
    }

    /// Compiler options laid over the base configuration on every call.
    pub fn with_overrides(mut self, overrides: CompilerOptionsMap) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn compile(&self, source: &str) -> Result<TranspileOutput> {
        let merged = self.config.merged_options(self.overrides.as_ref());
        let options = TranspileOptions::from_json(&merged)?;
        Ok(transpile_module(source, &options)?)
    }

    /// Locates, compiles and writes one command.  Returns the written path.
    pub fn reload_command(&self, name: &str) -> Result<PathBuf> {
        let commands_dir = self.layout.commands_dir();
        let source_path = locate_command(&commands_dir, name)?;
        let source = fs::read_to_string(&source_path)
            .with_context(|| format!("failed to read {}", source_path.display()))?;

        let output = self
            .compile(&source)
            .with_context(|| format!("failed to compile {}", source_path.display()))?;

        let dist_path = self.layout.dist_path_for(&source_path);
        if let Some(parent) = dist_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&dist_path, output.output_text)
            .with_context(|| format!("failed to write {}", dist_path.display()))?;

        log::info!("{} -> {}", source_path.display(), dist_path.display());
        Ok(dist_path)
    }

    /// Reloads `names` in order, stopping at the first failure.  Files
    /// written before the failure stay in place.
    pub fn reload_all(&self, names: &[String]) -> Result<Vec<PathBuf>> {
        names
            .iter()
            .map(|name| {
                self.reload_command(name)
                    .with_context(|| format!("failed to reload command '{}'", name))
            })
            .collect()
    }
}
