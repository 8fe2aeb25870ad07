// crates/reload_commands/src/lib.rs
//! `reload_commands`: recompiles selected bot commands from TypeScript to
//! JavaScript without running a full build.
//!
//! The flow is discover → load config → select → (read → compile → write)*.
//! The first error ends the run; files written before it are kept.

use std::path::PathBuf;

use anyhow::{Context, Result};
use find_commands::discover_commands;
use load_tsconfig::load_tsconfig;
use select_commands::{ensure_non_empty, resolve_selection, TerminalPrompter};

pub mod cli;
pub mod layout;
pub mod reload;

pub use cli::Cli;
pub use layout::Layout;
pub use reload::Reloader;

/// Runs one reload as described by `cli`.  Returns the written files.
pub fn run(cli: &Cli) -> Result<Vec<PathBuf>> {
    let layout = Layout::new(&cli.root);

    let commands_dir = layout.commands_dir();
    let choices = discover_commands(&commands_dir)
        .with_context(|| format!("failed to list commands in {}", commands_dir.display()))?;
    log::debug!("found {} command(s) in {}", choices.len(), commands_dir.display());

    let config_path = cli.config.clone().unwrap_or_else(|| layout.tsconfig_path());
    log::debug!("compiler configuration: {}", config_path.display());
    let config = load_tsconfig(&config_path)?;

    let names = resolve_selection(
        cli.selection(),
        cli.interactive,
        &choices,
        TerminalPrompter::new,
    )?;
    let names = ensure_non_empty(names)?;

    Reloader::new(layout, config).reload_all(&names)
}
