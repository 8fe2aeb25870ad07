// crates/reload_commands/src/cli.rs

use std::path::PathBuf;

use anstyle::{AnsiColor, Style};
use clap::{ArgAction, Parser};
use select_commands::Selection;

const YELLOW: Style = AnsiColor::Yellow.on_default();
const CYAN: Style = AnsiColor::Cyan.on_default();
const GREEN: Style = AnsiColor::Green.on_default();

fn banner() -> String {
    let bin = format!("{}reload_commands{}", GREEN.render(), GREEN.render_reset());
    format!(
        "{}Command Reloader{}\n{}Usage:{}\n    {bin}\n    {bin} --command <command>\n    {bin} --help",
        YELLOW.render(),
        YELLOW.render_reset(),
        CYAN.render(),
        CYAN.render_reset(),
    )
}

/// Recompiles selected commands from `src/commands` into `dist/commands`.
#[derive(Debug, Parser)]
#[command(name = "reload_commands", version, before_help = banner())]
pub struct Cli {
    /// Ask for commands when none are given with --command
    #[arg(
        long,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        action = ArgAction::Set,
        value_name = "BOOL"
    )]
    pub interactive: bool,

    /// Command to reload; repeat or separate with commas for several
    #[arg(long = "command", value_name = "NAME", num_args = 1.., value_delimiter = ',', action = ArgAction::Append)]
    pub commands: Vec<String>,

    /// Project root containing tsconfig.json and src/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Compiler configuration [default: <root>/tsconfig.json]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// The answer given on the command line, if any.
    pub fn selection(&self) -> Option<Selection> {
        match self.commands.as_slice() {
            [] => None,
            [one] => Some(Selection::One(one.clone())),
            many => Some(Selection::Many(many.to_vec())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_defaults_to_true() {
        let cli = Cli::try_parse_from(["reload_commands"]).unwrap();
        assert!(cli.interactive);
        assert_eq!(cli.selection(), None);
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn interactive_accepts_explicit_value() {
        let cli = Cli::try_parse_from(["reload_commands", "--interactive", "false"]).unwrap();
        assert!(!cli.interactive);
        let cli = Cli::try_parse_from(["reload_commands", "--interactive"]).unwrap();
        assert!(cli.interactive);
    }

    #[test]
    fn commands_accumulate() {
        let cli = Cli::try_parse_from(["reload_commands", "--command", "ping", "--command", "ban,kick"]).unwrap();
        assert_eq!(
            cli.selection(),
            Some(Selection::Many(vec!["ping".into(), "ban".into(), "kick".into()]))
        );
        let cli = Cli::try_parse_from(["reload_commands", "--command", "ping"]).unwrap();
        assert_eq!(cli.selection(), Some(Selection::One("ping".into())));
    }

    #[test]
    fn banner_names_the_tool() {
        assert!(banner().contains("Command Reloader"));
    }
}
