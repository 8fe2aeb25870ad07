// crates/reload_commands/src/main.rs

use std::process;

use anstyle::{AnsiColor, Style};
use clap::Parser;
use env_logger::Env;
use reload_commands::{run, Cli};

const GREEN: Style = AnsiColor::Green.on_default();
const RED: Style = AnsiColor::Red.on_default();

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match run(&cli) {
        Ok(written) => {
            log::info!("reloaded {} command(s)", written.len());
            anstream::println!("{}Done!{}", GREEN.render(), GREEN.render_reset());
            process::exit(0);
        }
        Err(err) => {
            anstream::eprintln!("{}{:#}{}", RED.render(), err, RED.render_reset());
            process::exit(1);
        }
    }
}
