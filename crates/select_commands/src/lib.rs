// crates/select_commands/src/lib.rs
//! `select_commands`: turns the developer's answer into the list of command
//! names to reload.
//!
//! The answer comes either from the command line or, when that is empty and
//! interactive mode is on, from a numbered checkbox-style prompt.  Prompting
//! goes through the [`Prompter`] trait so tests can script the conversation.

use once_cell::sync::Lazy;
use regex::Regex;
use rustyline::error::ReadlineError;
use thiserror::Error;

mod terminal;

pub use terminal::TerminalPrompter;

/// Question shown above the list of choices.
pub const QUESTION: &str = "Which commands should be reloaded?";

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("You didn't give any commands to reload")]
    Empty,
    #[error("selection cancelled")]
    Cancelled,
    #[error("failed to read the answer")]
    Prompt(#[from] ReadlineError),
}

/// An answer as given: a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    One(String),
    Many(Vec<String>),
}

/// Promotes a single answer to a one-element list and drops empty names.
pub fn normalize(selection: Selection) -> Vec<String> {
    let names = match selection {
        Selection::One(name) => vec![name],
        Selection::Many(names) => names,
    };
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

pub fn ensure_non_empty(names: Vec<String>) -> Result<Vec<String>, SelectError> {
    if names.is_empty() {
        Err(SelectError::Empty)
    } else {
        Ok(names)
    }
}

/// The two halves of a prompt conversation.
pub trait Prompter {
    /// Shows a line of text to the developer.
    fn say(&mut self, line: &str);
    /// Asks for one line of input.
    fn ask(&mut self, prompt: &str) -> Result<String, SelectError>;
}

/// Parses a typed answer against the numbered `choices`.
///
/// Tokens are 1-based numbers or command names, separated by whitespace or
/// commas; `*` selects everything.  Returns the unrecognised tokens on
/// failure.  Duplicates are dropped, first occurrence wins.
pub fn parse_answer(answer: &str, choices: &[String]) -> Result<Vec<String>, Vec<String>> {
    let mut picked: Vec<String> = Vec::new();
    let mut unknown = Vec::new();

    for token in SEPARATOR_RE.split(answer.trim()).filter(|t| !t.is_empty()) {
        let matched: Vec<&String> = if token == "*" {
            choices.iter().collect()
        } else if let Ok(n) = token.parse::<usize>() {
            match n.checked_sub(1).and_then(|i| choices.get(i)) {
                Some(choice) => vec![choice],
                None => {
                    unknown.push(token.to_string());
                    continue;
                }
            }
        } else if let Some(choice) = choices.iter().find(|c| c.as_str() == token) {
            vec![choice]
        } else {
            unknown.push(token.to_string());
            continue;
        };

        for choice in matched {
            if !picked.contains(choice) {
                picked.push(choice.clone());
            }
        }
    }

    if unknown.is_empty() {
        Ok(picked)
    } else {
        Err(unknown)
    }
}

/// Lists `choices` and asks until the answer parses.  An empty answer is an
/// empty selection.
pub fn prompt_for_commands(
    prompter: &mut dyn Prompter,
    choices: &[String],
) -> Result<Vec<String>, SelectError> {
    prompter.say(QUESTION);
    for (i, name) in choices.iter().enumerate() {
        prompter.say(&format!("  {:>2}) {}", i + 1, name));
    }

    loop {
        let answer = prompter.ask("numbers or names, '*' for all: ")?;
        match parse_answer(&answer, choices) {
            Ok(names) => {
                log::debug!("selected {:?}", names);
                return Ok(names);
            }
            Err(unknown) => {
                log::warn!("unknown choice(s): {}", unknown.join(", "));
                prompter.say(&format!("Not a listed command: {}", unknown.join(", ")));
            }
        }
    }
}

/// Resolves the final selection.
///
/// A non-empty `answer` is used as given.  Otherwise the developer is asked,
/// but only in interactive mode; `make_prompter` is not called at all when no
/// prompt is needed.  The result may be empty, see [`ensure_non_empty`].
pub fn resolve_selection<P, F>(
    answer: Option<Selection>,
    interactive: bool,
    choices: &[String],
    make_prompter: F,
) -> Result<Vec<String>, SelectError>
where
    P: Prompter,
    F: FnOnce(&[String]) -> Result<P, SelectError>,
{
    let names = answer.map(normalize).unwrap_or_default();
    if !names.is_empty() || !interactive {
        return Ok(names);
    }

    let mut prompter = make_prompter(choices)?;
    prompt_for_commands(&mut prompter, choices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<String> {
        vec!["ban".into(), "kick".into(), "ping".into()]
    }

    #[test]
    fn normalize_promotes_single_answer() {
        assert_eq!(normalize(Selection::One("ping".into())), vec!["ping"]);
        assert_eq!(
            normalize(Selection::Many(vec!["a".into(), " ".into(), "b".into()])),
            vec!["a", "b"]
        );
        assert!(normalize(Selection::One(String::new())).is_empty());
    }

    #[test]
    fn empty_selection_is_an_error() {
        let err = ensure_non_empty(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "You didn't give any commands to reload");
        assert_eq!(ensure_non_empty(vec!["a".into()]).unwrap(), vec!["a"]);
    }

    #[test]
    fn parse_answer_accepts_numbers_names_and_star() {
        let c = choices();
        assert_eq!(parse_answer("1, ping", &c).unwrap(), vec!["ban", "ping"]);
        assert_eq!(parse_answer("  3 3 ", &c).unwrap(), vec!["ping"]);
        assert_eq!(parse_answer("*", &c).unwrap(), c);
        assert!(parse_answer("", &c).unwrap().is_empty());
    }

    #[test]
    fn parse_answer_reports_unknown_tokens() {
        let c = choices();
        assert_eq!(parse_answer("0 4 mute kick", &c).unwrap_err(), vec!["0", "4", "mute"]);
    }
}
