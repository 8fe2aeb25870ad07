// crates/select_commands/src/terminal.rs

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::{Prompter, SelectError};

/// Tab-completes command names in the answer line.
struct ChoiceHelper {
    choices: Vec<String>,
}

impl Completer for ChoiceHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == ',')
            .map_or(0, |i| i + 1);
        let prefix = &line[start..pos];
        let candidates = self
            .choices
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ChoiceHelper {
    type Hint = String;
}

impl Highlighter for ChoiceHelper {}

impl Validator for ChoiceHelper {}

impl Helper for ChoiceHelper {}

/// Prompts on the controlling terminal.  Falls back to plain line reads when
/// stdin is not a terminal.
pub struct TerminalPrompter {
    editor: Editor<ChoiceHelper, DefaultHistory>,
}

impl TerminalPrompter {
    pub fn new(choices: &[String]) -> Result<Self, SelectError> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ChoiceHelper {
            choices: choices.to_vec(),
        }));
        Ok(Self { editor })
    }
}

impl Prompter for TerminalPrompter {
    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, prompt: &str) -> Result<String, SelectError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Err(SelectError::Cancelled),
            Err(err) => Err(err.into()),
        }
    }
}
