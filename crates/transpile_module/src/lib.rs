// crates/transpile_module/src/lib.rs
//! `transpile_module`: a transpile-only TypeScript → JavaScript compiler.
//!
//! The source is parsed with tree-sitter and rewritten in place: TypeScript
//! syntax is cut out or replaced by byte-range edits, everything else is
//! copied through verbatim, so formatting and comments survive.  There is no
//! type checker.  Whether an import is a type is decided syntactically, from
//! how its bindings are used in the same file.

use thiserror::Error;
use tree_sitter::{Language, Node, Parser};

mod edits;
mod enums;
mod erase;
mod modules;
pub mod options;

pub use options::{CompilerOptions, ModuleFormat, ModuleKind, NewLine, ScriptTarget};

use erase::Eraser;

#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("TypeScript parser failed: {0}")]
    Parser(String),
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("invalid compiler option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },
    #[error("enum member '{member}' must have an initializer")]
    EnumInitializer { member: String },
}

/// Options for one transpile call.
#[derive(Debug, Clone, Default)]
pub struct TranspileOptions {
    pub compiler_options: CompilerOptions,
}

impl TranspileOptions {
    /// Builds options from a raw `compilerOptions` object.
    pub fn from_json(
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, TranspileError> {
        Ok(Self {
            compiler_options: CompilerOptions::from_json(raw)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOutput {
    pub output_text: String,
}

/// Transpiles one TypeScript module to JavaScript.
pub fn transpile_module(
    input: &str,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TranspileError> {
    let compiler_options = &options.compiler_options;
    let format = compiler_options.module_format()?;

    let mut parser = Parser::new();
    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    parser
        .set_language(&language)
        .map_err(|e| TranspileError::Parser(e.to_string()))?;
    let tree = parser
        .parse(input, None)
        .ok_or_else(|| TranspileError::Parser("no syntax tree was produced".into()))?;
    let root = tree.root_node();

    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let position = node.start_position();
        return Err(TranspileError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
        });
    }

    let mut eraser = Eraser::new(input, compiler_options, format);
    eraser.scan_declarations(root);
    eraser.visit(root)?;
    eraser.lower_modules()?;
    let output = eraser.finish(root);

    let output_text = match compiler_options.new_line {
        Some(new_line) => normalize_newlines(&output, new_line),
        None => output,
    };
    Ok(TranspileOutput { output_text })
}

/// The first node, in source order, that tree-sitter marked as an error or
/// inserted as missing.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn normalize_newlines(text: &str, new_line: NewLine) -> String {
    let lf = text.replace("\r\n", "\n");
    match new_line {
        NewLine::Lf => lf,
        NewLine::CrLf => lf.replace('\n', "\r\n"),
    }
}
