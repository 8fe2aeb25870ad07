// crates/transpile_module/src/options.rs

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::TranspileError;

/// ECMAScript version the output is meant for.
///
/// Only used to pick defaults; syntax is never down-levelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScriptTarget {
    Es3,
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    Es2023,
    Es2024,
    EsNext,
}

impl FromStr for ScriptTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "es3" => Self::Es3,
            "es5" => Self::Es5,
            "es6" | "es2015" => Self::Es2015,
            "es2016" => Self::Es2016,
            "es2017" => Self::Es2017,
            "es2018" => Self::Es2018,
            "es2019" => Self::Es2019,
            "es2020" => Self::Es2020,
            "es2021" => Self::Es2021,
            "es2022" => Self::Es2022,
            "es2023" => Self::Es2023,
            "es2024" => Self::Es2024,
            "esnext" | "latest" => Self::EsNext,
            _ => return Err(()),
        })
    }
}

impl ScriptTarget {
    /// Numeric values of the compiler API's `ScriptTarget` enum.
    fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Self::Es3,
            1 => Self::Es5,
            2 => Self::Es2015,
            3 => Self::Es2016,
            4 => Self::Es2017,
            5 => Self::Es2018,
            6 => Self::Es2019,
            7 => Self::Es2020,
            8 => Self::Es2021,
            9 => Self::Es2022,
            10 => Self::Es2023,
            11 => Self::Es2024,
            99 => Self::EsNext,
            _ => return None,
        })
    }

    /// `const`/`let` are available from ES2015 on.
    pub fn has_block_scoping(self) -> bool {
        self >= Self::Es2015
    }
}

/// Module system of the emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    None,
    CommonJs,
    Amd,
    Umd,
    System,
    Es2015,
    Es2020,
    Es2022,
    EsNext,
    Node16,
    NodeNext,
    Preserve,
}

impl FromStr for ModuleKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "commonjs" => Self::CommonJs,
            "amd" => Self::Amd,
            "umd" => Self::Umd,
            "system" => Self::System,
            "es6" | "es2015" => Self::Es2015,
            "es2020" => Self::Es2020,
            "es2022" => Self::Es2022,
            "esnext" => Self::EsNext,
            "node16" => Self::Node16,
            "nodenext" => Self::NodeNext,
            "preserve" => Self::Preserve,
            _ => return Err(()),
        })
    }
}

impl ModuleKind {
    fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::CommonJs,
            2 => Self::Amd,
            3 => Self::Umd,
            4 => Self::System,
            5 => Self::Es2015,
            6 => Self::Es2020,
            7 => Self::Es2022,
            99 => Self::EsNext,
            100 => Self::Node16,
            199 => Self::NodeNext,
            200 => Self::Preserve,
            _ => return None,
        })
    }
}

/// How the module syntax of a file ends up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// `require` / `exports`.
    CommonJs,
    /// `import` / `export` kept as written.
    EsModule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewLine {
    Lf,
    CrLf,
}

/// The subset of compiler options that changes transpile-only output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
    pub module: Option<ModuleKind>,
    pub es_module_interop: bool,
    pub verbatim_module_syntax: bool,
    pub preserve_value_imports: bool,
    pub use_define_for_class_fields: Option<bool>,
    pub always_strict: Option<bool>,
    pub strict: bool,
    pub remove_comments: bool,
    pub experimental_decorators: bool,
    pub new_line: Option<NewLine>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            target: ScriptTarget::Es5,
            module: None,
            es_module_interop: false,
            verbatim_module_syntax: false,
            preserve_value_imports: false,
            use_define_for_class_fields: None,
            always_strict: None,
            strict: false,
            remove_comments: false,
            experimental_decorators: false,
            new_line: None,
        }
    }
}

impl CompilerOptions {
    /// Builds the typed view from a raw `compilerOptions` object.
    ///
    /// Option names and string values are matched case-insensitively.
    /// Options that do not influence transpile-only output are ignored.
    pub fn from_json(raw: &Map<String, Value>) -> Result<Self, TranspileError> {
        let mut options = Self::default();

        for (name, value) in raw {
            match name.to_ascii_lowercase().as_str() {
                "target" => options.target = parse_enum(name, value, ScriptTarget::from_code)?,
                "module" => options.module = Some(parse_enum(name, value, ModuleKind::from_code)?),
                "esmoduleinterop" => options.es_module_interop = parse_bool(name, value)?,
                "verbatimmodulesyntax" => options.verbatim_module_syntax = parse_bool(name, value)?,
                "preservevalueimports" => options.preserve_value_imports = parse_bool(name, value)?,
                "usedefineforclassfields" => {
                    options.use_define_for_class_fields = Some(parse_bool(name, value)?)
                }
                "alwaysstrict" => options.always_strict = Some(parse_bool(name, value)?),
                "strict" => options.strict = parse_bool(name, value)?,
                "removecomments" => options.remove_comments = parse_bool(name, value)?,
                "experimentaldecorators" => options.experimental_decorators = parse_bool(name, value)?,
                "newline" => {
                    options.new_line = Some(match value.as_str().map(str::to_ascii_lowercase).as_deref() {
                        Some("lf") => NewLine::Lf,
                        Some("crlf") => NewLine::CrLf,
                        _ => return Err(invalid(name, "expected \"lf\" or \"crlf\"")),
                    })
                }
                _ => log::trace!("compiler option '{}' does not affect transpilation", name),
            }
        }

        Ok(options)
    }

    /// Module kind in effect, defaulting the way tsc does from `target`.
    pub fn module_kind(&self) -> ModuleKind {
        self.module.unwrap_or(if self.target <= ScriptTarget::Es5 {
            ModuleKind::CommonJs
        } else {
            ModuleKind::Es2015
        })
    }

    /// Output format for a `.ts` file.  The Node kinds resolve to CommonJS
    /// because there is no `package.json` to say otherwise.
    pub fn module_format(&self) -> Result<ModuleFormat, TranspileError> {
        match self.module_kind() {
            ModuleKind::CommonJs | ModuleKind::Node16 | ModuleKind::NodeNext => Ok(ModuleFormat::CommonJs),
            ModuleKind::Es2015
            | ModuleKind::Es2020
            | ModuleKind::Es2022
            | ModuleKind::EsNext
            | ModuleKind::Preserve => Ok(ModuleFormat::EsModule),
            other => Err(TranspileError::Unsupported(format!("module kind {:?}", other))),
        }
    }

    /// Whether class fields without an initializer are emitted.
    pub fn defines_class_fields(&self) -> bool {
        self.use_define_for_class_fields
            .unwrap_or(self.target >= ScriptTarget::Es2022)
    }

    /// Whether a non-module file gets a `"use strict"` prologue.
    pub fn emits_use_strict(&self) -> bool {
        self.always_strict.unwrap_or(self.strict)
    }

    /// Whether unused import bindings are kept.
    pub fn preserves_imports(&self) -> bool {
        self.verbatim_module_syntax || self.preserve_value_imports
    }

    /// Keyword used for generated bindings.
    pub fn binding_keyword(&self) -> &'static str {
        if self.target.has_block_scoping() {
            "const"
        } else {
            "var"
        }
    }
}

fn parse_enum<T: FromStr>(
    name: &str,
    value: &Value,
    from_code: fn(u64) -> Option<T>,
) -> Result<T, TranspileError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| invalid(name, &format!("unknown value \"{}\"", s))),
        Value::Number(n) => n
            .as_u64()
            .and_then(from_code)
            .ok_or_else(|| invalid(name, &format!("unknown value {}", n))),
        other => Err(invalid(name, &format!("expected a string, got {}", other))),
    }
}

fn parse_bool(name: &str, value: &Value) -> Result<bool, TranspileError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(name, &format!("expected a boolean, got {}", value)))
}

fn invalid(name: &str, reason: &str) -> TranspileError {
    TranspileError::InvalidOption {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Result<CompilerOptions, TranspileError> {
        match value {
            Value::Object(map) => CompilerOptions::from_json(&map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_follow_target() {
        let es5 = options(json!({ "target": "ES5" })).unwrap();
        assert_eq!(es5.module_kind(), ModuleKind::CommonJs);
        assert!(!es5.defines_class_fields());
        assert_eq!(es5.binding_keyword(), "var");

        let next = options(json!({ "target": "ESNext" })).unwrap();
        assert_eq!(next.module_kind(), ModuleKind::Es2015);
        assert!(next.defines_class_fields());
        assert_eq!(next.binding_keyword(), "const");
    }

    #[test]
    fn names_and_values_are_case_insensitive() {
        let opts = options(json!({ "TARGET": "es2020", "Module": "CommonJS", "esmoduleinterop": true }))
            .unwrap();
        assert_eq!(opts.target, ScriptTarget::Es2020);
        assert_eq!(opts.module, Some(ModuleKind::CommonJs));
        assert!(opts.es_module_interop);
    }

    #[test]
    fn numeric_enum_values_are_accepted() {
        let opts = options(json!({ "target": 7, "module": 1 })).unwrap();
        assert_eq!(opts.target, ScriptTarget::Es2020);
        assert_eq!(opts.module, Some(ModuleKind::CommonJs));
    }

    #[test]
    fn unknown_target_is_rejected() {
        match options(json!({ "target": "ES1999" })) {
            Err(TranspileError::InvalidOption { name, .. }) => assert_eq!(name, "target"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(options(json!({ "strict": "yes" })).is_err());
        assert!(options(json!({ "newLine": "cr" })).is_err());
    }

    #[test]
    fn unrelated_options_are_ignored() {
        let opts = options(json!({ "outDir": "./dist", "noImplicitAny": true, "paths": {} })).unwrap();
        assert_eq!(opts, CompilerOptions::default());
    }

    #[test]
    fn node_kinds_emit_commonjs_and_amd_is_unsupported() {
        let node = options(json!({ "module": "NodeNext" })).unwrap();
        assert_eq!(node.module_format().unwrap(), ModuleFormat::CommonJs);

        let amd = options(json!({ "module": "amd" })).unwrap();
        assert!(matches!(amd.module_format(), Err(TranspileError::Unsupported(_))));
    }

    #[test]
    fn strict_implies_use_strict_unless_overridden() {
        assert!(options(json!({ "strict": true })).unwrap().emits_use_strict());
        assert!(!options(json!({ "strict": true, "alwaysStrict": false }))
            .unwrap()
            .emits_use_strict());
    }
}
