// crates/transpile_module/src/modules.rs
//
// Import elision and the CommonJS lowering of import/export statements.
// Runs after the eraser has walked the whole file, because whether an import
// binding is still needed depends on every value reference in the file.

use tree_sitter::Node;

use crate::edits::line_indent;
use crate::erase::{has_token, named_children, Eraser};
use crate::options::ModuleFormat;
use crate::TranspileError;

const IMPORT_DEFAULT_HELPER: &str = "\
var __importDefault = (this && this.__importDefault) || function (mod) {
    return (mod && mod.__esModule) ? mod : { \"default\": mod };
};";

const IMPORT_STAR_HELPER: &str = "\
var __importStar = (this && this.__importStar) || function (mod) {
    if (mod && mod.__esModule) return mod;
    var result = {};
    if (mod != null) for (var k in mod) if (k !== \"default\" && Object.prototype.hasOwnProperty.call(mod, k)) result[k] = mod[k];
    result[\"default\"] = mod;
    return result;
};";

const EXPORT_STAR_HELPER: &str = "\
var __exportStar = (this && this.__exportStar) || function (m, exports) {
    for (var p in m) if (p !== \"default\" && !Object.prototype.hasOwnProperty.call(exports, p)) exports[p] = m[p];
};";

/// Runtime helpers the CommonJS output refers to.
#[derive(Debug, Default)]
pub(crate) struct Helpers {
    pub import_default: bool,
    pub import_star: bool,
    pub export_star: bool,
}

impl Helpers {
    pub fn render(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.import_default {
            out.push(IMPORT_DEFAULT_HELPER);
        }
        if self.import_star {
            out.push(IMPORT_STAR_HELPER);
        }
        if self.export_star {
            out.push(EXPORT_STAR_HELPER);
        }
        out
    }
}

struct ImportDecl<'a> {
    /// Module specifier with its quotes.
    source: &'a str,
    default: Option<&'a str>,
    namespace: Option<&'a str>,
    named: Vec<NamedImport<'a>>,
    attributes: Option<&'a str>,
}

impl ImportDecl<'_> {
    fn binding_count(&self) -> usize {
        usize::from(self.default.is_some()) + usize::from(self.namespace.is_some()) + self.named.len()
    }
}

#[derive(Clone, Copy)]
struct NamedImport<'a> {
    imported: &'a str,
    local: &'a str,
    type_only: bool,
}

#[derive(Clone, Copy)]
struct ExportSpec<'a> {
    name: &'a str,
    exported: &'a str,
}

/// `obj.name`, or `obj["name"]` when the name is a string literal.
fn member(object: &str, name: &str) -> String {
    if name.starts_with('"') || name.starts_with('\'') {
        format!("{}[{}]", object, name)
    } else {
        format!("{}.{}", object, name)
    }
}

/// Name as a double-quoted string literal.
fn quoted(name: &str) -> String {
    if name.starts_with('"') {
        name.to_string()
    } else {
        format!("\"{}\"", name.trim_matches('\''))
    }
}

impl<'a> Eraser<'a> {
    pub(crate) fn lower_modules(&mut self) -> Result<(), TranspileError> {
        for node in std::mem::take(&mut self.imports) {
            self.lower_import(node)?;
        }
        for node in std::mem::take(&mut self.exports) {
            self.lower_export(node)?;
        }
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Imports
    // ──────────────────────────────────────────────────────────────────────

    fn parse_import(&self, node: Node<'a>) -> Result<ImportDecl<'a>, TranspileError> {
        let source = node
            .child_by_field_name("source")
            .map(|s| self.text(s))
            .ok_or_else(|| TranspileError::Unsupported("import without a module specifier".into()))?;

        let mut decl = ImportDecl {
            source,
            default: None,
            namespace: None,
            named: Vec::new(),
            attributes: None,
        };

        for child in named_children(node) {
            match child.kind() {
                "import_clause" => {
                    for part in named_children(child) {
                        match part.kind() {
                            "identifier" => decl.default = Some(self.text(part)),
                            "namespace_import" => {
                                decl.namespace = named_children(part).first().map(|n| self.text(*n))
                            }
                            "named_imports" => {
                                for spec in named_children(part)
                                    .into_iter()
                                    .filter(|s| s.kind() == "import_specifier")
                                {
                                    let Some(name) = spec.child_by_field_name("name") else {
                                        continue;
                                    };
                                    let imported = self.text(name);
                                    let local = spec
                                        .child_by_field_name("alias")
                                        .map_or(imported, |a| self.text(a));
                                    decl.named.push(NamedImport {
                                        imported,
                                        local,
                                        type_only: has_token(spec, "type") || has_token(spec, "typeof"),
                                    });
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "import_attribute" => decl.attributes = Some(self.text(child)),
                _ => {}
            }
        }
        Ok(decl)
    }

    fn lower_import(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        let decl = self.parse_import(node)?;
        let keep_all = self.options.preserves_imports();
        let used = |local: &str| keep_all || self.value_refs.contains(local);

        let default = decl.default.filter(|l| used(*l));
        let namespace = decl.namespace.filter(|l| used(*l));
        let named: Vec<NamedImport<'a>> = decl
            .named
            .iter()
            .copied()
            .filter(|n| !n.type_only && used(n.local))
            .collect();

        let kept = usize::from(default.is_some()) + usize::from(namespace.is_some()) + named.len();
        let elided = decl.binding_count() - kept;
        if elided > 0 {
            log::debug!("elided {} import binding(s) from {}", elided, decl.source);
        }

        // Every binding was a type or unused: the import disappears, unless
        // the module has to be loaded anyway.
        if decl.binding_count() > 0 && kept == 0 && !keep_all {
            self.remove_statement(node);
            return Ok(());
        }
        self.module_statements_kept += 1;

        match self.format {
            ModuleFormat::EsModule => {
                if elided > 0 {
                    let text = render_esm_import(&decl, default, namespace, &named);
                    self.edits.replace(node.start_byte(), node.end_byte(), text);
                }
            }
            ModuleFormat::CommonJs => {
                let indent = line_indent(self.src, node.start_byte());
                let text = self.render_require(&decl, default, namespace, &named, indent);
                self.edits.replace(node.start_byte(), node.end_byte(), text);
            }
        }
        Ok(())
    }

    fn render_require(
        &mut self,
        decl: &ImportDecl<'a>,
        default: Option<&str>,
        namespace: Option<&str>,
        named: &[NamedImport<'_>],
        indent: &str,
    ) -> String {
        let kw = self.options.binding_keyword();
        let require = format!("require({})", decl.source);
        let interop = self.options.es_module_interop;

        match (default, namespace, named.is_empty()) {
            (None, None, true) => format!("{};", require),
            (None, Some(ns), true) => format!("{} {} = {};", kw, ns, self.import_star(require)),
            (Some(d), None, true) => {
                let module = if interop {
                    self.helpers.import_default = true;
                    format!("__importDefault({})", require)
                } else {
                    require
                };
                format!("{} {} = {}.default;", kw, d, module)
            }
            (None, None, false) if self.options.target.has_block_scoping() => {
                let fields: Vec<String> = named
                    .iter()
                    .map(|n| {
                        if n.imported == n.local {
                            n.local.to_string()
                        } else {
                            format!("{}: {}", n.imported, n.local)
                        }
                    })
                    .collect();
                format!("{} {{ {} }} = {};", kw, fields.join(", "), require)
            }
            _ => {
                let holder = match namespace {
                    Some(ns) => ns.to_string(),
                    None => self.temp_name(decl.source),
                };
                let module = if interop && (default.is_some() || namespace.is_some()) {
                    self.import_star(require)
                } else {
                    require
                };
                let mut lines = vec![format!("{} {} = {};", kw, holder, module)];
                if let Some(d) = default {
                    lines.push(format!("{} {} = {}.default;", kw, d, holder));
                }
                for n in named {
                    lines.push(format!("{} {} = {};", kw, n.local, member(&holder, n.imported)));
                }
                lines.join(format!("\n{}", indent).as_str())
            }
        }
    }

    fn import_star(&mut self, require: String) -> String {
        if self.options.es_module_interop {
            self.helpers.import_star = true;
            format!("__importStar({})", require)
        } else {
            require
        }
    }

    /// Fresh binding name derived from a module specifier: `./util/log` → `log_1`.
    fn temp_name(&mut self, source: &str) -> String {
        let spec = source.trim_matches(|c| c == '"' || c == '\'');
        let last = spec.rsplit('/').next().unwrap_or(spec);
        let stem = last.split('.').next().filter(|s| !s.is_empty()).unwrap_or("module");

        let mut base: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
            .collect();
        if base.starts_with(|c: char| c.is_ascii_digit()) {
            base.insert(0, '_');
        }

        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.value_refs.contains(candidate.as_str()) && self.temp_names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// `import(x)` → `Promise.resolve().then(() => require(x))`.
    pub(crate) fn lower_dynamic_import(&mut self, call: Node<'a>) {
        let Some(callee) = call.child_by_field_name("function") else {
            return;
        };
        let require = if self.options.es_module_interop {
            self.helpers.import_star = true;
            ("__importStar(require", "))")
        } else {
            ("require", ")")
        };
        let (prefix, suffix) = if self.options.target.has_block_scoping() {
            (format!("Promise.resolve().then(() => {}", require.0), require.1.to_string())
        } else {
            (
                format!("Promise.resolve().then(function () {{ return {}", require.0),
                format!("{}; }})", &require.1[..require.1.len() - 1]),
            )
        };
        self.edits.replace(callee.start_byte(), callee.end_byte(), prefix);
        self.edits.insert(call.end_byte(), suffix);
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Exports
    // ──────────────────────────────────────────────────────────────────────

    fn export_specs(&self, clause: Node<'a>) -> Vec<ExportSpec<'a>> {
        named_children(clause)
            .into_iter()
            .filter(|s| s.kind() == "export_specifier" && !has_token(*s, "type"))
            .filter_map(|s| {
                let name = self.text(s.child_by_field_name("name")?);
                let exported = s.child_by_field_name("alias").map_or(name, |a| self.text(a));
                Some(ExportSpec { name, exported })
            })
            .collect()
    }

    fn lower_export(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        let clause = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "export_clause");
        let source = node.child_by_field_name("source").map(|s| self.text(s));

        // Local names that are only types cannot be exported at runtime.
        let specs: Option<Vec<ExportSpec<'a>>> = clause.map(|c| {
            self.export_specs(c)
                .into_iter()
                .filter(|s| source.is_some() || !self.type_names.contains(s.name))
                .collect()
        });

        match self.format {
            ModuleFormat::EsModule => self.lower_esm_export(node, clause, specs, source),
            ModuleFormat::CommonJs => self.lower_cjs_export(node, specs, source),
        }
    }

    fn lower_esm_export(
        &mut self,
        node: Node<'a>,
        clause: Option<Node<'a>>,
        specs: Option<Vec<ExportSpec<'a>>>,
        source: Option<&'a str>,
    ) -> Result<(), TranspileError> {
        if has_token(node, "=") {
            return Err(TranspileError::Unsupported("`export =` in ES module output".into()));
        }
        let (Some(clause), Some(specs)) = (clause, specs) else {
            self.module_statements_kept += 1;
            return Ok(());
        };

        let written = named_children(clause)
            .iter()
            .filter(|c| c.kind() == "export_specifier")
            .count();
        if specs.len() == written {
            self.module_statements_kept += 1;
            return Ok(());
        }
        if specs.is_empty() {
            self.remove_statement(node);
            return Ok(());
        }

        let list: Vec<String> = specs
            .iter()
            .map(|s| {
                if s.name == s.exported {
                    s.name.to_string()
                } else {
                    format!("{} as {}", s.name, s.exported)
                }
            })
            .collect();
        let from = source.map(|s| format!(" from {}", s)).unwrap_or_default();
        self.edits.replace(
            node.start_byte(),
            node.end_byte(),
            format!("export {{ {} }}{};", list.join(", "), from),
        );
        self.module_statements_kept += 1;
        Ok(())
    }

    fn lower_cjs_export(
        &mut self,
        node: Node<'a>,
        specs: Option<Vec<ExportSpec<'a>>>,
        source: Option<&'a str>,
    ) -> Result<(), TranspileError> {
        let export_kw = crate::erase::token_child(node, "export")
            .ok_or_else(|| TranspileError::Unsupported("export statement without `export`".into()))?;
        let indent = line_indent(self.src, node.start_byte());
        let is_default = has_token(node, "default");

        // export const a = 1; export function f() {} export default class C {}
        if let Some(decl) = node.child_by_field_name("declaration") {
            self.edits.remove(export_kw.start_byte(), decl.start_byte());
            match decl.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let mut names = Vec::new();
                    for declarator in named_children(decl)
                        .into_iter()
                        .filter(|d| d.kind() == "variable_declarator")
                    {
                        if let Some(pattern) = declarator.child_by_field_name("name") {
                            self.collect_bindings(pattern, &mut names);
                        }
                    }
                    let text: String = names
                        .iter()
                        .map(|n| format!("\n{}exports.{} = {};", indent, n, n))
                        .collect();
                    self.edits.insert(node.end_byte(), text);
                }
                "function_declaration" | "generator_function_declaration" => {
                    let name = self.declaration_name(decl)?;
                    let exported = if is_default { "default" } else { name };
                    self.hoisted.push(format!("exports.{} = {};", exported, name));
                }
                "class_declaration" | "abstract_class_declaration" | "enum_declaration" => {
                    let name = self.declaration_name(decl)?;
                    let exported = if is_default { "default" } else { name };
                    self.edits
                        .insert(node.end_byte(), format!("\n{}exports.{} = {};", indent, exported, name));
                }
                other => {
                    return Err(TranspileError::Unsupported(format!("export of {}", other)));
                }
            }
            return Ok(());
        }

        // export default <expression>;
        if let Some(value) = node.child_by_field_name("value") {
            self.edits
                .replace(export_kw.start_byte(), value.start_byte(), "exports.default = ");
            if !self.text(node).trim_end().ends_with(';') {
                self.edits.insert(node.end_byte(), ";");
            }
            return Ok(());
        }

        // export = <expression>;
        if has_token(node, "=") {
            if let Some(value) = named_children(node).into_iter().find(|c| c.kind() != "comment") {
                self.edits
                    .replace(export_kw.start_byte(), value.start_byte(), "module.exports = ");
            }
            return Ok(());
        }

        let kw = self.options.binding_keyword();

        // export * from "m"; export * as ns from "m";
        if let Some(source) = source.filter(|_| has_token(node, "*") || specs.is_none()) {
            let require = format!("require({})", source);
            let ns = named_children(node)
                .into_iter()
                .find(|c| c.kind() == "namespace_export")
                .and_then(|n| named_children(n).into_iter().next());
            let text = match ns {
                Some(ns) => {
                    let target = member("exports", self.text(ns));
                    format!("{} = {};", target, self.import_star(require))
                }
                None => {
                    self.helpers.export_star = true;
                    format!("__exportStar({}, exports);", require)
                }
            };
            self.edits.replace(node.start_byte(), node.end_byte(), text);
            return Ok(());
        }

        let Some(specs) = specs else {
            return Err(TranspileError::Unsupported(format!(
                "export form `{}`",
                self.text(node)
            )));
        };
        if specs.is_empty() {
            self.remove_statement(node);
            return Ok(());
        }

        let separator = format!("\n{}", indent);
        let text = match source {
            // export { a, b as c } from "m";
            Some(source) => {
                let holder = self.temp_name(source);
                let require = format!("require({})", source);
                let module = if self.options.es_module_interop && specs.iter().any(|s| s.name == "default") {
                    self.helpers.import_default = true;
                    format!("__importDefault({})", require)
                } else {
                    require
                };
                let mut lines = vec![format!("{} {} = {};", kw, holder, module)];
                for spec in &specs {
                    lines.push(format!(
                        "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ return {}; }} }});",
                        quoted(spec.exported),
                        member(&holder, spec.name)
                    ));
                }
                lines.join(separator.as_str())
            }
            // export { a, b as c };
            None => specs
                .iter()
                .map(|s| format!("{} = {};", member("exports", s.exported), s.name))
                .collect::<Vec<_>>()
                .join(separator.as_str()),
        };
        self.edits.replace(node.start_byte(), node.end_byte(), text);
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Live bindings
    // ──────────────────────────────────────────────────────────────────────

    /// Finds the exported `let` and `var` bindings.  Every later write to one
    /// of them has to update `exports` as well.
    pub(crate) fn scan_live_exports(&mut self, root: Node<'a>) {
        let mut mutable = Vec::new();
        let mut clauses = Vec::new();
        for stmt in named_children(root) {
            let (decl, exported) = match stmt.kind() {
                "export_statement" => match stmt.child_by_field_name("declaration") {
                    Some(decl) => (decl, true),
                    None => {
                        if stmt.child_by_field_name("source").is_none() {
                            clauses.extend(
                                named_children(stmt)
                                    .into_iter()
                                    .filter(|c| c.kind() == "export_clause"),
                            );
                        }
                        continue;
                    }
                },
                _ => (stmt, false),
            };
            let is_mutable = decl.kind() == "variable_declaration"
                || (decl.kind() == "lexical_declaration" && has_token(decl, "let"));
            if !is_mutable {
                continue;
            }

            let mut names = Vec::new();
            for declarator in named_children(decl)
                .into_iter()
                .filter(|d| d.kind() == "variable_declarator")
            {
                if let Some(pattern) = declarator.child_by_field_name("name") {
                    self.collect_bindings(pattern, &mut names);
                }
            }
            for name in names {
                mutable.push(name);
                if exported {
                    self.live_exports.entry(name).or_default().push(name);
                }
            }
        }

        for clause in clauses {
            for spec in self.export_specs(clause) {
                if mutable.contains(&spec.name) {
                    self.live_exports.entry(spec.name).or_default().push(spec.exported);
                }
            }
        }
    }

    /// `exports.a = ` for each name the written binding is exported as.
    fn export_targets(&self, target: Node<'a>) -> Option<String> {
        if target.kind() != "identifier" {
            return None;
        }
        let exported = self.live_exports.get(self.text(target))?;
        Some(
            exported
                .iter()
                .map(|e| format!("{} = ", member("exports", e)))
                .collect(),
        )
    }

    /// `n = v` and `n += v` → `exports.n = n = v`.
    pub(crate) fn lower_export_assignment(&mut self, node: Node<'a>) {
        let prefix = node
            .child_by_field_name("left")
            .and_then(|left| self.export_targets(left));
        if let Some(prefix) = prefix {
            self.edits.insert(node.start_byte(), prefix);
        }
    }

    /// `n++` → `exports.n = ++n` when the result is unused, otherwise
    /// `(exports.n = n += 1, n - 1)`.  Returns whether `node` was rewritten.
    pub(crate) fn lower_export_update(&mut self, node: Node<'a>) -> bool {
        let (Some(argument), Some(operator)) = (
            node.child_by_field_name("argument"),
            node.child_by_field_name("operator"),
        ) else {
            return false;
        };
        let Some(prefix) = self.export_targets(argument) else {
            return false;
        };

        let name = self.text(argument);
        let op = self.text(operator);
        let is_prefix = operator.start_byte() < argument.start_byte();
        let result_unused = node.parent().is_some_and(|p| {
            p.kind() == "expression_statement" || p.child_by_field_name("increment") == Some(node)
        });

        let text = if result_unused {
            format!("{}{}{}", prefix, op, name)
        } else if is_prefix {
            format!("({}{}{})", prefix, op, name)
        } else {
            let (step, undo) = if op == "++" { ("+=", "-") } else { ("-=", "+") };
            format!("({}{} {} 1, {} {} 1)", prefix, name, step, name, undo)
        };
        self.value_refs.insert(name);
        self.edits.replace(node.start_byte(), node.end_byte(), text);
        true
    }

    fn declaration_name(&self, decl: Node<'a>) -> Result<&'a str, TranspileError> {
        decl.child_by_field_name("name")
            .map(|n| self.text(n))
            .ok_or_else(|| TranspileError::Unsupported(format!("anonymous {}", decl.kind())))
    }

    /// Binding identifiers introduced by a declaration pattern.
    fn collect_bindings(&self, pattern: Node<'a>, out: &mut Vec<&'a str>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => out.push(self.text(pattern)),
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.collect_bindings(value, out);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.collect_bindings(left, out);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(pattern) {
                    self.collect_bindings(child, out);
                }
            }
            _ => {}
        }
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Prologue
    // ──────────────────────────────────────────────────────────────────────

    /// Adds the module prologue and returns the rewritten source.
    pub(crate) fn finish(mut self, root: Node<'a>) -> String {
        let statements: Vec<Node<'a>> = named_children(root)
            .into_iter()
            .filter(|n| !matches!(n.kind(), "comment" | "hash_bang_line"))
            .collect();
        let directive = statements.first().copied().filter(|s| {
            s.kind() == "expression_statement" && {
                let text = self.text(*s);
                text.starts_with("\"use strict\"") || text.starts_with("'use strict'")
            }
        });

        let mut prologue: Vec<String> = Vec::new();
        match self.format {
            ModuleFormat::CommonJs if self.is_module => {
                if directive.is_none() {
                    prologue.push("\"use strict\";".into());
                }
                prologue.extend(self.helpers.render().into_iter().map(String::from));
                prologue.push("Object.defineProperty(exports, \"__esModule\", { value: true });".into());
                prologue.append(&mut self.hoisted);
            }
            ModuleFormat::CommonJs if directive.is_none() && self.options.emits_use_strict() => {
                prologue.push("\"use strict\";".into());
            }
            _ => {}
        }

        if self.format == ModuleFormat::EsModule && self.is_module && self.module_statements_kept == 0 {
            let tail = if self.src.ends_with('\n') || self.src.is_empty() {
                "export {};\n"
            } else {
                "\nexport {};\n"
            };
            self.edits.insert(self.src.len(), tail);
        }

        if !prologue.is_empty() {
            let anchor = directive.or_else(|| {
                named_children(root)
                    .into_iter()
                    .find(|n| n.kind() == "hash_bang_line")
            });
            let at = match anchor {
                Some(node) => self.src[node.end_byte()..]
                    .find('\n')
                    .map_or(self.src.len(), |i| node.end_byte() + i + 1),
                None => 0,
            };
            let mut text = prologue.join("\n");
            text.push('\n');
            if at > 0 && !self.src[..at].ends_with('\n') {
                text.insert(0, '\n');
            }
            self.edits.insert(at, text);
        }

        let src = self.src;
        self.edits.apply(src)
    }
}

fn render_esm_import(
    decl: &ImportDecl<'_>,
    default: Option<&str>,
    namespace: Option<&str>,
    named: &[NamedImport<'_>],
) -> String {
    let mut clause = Vec::new();
    if let Some(d) = default {
        clause.push(d.to_string());
    }
    if let Some(ns) = namespace {
        clause.push(format!("* as {}", ns));
    }
    if !named.is_empty() {
        let specs: Vec<String> = named
            .iter()
            .map(|n| {
                if n.imported == n.local {
                    n.local.to_string()
                } else {
                    format!("{} as {}", n.imported, n.local)
                }
            })
            .collect();
        clause.push(format!("{{ {} }}", specs.join(", ")));
    }

    let attributes = decl.attributes.map(|a| format!(" {}", a)).unwrap_or_default();
    if clause.is_empty() {
        format!("import {}{};", decl.source, attributes)
    } else {
        format!("import {} from {}{};", clause.join(", "), decl.source, attributes)
    }
}
