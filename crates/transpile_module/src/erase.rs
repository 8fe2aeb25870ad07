// crates/transpile_module/src/erase.rs

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::edits::{expand_to_lines, line_indent, skip_spaces, spaces_before, EditList};
use crate::modules::Helpers;
use crate::options::{CompilerOptions, ModuleFormat};
use crate::TranspileError;

/// Declarations that exist only at the type level and vanish from the output.
const TYPE_ONLY_DECLARATIONS: &[&str] = &[
    "interface_declaration",
    "type_alias_declaration",
    "ambient_declaration",
    "function_signature",
];

/// Nodes that are erased in place wherever they appear in value code.
const ERASED_IN_PLACE: &[&str] = &[
    "type_annotation",
    "asserts_annotation",
    "type_predicate_annotation",
    "type_parameters",
    "type_arguments",
];

/// Class members with no runtime counterpart.
const ERASED_MEMBERS: &[&str] = &["method_signature", "abstract_method_signature", "index_signature"];

/// Collects the children of `node`, anonymous tokens included.
pub(crate) fn children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

pub(crate) fn named_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Whether `node` has a direct anonymous child token spelled `token`.
pub(crate) fn has_token(node: Node<'_>, token: &str) -> bool {
    token_child(node, token).is_some()
}

pub(crate) fn token_child<'a>(node: Node<'a>, token: &str) -> Option<Node<'a>> {
    children(node)
        .into_iter()
        .find(|c| !c.is_named() && c.kind() == token)
}

/// Walks the syntax tree once, recording the edits that erase TypeScript-only
/// syntax and the facts the module lowering needs afterwards.
pub(crate) struct Eraser<'a> {
    pub src: &'a str,
    pub options: &'a CompilerOptions,
    pub format: ModuleFormat,
    pub edits: EditList,
    /// Identifiers that survive in emitted code.
    pub value_refs: HashSet<&'a str>,
    /// Names declared only as types (interfaces, aliases, type imports).
    pub type_names: HashSet<&'a str>,
    /// Top-level import statements left for the module lowering.
    pub imports: Vec<Node<'a>>,
    /// Top-level export statements left for the module lowering.
    pub exports: Vec<Node<'a>>,
    /// The file had import or export syntax before erasure.
    pub is_module: bool,
    /// Import/export statements that are still present in the output.
    pub module_statements_kept: usize,
    pub helpers: Helpers,
    /// `exports.x = x;` lines for function declarations, emitted at the top.
    pub hoisted: Vec<String>,
    pub temp_names: HashSet<String>,
    /// Exported `let`/`var` bindings and the names they are exported as.
    pub live_exports: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Eraser<'a> {
    pub fn new(src: &'a str, options: &'a CompilerOptions, format: ModuleFormat) -> Self {
        Self {
            src,
            options,
            format,
            edits: EditList::default(),
            value_refs: HashSet::new(),
            type_names: HashSet::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            is_module: false,
            module_statements_kept: 0,
            helpers: Helpers::default(),
            hoisted: Vec::new(),
            temp_names: HashSet::new(),
            live_exports: HashMap::new(),
        }
    }

    pub fn text(&self, node: Node<'_>) -> &'a str {
        &self.src[node.start_byte()..node.end_byte()]
    }

    /// First pass over the top-level statements: notes module syntax and the
    /// names that only exist as types, so later export clauses can drop them.
    pub fn scan_declarations(&mut self, root: Node<'a>) {
        for stmt in named_children(root) {
            match stmt.kind() {
                "import_statement" => {
                    self.is_module = true;
                    let whole_import_is_type = has_token(stmt, "type") || has_token(stmt, "typeof");
                    self.scan_import_bindings(stmt, whole_import_is_type);
                }
                "export_statement" => {
                    self.is_module = true;
                    if let Some(decl) = stmt.child_by_field_name("declaration") {
                        self.scan_type_declaration(decl);
                    }
                }
                _ => self.scan_type_declaration(stmt),
            }
        }
        if self.format == ModuleFormat::CommonJs {
            self.scan_live_exports(root);
        }
    }

    fn scan_type_declaration(&mut self, decl: Node<'a>) {
        if matches!(decl.kind(), "interface_declaration" | "type_alias_declaration") {
            if let Some(name) = decl.child_by_field_name("name") {
                self.type_names.insert(self.text(name));
            }
        }
    }

    fn scan_import_bindings(&mut self, stmt: Node<'a>, whole_import_is_type: bool) {
        let Some(clause) = named_children(stmt).into_iter().find(|c| c.kind() == "import_clause") else {
            return;
        };
        for part in named_children(clause) {
            match part.kind() {
                "identifier" if whole_import_is_type => {
                    self.type_names.insert(self.text(part));
                }
                "namespace_import" if whole_import_is_type => {
                    if let Some(ident) = named_children(part).into_iter().next() {
                        self.type_names.insert(self.text(ident));
                    }
                }
                "named_imports" => {
                    for spec in named_children(part).into_iter().filter(|s| s.kind() == "import_specifier") {
                        if whole_import_is_type || has_token(spec, "type") || has_token(spec, "typeof") {
                            let local = spec
                                .child_by_field_name("alias")
                                .or_else(|| spec.child_by_field_name("name"));
                            if let Some(local) = local {
                                self.type_names.insert(self.text(local));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    pub fn visit(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        if !node.is_named() {
            return Ok(());
        }

        let kind = node.kind();
        if TYPE_ONLY_DECLARATIONS.contains(&kind) {
            self.remove_statement(node);
            return Ok(());
        }
        if ERASED_IN_PLACE.contains(&kind) {
            self.edits.remove(node.start_byte(), node.end_byte());
            return Ok(());
        }

        match kind {
            "accessibility_modifier" | "override_modifier" => self.remove_keyword(node),
            "implements_clause" => self
                .edits
                .remove(spaces_before(self.src, node.start_byte()), node.end_byte()),
            "as_expression" | "satisfies_expression" | "non_null_expression" => {
                if let Some(expr) = named_children(node).into_iter().next() {
                    self.visit(expr)?;
                    self.edits.remove(expr.end_byte(), node.end_byte());
                }
            }
            "type_assertion" => self.visit_children(node)?,
            "import_statement" => self.visit_import(node)?,
            "import_alias" => self.visit_import_alias(node)?,
            "export_statement" => self.visit_export(node)?,
            "enum_declaration" => self.lower_enum(node)?,
            "class_body" => self.visit_class_body(node)?,
            "abstract_class_declaration" => {
                if let Some(abstract_kw) = token_child(node, "abstract") {
                    self.remove_keyword(abstract_kw);
                }
                self.visit_children(node)?;
            }
            "required_parameter" | "optional_parameter" => self.visit_parameter(node)?,
            "variable_declarator" => {
                if let Some(bang) = token_child(node, "!") {
                    self.edits.remove(bang.start_byte(), bang.end_byte());
                }
                self.visit_children(node)?;
            }
            "method_definition" => self.visit_method(node)?,
            "public_field_definition" => self.visit_field(node)?,
            "call_expression" => self.visit_call(node)?,
            "assignment_expression" | "augmented_assignment_expression" => {
                self.lower_export_assignment(node);
                self.visit_children(node)?;
            }
            "update_expression" => {
                if !self.lower_export_update(node) {
                    self.visit_children(node)?;
                }
            }
            "internal_module" | "module" => {
                return Err(TranspileError::Unsupported("namespace declarations".into()))
            }
            "decorator" => {
                if self.options.experimental_decorators {
                    return Err(TranspileError::Unsupported(
                        "decorators with experimentalDecorators".into(),
                    ));
                }
                self.visit_children(node)?;
            }
            "comment" => {
                if self.options.remove_comments && !self.text(node).starts_with("/*!") {
                    self.remove_comment(node);
                }
            }
            "identifier" | "shorthand_property_identifier" => {
                self.value_refs.insert(self.text(node));
            }
            _ => self.visit_children(node)?,
        }
        Ok(())
    }

    pub fn visit_children(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        for child in children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Removal helpers
    // ──────────────────────────────────────────────────────────────────────

    /// Removes a whole statement, taking its line with it when it has the
    /// line to itself.
    pub fn remove_statement(&mut self, node: Node<'_>) {
        let end = self.terminator_end(node.end_byte(), &[b';']);
        let (start, end) = expand_to_lines(self.src, node.start_byte(), end);
        self.edits.remove(start, end);
    }

    /// Removes a class member together with its `;` or `,` terminator.
    fn remove_member(&mut self, node: Node<'_>) {
        let end = self.terminator_end(node.end_byte(), &[b';', b',']);
        let (start, end) = expand_to_lines(self.src, node.start_byte(), end);
        self.edits.remove(start, end);
    }

    /// End of the terminator following `end` on the same line, if any.
    /// Signatures leave theirs outside the node.
    fn terminator_end(&self, end: usize, terminators: &[u8]) -> usize {
        if self.src[..end].ends_with(';') {
            return end;
        }
        let after = skip_spaces(self.src, end);
        match self.src.as_bytes().get(after) {
            Some(b) if terminators.contains(b) => after + 1,
            _ => end,
        }
    }

    /// Removes a modifier keyword and the spaces after it.
    fn remove_keyword(&mut self, node: Node<'_>) {
        self.edits
            .remove(node.start_byte(), skip_spaces(self.src, node.end_byte()));
    }

    fn remove_comment(&mut self, node: Node<'_>) {
        let (start, end) = expand_to_lines(self.src, node.start_byte(), node.end_byte());
        if start == node.start_byte() {
            self.edits.remove(spaces_before(self.src, start), end);
        } else {
            self.edits.remove(start, end);
        }
    }

    /// Removes one element of a comma separated list along with its comma.
    fn remove_list_item(&mut self, node: Node<'_>) {
        let next_comma = node
            .next_sibling()
            .filter(|n| !n.is_named() && n.kind() == ",");
        let prev_comma = node
            .prev_sibling()
            .filter(|n| !n.is_named() && n.kind() == ",");

        if let Some(comma) = next_comma {
            let end = comma
                .next_sibling()
                .map_or(comma.end_byte(), |n| n.start_byte());
            self.edits.remove(node.start_byte(), end);
        } else if let Some(comma) = prev_comma {
            self.edits.remove(comma.start_byte(), node.end_byte());
        } else {
            self.edits.remove(node.start_byte(), node.end_byte());
        }
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Statements
    // ──────────────────────────────────────────────────────────────────────

    fn visit_import(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        if has_token(node, "type") || has_token(node, "typeof") {
            self.remove_statement(node);
            return Ok(());
        }

        let require_clause = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "import_require_clause");
        if require_clause.is_some() {
            // import x = require("m");
            if self.format == ModuleFormat::EsModule
                && self.options.module_kind() != crate::options::ModuleKind::Preserve
            {
                return Err(TranspileError::Unsupported(
                    "`import x = require()` in ES module output".into(),
                ));
            }
            if let Some(import_kw) = token_child(node, "import") {
                self.edits.replace(
                    import_kw.start_byte(),
                    import_kw.end_byte(),
                    self.options.binding_keyword(),
                );
            }
            self.module_statements_kept += 1;
            return Ok(());
        }

        self.imports.push(node);
        Ok(())
    }

    /// `import A = B.C;` aliases a namespace member.
    fn visit_import_alias(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        if has_token(node, "type") {
            self.remove_statement(node);
            return Ok(());
        }
        if let Some(import_kw) = token_child(node, "import") {
            self.edits.replace(
                import_kw.start_byte(),
                import_kw.end_byte(),
                self.options.binding_keyword(),
            );
        }
        self.visit_children(node)
    }

    fn visit_export(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        // export type { A }; export type * from "m"; export as namespace X;
        if has_token(node, "type") || has_token(node, "namespace") {
            self.remove_statement(node);
            return Ok(());
        }

        if let Some(decl) = node.child_by_field_name("declaration") {
            if TYPE_ONLY_DECLARATIONS.contains(&decl.kind()) {
                self.remove_statement(node);
                return Ok(());
            }
            for child in children(node) {
                self.visit(child)?;
            }
            self.exports.push(node);
            return Ok(());
        }

        for child in named_children(node) {
            match child.kind() {
                "export_clause" => {
                    for spec in named_children(child).into_iter().filter(|s| s.kind() == "export_specifier") {
                        if has_token(spec, "type") {
                            continue;
                        }
                        if let Some(name) = spec.child_by_field_name("name") {
                            self.value_refs.insert(self.text(name));
                        }
                    }
                }
                "string" | "namespace_export" => {}
                _ => self.visit(child)?,
            }
        }
        self.exports.push(node);
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Classes
    // ──────────────────────────────────────────────────────────────────────

    fn visit_class_body(&mut self, body: Node<'a>) -> Result<(), TranspileError> {
        for member in children(body) {
            if !member.is_named() {
                continue;
            }
            if ERASED_MEMBERS.contains(&member.kind())
                || (member.kind() == "public_field_definition" && self.field_is_erased(member))
            {
                self.remove_member(member);
            } else {
                self.visit(member)?;
            }
        }
        Ok(())
    }

    /// `declare` and `abstract` fields never reach the output.  Without
    /// define semantics, neither do fields that only declare a type.
    fn field_is_erased(&self, field: Node<'a>) -> bool {
        if has_token(field, "declare") || has_token(field, "abstract") {
            return true;
        }
        if self.options.defines_class_fields() {
            return false;
        }
        let has_initializer = field.child_by_field_name("value").is_some();
        let has_decorator = field.child_by_field_name("decorator").is_some();
        let is_private_name = field
            .child_by_field_name("name")
            .is_some_and(|n| n.kind() == "private_property_identifier");
        !has_initializer && !has_decorator && !is_private_name
    }

    fn visit_field(&mut self, field: Node<'a>) -> Result<(), TranspileError> {
        for child in children(field) {
            if child.is_named() {
                self.visit(child)?;
                continue;
            }
            match child.kind() {
                "readonly" => self.remove_keyword(child),
                "?" | "!" => self.edits.remove(child.start_byte(), child.end_byte()),
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_method(&mut self, method: Node<'a>) -> Result<(), TranspileError> {
        for child in children(method) {
            if child.is_named() {
                self.visit(child)?;
                continue;
            }
            match child.kind() {
                "readonly" => self.remove_keyword(child),
                "?" => self.edits.remove(child.start_byte(), child.end_byte()),
                _ => {}
            }
        }

        let is_constructor = method
            .child_by_field_name("name")
            .is_some_and(|n| self.text(n) == "constructor");
        if is_constructor {
            self.lower_parameter_properties(method)?;
        }
        Ok(())
    }

    fn visit_parameter(&mut self, param: Node<'a>) -> Result<(), TranspileError> {
        if param.child_by_field_name("decorator").is_some() {
            return Err(TranspileError::Unsupported("parameter decorators".into()));
        }
        if param
            .child_by_field_name("pattern")
            .is_some_and(|p| p.kind() == "this")
        {
            self.remove_list_item(param);
            return Ok(());
        }

        for child in children(param) {
            if child.is_named() {
                self.visit(child)?;
                continue;
            }
            match child.kind() {
                "readonly" => self.remove_keyword(child),
                "?" => self.edits.remove(child.start_byte(), child.end_byte()),
                _ => {}
            }
        }
        Ok(())
    }

    /// `constructor(private x: T)` declares and assigns `this.x`; the
    /// assignment has to be spelled out once the modifier is gone.
    fn lower_parameter_properties(&mut self, method: Node<'a>) -> Result<(), TranspileError> {
        let Some(params) = method.child_by_field_name("parameters") else {
            return Ok(());
        };

        let mut names = Vec::new();
        for param in named_children(params) {
            if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let is_property = children(param).iter().any(|c| {
                matches!(c.kind(), "accessibility_modifier" | "override_modifier")
                    || (!c.is_named() && c.kind() == "readonly")
            });
            if !is_property {
                continue;
            }
            match param.child_by_field_name("pattern") {
                Some(pattern) if pattern.kind() == "identifier" => names.push(self.text(pattern)),
                _ => {
                    return Err(TranspileError::Unsupported(
                        "destructured parameter properties".into(),
                    ))
                }
            }
        }
        if names.is_empty() {
            return Ok(());
        }

        let Some(body) = method.child_by_field_name("body") else {
            return Ok(());
        };
        let statements: Vec<Node<'a>> = named_children(body)
            .into_iter()
            .filter(|n| n.kind() != "comment")
            .collect();

        let assignments = |indent: &str| -> String {
            names
                .iter()
                .map(|n| format!("\n{}this.{} = {};", indent, n, n))
                .collect()
        };

        // Fields on `this` exist only once `super(...)` has returned.
        if let Some(call) = statements.iter().find(|s| is_super_call(**s)) {
            let indent = line_indent(self.src, call.start_byte());
            self.edits.insert(call.end_byte(), assignments(indent));
            return Ok(());
        }

        match statements.first() {
            Some(first) => {
                let indent = line_indent(self.src, first.start_byte());
                self.edits.insert(body.start_byte() + 1, assignments(indent));
            }
            None => {
                let outer = line_indent(self.src, body.start_byte());
                let inner = format!("{}    ", outer);
                if self.text(body)[1..].trim_start().starts_with('}') {
                    self.edits.replace(
                        body.start_byte() + 1,
                        body.end_byte() - 1,
                        format!("{}\n{}", assignments(&inner), outer),
                    );
                } else {
                    self.edits.insert(body.start_byte() + 1, assignments(&inner));
                }
            }
        }
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    //  Expressions
    // ──────────────────────────────────────────────────────────────────────

    fn visit_call(&mut self, call: Node<'a>) -> Result<(), TranspileError> {
        let is_dynamic_import = call
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "import");
        if is_dynamic_import && self.format == ModuleFormat::CommonJs {
            self.lower_dynamic_import(call);
        }
        self.visit_children(call)
    }
}

fn is_super_call(stmt: Node<'_>) -> bool {
    stmt.kind() == "expression_statement"
        && named_children(stmt).into_iter().next().is_some_and(|expr| {
            expr.kind() == "call_expression"
                && expr
                    .child_by_field_name("function")
                    .is_some_and(|f| f.kind() == "super")
        })
}
