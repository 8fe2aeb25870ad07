// crates/transpile_module/src/enums.rs
//
// `enum` has a runtime form: an object filled in by an immediately invoked
// function, with a reverse mapping for numeric members.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::edits::{apply_edits, line_indent};
use crate::erase::{children, named_children, Eraser};
use crate::TranspileError;

#[derive(Debug, Clone, PartialEq)]
enum ConstValue {
    Number(f64),
    Str(String),
}

/// Values of the members seen so far, `None` for members that are not
/// compile-time constants.
type Known = HashMap<String, Option<ConstValue>>;

impl<'a> Eraser<'a> {
    pub(crate) fn lower_enum(&mut self, node: Node<'a>) -> Result<(), TranspileError> {
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| TranspileError::Unsupported("enum without a name".into()))?;
        let name = self.text(name_node);
        let indent = line_indent(self.src, node.start_byte());

        let mut known = Known::new();
        let mut next: Option<f64> = Some(0.0);
        let mut lines = Vec::new();

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                let (key_node, init) = match member.kind() {
                    "enum_assignment" => (
                        member.child_by_field_name("name"),
                        member.child_by_field_name("value"),
                    ),
                    "comment" => continue,
                    _ => (Some(member), None),
                };
                let Some(key_node) = key_node else { continue };
                let key = self.member_key(key_node)?;
                let quoted_key = quote(&key);

                let value = match init {
                    Some(init) => match self.eval_const(init, name, &known) {
                        Some(value) => Rendered::Const(value),
                        None => Rendered::Computed(self.render_initializer(init, name, &known)?),
                    },
                    None => match next {
                        Some(n) => Rendered::Const(ConstValue::Number(n)),
                        None => return Err(TranspileError::EnumInitializer { member: key }),
                    },
                };

                let line = match &value {
                    Rendered::Const(ConstValue::Str(s)) => {
                        format!("{}[{}] = {};", name, quoted_key, quote(s))
                    }
                    Rendered::Const(ConstValue::Number(n)) => format!(
                        "{}[{}[{}] = {}] = {};",
                        name,
                        name,
                        quoted_key,
                        format_number(*n),
                        quoted_key
                    ),
                    Rendered::Computed(expr) => format!(
                        "{}[{}[{}] = {}] = {};",
                        name, name, quoted_key, expr, quoted_key
                    ),
                };
                lines.push(format!("{}    {}", indent, line));

                next = match &value {
                    Rendered::Const(ConstValue::Number(n)) => Some(n + 1.0),
                    _ => None,
                };
                let constant = match value {
                    Rendered::Const(v) => Some(v),
                    Rendered::Computed(_) => None,
                };
                known.insert(key, constant);
            }
        }

        let mut text = format!("var {};\n{}(function ({}) {{\n", name, indent, name);
        for line in &lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&format!("{}}})({} || ({} = {{}}));", indent, name, name));

        log::trace!("lowered enum {} with {} member(s)", name, lines.len());
        self.edits.replace(node.start_byte(), node.end_byte(), text);
        Ok(())
    }

    fn member_key(&self, key: Node<'a>) -> Result<String, TranspileError> {
        match key.kind() {
            "property_identifier" | "identifier" => Ok(self.text(key).to_string()),
            "string" => Ok(self.string_value(key)),
            "number" => parse_number(self.text(key))
                .map(format_number)
                .ok_or_else(|| TranspileError::Unsupported("bigint enum member name".into())),
            other => Err(TranspileError::Unsupported(format!("enum member name of kind {}", other))),
        }
    }

    /// Decoded contents of a string or substitution-free template literal.
    fn string_value(&self, node: Node<'a>) -> String {
        let mut out = String::new();
        for part in named_children(node) {
            match part.kind() {
                "string_fragment" => out.push_str(self.text(part)),
                "escape_sequence" => out.push_str(&unescape(self.text(part))),
                _ => {}
            }
        }
        out
    }

    fn eval_const(&self, node: Node<'a>, enum_name: &str, known: &Known) -> Option<ConstValue> {
        match node.kind() {
            "number" => parse_number(self.text(node)).map(ConstValue::Number),
            "string" => Some(ConstValue::Str(self.string_value(node))),
            "template_string" => {
                if named_children(node).iter().any(|c| c.kind() == "template_substitution") {
                    return None;
                }
                Some(ConstValue::Str(self.string_value(node)))
            }
            "parenthesized_expression" => {
                let inner = named_children(node).into_iter().next()?;
                self.eval_const(inner, enum_name, known)
            }
            "identifier" => {
                let name = self.text(node);
                match known.get(name) {
                    Some(value) => value.clone(),
                    None => match name {
                        "NaN" => Some(ConstValue::Number(f64::NAN)),
                        "Infinity" => Some(ConstValue::Number(f64::INFINITY)),
                        _ => None,
                    },
                }
            }
            "member_expression" => {
                let object = node.child_by_field_name("object")?;
                let property = node.child_by_field_name("property")?;
                if object.kind() != "identifier" || self.text(object) != enum_name {
                    return None;
                }
                known.get(self.text(property)).cloned().flatten()
            }
            "subscript_expression" => {
                let object = node.child_by_field_name("object")?;
                let index = node.child_by_field_name("index")?;
                if object.kind() != "identifier" || self.text(object) != enum_name || index.kind() != "string" {
                    return None;
                }
                known.get(&self.string_value(index)).cloned().flatten()
            }
            "unary_expression" => {
                let operator = node.child_by_field_name("operator")?;
                let argument = node.child_by_field_name("argument")?;
                let ConstValue::Number(n) = self.eval_const(argument, enum_name, known)? else {
                    return None;
                };
                let value = match self.text(operator) {
                    "+" => n,
                    "-" => -n,
                    "~" => !to_int32(n) as f64,
                    _ => return None,
                };
                Some(ConstValue::Number(value))
            }
            "binary_expression" => {
                let left = self.eval_const(node.child_by_field_name("left")?, enum_name, known)?;
                let right = self.eval_const(node.child_by_field_name("right")?, enum_name, known)?;
                let operator = self.text(node.child_by_field_name("operator")?);
                eval_binary(operator, left, right)
            }
            _ => None,
        }
    }

    /// Emits a non-constant initializer, with bare references to earlier
    /// members qualified by the enum name.
    fn render_initializer(
        &mut self,
        init: Node<'a>,
        enum_name: &str,
        known: &Known,
    ) -> Result<String, TranspileError> {
        self.visit(init)?;
        self.qualify_member_refs(init, enum_name, known);

        let (start, end) = (init.start_byte(), init.end_byte());
        let edits = self.edits.take_within(start, end);
        Ok(apply_edits(&self.src[start..end], start, edits))
    }

    fn qualify_member_refs(&mut self, node: Node<'a>, enum_name: &str, known: &Known) {
        match node.kind() {
            "identifier" if known.contains_key(self.text(node)) => {
                let qualified = format!("{}.{}", enum_name, self.text(node));
                self.edits.replace(node.start_byte(), node.end_byte(), qualified);
            }
            // `x.A` only refers to the member on the left of the dot.
            "member_expression" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.qualify_member_refs(object, enum_name, known);
                }
            }
            _ => {
                for child in children(node) {
                    self.qualify_member_refs(child, enum_name, known);
                }
            }
        }
    }
}

enum Rendered {
    Const(ConstValue),
    Computed(String),
}

fn eval_binary(operator: &str, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Number, Str};

    let (l, r) = match (left, right) {
        (Number(l), Number(r)) => (l, r),
        (l, r) if operator == "+" => {
            let text = |v: ConstValue| match v {
                Number(n) => format_number(n),
                Str(s) => s,
            };
            return Some(Str(text(l) + &text(r)));
        }
        _ => return None,
    };

    let value = match operator {
        "+" => l + r,
        "-" => l - r,
        "*" => l * r,
        "/" => l / r,
        "%" => l % r,
        "**" => l.powf(r),
        "|" => (to_int32(l) | to_int32(r)) as f64,
        "&" => (to_int32(l) & to_int32(r)) as f64,
        "^" => (to_int32(l) ^ to_int32(r)) as f64,
        "<<" => to_int32(l).wrapping_shl(to_uint32(r) & 31) as f64,
        ">>" => to_int32(l).wrapping_shr(to_uint32(r) & 31) as f64,
        ">>>" => to_uint32(l).wrapping_shr(to_uint32(r) & 31) as f64,
        _ => return None,
    };
    Some(Number(value))
}

fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// Numeric literal value; `None` for bigints.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.replace('_', "");
    if text.ends_with('n') {
        return None;
    }
    let lower = text.to_ascii_lowercase();
    let radix = |digits: &str, radix: u32| u128::from_str_radix(digits, radix).ok().map(|v| v as f64);

    if let Some(hex) = lower.strip_prefix("0x") {
        radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        radix(bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') && lower.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        radix(&lower[1..], 8)
    } else {
        lower.parse().ok()
    }
}

/// Formats a number the way JavaScript prints it for the common cases.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n == f64::INFINITY {
        "Infinity".into()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn unescape(seq: &str) -> String {
    let body = &seq[1..];
    let code = |hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    let decoded = match body.chars().next() {
        Some('n') => Some('\n'),
        Some('t') => Some('\t'),
        Some('r') => Some('\r'),
        Some('b') => Some('\u{8}'),
        Some('f') => Some('\u{c}'),
        Some('v') => Some('\u{b}'),
        Some('0') if body.len() == 1 => Some('\0'),
        Some('x') => code(&body[1..]),
        Some('u') => code(body[1..].trim_start_matches('{').trim_end_matches('}')),
        Some('\n') | Some('\r') => return String::new(),
        Some(c) => Some(c),
        None => None,
    };
    decoded.map(String::from).unwrap_or_else(|| seq.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_literals() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("0xFF"), Some(255.0));
        assert_eq!(parse_number("0o17"), Some(15.0));
        assert_eq!(parse_number("0b101"), Some(5.0));
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number("1.5e3"), Some(1500.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("10n"), None);
    }

    #[test]
    fn formats_like_javascript() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn int32_conversions_wrap() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn binary_operators() {
        use super::ConstValue::{Number, Str};
        assert_eq!(eval_binary("<<", Number(1.0), Number(4.0)), Some(Number(16.0)));
        assert_eq!(eval_binary(">>>", Number(-1.0), Number(28.0)), Some(Number(15.0)));
        assert_eq!(eval_binary("|", Number(1.0), Number(2.0)), Some(Number(3.0)));
        assert_eq!(
            eval_binary("+", Str("a".into()), Number(1.0)),
            Some(Str("a1".into()))
        );
        assert_eq!(eval_binary("-", Str("a".into()), Number(1.0)), None);
    }

    #[test]
    fn unescapes_common_sequences() {
        assert_eq!(unescape("\\n"), "\n");
        assert_eq!(unescape("\\x41"), "A");
        assert_eq!(unescape("\\u{1F600}"), "\u{1F600}");
        assert_eq!(unescape("\\\""), "\"");
    }
}
