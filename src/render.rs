//! Canonical text rendering of types and values.
//!
//! The output is valid input to [`crate::parse`]. Binary operators are
//! parenthesized by precedence: comma < `|` < `^` < `&` < a single type.
//! A map entry `K:V` is bare only at the top and parenthesized elsewhere.
//!
//! Natives, type values inside exact collections and cyclic types have no
//! readable form.

use std::fmt::Write;

use crate::types::{FloatRange, IntRange, SizeBounds, Type, TypeIdentifier, TypeKind};
use crate::value::Value;
use crate::violation::Violation;

const COMMA: u8 = 0;
const OR: u8 = 1;
const XOR: u8 = 2;
const AND: u8 = 3;
const TYPE: u8 = 4;

/// Render a type in canonical syntax.
pub fn type_string(t: &Type) -> String {
    let mut printer = Printer { types: true, ..Printer::default() };
    printer.ty(t, COMMA);
    printer.out
}

/// Render a value in literal syntax.
pub(crate) fn value_string(v: &Value) -> String {
    let mut printer = Printer::default();
    printer.value(v);
    printer.out
}

#[derive(Default)]
struct Printer {
    /// Composite nodes on the current path.
    seen: Vec<Type>,
    out: String,
    /// Nesting level of the type or value being printed; 1 is the top.
    depth: usize,
    /// Type syntax rather than value display. The empty array then prints as
    /// `[0,0]any` since `{}` reads as the empty map.
    types: bool,
}

impl Printer {
    fn ty(&mut self, t: &Type, prio: u8) {
        self.depth += 1;
        self.type_node(t, prio);
        self.depth -= 1;
    }

    fn type_node(&mut self, t: &Type, prio: u8) {
        let id = t.identifier();
        if id.is_atomic() {
            self.out.push_str(id.name());
            return;
        }
        if self.seen.iter().any(|s| Type::ptr_eq(s, t)) {
            let _ = write!(self.out, "<recursive self reference to {id} type>");
            return;
        }
        self.seen.push(t.clone());
        self.composite(t, prio);
        self.seen.pop();
    }

    fn composite(&mut self, t: &Type, prio: u8) {
        match t.kind() {
            TypeKind::AnyOf(ops) => self.binary(ops, "|", OR, prio),
            TypeKind::OneOf(ops) => self.binary(ops, "^", XOR, prio),
            TypeKind::AllOf(ops) => self.binary(ops, "&", AND, prio),
            TypeKind::Not(op) => {
                self.out.push('!');
                self.ty(op, TYPE);
            }
            TypeKind::Meta(op) => {
                self.out.push_str("type");
                if let Some(op) = op {
                    self.out.push('[');
                    self.ty(op, COMMA);
                    self.out.push(']');
                }
            }
            TypeKind::String(size) => {
                self.out.push_str("string");
                self.bracketed_size(*size);
            }
            TypeKind::Binary(size) => {
                self.out.push_str("binary");
                self.bracketed_size(*size);
            }
            TypeKind::Array { element, size } => {
                if size.unbounded() {
                    self.out.push_str("[]");
                } else {
                    self.out.push('[');
                    self.size(*size);
                    self.out.push(']');
                }
                self.ty(element, TYPE);
            }
            TypeKind::Tuple(elements) => {
                self.out.push('{');
                self.join(elements, ",", COMMA);
                self.out.push('}');
            }
            TypeKind::Map { key, value, size } => {
                self.out.push_str("map[");
                self.ty(key, COMMA);
                if !size.unbounded() {
                    self.out.push(',');
                    self.size(*size);
                }
                self.out.push(']');
                self.ty(value, TYPE);
            }
            TypeKind::Struct(st) => {
                self.out.push('{');
                for (i, entry) in st.entries().iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.value(entry.key());
                    if !entry.required() {
                        self.out.push('?');
                    }
                    self.out.push(':');
                    self.ty(entry.value(), COMMA);
                }
                if st.additional() {
                    if !st.is_empty() {
                        self.out.push(',');
                    }
                    self.out.push_str("...");
                }
                self.out.push('}');
            }
            TypeKind::MapEntry { key, value } => {
                let parens = self.depth > 1;
                self.open(parens);
                self.ty(key, COMMA);
                self.out.push(':');
                self.ty(value, COMMA);
                self.close(parens);
            }
            TypeKind::IntRange(range) => self.int_range(*range),
            TypeKind::FloatRange(range) => self.float_range(*range),
            TypeKind::Pattern(regexp) => slash_quote(&mut self.out, regexp.as_str()),
            TypeKind::Native(native) => self.out.push_str(native.name()),
            TypeKind::Exact(value) => self.literal(value),
            TypeKind::Any | TypeKind::Boolean | TypeKind::Error => {
                self.out.push_str(t.identifier().name());
            }
        }
    }

    fn value(&mut self, v: &Value) {
        self.depth += 1;
        self.literal(v);
        self.depth -= 1;
    }

    /// Literal syntax; nested values render as their exact types.
    fn literal(&mut self, v: &Value) {
        match v {
            Value::Nil => self.out.push_str("nil"),
            Value::Bool(b) => {
                let _ = write!(self.out, "{b}");
            }
            Value::Int(i) => {
                let _ = write!(self.out, "{i}");
            }
            Value::Float(f) => {
                let _ = write!(self.out, "{:?}", f.0);
            }
            Value::String(s) => quote(&mut self.out, s),
            Value::Binary(b) => {
                self.out.push_str("binary[");
                quote(&mut self.out, &b.to_base64());
                self.out.push(']');
            }
            Value::Regexp(r) => {
                self.out.push_str("regexp[");
                quote(&mut self.out, r.as_str());
                self.out.push(']');
            }
            Value::Array(a) if a.is_empty() && self.types => self.out.push_str("[0,0]any"),
            Value::Array(a) => {
                self.out.push('{');
                for (i, e) in a.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.value(e);
                }
                self.out.push('}');
            }
            Value::Map(m) => {
                self.out.push('{');
                for (i, (k, e)) in m.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.value(k);
                    self.out.push(':');
                    self.value(e);
                }
                self.out.push('}');
            }
            Value::Entry(e) => {
                let parens = self.depth > 1;
                self.open(parens);
                self.value(e.key());
                self.out.push(':');
                self.value(e.value());
                self.close(parens);
            }
            Value::Type(t) => self.ty(&Type::meta(t.clone()), COMMA),
            Value::Violation(violation) => self.violation(violation),
            Value::Native(n) => self.out.push_str(n.native_type().name()),
        }
    }

    /// `error[kind,fields…]`, the fields in declaration order.
    fn violation(&mut self, violation: &Violation) {
        self.out.push_str(TypeIdentifier::ErrorExact.name());
        self.out.push('[');
        match violation {
            Violation::IllegalAssignment { value, ty } => {
                self.out.push_str("\"assignment\",");
                self.value(value);
                self.out.push(',');
                self.ty(ty, COMMA);
            }
            Violation::IllegalSize { ty, size } => {
                self.out.push_str("\"size\",");
                self.ty(ty, COMMA);
                let _ = write!(self.out, ",{size}");
            }
            Violation::IllegalMapKey { key, ty } => {
                self.out.push_str("\"mapKey\",");
                self.value(key);
                self.out.push(',');
                self.ty(ty, COMMA);
            }
            Violation::MissingKey { key, label, ty } => {
                self.out.push_str("\"missingKey\",");
                self.value(key);
                self.out.push(',');
                quote(&mut self.out, label);
                self.out.push(',');
                self.ty(ty, COMMA);
            }
        }
        self.out.push(']');
    }

    fn binary(&mut self, ops: &[Type], op: &str, op_prio: u8, prio: u8) {
        let parens = prio >= op_prio;
        self.open(parens);
        self.join(ops, op, op_prio);
        self.close(parens);
    }

    fn open(&mut self, parens: bool) {
        if parens {
            self.out.push('(');
        }
    }

    fn close(&mut self, parens: bool) {
        if parens {
            self.out.push(')');
        }
    }

    fn join(&mut self, ops: &[Type], sep: &str, prio: u8) {
        for (i, op) in ops.iter().enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            self.ty(op, prio);
        }
    }

    fn bracketed_size(&mut self, size: SizeBounds) {
        if !size.unbounded() {
            self.out.push('[');
            self.size(size);
            self.out.push(']');
        }
    }

    fn size(&mut self, size: SizeBounds) {
        let _ = write!(self.out, "{}", size.min());
        if size.max() != usize::MAX {
            let _ = write!(self.out, ",{}", size.max());
        }
    }

    fn int_range(&mut self, range: IntRange) {
        if range.unbounded() {
            self.out.push_str("int");
            return;
        }
        if range.min() != i64::MIN {
            let _ = write!(self.out, "{}", range.min());
        }
        self.out.push_str(if range.inclusive() { ".." } else { "..." });
        if range.max() != i64::MAX {
            let _ = write!(self.out, "{}", range.max());
        }
    }

    fn float_range(&mut self, range: FloatRange) {
        if range.unbounded() {
            self.out.push_str("float");
            return;
        }
        if range.min() != f64::MIN {
            let _ = write!(self.out, "{:?}", range.min());
        }
        self.out.push_str(if range.inclusive() { ".." } else { "..." });
        if range.max() != f64::MAX {
            let _ = write!(self.out, "{:?}", range.max());
        }
    }
}

fn quote(out: &mut String, s: &str) {
    out.push_str(&serde_json::Value::String(s.to_owned()).to_string());
}

/// `/source/` with every `/` in the source escaped.
fn slash_quote(out: &mut String, source: &str) {
    out.push('/');
    for c in source.chars() {
        if c == '/' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('/');
}
