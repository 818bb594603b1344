//! Reader for the canonical type syntax produced by [`crate::render`].
//!
//! Precedence, loosest first: `:` (map entry, top level or parenthesized),
//! `|`, `^`, `&`, prefix `!`. Errors carry the byte offset where reading
//! stopped.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{StructEntry, Type, TypeKind};
use crate::value::{Binary, Regexp, Value};
use crate::violation::Violation;

pub fn parse(text: &str) -> Result<Type> {
    let mut parser = Parser { src: text, pos: 0 };
    let result = parser.entry_expr().and_then(|t| {
        parser.skip_ws();
        if parser.pos < parser.src.len() {
            Err(parser.error("unexpected trailing input"))
        } else {
            Ok(t)
        }
    });
    if let Err(error) = &result {
        debug!(%error, text, "type parse failed");
    }
    result
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::Int(i),
            Num::Float(f) => Value::float(f),
        }
    }
}

impl<'a> Parser<'a> {
    // ————————————————————————————————————————————————————————————————————————
    // EXPRESSIONS
    // ————————————————————————————————————————————————————————————————————————

    /// `K:V` or a plain expression.
    fn entry_expr(&mut self) -> Result<Type> {
        let key = self.expr()?;
        if !self.eat(b':') {
            return Ok(key);
        }
        Ok(Type::map_entry(key, self.expr()?))
    }

    fn expr(&mut self) -> Result<Type> {
        self.binary(b'|', Self::xor, Type::any_of)
    }

    fn xor(&mut self) -> Result<Type> {
        self.binary(b'^', Self::and, Type::one_of)
    }

    fn and(&mut self) -> Result<Type> {
        self.binary(b'&', Self::unary, Type::all_of)
    }

    fn binary(
        &mut self,
        op: u8,
        operand: fn(&mut Self) -> Result<Type>,
        build: fn(Vec<Type>) -> Type,
    ) -> Result<Type> {
        let first = operand(self)?;
        if !self.eat(op) {
            return Ok(first);
        }
        let mut operands = vec![first, operand(self)?];
        while self.eat(op) {
            operands.push(operand(self)?);
        }
        Ok(build(operands))
    }

    fn unary(&mut self) -> Result<Type> {
        if self.eat(b'!') {
            return Ok(Type::not(self.unary()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Type> {
        self.skip_ws();
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        match c {
            b'(' => {
                self.pos += 1;
                let t = self.entry_expr()?;
                self.expect(b')')?;
                Ok(t)
            }
            b'[' => self.array(),
            b'{' => self.braces(),
            b'"' => Ok(Type::exact(self.string_literal()?)),
            b'/' => self.pattern(),
            b'.' => match self.range_op() {
                Some(inclusive) => {
                    let max = self.range_bound()?;
                    Ok(range(None, max, inclusive))
                }
                None => Err(self.error("unexpected '.'")),
            },
            b'-' | b'0'..=b'9' => {
                let min = self.number()?;
                match self.range_op() {
                    Some(inclusive) => {
                        let max = self.range_bound()?;
                        Ok(range(Some(min), max, inclusive))
                    }
                    None => Ok(Type::exact(min.into_value())),
                }
            }
            c if is_ident_start(c) => self.keyword(),
            _ => {
                let found = self.src[self.pos..].chars().next().unwrap_or(' ');
                Err(self.error(format!("unexpected character '{found}'")))
            }
        }
    }

    fn keyword(&mut self) -> Result<Type> {
        let start = self.pos;
        let word = self.ident();
        let t = match word {
            "any" => Type::any(),
            "bool" => Type::boolean(),
            "true" => Type::exact(true),
            "false" => Type::exact(false),
            "nil" => Type::nil(),
            "error" => match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    self.violation()?
                }
                _ => Type::error(),
            },
            "inf" => Type::exact(f64::INFINITY),
            "NaN" => Type::exact(f64::NAN),
            "int" => Type::integer(),
            "float" => Type::float(),
            "string" => match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    let (min, max) = self.size_tail()?;
                    Type::string_sized(min, max)
                }
                _ => Type::string(),
            },
            "binary" => match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(b'"') {
                        let encoded = self.string_literal()?;
                        self.expect(b']')?;
                        Type::exact(Binary::from_base64(&encoded)?)
                    } else {
                        let (min, max) = self.size_tail()?;
                        Type::binary_sized(min, max)
                    }
                }
                _ => Type::binary(),
            },
            "type" => match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    let inner = self.expr()?;
                    self.expect(b']')?;
                    Type::meta(inner)
                }
                _ => Type::meta_any(),
            },
            "regexp" => {
                self.expect(b'[')?;
                self.skip_ws();
                let source = self.string_literal()?;
                self.expect(b']')?;
                Type::exact(Regexp::new(&source)?)
            }
            "map" => {
                self.expect(b'[')?;
                let key = self.expr()?;
                let (min, max) = if self.eat(b',') {
                    self.size_tail()?
                } else {
                    self.expect(b']')?;
                    (0, usize::MAX)
                };
                let value = self.unary()?;
                Type::map_sized(key, value, min, max)
            }
            other => return Err(Error::parse(start, format!("unknown type name '{other}'"))),
        };
        Ok(t)
    }

    /// After the opening `[` of `error[kind,fields…]`.
    fn violation(&mut self) -> Result<Type> {
        self.skip_ws();
        let start = self.pos;
        let kind = self.string_literal()?;
        self.expect(b',')?;
        let violation = match kind.as_str() {
            "assignment" => {
                let value = self.literal()?;
                self.expect(b',')?;
                Violation::assignment(value, self.expr()?)
            }
            "size" => {
                let ty = self.expr()?;
                self.expect(b',')?;
                Violation::size(ty, self.unsigned()?)
            }
            "mapKey" => {
                let key = self.literal()?;
                self.expect(b',')?;
                Violation::map_key(self.expr()?, key)
            }
            "missingKey" => {
                let key = self.literal()?;
                self.expect(b',')?;
                self.skip_ws();
                let label = self.string_literal()?;
                self.expect(b',')?;
                Violation::missing_key(key, label, self.expr()?)
            }
            other => return Err(Error::parse(start, format!("unknown error kind '{other}'"))),
        };
        self.expect(b']')?;
        Ok(Type::exact(violation))
    }

    /// A value in literal syntax, read as its exact type and unwrapped.
    fn literal(&mut self) -> Result<Value> {
        self.skip_ws();
        let start = self.pos;
        let t = self.expr()?;
        match t.kind() {
            TypeKind::Exact(value) => Ok(value.clone()),
            TypeKind::Meta(inner) => Ok(Value::Type(inner.clone().unwrap_or_else(Type::any))),
            _ => Err(Error::parse(start, "expected a literal value")),
        }
    }

    /// `[]T`, `[min]T` or `[min,max]T`.
    fn array(&mut self) -> Result<Type> {
        self.pos += 1;
        let (min, max) = if self.eat(b']') { (0, usize::MAX) } else { self.size_tail()? };
        let element = self.unary()?;
        Ok(Type::array_sized(element, min, max))
    }

    /// Tuple `{T,...}` or record `{key:T,key?:T,...}`.
    fn braces(&mut self) -> Result<Type> {
        let start = self.pos;
        self.pos += 1;
        if self.eat(b'}') {
            return Ok(Type::record([], false));
        }
        let mut entries = Vec::new();
        let mut elements = Vec::new();
        let mut additional = false;
        loop {
            if self.additional_marker() {
                additional = true;
                break;
            }
            match self.entry_key() {
                Some((key, required)) => entries.push(StructEntry::new(key, self.expr()?, required)),
                None => elements.push(self.expr()?),
            }
            if !self.eat(b',') {
                self.expect(b'}')?;
                break;
            }
        }
        if elements.is_empty() {
            return Ok(Type::record(entries, additional));
        }
        if !entries.is_empty() || additional {
            return Err(Error::parse(start, "tuple elements and record entries cannot be mixed"));
        }
        Ok(Type::tuple(elements))
    }

    /// A closing `...}`. A `...` that starts an element such as `...2.0` is
    /// left in place.
    fn additional_marker(&mut self) -> bool {
        let start = self.pos;
        if self.eat_str("...") && self.eat(b'}') {
            return true;
        }
        self.pos = start;
        false
    }

    /// A literal followed by `:` or `?:`. Consumes nothing when the input
    /// does not start a record entry.
    fn entry_key(&mut self) -> Option<(Value, bool)> {
        let start = self.pos;
        self.skip_ws();
        let key = match self.peek() {
            Some(b'"') => self.string_literal().ok().map(Value::from),
            Some(b'-' | b'0'..=b'9') => self.number().ok().map(Num::into_value),
            Some(c) if is_ident_start(c) => Some(match self.ident() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "nil" => Value::Nil,
                "inf" => Value::float(f64::INFINITY),
                "NaN" => Value::float(f64::NAN),
                word => Value::from(word),
            }),
            _ => None,
        };
        let entry = key.and_then(|key| {
            self.skip_ws();
            let required = !self.eat(b'?');
            self.eat(b':').then_some((key, required))
        });
        if entry.is_none() {
            self.pos = start;
        }
        entry
    }

    fn pattern(&mut self) -> Result<Type> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut source = Vec::new();
        let mut i = start + 1;
        loop {
            match bytes.get(i) {
                None => return Err(Error::parse(start, "unterminated pattern")),
                Some(b'\\') if bytes.get(i + 1) == Some(&b'/') => {
                    source.push(b'/');
                    i += 2;
                }
                Some(b'/') => break,
                Some(&b) => {
                    source.push(b);
                    i += 1;
                }
            }
        }
        self.pos = i + 1;
        let source = String::from_utf8(source).map_err(|e| Error::parse(start, e.to_string()))?;
        Ok(Type::pattern(Regexp::new(&source)?))
    }

    // ————————————————————————————————————————————————————————————————————————
    // TOKENS
    // ————————————————————————————————————————————————————————————————————————

    /// After the opening `[`: `min]` or `min,max]`.
    fn size_tail(&mut self) -> Result<(usize, usize)> {
        let min = self.unsigned()?;
        let max = if self.eat(b',') { self.unsigned()? } else { usize::MAX };
        self.expect(b']')?;
        Ok((min, max))
    }

    fn unsigned(&mut self) -> Result<usize> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a size"));
        }
        self.src[start..self.pos].parse().map_err(|e: std::num::ParseIntError| Error::parse(start, e.to_string()))
    }

    fn number(&mut self) -> Result<Num> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let digit_at = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);
        let mut i = start;
        if bytes.get(i) == Some(&b'-') {
            i += 1;
            if self.src[i..].starts_with("inf") {
                self.pos = i + 3;
                return Ok(Num::Float(f64::NEG_INFINITY));
            }
        }
        let digits = i;
        while digit_at(i) {
            i += 1;
        }
        if i == digits {
            return Err(Error::parse(start, "expected a number"));
        }
        let mut float = false;
        if bytes.get(i) == Some(&b'.') && digit_at(i + 1) {
            float = true;
            i += 1;
            while digit_at(i) {
                i += 1;
            }
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+' | b'-')) {
                j += 1;
            }
            if digit_at(j) {
                float = true;
                i = j;
                while digit_at(i) {
                    i += 1;
                }
            }
        }
        self.pos = i;
        let text = &self.src[start..i];
        if float {
            text.parse().map(Num::Float).map_err(|e: std::num::ParseFloatError| Error::parse(start, e.to_string()))
        } else {
            text.parse().map(Num::Int).map_err(|e: std::num::ParseIntError| Error::parse(start, e.to_string()))
        }
    }

    /// `..` is inclusive, `...` exclusive.
    fn range_op(&mut self) -> Option<bool> {
        if self.src[self.pos..].starts_with("...") {
            self.pos += 3;
            Some(false)
        } else if self.src[self.pos..].starts_with("..") {
            self.pos += 2;
            Some(true)
        } else {
            None
        }
    }

    fn range_bound(&mut self) -> Result<Option<Num>> {
        let bytes = self.src.as_bytes();
        let starts_number = match bytes.get(self.pos) {
            Some(b'-') => bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        if starts_number { self.number().map(Some) } else { Ok(None) }
    }

    fn string_literal(&mut self) -> Result<String> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        loop {
            match bytes.get(i) {
                None => return Err(Error::parse(start, "unterminated string")),
                Some(b'\\') => i += 2,
                Some(b'"') => break,
                Some(_) => i += 1,
            }
        }
        self.pos = i + 1;
        serde_json::from_str(&self.src[start..=i]).map_err(|e| Error::parse(start, e.to_string()))
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| is_ident_start(c) || c.is_ascii_digit()) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    // ————————————————————————————————————————————————————————————————————————
    // CURSOR
    // ————————————————————————————————————————————————————————————————————————

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c as char)))
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.pos, message)
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn range(min: Option<Num>, max: Option<Num>, inclusive: bool) -> Type {
    if matches!(min, Some(Num::Float(_))) || matches!(max, Some(Num::Float(_))) {
        Type::float_range(
            min.map_or(f64::MIN, Num::as_f64),
            max.map_or(f64::MAX, Num::as_f64),
            inclusive,
        )
    } else {
        let bound = |n: Option<Num>, default: i64| match n {
            Some(Num::Int(i)) => i,
            _ => default,
        };
        Type::int_range(bound(min, i64::MIN), bound(max, i64::MAX), inclusive)
    }
}
