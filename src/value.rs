//! The value universe described by [`Type`].
//!
//! Every `Value` is immutable once built. Containers hold their children behind
//! `Arc`, so cloning is cheap and a value graph can never contain a cycle.
pub mod binary;

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use regex::Regex;

use crate::map::{FrozenMap, Map, MapEntry};
use crate::types::{NativeType, Type};
use crate::violation::Violation;

pub use binary::Binary;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(Arc<str>),
    Binary(Binary),
    Regexp(Regexp),
    Array(Array),
    Map(FrozenMap),
    Entry(MapEntry),
    Type(Type),
    Violation(Arc<Violation>),
    Native(Native),
}

/// Frozen sequence of values. Also the snapshot type returned by map
/// `keys()`, `values()` and `entries()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Array(Arc<[Value]>);

/// Compiled regular expression compared by its source text.
#[derive(Clone, Debug)]
pub struct Regexp(Arc<Regex>);

/// Opaque host value. Two natives are equal only when they share the same
/// allocation.
#[derive(Clone)]
pub struct Native {
    value: Arc<dyn Any + Send + Sync>,
    ty: NativeType,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn float(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }

    /// The exact type of this value. Type values yield `type[T]` and natives
    /// yield their native type.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Type(t) => Type::meta(t.clone()),
            Value::Native(n) => Type::from_native(n.ty),
            _ => Type::exact(self.clone()),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FrozenMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Interpret this value where a type is expected: type values stand for
    /// themselves, everything else for its exact type.
    pub fn as_type_or_exact(&self) -> Type {
        match self {
            Value::Type(t) => t.clone(),
            _ => self.type_of(),
        }
    }

    /// Natural ordering used to sort entries taken from unordered sources.
    /// Values of different kinds order by kind; numbers compare numerically
    /// within their own kind only.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let o = x.natural_cmp(y);
                    if o != Ordering::Equal {
                        return o;
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) if a.rank() == b.rank() => a.to_string().cmp(&b.to_string()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Regexp(_) => "regexp",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Entry(_) => "entry",
            Value::Type(_) => "type",
            Value::Violation(_) => "error",
            Value::Native(_) => "native",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::Binary(_) => 5,
            Value::Regexp(_) => 6,
            Value::Array(_) => 7,
            Value::Map(_) => 8,
            Value::Entry(_) => 9,
            Value::Type(_) => 10,
            Value::Violation(_) => 11,
            Value::Native(_) => 12,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Type(t) => write!(f, "{t}"),
            Value::Violation(v) => write!(f, "{v}"),
            _ => f.write_str(&crate::render::value_string(self)),
        }
    }
}

impl Array {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Array(values.into())
    }
}

impl Regexp {
    pub fn new(source: &str) -> crate::Result<Self> {
        Ok(Regexp(Arc::new(Regex::new(source)?)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl From<Regex> for Regexp {
    fn from(regex: Regex) -> Self {
        Regexp(Arc::new(regex))
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Regexp {}

impl Hash for Regexp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Native {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Native { value: Arc::new(value), ty: NativeType::of::<T>() }
    }

    pub fn native_type(&self) -> NativeType {
        self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Eq for Native {}

impl Hash for Native {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.value) as *const () as usize).hash(state);
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native({})", self.ty.name())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Value::Binary(b)
    }
}

impl From<Regexp> for Value {
    fn from(r: Regexp) -> Self {
        Value::Regexp(r)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(Array::from(values))
    }
}

impl From<FrozenMap> for Value {
    fn from(m: FrozenMap) -> Self {
        Value::Map(m)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m.freeze())
    }
}

impl From<MapEntry> for Value {
    fn from(e: MapEntry) -> Self {
        Value::Entry(e)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Value::Type(t)
    }
}

impl From<Violation> for Value {
    fn from(v: Violation) -> Self {
        Value::Violation(Arc::new(v))
    }
}

impl From<Native> for Value {
    fn from(n: Native) -> Self {
        Value::Native(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_display_quoted() {
        assert_eq!(Value::from("b").to_string(), r#""b""#);
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Nil.to_string(), "nil");
    }

    #[test]
    fn int_and_float_never_coerce() {
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn natural_order_groups_by_kind() {
        let mut xs = vec![Value::from("b"), Value::from(2), Value::Nil, Value::from("a"), Value::from(1)];
        xs.sort_by(Value::natural_cmp);
        assert_eq!(
            xs,
            vec![Value::Nil, Value::from(1), Value::from(2), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn regexps_compare_by_source() {
        let a = Regexp::new("a+").unwrap();
        let b = Regexp::new("a+").unwrap();
        assert_eq!(Value::from(a), Value::from(b));
    }

    #[test]
    fn natives_compare_by_identity() {
        let a = Native::new(42u8);
        let b = Native::new(42u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u8>(), Some(&42));
        assert!(a.downcast_ref::<u16>().is_none());
    }

    #[test]
    fn type_values_have_meta_types() {
        let t = Type::string();
        let v = Value::from(t.clone());
        assert_eq!(v.type_of(), Type::meta(t));
        assert!(v.type_of().instance(&v));
    }
}
