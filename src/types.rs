//! The type algebra.
//!
//! A [`Type`] is an immutable, cheaply clonable description of a set of
//! values. The closed set of kinds lives in [`TypeKind`]; every operation
//! (assignability, instance test, equality, hashing, rendering) is an
//! exhaustive match over it.
//!
//! Types may be self-referential through [`Type::recursive`]. Every walk over
//! a type graph carries a guard so it terminates on such graphs.
pub mod assignable;
pub mod equality;
pub mod ident;
pub mod instance;
pub mod record;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;

use crate::map::{FrozenMap, MapEntry};
use crate::value::{Regexp, Value};

pub use ident::TypeIdentifier;
pub use record::{StructEntry, StructType, default_key_label};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
pub struct Type(Arc<Node>);

enum Node {
    Kind(TypeKind),
    /// Back-reference created by [`Type::recursive`], bound once the body is built.
    Deferred(OnceLock<Type>),
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Any,
    Boolean,
    /// Any error value.
    Error,
    /// `None` is the type of every type.
    Meta(Option<Type>),
    AnyOf(Vec<Type>),
    OneOf(Vec<Type>),
    AllOf(Vec<Type>),
    Not(Type),
    String(SizeBounds),
    Binary(SizeBounds),
    Array { element: Type, size: SizeBounds },
    Tuple(Vec<Type>),
    Map { key: Type, value: Type, size: SizeBounds },
    Struct(StructType),
    MapEntry { key: Type, value: Type },
    IntRange(IntRange),
    FloatRange(FloatRange),
    Pattern(Regexp),
    Native(NativeType),
    /// Singleton set holding exactly this value.
    Exact(Value),
}

/// Size constraint of the sized kinds (string, binary, array, map).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SizeBounds {
    min: usize,
    max: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntRange {
    min: i64,
    max: i64,
    inclusive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatRange {
    min: OrderedFloat<f64>,
    max: OrderedFloat<f64>,
    inclusive: bool,
}

/// Rust type wrapped by [`Value::Native`](crate::value::Value::Native).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeType {
    id: TypeId,
    name: &'static str,
}

static ANY: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::Any));
static BOOLEAN: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::Boolean));
static ERROR: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::Error));
static STRING: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::String(SizeBounds::UNBOUNDED)));
static BINARY: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::Binary(SizeBounds::UNBOUNDED)));
static INTEGER: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::IntRange(IntRange::UNBOUNDED)));
static FLOAT: Lazy<Type> = Lazy::new(|| Type::from_kind(TypeKind::FloatRange(FloatRange::UNBOUNDED)));

static UNBOUND_KIND: TypeKind = TypeKind::Any;

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Type {
    fn from_kind(kind: TypeKind) -> Self {
        Type(Arc::new(Node::Kind(kind)))
    }

    pub fn any() -> Self {
        ANY.clone()
    }

    pub fn boolean() -> Self {
        BOOLEAN.clone()
    }

    pub fn error() -> Self {
        ERROR.clone()
    }

    pub fn nil() -> Self {
        Type::exact(Value::Nil)
    }

    /// The type of type values assignable to `t`. `type[any]` collapses to
    /// the unparameterized meta type.
    pub fn meta(t: Type) -> Self {
        if matches!(t.kind(), TypeKind::Any) {
            Type::meta_any()
        } else {
            Type::from_kind(TypeKind::Meta(Some(t)))
        }
    }

    pub fn meta_any() -> Self {
        Type::from_kind(TypeKind::Meta(None))
    }

    /// The empty set, `!any`.
    pub fn nothing() -> Self {
        Type::not(Type::any())
    }

    /// Union. Without operands this is [`Type::nothing`]; a single operand
    /// is returned as is.
    pub fn any_of(operands: Vec<Type>) -> Self {
        Type::composite(operands, Type::nothing, TypeKind::AnyOf)
    }

    /// Exclusive union. Duplicated operands are kept: they cancel out.
    pub fn one_of(operands: Vec<Type>) -> Self {
        Type::composite(operands, Type::nothing, TypeKind::OneOf)
    }

    /// Intersection. Without operands this is `any`.
    pub fn all_of(operands: Vec<Type>) -> Self {
        Type::composite(operands, Type::any, TypeKind::AllOf)
    }

    /// Intersection of values read as types: a type value stands for itself,
    /// any other value for its exact type.
    pub fn all_of_values(operands: Vec<Value>) -> Self {
        Type::all_of(operands.iter().map(Value::as_type_or_exact).collect())
    }

    fn composite(mut operands: Vec<Type>, empty: fn() -> Type, build: fn(Vec<Type>) -> TypeKind) -> Self {
        if operands.len() > 1 {
            return Type::from_kind(build(operands));
        }
        operands.pop().unwrap_or_else(empty)
    }

    pub fn not(operand: Type) -> Self {
        Type::from_kind(TypeKind::Not(operand))
    }

    pub fn string() -> Self {
        STRING.clone()
    }

    pub fn string_sized(min: usize, max: usize) -> Self {
        Type::from_kind(TypeKind::String(SizeBounds::new(min, max)))
    }

    pub fn binary() -> Self {
        BINARY.clone()
    }

    pub fn binary_sized(min: usize, max: usize) -> Self {
        Type::from_kind(TypeKind::Binary(SizeBounds::new(min, max)))
    }

    pub fn array(element: Type) -> Self {
        Type::array_sized(element, 0, usize::MAX)
    }

    /// An array type that only admits the empty array is the exact empty array.
    pub fn array_sized(element: Type, min: usize, max: usize) -> Self {
        let size = SizeBounds::new(min, max);
        if size.max == 0 {
            return Type::exact(Vec::<Value>::new());
        }
        Type::from_kind(TypeKind::Array { element, size })
    }

    /// A tuple of exact types is the exact array of their values.
    pub fn tuple(elements: Vec<Type>) -> Self {
        match exact_values(&elements) {
            Some(values) => Type::exact(values),
            None => Type::from_kind(TypeKind::Tuple(elements)),
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::map_sized(key, value, 0, usize::MAX)
    }

    /// A map type that only admits the empty map is the exact empty map.
    pub fn map_sized(key: Type, value: Type, min: usize, max: usize) -> Self {
        let size = SizeBounds::new(min, max);
        if size.max == 0 {
            return Type::exact(FrozenMap::new());
        }
        Type::from_kind(TypeKind::Map { key, value, size })
    }

    /// Record type. Later entries with an already declared key replace the
    /// earlier declaration in place.
    pub fn record(entries: impl IntoIterator<Item = StructEntry>, additional: bool) -> Self {
        Type::from(StructType::new(entries, additional))
    }

    /// An entry of two exact types is the exact entry.
    pub fn map_entry(key: Type, value: Type) -> Self {
        match (key.exact_value(), value.exact_value()) {
            (Some(k), Some(v)) => Type::exact(MapEntry::new(k.clone(), v.clone())),
            _ => Type::from_kind(TypeKind::MapEntry { key, value }),
        }
    }

    pub fn integer() -> Self {
        INTEGER.clone()
    }

    pub fn int_range(min: i64, max: i64, inclusive: bool) -> Self {
        Type::from_kind(TypeKind::IntRange(IntRange::new(min, max, inclusive)))
    }

    pub fn float() -> Self {
        FLOAT.clone()
    }

    pub fn float_range(min: f64, max: f64, inclusive: bool) -> Self {
        Type::from_kind(TypeKind::FloatRange(FloatRange::new(min, max, inclusive)))
    }

    pub fn pattern(regexp: Regexp) -> Self {
        Type::from_kind(TypeKind::Pattern(regexp))
    }

    /// Singleton type. A type value yields its meta type instead.
    pub fn exact(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Type(t) => Type::meta(t),
            value => Type::from_kind(TypeKind::Exact(value)),
        }
    }

    pub fn native<T: Any>() -> Self {
        Type::from_native(NativeType::of::<T>())
    }

    pub fn from_native(native: NativeType) -> Self {
        Type::from_kind(TypeKind::Native(native))
    }

    /// Build a self-referential type. `build` receives a handle that stands
    /// for the type being built; the handle is bound to the returned body.
    ///
    /// The resulting graph is an `Arc` cycle and is never freed.
    pub fn recursive(build: impl FnOnce(Type) -> Type) -> Self {
        let handle = Type(Arc::new(Node::Deferred(OnceLock::new())));
        let body = build(handle.clone());
        if Type::ptr_eq(&body, &handle) {
            return Type::any();
        }
        if let Node::Deferred(cell) = &*handle.0 {
            let _ = cell.set(body.clone());
        }
        body
    }

    pub fn parse(text: &str) -> crate::Result<Self> {
        crate::parse::parse(text)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl Type {
    /// The kind of this type, looking through back-references. An unbound
    /// back-reference reads as `any`.
    pub fn kind(&self) -> &TypeKind {
        match &*self.resolved().0 {
            Node::Kind(kind) => kind,
            Node::Deferred(_) => &UNBOUND_KIND,
        }
    }

    pub(crate) fn resolved(&self) -> &Type {
        match &*self.0 {
            Node::Deferred(cell) => match cell.get() {
                Some(target) => target.resolved(),
                None => self,
            },
            Node::Kind(_) => self,
        }
    }

    /// Address of the resolved node; the identity used by recursion guards.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.resolved().0) as *const () as usize
    }

    /// Identity comparison, looking through back-references.
    pub fn ptr_eq(a: &Type, b: &Type) -> bool {
        a.addr() == b.addr()
    }

    pub fn identifier(&self) -> TypeIdentifier {
        match self.kind() {
            TypeKind::Any => TypeIdentifier::Any,
            TypeKind::Boolean => TypeIdentifier::Boolean,
            TypeKind::Error => TypeIdentifier::Error,
            TypeKind::Meta(_) => TypeIdentifier::Meta,
            TypeKind::AnyOf(_) => TypeIdentifier::AnyOf,
            TypeKind::OneOf(_) => TypeIdentifier::OneOf,
            TypeKind::AllOf(_) => TypeIdentifier::AllOf,
            TypeKind::Not(_) => TypeIdentifier::Not,
            TypeKind::String(_) => TypeIdentifier::StringSized,
            TypeKind::Binary(_) => TypeIdentifier::Binary,
            TypeKind::Array { .. } => TypeIdentifier::Array,
            TypeKind::Tuple(_) => TypeIdentifier::Tuple,
            TypeKind::Map { .. } => TypeIdentifier::Map,
            TypeKind::Struct(_) => TypeIdentifier::Struct,
            TypeKind::MapEntry { .. } => TypeIdentifier::MapEntry,
            TypeKind::IntRange(_) => TypeIdentifier::IntegerRange,
            TypeKind::FloatRange(_) => TypeIdentifier::FloatRange,
            TypeKind::Pattern(_) => TypeIdentifier::StringPattern,
            TypeKind::Native(_) => TypeIdentifier::Native,
            TypeKind::Exact(value) => match value {
                Value::Nil => TypeIdentifier::Nil,
                Value::Bool(true) => TypeIdentifier::True,
                Value::Bool(false) => TypeIdentifier::False,
                Value::Int(_) => TypeIdentifier::IntegerExact,
                Value::Float(_) => TypeIdentifier::FloatExact,
                Value::String(_) => TypeIdentifier::StringExact,
                Value::Binary(_) => TypeIdentifier::BinaryExact,
                Value::Regexp(_) => TypeIdentifier::RegexpExact,
                Value::Array(_) => TypeIdentifier::ArrayExact,
                Value::Map(_) => TypeIdentifier::MapExact,
                Value::Entry(_) => TypeIdentifier::MapEntryExact,
                Value::Type(_) => TypeIdentifier::Meta,
                Value::Violation(_) => TypeIdentifier::ErrorExact,
                Value::Native(_) => TypeIdentifier::Native,
            },
        }
    }

    /// The meta type describing this type.
    pub fn type_of(&self) -> Type {
        Type::meta(self.clone())
    }

    /// True iff every value matched by `other` is also matched by `self`.
    pub fn assignable(&self, other: &Type) -> bool {
        assignable::assignable(self, other, &mut Guard::default())
    }

    /// True iff `value` is a member of the set this type describes.
    pub fn instance(&self, value: &Value) -> bool {
        instance::instance(self, value, &mut Guard::default())
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.kind(), TypeKind::Exact(_))
    }

    pub fn exact_value(&self) -> Option<&Value> {
        match self.kind() {
            TypeKind::Exact(value) => Some(value),
            _ => None,
        }
    }

    pub fn operands(&self) -> Option<&[Type]> {
        match self.kind() {
            TypeKind::AnyOf(ops) | TypeKind::OneOf(ops) | TypeKind::AllOf(ops) => Some(ops),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self.kind() {
            TypeKind::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// Bounds of the sized kinds: string, binary, array and map.
    pub fn as_sized(&self) -> Option<SizeBounds> {
        match self.kind() {
            TypeKind::String(size) | TypeKind::Binary(size) => Some(*size),
            TypeKind::Array { size, .. } | TypeKind::Map { size, .. } => Some(*size),
            _ => None,
        }
    }

    pub fn as_int_range(&self) -> Option<IntRange> {
        match self.kind() {
            TypeKind::IntRange(range) => Some(*range),
            _ => None,
        }
    }

    pub fn as_float_range(&self) -> Option<FloatRange> {
        match self.kind() {
            TypeKind::FloatRange(range) => Some(*range),
            _ => None,
        }
    }

    /// Kinds whose instances are maps; the only types a map can be bound to.
    pub fn describes_maps(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Map { .. } | TypeKind::Struct(_) | TypeKind::Exact(Value::Map(_))
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render::type_string(self))
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

/// A closed record whose entries are all required and exact admits a single
/// map and becomes that exact map.
impl From<StructType> for Type {
    fn from(st: StructType) -> Self {
        if !st.additional() && st.entries().iter().all(StructEntry::required) {
            let pairs: Option<FrozenMap> = st
                .entries()
                .iter()
                .map(|e| e.value().exact_value().map(|v| (e.key().clone(), v.clone())))
                .collect();
            if let Some(map) = pairs {
                return Type::exact(map);
            }
        }
        Type::from_kind(TypeKind::Struct(st))
    }
}

fn exact_values(types: &[Type]) -> Option<Vec<Value>> {
    types.iter().map(|t| t.exact_value().cloned()).collect()
}

// ————————————————————————————————————————————————————————————————————————————
// BOUNDS
// ————————————————————————————————————————————————————————————————————————————

impl SizeBounds {
    pub const UNBOUNDED: SizeBounds = SizeBounds { min: 0, max: usize::MAX };

    /// Swapped bounds are reordered.
    pub fn new(min: usize, max: usize) -> Self {
        if max < min { SizeBounds { min: max, max: min } } else { SizeBounds { min, max } }
    }

    pub fn min(self) -> usize {
        self.min
    }

    pub fn max(self) -> usize {
        self.max
    }

    pub fn unbounded(self) -> bool {
        self.min == 0 && self.max == usize::MAX
    }

    pub fn contains(self, size: usize) -> bool {
        self.min <= size && size <= self.max
    }

    pub(crate) fn covers(self, other: SizeBounds) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

impl IntRange {
    pub const UNBOUNDED: IntRange = IntRange { min: i64::MIN, max: i64::MAX, inclusive: true };

    /// An unbounded maximum is always inclusive.
    pub fn new(min: i64, max: i64, inclusive: bool) -> Self {
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        IntRange { min, max, inclusive: inclusive || max == i64::MAX }
    }

    pub fn min(self) -> i64 {
        self.min
    }

    pub fn max(self) -> i64 {
        self.max
    }

    pub fn inclusive(self) -> bool {
        self.inclusive
    }

    pub fn unbounded(self) -> bool {
        self.min == i64::MIN && self.max == i64::MAX
    }

    pub fn contains(self, i: i64) -> bool {
        i >= self.min && if self.inclusive { i <= self.max } else { i < self.max }
    }

    fn last(self) -> i128 {
        if self.inclusive { i128::from(self.max) } else { i128::from(self.max) - 1 }
    }

    pub(crate) fn covers(self, other: IntRange) -> bool {
        if other.last() < i128::from(other.min) {
            return true;
        }
        self.min <= other.min && other.last() <= self.last()
    }
}

impl FloatRange {
    pub const UNBOUNDED: FloatRange =
        FloatRange { min: OrderedFloat(f64::MIN), max: OrderedFloat(f64::MAX), inclusive: true };

    /// Non-finite bounds read as the unbounded sentinels.
    pub fn new(min: f64, max: f64, inclusive: bool) -> Self {
        let (min, max) = (finite(min, f64::MIN), finite(max, f64::MAX));
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        FloatRange { min: OrderedFloat(min), max: OrderedFloat(max), inclusive: inclusive || max == f64::MAX }
    }

    pub fn min(self) -> f64 {
        self.min.0
    }

    pub fn max(self) -> f64 {
        self.max.0
    }

    pub fn inclusive(self) -> bool {
        self.inclusive
    }

    pub fn unbounded(self) -> bool {
        self.min.0 == f64::MIN && self.max.0 == f64::MAX
    }

    pub fn contains(self, f: f64) -> bool {
        f >= self.min.0 && if self.inclusive { f <= self.max.0 } else { f < self.max.0 }
    }

    pub(crate) fn covers(self, other: FloatRange) -> bool {
        self.min <= other.min
            && (other.max < self.max || (other.max == self.max && (self.inclusive || !other.inclusive)))
    }
}

fn finite(f: f64, nan: f64) -> f64 {
    if f.is_nan() { nan } else { f.clamp(f64::MIN, f64::MAX) }
}

impl NativeType {
    pub fn of<T: Any>() -> Self {
        NativeType { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECURSION GUARD
// ————————————————————————————————————————————————————————————————————————————

/// Pairs currently being visited on the call path, each with the number of
/// structural steps (into an element, entry or meta type) taken before it.
#[derive(Default)]
pub(crate) struct Guard {
    path: Vec<(usize, usize, usize)>,
    depth: usize,
}

/// Outcome of [`Guard::enter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    /// First visit on this path; pair it with [`Guard::leave`].
    Fresh,
    /// The pair is already on the path and at least one structural step was
    /// taken since, so the cycle consumes structure.
    Productive,
    /// The pair is already on the path and no structure was consumed.
    Unproductive,
}

impl Guard {
    pub(crate) fn enter(&mut self, a: usize, b: usize) -> Visit {
        match self.path.iter().find(|(x, y, _)| (*x, *y) == (a, b)) {
            Some(&(_, _, depth)) if depth < self.depth => Visit::Productive,
            Some(_) => Visit::Unproductive,
            None => {
                self.path.push((a, b, self.depth));
                Visit::Fresh
            }
        }
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Run `f` one structural step deeper.
    pub(crate) fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}
