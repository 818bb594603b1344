//! Ordered key-value maps.
//!
//! [`Map`] is the mutable, single-owner form. It may be bound to a map,
//! record or exact-map type, after which every mutation is checked against
//! that type. [`FrozenMap`] is the shared, immutable form; it has no
//! mutators and `frozen()` on it returns the same allocation.
//!
//! Both preserve insertion order. Replacing the value of a present key keeps
//! the key's position.
pub mod codec;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Iter;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::indent::Indenter;
use crate::types::instance::struct_conforms;
use crate::types::{Guard, Type, TypeKind, default_key_label};
use crate::value::{Array, Value};
use crate::violation::Violation;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Default)]
pub struct FrozenMap(Arc<IndexMap<Value, Value>>);

#[derive(Clone, Default)]
pub struct Map {
    entries: IndexMap<Value, Value>,
    ty: Option<Type>,
}

/// A single key-value association.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapEntry(Arc<(Value, Value)>);

/// Read-only queries shared by both map forms.
pub trait ReadMap {
    fn associations(&self) -> &IndexMap<Value, Value>;

    fn each(&self, mut f: impl FnMut(&Value, &Value)) {
        self.associations().iter().for_each(|(k, v)| f(k, v));
    }

    fn each_key(&self, f: impl FnMut(&Value)) {
        self.associations().keys().for_each(f);
    }

    fn each_value(&self, f: impl FnMut(&Value)) {
        self.associations().values().for_each(f);
    }

    fn all(&self, mut predicate: impl FnMut(&Value, &Value) -> bool) -> bool {
        self.associations().iter().all(|(k, v)| predicate(k, v))
    }

    fn any(&self, mut predicate: impl FnMut(&Value, &Value) -> bool) -> bool {
        self.associations().iter().any(|(k, v)| predicate(k, v))
    }

    fn all_keys(&self, predicate: impl FnMut(&Value) -> bool) -> bool {
        self.associations().keys().all(predicate)
    }

    fn any_key(&self, predicate: impl FnMut(&Value) -> bool) -> bool {
        self.associations().keys().any(predicate)
    }

    fn all_values(&self, predicate: impl FnMut(&Value) -> bool) -> bool {
        self.associations().values().all(predicate)
    }

    fn any_value(&self, predicate: impl FnMut(&Value) -> bool) -> bool {
        self.associations().values().any(predicate)
    }

    /// Snapshot of the keys.
    fn keys(&self) -> Array {
        self.associations().keys().cloned().collect()
    }

    /// Snapshot of the values.
    fn values(&self) -> Array {
        self.associations().values().cloned().collect()
    }

    /// Snapshot of the entries, each a [`Value::Entry`].
    fn entries(&self) -> Array {
        self.associations()
            .iter()
            .map(|(k, v)| Value::Entry(MapEntry::new(k.clone(), v.clone())))
            .collect()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FROZEN
// ————————————————————————————————————————————————————————————————————————————

impl FrozenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a source without a meaningful order; entries are sorted
    /// once by the natural order of their keys.
    pub fn from_unordered(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut entries: Vec<(Value, Value)> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.natural_cmp(&b.0));
        entries.into_iter().collect()
    }

    pub fn associations(&self) -> &IndexMap<Value, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `None` when the key is absent. A key bound to nil yields `Some(&Value::Nil)`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> Iter<'_, Value, Value> {
        self.0.iter()
    }

    /// Already frozen: returns the same allocation.
    pub fn frozen(&self) -> FrozenMap {
        self.clone()
    }

    pub fn ptr_eq(a: &FrozenMap, b: &FrozenMap) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// An untyped mutable copy.
    pub fn to_mutable(&self) -> Map {
        Map { entries: (*self.0).clone(), ty: None }
    }

    pub fn with(&self, key: impl Into<Value>, value: impl Into<Value>) -> FrozenMap {
        let mut entries = (*self.0).clone();
        entries.insert(key.into(), value.into());
        FrozenMap(Arc::new(entries))
    }

    pub fn without(&self, key: &Value) -> FrozenMap {
        if !self.contains_key(key) {
            return self.clone();
        }
        let mut entries = (*self.0).clone();
        entries.shift_remove(key);
        FrozenMap(Arc::new(entries))
    }

    pub fn without_all<'a>(&self, keys: impl IntoIterator<Item = &'a Value>) -> FrozenMap {
        let mut entries = (*self.0).clone();
        for key in keys {
            entries.shift_remove(key);
        }
        FrozenMap(Arc::new(entries))
    }

    /// Union of both maps. Where both define a key the value of `other` wins.
    pub fn merge(&self, other: &impl ReadMap) -> FrozenMap {
        FrozenMap(Arc::new(merged(&self.0, other.associations())))
    }

    /// Same keys, values replaced by `mapper`.
    pub fn map(&self, mapper: impl FnMut(&Value, &Value) -> Value) -> FrozenMap {
        FrozenMap(Arc::new(mapped(&self.0, mapper)))
    }

    /// One entry per line, nested maps indented one level deeper.
    pub fn append_to(&self, out: &mut impl Indenter) {
        append_entries(&self.0, out);
    }
}

impl ReadMap for FrozenMap {
    fn associations(&self) -> &IndexMap<Value, Value> {
        &self.0
    }
}

impl FromIterator<(Value, Value)> for FrozenMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        FrozenMap(Arc::new(iter.into_iter().collect()))
    }
}

impl<'a> IntoIterator for &'a FrozenMap {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Order-insensitive: two maps are equal when they hold the same associations.
impl PartialEq for FrozenMap {
    fn eq(&self, other: &Self) -> bool {
        FrozenMap::ptr_eq(self, other) || *self.0 == *other.0
    }
}

impl Eq for FrozenMap {}

impl Hash for FrozenMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        state.write_u64(associations_hash(&self.0));
    }
}

impl fmt::Debug for FrozenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for FrozenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render::value_string(&Value::Map(self.clone())))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MUTABLE
// ————————————————————————————————————————————————————————————————————————————

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a source without a meaningful order; entries are sorted
    /// once by the natural order of their keys.
    pub fn from_unordered(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        FrozenMap::from_unordered(entries).to_mutable()
    }

    pub fn associations(&self) -> &IndexMap<Value, Value> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` when the key is absent. A key bound to nil yields `Some(&Value::Nil)`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> Iter<'_, Value, Value> {
        self.entries.iter()
    }

    /// The type this map is bound to, if any.
    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Insert or replace. Returns the previous value.
    pub fn put(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Option<Value>> {
        let (key, value) = (key.into(), value.into());
        if let Some(ty) = &self.ty {
            check_put(ty, &self.entries, &key, &value)?;
        }
        Ok(self.entries.insert(key, value))
    }

    /// Insert or replace every association of `other`. On a typed map either
    /// all of them are applied or none is.
    pub fn put_all(&mut self, other: &impl ReadMap) -> Result<()> {
        let Some(ty) = &self.ty else {
            for (k, v) in other.associations() {
                self.entries.insert(k.clone(), v.clone());
            }
            return Ok(());
        };
        let mut staged = self.entries.clone();
        for (k, v) in other.associations() {
            check_put(ty, &staged, k, v)?;
            staged.insert(k.clone(), v.clone());
        }
        self.entries = staged;
        Ok(())
    }

    /// Remove `key`. Absent keys are a no-op returning `None`.
    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>> {
        if !self.entries.contains_key(key) {
            return Ok(None);
        }
        if let Some(ty) = &self.ty {
            check_remove(ty, &self.entries, key)?;
        }
        Ok(self.entries.shift_remove(key))
    }

    /// On a typed map either all keys are removed or none is.
    pub fn remove_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a Value>) -> Result<()> {
        let Some(ty) = &self.ty else {
            for key in keys {
                self.entries.shift_remove(key);
            }
            return Ok(());
        };
        let mut staged = self.entries.clone();
        for key in keys {
            if staged.contains_key(key) {
                check_remove(ty, &staged, key)?;
                staged.shift_remove(key);
            }
        }
        self.entries = staged;
        Ok(())
    }

    /// Untyped copy with `key` bound to `value`.
    pub fn with(&self, key: impl Into<Value>, value: impl Into<Value>) -> Map {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value.into());
        Map { entries, ty: None }
    }

    /// Untyped copy without `key`.
    pub fn without(&self, key: &Value) -> Map {
        let mut entries = self.entries.clone();
        entries.shift_remove(key);
        Map { entries, ty: None }
    }

    pub fn without_all<'a>(&self, keys: impl IntoIterator<Item = &'a Value>) -> Map {
        let mut entries = self.entries.clone();
        for key in keys {
            entries.shift_remove(key);
        }
        Map { entries, ty: None }
    }

    /// Untyped union of both maps. Where both define a key the value of
    /// `other` wins.
    pub fn merge(&self, other: &impl ReadMap) -> Map {
        Map { entries: merged(&self.entries, other.associations()), ty: None }
    }

    /// Untyped copy with the same keys, values replaced by `mapper`.
    pub fn map(&self, mapper: impl FnMut(&Value, &Value) -> Value) -> Map {
        Map { entries: mapped(&self.entries, mapper), ty: None }
    }

    /// Bind this map to `ty`. The current contents must already be an
    /// instance of it.
    pub fn set_type(&mut self, ty: Type) -> Result<()> {
        if !ty.describes_maps() {
            return Err(Error::NotAMapType(ty));
        }
        let conforms = match ty.kind() {
            TypeKind::Struct(st) => struct_conforms(st, &self.entries, &mut Guard::default()),
            _ => ty.instance(&Value::Map(self.to_frozen())),
        };
        if !conforms {
            debug!(ty = %ty, "map contents rejected by type");
            return Err(Violation::assignment(Value::Map(self.to_frozen()), ty).into());
        }
        self.ty = Some(ty);
        Ok(())
    }

    /// A frozen copy. The map itself stays mutable.
    pub fn to_frozen(&self) -> FrozenMap {
        trace!(len = self.entries.len(), "frozen copy");
        FrozenMap(Arc::new(self.entries.clone()))
    }

    /// Freeze in place, giving up mutability.
    pub fn freeze(self) -> FrozenMap {
        FrozenMap(Arc::new(self.entries))
    }

    /// Same output as [`FrozenMap::append_to`].
    pub fn append_to(&self, out: &mut impl Indenter) {
        append_entries(&self.entries, out);
    }
}

impl ReadMap for Map {
    fn associations(&self) -> &IndexMap<Value, Value> {
        &self.entries
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        Map { entries: iter.into_iter().collect(), ty: None }
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compares associations only; the bound type is not part of equality.
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Map {}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_frozen(), f)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY
// ————————————————————————————————————————————————————————————————————————————

impl MapEntry {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        MapEntry(Arc::new((key.into(), value.into())))
    }

    pub fn key(&self) -> &Value {
        &self.0.0
    }

    pub fn value(&self) -> &Value {
        &self.0.1
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_put(ty: &Type, entries: &IndexMap<Value, Value>, key: &Value, value: &Value) -> Result<()> {
    match ty.kind() {
        TypeKind::Map { key: key_type, value: value_type, size } => {
            if !key_type.instance(key) {
                return Err(Violation::map_key(ty.clone(), key.clone()).into());
            }
            if !value_type.instance(value) {
                return Err(Violation::assignment(value.clone(), value_type.clone()).into());
            }
            if !entries.contains_key(key) && entries.len() + 1 > size.max() {
                return Err(Violation::size(ty.clone(), entries.len() + 1).into());
            }
            Ok(())
        }
        TypeKind::Struct(st) => match st.get(key) {
            Some(entry) if !entry.value().instance(value) => {
                Err(Violation::assignment(value.clone(), entry.value().clone()).into())
            }
            Some(_) => Ok(()),
            None if st.additional() => Ok(()),
            None => Err(Violation::map_key(ty.clone(), key.clone()).into()),
        },
        _ => {
            let mut staged = entries.clone();
            staged.insert(key.clone(), value.clone());
            check_snapshot(ty, staged)
        }
    }
}

fn check_remove(ty: &Type, entries: &IndexMap<Value, Value>, key: &Value) -> Result<()> {
    match ty.kind() {
        TypeKind::Map { size, .. } => {
            if entries.len() - 1 < size.min() {
                return Err(Violation::size(ty.clone(), entries.len() - 1).into());
            }
            Ok(())
        }
        TypeKind::Struct(st) => match st.get(key) {
            Some(entry) if entry.required() => Err(Violation::missing_key(
                key.clone(),
                default_key_label(key),
                entry.value().clone(),
            )
            .into()),
            _ => Ok(()),
        },
        _ => {
            let mut staged = entries.clone();
            staged.shift_remove(key);
            check_snapshot(ty, staged)
        }
    }
}

fn check_snapshot(ty: &Type, staged: IndexMap<Value, Value>) -> Result<()> {
    let candidate = Value::Map(FrozenMap(Arc::new(staged)));
    if ty.instance(&candidate) {
        Ok(())
    } else {
        Err(Violation::assignment(candidate, ty.clone()).into())
    }
}

fn merged(base: &IndexMap<Value, Value>, other: &IndexMap<Value, Value>) -> IndexMap<Value, Value> {
    let mut entries = base.clone();
    for (k, v) in other {
        entries.insert(k.clone(), v.clone());
    }
    entries
}

fn mapped(
    entries: &IndexMap<Value, Value>,
    mut mapper: impl FnMut(&Value, &Value) -> Value,
) -> IndexMap<Value, Value> {
    entries.iter().map(|(k, v)| (k.clone(), mapper(k, v))).collect()
}

fn associations_hash(entries: &IndexMap<Value, Value>) -> u64 {
    entries.iter().fold(0u64, |acc, (k, v)| {
        let mut h = DefaultHasher::new();
        k.hash(&mut h);
        v.hash(&mut h);
        acc.wrapping_add(h.finish())
    })
}

fn append_entries(entries: &IndexMap<Value, Value>, out: &mut impl Indenter) {
    if entries.is_empty() {
        out.write("{}");
        return;
    }
    out.write("{");
    out.indent();
    for (i, (k, v)) in entries.iter().enumerate() {
        if i > 0 {
            out.write(",");
        }
        out.newline();
        out.write(&k.to_string());
        out.write(": ");
        match v {
            Value::Map(m) => m.append_to(out),
            other => out.write(&other.to_string()),
        }
    }
    out.dedent();
    out.newline();
    out.write("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indent::IndentBuffer;
    use crate::types::StructEntry;

    fn abc() -> Map {
        let mut m = Map::new();
        m.put("a", 1).unwrap();
        m.put("b", 2).unwrap();
        m.put("c", 3).unwrap();
        m
    }

    fn keys_of(m: &impl ReadMap) -> Vec<Value> {
        m.keys().iter().cloned().collect()
    }

    #[test]
    fn replacing_keeps_position() {
        let mut m = abc();
        assert_eq!(m.put("a", 10).unwrap(), Some(Value::from(1)));
        assert_eq!(keys_of(&m), vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(m.get(&Value::from("a")), Some(&Value::from(10)));
    }

    #[test]
    fn nil_is_distinct_from_absent() {
        let mut m = Map::new();
        m.put("a", Value::Nil).unwrap();
        assert_eq!(m.get(&Value::from("a")), Some(&Value::Nil));
        assert_eq!(m.get(&Value::from("b")), None);
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut m = abc();
        assert_eq!(m.remove(&Value::from("z")).unwrap(), None);
        assert_eq!(m.remove(&Value::from("b")).unwrap(), Some(Value::from(2)));
        assert_eq!(keys_of(&m), vec![Value::from("a"), Value::from("c")]);
        m.remove_all([&Value::from("a"), &Value::from("q")]).unwrap();
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn pure_variants_leave_the_source_alone() {
        let m = abc().freeze();
        let with = m.with("d", 4);
        let without = m.without(&Value::from("a"));
        assert_eq!(m.len(), 3);
        assert_eq!(with.len(), 4);
        assert_eq!(without.len(), 2);
        assert_eq!(m.without_all([&Value::from("a"), &Value::from("b")]).len(), 1);
    }

    #[test]
    fn merge_prefers_argument() {
        let left = abc();
        let mut right = Map::new();
        right.put("b", 20).unwrap();
        right.put("d", 4).unwrap();
        let merged = left.merge(&right);
        assert_eq!(merged.get(&Value::from("b")), Some(&Value::from(20)));
        assert_eq!(keys_of(&merged), vec![Value::from("a"), Value::from("b"), Value::from("c"), Value::from("d")]);
        assert_eq!(left.get(&Value::from("b")), Some(&Value::from(2)));
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn freeze_is_idempotent() {
        let frozen = abc().to_frozen();
        let again = frozen.frozen();
        assert!(FrozenMap::ptr_eq(&frozen, &again));
        assert!(FrozenMap::ptr_eq(&again.frozen(), &frozen));
        assert_eq!(frozen.to_mutable(), abc());
    }

    #[test]
    fn snapshots_are_independent() {
        let mut m = abc();
        let keys = m.keys();
        let entries = m.entries();
        m.put("d", 4).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(entries.get(0), Some(&Value::Entry(MapEntry::new("a", 1))));
        assert_eq!(m.values().len(), 4);
    }

    #[test]
    fn combinators() {
        let m = abc();
        assert!(m.all_keys(|k| matches!(k, Value::String(_))));
        assert!(m.any_value(|v| *v == Value::from(2)));
        assert!(!m.all_values(|v| *v == Value::from(2)));
        assert!(m.all(|_, v| v.as_int().is_some_and(|i| i > 0)));
        assert!(!m.any(|k, _| *k == Value::from("z")));
        assert!(!m.any_key(|k| *k == Value::from(1)));
        let mut sum = 0;
        m.each_value(|v| sum += v.as_int().unwrap_or(0));
        assert_eq!(sum, 6);
        let mut seen = Vec::new();
        m.each(|k, _| seen.push(k.clone()));
        m.each_key(|k| seen.push(k.clone()));
        assert_eq!(seen.len(), 6);
        let doubled = m.map(|_, v| Value::from(v.as_int().unwrap_or(0) * 2));
        assert_eq!(doubled.get(&Value::from("c")), Some(&Value::from(6)));
    }

    #[test]
    fn unordered_sources_are_sorted() {
        let m = FrozenMap::from_unordered([
            (Value::from("b"), Value::from(1)),
            (Value::from("a"), Value::from(2)),
            (Value::from(3), Value::Nil),
        ]);
        assert_eq!(keys_of(&m), vec![Value::from(3), Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn equality_ignores_order() {
        let a: FrozenMap = [(Value::from("x"), Value::from(1)), (Value::from("y"), Value::from(2))].into_iter().collect();
        let b: FrozenMap = [(Value::from("y"), Value::from(2)), (Value::from("x"), Value::from(1))].into_iter().collect();
        assert_eq!(a, b);
        let hash = |m: &FrozenMap| {
            let mut h = DefaultHasher::new();
            m.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn typed_map_checks_mutations() {
        let mut m = Map::new();
        m.put("a", 1).unwrap();
        m.set_type(Type::map_sized(Type::string(), Type::integer(), 1, 2)).unwrap();
        m.put("b", 2).unwrap();

        let Err(Error::Violation(v)) = m.put("c", 3) else { panic!("expected size violation") };
        assert!(matches!(v, Violation::IllegalSize { size: 3, .. }));
        let Err(Error::Violation(v)) = m.put(1, 3) else { panic!("expected key violation") };
        assert!(matches!(v, Violation::IllegalMapKey { .. }));
        let Err(Error::Violation(v)) = m.put("a", "x") else { panic!("expected assignment violation") };
        assert_eq!(v, Violation::assignment(Value::from("x"), Type::integer()));

        m.remove(&Value::from("a")).unwrap();
        assert!(m.remove(&Value::from("b")).is_err());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn typed_record_checks_mutations() {
        let t = Type::record(
            [StructEntry::new("a", Type::string(), true), StructEntry::new("b", Type::integer(), false)],
            false,
        );
        let mut m = Map::new();
        m.put("a", "x").unwrap();
        m.set_type(t.clone()).unwrap();
        m.put("b", 1).unwrap();
        assert!(m.put("b", "no").is_err());
        let Err(Error::Violation(v)) = m.put("z", 1) else { panic!("expected key violation") };
        assert_eq!(v, Violation::map_key(t, Value::from("z")));
        let Err(Error::Violation(v)) = m.remove(&Value::from("a")) else { panic!("expected missing key") };
        assert_eq!(v.to_string(), "missing required parameter 'a' of type string");
        assert_eq!(m.remove(&Value::from("b")).unwrap(), Some(Value::from(1)));
    }

    #[test]
    fn put_all_is_atomic_on_typed_maps() {
        let mut m = Map::new();
        m.set_type(Type::map(Type::string(), Type::integer())).unwrap();
        let mut batch = Map::new();
        batch.put("a", 1).unwrap();
        batch.put("b", "x").unwrap();
        assert!(m.put_all(&batch).is_err());
        assert!(m.is_empty());
    }

    #[test]
    fn set_type_rejects_mismatches() {
        let mut m = abc();
        assert!(matches!(m.set_type(Type::string()), Err(Error::NotAMapType(_))));
        let Err(Error::Violation(v)) = m.set_type(Type::map(Type::string(), Type::string())) else {
            panic!("expected assignment violation")
        };
        assert!(matches!(v, Violation::IllegalAssignment { .. }));
        assert!(m.ty().is_none());
        let exact = Type::exact(abc());
        m.set_type(exact.clone()).unwrap();
        assert_eq!(m.ty(), Some(&exact));
        assert!(m.put("a", 2).is_err());
        assert!(m.put("a", 1).is_ok());
    }

    #[test]
    fn pure_variants_are_untyped() {
        let mut m = abc();
        m.set_type(Type::map(Type::string(), Type::integer())).unwrap();
        let mut copy = m.with("d", 4);
        assert!(copy.ty().is_none());
        copy.put(1, "x").unwrap();
    }

    #[test]
    fn indented_output() {
        let mut inner = Map::new();
        inner.put("c", Value::Nil).unwrap();
        let mut m = Map::new();
        m.put("a", 1).unwrap();
        m.put("b", inner).unwrap();
        m.put("e", Map::new()).unwrap();
        let mut out = IndentBuffer::new();
        m.append_to(&mut out);
        assert_eq!(out.as_str(), "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": nil\n  },\n  \"e\": {}\n}");
    }
}
