//! Structural equality and hashing.
//!
//! Operand lists of the composite kinds compare as multisets and record
//! entries by key, so their order affects only the printed form. Hashes
//! combine those members with a commutative sum to stay consistent with
//! equality.
//!
//! Equality is coinductive: a recursive type equals any of its unrollings.
//! Hashing therefore walks the infinite unfolding to a fixed depth instead of
//! stopping at nodes already seen.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{Guard, Type, TypeKind, Visit};
use crate::value::Value;

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        equals(self, other, &mut Guard::default())
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_code(self, HASH_DEPTH));
    }
}

/// A pair met again on the current path is assumed equal; any difference
/// will surface elsewhere in the walk.
pub(crate) fn equals(a: &Type, b: &Type, guard: &mut Guard) -> bool {
    if Type::ptr_eq(a, b) {
        return true;
    }
    if guard.enter(a.addr(), b.addr()) != Visit::Fresh {
        return true;
    }
    let result = kind_equals(a.kind(), b.kind(), guard);
    guard.leave();
    result
}

fn kind_equals(a: &TypeKind, b: &TypeKind, guard: &mut Guard) -> bool {
    use TypeKind as K;
    match (a, b) {
        (K::Any, K::Any) | (K::Boolean, K::Boolean) | (K::Error, K::Error) => true,
        (K::Meta(x), K::Meta(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => equals(x, y, guard),
            _ => false,
        },
        (K::AnyOf(x), K::AnyOf(y)) | (K::OneOf(x), K::OneOf(y)) | (K::AllOf(x), K::AllOf(y)) => {
            same_members(x, y, guard)
        }
        (K::Not(x), K::Not(y)) => equals(x, y, guard),
        (K::String(x), K::String(y)) | (K::Binary(x), K::Binary(y)) => x == y,
        (K::Array { element: e1, size: s1 }, K::Array { element: e2, size: s2 }) => {
            s1 == s2 && equals(e1, e2, guard)
        }
        (K::Tuple(x), K::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equals(p, q, guard))
        }
        (K::Map { key: k1, value: v1, size: s1 }, K::Map { key: k2, value: v2, size: s2 }) => {
            s1 == s2 && equals(k1, k2, guard) && equals(v1, v2, guard)
        }
        (K::Struct(x), K::Struct(y)) => {
            x.additional() == y.additional()
                && x.len() == y.len()
                && x.entries().iter().all(|e| {
                    y.get(e.key()).is_some_and(|f| {
                        e.required() == f.required() && equals(e.value(), f.value(), guard)
                    })
                })
        }
        (K::MapEntry { key: k1, value: v1 }, K::MapEntry { key: k2, value: v2 }) => {
            equals(k1, k2, guard) && equals(v1, v2, guard)
        }
        (K::IntRange(x), K::IntRange(y)) => x == y,
        (K::FloatRange(x), K::FloatRange(y)) => x == y,
        (K::Pattern(x), K::Pattern(y)) => x == y,
        (K::Native(x), K::Native(y)) => x == y,
        (K::Exact(x), K::Exact(y)) => value_equals(x, y, guard),
        _ => false,
    }
}

/// Every operand of `x` pairs off with a distinct equal operand of `y`.
fn same_members(x: &[Type], y: &[Type], guard: &mut Guard) -> bool {
    if x.len() != y.len() {
        return false;
    }
    let mut taken = vec![false; y.len()];
    x.iter().all(|p| {
        match (0..y.len()).find(|&i| !taken[i] && equals(p, &y[i], guard)) {
            Some(i) => {
                taken[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Value equality that keeps the guard when it meets embedded type values.
pub(crate) fn value_equals(a: &Value, b: &Value, guard: &mut Guard) -> bool {
    match (a, b) {
        (Value::Type(x), Value::Type(y)) => equals(x, y, guard),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| value_equals(p, q, guard))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| value_equals(v, w, guard)))
        }
        (Value::Entry(x), Value::Entry(y)) => {
            value_equals(x.key(), y.key(), guard) && value_equals(x.value(), y.value(), guard)
        }
        _ => a == b,
    }
}

/// Levels of the unfolding that contribute to a hash.
const HASH_DEPTH: u32 = 8;

/// Below `depth` levels a node contributes only its kind tag.
pub(crate) fn hash_code(t: &Type, depth: u32) -> u64 {
    let mut h = DefaultHasher::new();
    t.identifier().hash(&mut h);
    if depth == 0 {
        return h.finish();
    }
    let depth = depth - 1;
    match t.kind() {
        TypeKind::Any | TypeKind::Boolean | TypeKind::Error | TypeKind::Meta(None) => {}
        TypeKind::Meta(Some(op)) | TypeKind::Not(op) => hash_code(op, depth).hash(&mut h),
        TypeKind::AnyOf(ops) | TypeKind::OneOf(ops) | TypeKind::AllOf(ops) => {
            ops.iter()
                .fold(0u64, |acc, op| acc.wrapping_add(hash_code(op, depth)))
                .hash(&mut h);
        }
        TypeKind::String(size) | TypeKind::Binary(size) => size.hash(&mut h),
        TypeKind::Array { element, size } => {
            size.hash(&mut h);
            hash_code(element, depth).hash(&mut h);
        }
        TypeKind::Tuple(elements) => {
            for e in elements {
                hash_code(e, depth).hash(&mut h);
            }
        }
        TypeKind::Map { key, value, size } => {
            size.hash(&mut h);
            hash_code(key, depth).hash(&mut h);
            hash_code(value, depth).hash(&mut h);
        }
        TypeKind::Struct(st) => {
            st.additional().hash(&mut h);
            st.entries()
                .iter()
                .fold(0u64, |acc, e| {
                    let mut eh = DefaultHasher::new();
                    e.key().hash(&mut eh);
                    e.required().hash(&mut eh);
                    hash_code(e.value(), depth).hash(&mut eh);
                    acc.wrapping_add(eh.finish())
                })
                .hash(&mut h);
        }
        TypeKind::MapEntry { key, value } => {
            hash_code(key, depth).hash(&mut h);
            hash_code(value, depth).hash(&mut h);
        }
        TypeKind::IntRange(range) => range.hash(&mut h),
        TypeKind::FloatRange(range) => range.hash(&mut h),
        TypeKind::Pattern(regexp) => regexp.hash(&mut h),
        TypeKind::Native(native) => native.hash(&mut h),
        TypeKind::Exact(value) => return value_hash(value, depth),
    }
    h.finish()
}

/// Hash of a value, consistent with [`value_equals`].
pub(crate) fn value_hash(v: &Value, depth: u32) -> u64 {
    let mut h = DefaultHasher::new();
    match v {
        Value::Type(t) => return hash_code(t, depth),
        Value::Array(a) => {
            a.len().hash(&mut h);
            for e in a {
                value_hash(e, depth).hash(&mut h);
            }
        }
        Value::Map(m) => {
            m.len().hash(&mut h);
            m.iter()
                .fold(0u64, |acc, (k, e)| {
                    let mut eh = DefaultHasher::new();
                    k.hash(&mut eh);
                    value_hash(e, depth).hash(&mut eh);
                    acc.wrapping_add(eh.finish())
                })
                .hash(&mut h);
        }
        Value::Entry(e) => {
            value_hash(e.key(), depth).hash(&mut h);
            value_hash(e.value(), depth).hash(&mut h);
        }
        _ => v.hash(&mut h),
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructEntry;

    fn hash_of(t: &Type) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    #[test]
    fn structural_not_referential() {
        let a = Type::array_sized(Type::string_sized(1, 10), 0, 5);
        let b = Type::array_sized(Type::string_sized(1, 10), 0, 5);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Type::array_sized(Type::string_sized(1, 11), 0, 5));
    }

    #[test]
    fn operand_order_is_irrelevant() {
        let a = Type::any_of(vec![Type::string(), Type::integer(), Type::boolean()]);
        let b = Type::any_of(vec![Type::boolean(), Type::string(), Type::integer()]);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Type::one_of(vec![Type::string(), Type::integer(), Type::boolean()]));
    }

    #[test]
    fn record_entry_order_is_irrelevant() {
        let a = Type::record(
            [StructEntry::new("a", Type::string(), true), StructEntry::new("b", Type::integer(), false)],
            false,
        );
        let b = Type::record(
            [StructEntry::new("b", Type::integer(), false), StructEntry::new("a", Type::string(), true)],
            false,
        );
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        let c = Type::record(
            [StructEntry::new("a", Type::string(), false), StructEntry::new("b", Type::integer(), false)],
            false,
        );
        assert_ne!(a, c);
    }

    #[test]
    fn exact_types_delegate_to_value() {
        assert_eq!(Type::exact(3), Type::exact(3));
        assert_ne!(Type::exact(3), Type::exact(4));
        assert_ne!(Type::exact(3), Type::exact(3.0));
        assert_eq!(hash_of(&Type::exact("x")), hash_of(&Type::exact("x")));
    }

    #[test]
    fn cyclic_types_compare_and_hash() {
        let a = Type::recursive(|me| Type::any_of(vec![Type::string(), Type::array(me)]));
        let b = Type::recursive(|me| Type::any_of(vec![Type::string(), Type::array(me)]));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        let c = Type::recursive(|me| Type::any_of(vec![Type::integer(), Type::array(me)]));
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_operands_count() {
        let a = Type::any_of(vec![Type::string(), Type::string(), Type::integer()]);
        let b = Type::any_of(vec![Type::string(), Type::integer(), Type::integer()]);
        assert_ne!(a, b);
        let c = Type::any_of(vec![Type::integer(), Type::string(), Type::string()]);
        assert_eq!(a, c);
        assert_eq!(hash_of(&a), hash_of(&c));
        assert_ne!(a, Type::any_of(vec![Type::string(), Type::integer()]));
    }

    #[test]
    fn unrolled_recursive_types_hash_alike() {
        let a = Type::recursive(|me| Type::any_of(vec![Type::string(), Type::array(me)]));
        let b = Type::any_of(vec![Type::string(), Type::array(a.clone())]);
        let c = Type::any_of(vec![Type::string(), Type::array(b.clone())]);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&c));
    }
}
