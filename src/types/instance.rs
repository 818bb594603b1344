//! Value membership.

use indexmap::IndexMap;

use super::equality::value_equals;
use super::record::StructType;
use super::{Guard, Type, TypeKind, Visit};
use crate::value::Value;

/// The guard is keyed on (type node, value address); a pair met again has
/// gone around a cycle without consuming any of the value and is rejected.
pub(crate) fn instance(t: &Type, value: &Value, guard: &mut Guard) -> bool {
    if guard.enter(t.addr(), value as *const Value as usize) != Visit::Fresh {
        return false;
    }
    let result = decide(t, value, guard);
    guard.leave();
    result
}

fn decide(t: &Type, value: &Value, guard: &mut Guard) -> bool {
    match t.kind() {
        TypeKind::Any => true,
        TypeKind::Boolean => matches!(value, Value::Bool(_)),
        TypeKind::Error => matches!(value, Value::Violation(_)),
        TypeKind::Meta(target) => match (target, value) {
            (None, Value::Type(_)) => true,
            (Some(target), Value::Type(candidate)) => {
                guard.nested(|g| super::assignable::assignable(target, candidate, g))
            }
            _ => false,
        },
        TypeKind::AnyOf(ops) => ops.iter().any(|op| instance(op, value, guard)),
        TypeKind::OneOf(ops) => {
            let mut found = false;
            for op in ops {
                if instance(op, value, guard) {
                    if found {
                        return false;
                    }
                    found = true;
                }
            }
            found
        }
        TypeKind::AllOf(ops) => ops.iter().all(|op| instance(op, value, guard)),
        TypeKind::Not(negated) => !instance(negated, value, guard),
        TypeKind::String(size) => match value {
            Value::String(s) => size.contains(s.chars().count()),
            _ => false,
        },
        TypeKind::Binary(size) => match value {
            Value::Binary(b) => size.contains(b.len()),
            _ => false,
        },
        TypeKind::Array { element, size } => match value {
            Value::Array(a) => size.contains(a.len()) && a.iter().all(|e| instance(element, e, guard)),
            _ => false,
        },
        TypeKind::Tuple(elements) => match value {
            Value::Array(a) => {
                a.len() == elements.len() && elements.iter().zip(a.iter()).all(|(t, e)| instance(t, e, guard))
            }
            _ => false,
        },
        TypeKind::Map { key, value: value_type, size } => match value {
            Value::Map(m) => {
                size.contains(m.len())
                    && m.iter().all(|(k, v)| instance(key, k, guard) && instance(value_type, v, guard))
            }
            _ => false,
        },
        TypeKind::Struct(st) => match value {
            Value::Map(m) => struct_conforms(st, m.associations(), guard),
            _ => false,
        },
        TypeKind::MapEntry { key, value: value_type } => match value {
            Value::Entry(e) => instance(key, e.key(), guard) && instance(value_type, e.value(), guard),
            _ => false,
        },
        TypeKind::IntRange(range) => match value {
            Value::Int(i) => range.contains(*i),
            _ => false,
        },
        TypeKind::FloatRange(range) => match value {
            Value::Float(f) => range.contains(f.0),
            _ => false,
        },
        TypeKind::Pattern(regexp) => match value {
            Value::String(s) => regexp.is_match(s),
            _ => false,
        },
        TypeKind::Native(native) => match value {
            Value::Native(n) => n.native_type() == *native,
            _ => false,
        },
        TypeKind::Exact(exact) => value_equals(exact, value, guard),
    }
}

/// Declared entries match, required ones are present and undeclared keys
/// appear only when the record is open.
pub(crate) fn struct_conforms(st: &StructType, entries: &IndexMap<Value, Value>, guard: &mut Guard) -> bool {
    let declared_ok = st.entries().iter().all(|e| match entries.get(e.key()) {
        Some(v) => instance(e.value(), v, guard),
        None => !e.required(),
    });
    declared_ok && (st.additional() || entries.keys().all(|k| st.get(k).is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::types::StructEntry;
    use crate::value::{Binary, Regexp};

    #[test]
    fn exact_types_are_deep_equality() {
        let arr = Value::from(vec![Value::from(1), Value::from("a")]);
        let t = Type::exact(arr.clone());
        assert!(t.instance(&arr));
        assert!(!t.instance(&Value::from(vec![Value::from(1)])));
    }

    #[test]
    fn sized_kinds_check_bounds() {
        let t = Type::string_sized(1, 3);
        assert!(t.instance(&Value::from("abc")));
        assert!(!t.instance(&Value::from("")));
        assert!(!t.instance(&Value::from("abcd")));
        assert!(Type::string_sized(2, 2).instance(&Value::from("åä")));
        assert!(Type::binary_sized(0, 2).instance(&Value::from(Binary::new(vec![1u8]))));
        assert!(!Type::binary().instance(&Value::from("AQID")));
    }

    #[test]
    fn ranges_and_patterns() {
        assert!(Type::int_range(1, 10, false).instance(&Value::from(9)));
        assert!(!Type::int_range(1, 10, false).instance(&Value::from(10)));
        assert!(!Type::integer().instance(&Value::from(1.0)));
        assert!(Type::float().instance(&Value::from(-3.5)));
        let p = Type::pattern(Regexp::new("^a+$").unwrap());
        assert!(p.instance(&Value::from("aaa")));
        assert!(!p.instance(&Value::from("ab")));
    }

    #[test]
    fn composites() {
        let t = Type::any_of(vec![Type::integer(), Type::string()]);
        assert!(t.instance(&Value::from(1)));
        assert!(!t.instance(&Value::Nil));
        assert!(Type::not(Type::string()).instance(&Value::Nil));
        let both = Type::all_of(vec![Type::string_sized(1, 5), Type::pattern(Regexp::new("^x").unwrap())]);
        assert!(both.instance(&Value::from("xy")));
        assert!(!both.instance(&Value::from("yx")));
    }

    #[test]
    fn maps_and_records() {
        let mut m = Map::new();
        m.put("a", "x").unwrap();
        m.put("b", 2).unwrap();
        let v = Value::from(m);
        assert!(Type::map(Type::string(), Type::any()).instance(&v));
        assert!(!Type::map_sized(Type::string(), Type::any(), 3, 5).instance(&v));
        let closed = Type::record([StructEntry::new("a", Type::string(), true)], false);
        let open = Type::record([StructEntry::new("a", Type::string(), true)], true);
        assert!(!closed.instance(&v));
        assert!(open.instance(&v));
    }

    #[test]
    fn cyclic_types_accept_finite_values() {
        let t = Type::recursive(|me| Type::any_of(vec![Type::string(), Type::array(me)]));
        let nested = Value::from(vec![Value::from("a"), Value::from(vec![Value::from("b")])]);
        assert!(t.instance(&nested));
        assert!(!t.instance(&Value::from(vec![Value::from(1)])));
        let looping = Type::recursive(|me| Type::any_of(vec![me, Type::integer()]));
        assert!(looping.instance(&Value::from(1)));
        assert!(!looping.instance(&Value::from("x")));
    }
}
