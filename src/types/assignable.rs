//! `assignable(a, b)`: every value matched by `b` is also matched by `a`.
//!
//! The relation is decided in two steps. First the shape of `b` is consulted
//! (unions distribute, exact types reduce to an instance test), then the
//! kind of `a` decides.
//!
//! A pair met again on the current path is assumed assignable only when the
//! walk stepped into an element, entry or meta type on the way round. A
//! cycle that consumes no structure (`μX. X|int`) proves nothing and is
//! rejected.

use super::{Guard, SizeBounds, Type, TypeKind, Visit, instance, record::StructType};

pub(crate) fn assignable(a: &Type, b: &Type, guard: &mut Guard) -> bool {
    if Type::ptr_eq(a, b) {
        return true;
    }
    match guard.enter(a.addr(), b.addr()) {
        Visit::Fresh => {}
        Visit::Productive => return true,
        Visit::Unproductive => return false,
    }
    let result = decide(a, b, guard);
    guard.leave();
    result
}

fn decide(a: &Type, b: &Type, guard: &mut Guard) -> bool {
    // ---- shape of the candidate ----
    match b.kind() {
        TypeKind::AnyOf(ops) | TypeKind::OneOf(ops) => {
            return ops.iter().all(|op| assignable(a, op, guard));
        }
        TypeKind::AllOf(ops) => {
            if ops.iter().any(|op| assignable(a, op, guard)) {
                return true;
            }
        }
        TypeKind::Exact(value) => return instance::instance(a, value, guard),
        _ => {}
    }

    // ---- kind of the target ----
    match a.kind() {
        TypeKind::Any => true,
        TypeKind::AnyOf(ops) => ops.iter().any(|op| assignable(op, b, guard)),
        TypeKind::OneOf(ops) => {
            let mut found = false;
            for op in ops {
                if assignable(op, b, guard) {
                    if found {
                        return false;
                    }
                    found = true;
                }
            }
            found
        }
        TypeKind::AllOf(ops) => ops.iter().all(|op| assignable(op, b, guard)),
        TypeKind::Not(negated) => match b.kind() {
            TypeKind::Not(other) => assignable(other, negated, guard),
            _ => !assignable(negated, b, guard),
        },
        TypeKind::Meta(target) => match (target, b.kind()) {
            (None, TypeKind::Meta(_)) => true,
            (Some(t), TypeKind::Meta(Some(u))) => nested(t, u, guard),
            _ => false,
        },
        TypeKind::Boolean => matches!(b.kind(), TypeKind::Boolean),
        TypeKind::Error => matches!(b.kind(), TypeKind::Error),
        TypeKind::String(size) => match b.kind() {
            TypeKind::String(other) => size.covers(*other),
            TypeKind::Pattern(_) => size.unbounded(),
            _ => false,
        },
        TypeKind::Binary(size) => match b.kind() {
            TypeKind::Binary(other) => size.covers(*other),
            _ => false,
        },
        TypeKind::Array { element, size } => match b.kind() {
            TypeKind::Array { element: other, size: other_size } => {
                size.covers(*other_size) && nested(element, other, guard)
            }
            TypeKind::Tuple(elements) => {
                size.contains(elements.len()) && elements.iter().all(|e| nested(element, e, guard))
            }
            _ => false,
        },
        TypeKind::Tuple(elements) => match b.kind() {
            TypeKind::Tuple(others) => {
                elements.len() == others.len()
                    && elements.iter().zip(others).all(|(e, o)| nested(e, o, guard))
            }
            TypeKind::Array { element, size } => {
                size.min() == elements.len()
                    && size.max() == elements.len()
                    && elements.iter().all(|e| nested(e, element, guard))
            }
            _ => false,
        },
        TypeKind::Map { key, value, size } => match b.kind() {
            TypeKind::Map { key: other_key, value: other_value, size: other_size } => {
                size.covers(*other_size)
                    && nested(key, other_key, guard)
                    && nested(value, other_value, guard)
            }
            TypeKind::Struct(st) => map_accepts_struct(key, value, *size, st, guard),
            _ => false,
        },
        TypeKind::Struct(st) => match b.kind() {
            TypeKind::Struct(other) => struct_accepts_struct(st, other, guard),
            TypeKind::Map { value, .. } => {
                st.additional()
                    && st.entries().iter().all(|e| !e.required() && nested(e.value(), value, guard))
            }
            _ => false,
        },
        TypeKind::MapEntry { key, value } => match b.kind() {
            TypeKind::MapEntry { key: other_key, value: other_value } => {
                nested(key, other_key, guard) && nested(value, other_value, guard)
            }
            _ => false,
        },
        TypeKind::IntRange(range) => match b.kind() {
            TypeKind::IntRange(other) => range.covers(*other),
            _ => false,
        },
        TypeKind::FloatRange(range) => match b.kind() {
            TypeKind::FloatRange(other) => range.covers(*other),
            _ => false,
        },
        TypeKind::Pattern(regexp) => match b.kind() {
            TypeKind::Pattern(other) => regexp == other,
            _ => false,
        },
        TypeKind::Native(native) => match b.kind() {
            TypeKind::Native(other) => native == other,
            _ => false,
        },
        // Exact candidates were settled above.
        TypeKind::Exact(_) => false,
    }
}

/// `assignable` one structural step down.
fn nested(a: &Type, b: &Type, guard: &mut Guard) -> bool {
    guard.nested(|g| assignable(a, b, g))
}

fn map_accepts_struct(
    key: &Type,
    value: &Type,
    size: SizeBounds,
    st: &StructType,
    guard: &mut Guard,
) -> bool {
    let required = st.entries().iter().filter(|e| e.required()).count();
    let most = if st.additional() { usize::MAX } else { st.len() };
    if required < size.min() || most > size.max() {
        return false;
    }
    let entries_fit = st.entries().iter().all(|e| {
        instance::instance(key, e.key(), guard) && nested(value, e.value(), guard)
    });
    entries_fit
        && (!st.additional() || (nested(key, &Type::any(), guard) && nested(value, &Type::any(), guard)))
}

fn struct_accepts_struct(st: &StructType, other: &StructType, guard: &mut Guard) -> bool {
    let any = Type::any();
    for entry in st.entries() {
        match other.get(entry.key()) {
            Some(candidate) => {
                if entry.required() && !candidate.required() {
                    return false;
                }
                if !nested(entry.value(), candidate.value(), guard) {
                    return false;
                }
            }
            None => {
                if entry.required() {
                    return false;
                }
                // the candidate may carry this key as one of its additional entries
                if other.additional() && !nested(entry.value(), &any, guard) {
                    return false;
                }
            }
        }
    }
    if st.additional() {
        return true;
    }
    !other.additional() && other.entries().iter().all(|e| st.get(e.key()).is_some())
}
