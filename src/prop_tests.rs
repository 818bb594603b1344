//! Property tests using proptest.
//!
//! 1. Printer round trip: parse(render(t)) == t for every generated type
//! 2. Equality is symmetric and equal types hash identically, including a
//!    recursive type and its unrolling
//! 3. Freezing a frozen map returns the same allocation
//! 4. Validation is deterministic
//! 5. JSON round trip preserves maps, including key order

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;

use crate::map::{FrozenMap, Map, MapEntry, ReadMap};
use crate::types::{StructEntry, Type};
use crate::value::{Regexp, Value};
use crate::violation::Violation;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const LABEL_POOL: &[&str] = &["a", "b", "c", "id", "name", "x y", "quo\"te"];
const PATTERN_POOL: &[&str] = &["a+", "^[a-z]*$", "x|y", "[0-9]{2,3}"];

fn hash_of<T: Hash>(t: &T) -> u64 {
    let mut h = DefaultHasher::new();
    t.hash(&mut h);
    h.finish()
}

fn arb_size() -> impl Strategy<Value = (usize, usize)> {
    prop_oneof![
        4 => (0usize..5, 5usize..20),
        2 => (1usize..5).prop_map(|min| (min, usize::MAX)),
        1 => Just((0usize, 0usize)),
    ]
}

fn arb_float() -> impl Strategy<Value = f64> {
    (-4000i32..4000).prop_map(|i| f64::from(i) / 8.0)
}

fn arb_leaf() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::any()),
        Just(Type::boolean()),
        Just(Type::nil()),
        Just(Type::error()),
        Just(Type::string()),
        Just(Type::binary()),
        Just(Type::integer()),
        Just(Type::float()),
        Just(Type::meta_any()),
        any::<bool>().prop_map(Type::exact),
        any::<i64>().prop_map(Type::exact),
        arb_float().prop_map(Type::exact),
        prop::sample::select(vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN]).prop_map(Type::exact),
        "[a-z \"\\\\]{0,6}".prop_map(|s| Type::exact(s.as_str())),
        arb_size().prop_map(|(min, max)| Type::string_sized(min, max)),
        arb_size().prop_map(|(min, max)| Type::binary_sized(min, max)),
        (any::<i64>(), any::<i64>(), any::<bool>()).prop_map(|(a, b, inc)| Type::int_range(a, b, inc)),
        (-100i64..100).prop_map(|min| Type::int_range(min, i64::MAX, true)),
        (-100i64..100).prop_map(|max| Type::int_range(i64::MIN, max, false)),
        (arb_float(), arb_float(), any::<bool>()).prop_map(|(a, b, inc)| Type::float_range(a, b, inc)),
        prop::sample::select(PATTERN_POOL)
            .prop_map(|p| Type::pattern(Regexp::new(p).expect("pattern pool compiles"))),
    ]
}

/// Types of bounded depth. Depth 0 = leaf types only.
fn arb_type(depth: u32) -> BoxedStrategy<Type> {
    if depth == 0 {
        return arb_leaf().boxed();
    }
    let inner = arb_type(depth - 1);
    let entries = prop::collection::btree_map(
        prop::sample::select(LABEL_POOL),
        (inner.clone(), any::<bool>()),
        0..=3,
    );
    prop_oneof![
        4 => arb_leaf(),
        1 => prop::collection::vec(inner.clone(), 0..=3).prop_map(Type::any_of),
        1 => prop::collection::vec(inner.clone(), 0..=3).prop_map(Type::one_of),
        1 => prop::collection::vec(inner.clone(), 0..=3).prop_map(Type::all_of),
        1 => inner.clone().prop_map(|t| Type::any_of(vec![t.clone(), t])),
        1 => inner.clone().prop_map(Type::not),
        1 => inner.clone().prop_map(Type::meta),
        1 => (inner.clone(), arb_size()).prop_map(|(t, (min, max))| Type::array_sized(t, min, max)),
        1 => inner.clone().prop_map(Type::array),
        1 => prop::collection::vec(inner.clone(), 0..=3).prop_map(Type::tuple),
        1 => (inner.clone(), inner.clone()).prop_map(|(k, v)| Type::map_entry(k, v)),
        1 => arb_json_value(1).prop_map(Type::exact),
        1 => (arb_json_value(1), arb_json_value(1)).prop_map(|(k, v)| Type::exact(MapEntry::new(k, v))),
        1 => prop::collection::vec(arb_json_value(1), 0..=3).prop_map(Type::all_of_values),
        1 => (arb_json_value(0), inner.clone())
            .prop_map(|(v, t)| Type::exact(Violation::assignment(v, t))),
        1 => (inner.clone(), inner.clone()).prop_map(|(k, v)| Type::map(k, v)),
        1 => (inner.clone(), inner.clone(), arb_size())
            .prop_map(|(k, v, (min, max))| Type::map_sized(k, v, min, max)),
        1 => (entries, any::<bool>()).prop_map(|(entries, additional)| {
            Type::record(
                entries.into_iter().map(|(k, (t, required))| StructEntry::new(k, t, required)),
                additional,
            )
        }),
    ]
    .boxed()
}

fn arb_json_value(depth: u32) -> BoxedStrategy<Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        arb_float().prop_map(Value::float),
        "[a-z]{0,5}".prop_map(Value::from),
    ];
    if depth == 0 {
        return leaf.boxed();
    }
    let inner = arb_json_value(depth - 1);
    prop_oneof![
        3 => leaf,
        1 => prop::collection::vec(inner.clone(), 0..=3).prop_map(Value::from),
        1 => arb_json_map(inner).prop_map(Value::Map),
    ]
    .boxed()
}

fn arb_json_map(values: BoxedStrategy<Value>) -> BoxedStrategy<FrozenMap> {
    prop::collection::vec(("[a-z]{1,4}", values), 0..=4)
        .prop_map(|pairs| pairs.into_iter().map(|(k, v)| (Value::from(k), v)).collect())
        .boxed()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Rendered text reads back as a structurally equal type.
    #[test]
    fn render_then_parse_is_identity(t in arb_type(3)) {
        let text = t.to_string();
        let back = crate::parse(&text);
        prop_assert!(back.is_ok(), "{text} did not parse: {back:?}");
        let back = back.unwrap();
        prop_assert_eq!(&back, &t, "{}", text);
        prop_assert_eq!(hash_of(&back), hash_of(&t));
        prop_assert_eq!(back.to_string(), text);
    }
}

/// A recursive type paired with its one-step unrolling.
fn arb_recursive() -> impl Strategy<Value = (Type, Type)> {
    (arb_type(1), any::<bool>()).prop_map(|(leaf, in_map)| {
        let body = move |me: Type| {
            let nested = if in_map { Type::map(Type::string(), me) } else { Type::array(me) };
            Type::any_of(vec![leaf.clone(), nested])
        };
        let folded = Type::recursive(&body);
        let unrolled = body(folded.clone());
        (folded, unrolled)
    })
}

proptest! {
    /// Equality is symmetric and consistent with hashing.
    #[test]
    fn equality_is_symmetric_and_hash_consistent(a in arb_type(2), b in arb_type(2)) {
        prop_assert_eq!(a == b, b == a);
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
        prop_assert!(a == a.clone());
    }

    /// Coinductive equality: unrolling a recursive type changes neither
    /// equality nor hash.
    #[test]
    fn unrolling_preserves_equality_and_hash((folded, unrolled) in arb_recursive()) {
        prop_assert!(folded == unrolled);
        prop_assert!(unrolled == folded);
        prop_assert_eq!(hash_of(&folded), hash_of(&unrolled));
    }
}

proptest! {
    #[test]
    fn freezing_is_idempotent(m in arb_json_map(arb_json_value(1))) {
        let once = m.to_mutable().to_frozen();
        let twice = once.frozen();
        prop_assert!(FrozenMap::ptr_eq(&once, &twice));
        prop_assert!(FrozenMap::ptr_eq(&twice.frozen(), &once));
        prop_assert_eq!(once, m);
    }

    #[test]
    fn validation_is_deterministic(t in arb_type(2), m in arb_json_map(arb_json_value(1))) {
        let candidate = Value::Map(m);
        prop_assert_eq!(t.validate(&candidate), t.validate(&candidate));
        prop_assert_eq!(t.validate(&candidate).is_empty(), t.instance(&candidate));
    }

    #[test]
    fn json_round_trip_preserves_maps(m in arb_json_map(arb_json_value(2))) {
        let text = m.to_json().unwrap();
        let back = FrozenMap::from_json(&text).unwrap();
        prop_assert_eq!(back.keys(), m.keys());
        prop_assert_eq!(&back, &m);
        let mutable = Map::from_json(&text).unwrap();
        prop_assert_eq!(mutable.freeze(), m);
    }
}
