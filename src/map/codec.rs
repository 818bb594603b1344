//! JSON and YAML adapters.
//!
//! Nil, bool, int, float, string, array and map survive a round trip with
//! key order intact. The remaining kinds marshal one way: binary as base64
//! text, regexp as its source, types in canonical syntax, errors as their
//! message and entries as two-element arrays.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use tracing::debug;

use super::{FrozenMap, Map};
use crate::error::{Error, Result};
use crate::path_de;
use crate::value::{Array, Value};

// ————————————————————————————————————————————————————————————————————————————
// SERIALIZE
// ————————————————————————————————————————————————————————————————————————————

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(f.0),
            Value::String(s) => serializer.serialize_str(s),
            Value::Binary(b) => serializer.serialize_str(&b.to_base64()),
            Value::Regexp(r) => serializer.serialize_str(r.as_str()),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for e in a {
                    seq.serialize_element(e)?;
                }
                seq.end()
            }
            Value::Map(m) => m.serialize(serializer),
            Value::Entry(e) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(e.key())?;
                seq.serialize_element(e.value())?;
                seq.end()
            }
            Value::Type(t) => serializer.collect_str(t),
            Value::Violation(v) => serializer.collect_str(v),
            Value::Native(n) => Err(ser::Error::custom(format!(
                "native value of type {} cannot be serialized",
                n.native_type().name()
            ))),
        }
    }
}

impl Serialize for FrozenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_entries(self.associations(), serializer)
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_entries(self.associations(), serializer)
    }
}

fn serialize_entries<S: Serializer>(
    entries: &IndexMap<Value, Value>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (k, v) in entries {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

// ————————————————————————————————————————————————————————————————————————————
// DESERIALIZE
// ————————————————————————————————————————————————————————————————————————————

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a nil, bool, number, string, sequence or map")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> std::result::Result<Value, E> {
        i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {u} is out of range")))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> std::result::Result<Value, E> {
        Ok(Value::float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Value, E> {
        Ok(Value::string(s))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(v) = seq.next_element::<Value>()? {
            values.push(v);
        }
        Ok(Value::Array(Array::from(values)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Value, A::Error> {
        let mut entries = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<Value, Value>()? {
            entries.insert(k, v);
        }
        Ok(Value::Map(entries.into_iter().collect()))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for FrozenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Map(m) => Ok(m),
            other => Err(de::Error::custom(format!("expected a map, found {}", other.kind_name()))),
        }
    }
}

impl<'de> Deserialize<'de> for Map {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        FrozenMap::deserialize(deserializer).map(|m| m.to_mutable())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TEXT FORMATS
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(src: &str) -> Result<Value> {
        path_de::from_json_with_path(src)
    }

    pub fn from_yaml(src: &str) -> Result<Value> {
        path_de::from_yaml_with_path(src)
    }
}

impl FrozenMap {
    /// JSON object keys are strings, so an int or float key comes back from
    /// [`FrozenMap::from_json`] as its string form. Use YAML to keep key kinds.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The document root must be a map.
    pub fn from_json(src: &str) -> Result<FrozenMap> {
        expect_map(Value::from_json(src)?)
    }

    /// The document root must be a map.
    pub fn from_yaml(src: &str) -> Result<FrozenMap> {
        expect_map(Value::from_yaml(src)?)
    }
}

impl Map {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(src: &str) -> Result<Map> {
        FrozenMap::from_json(src).map(|m| m.to_mutable())
    }

    pub fn from_yaml(src: &str) -> Result<Map> {
        FrozenMap::from_yaml(src).map(|m| m.to_mutable())
    }
}

fn expect_map(value: Value) -> Result<FrozenMap> {
    match value {
        Value::Map(m) => Ok(m),
        other => {
            debug!(kind = other.kind_name(), "document root is not a map");
            Err(Error::NotAMap(other.kind_name().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ReadMap;
    use crate::types::Type;
    use crate::value::Binary;
    use serde_json::json;

    #[test]
    fn json_round_trip_keeps_order() {
        let doc = json!({"z": 1, "a": [true, null, 2.5], "m": {"k": "v"}});
        let m = FrozenMap::from_json(&doc.to_string()).unwrap();
        let keys: Vec<Value> = m.keys().iter().cloned().collect();
        assert_eq!(keys, vec![Value::from("z"), Value::from("a"), Value::from("m")]);
        assert_eq!(m.get(&Value::from("z")), Some(&Value::from(1)));
        assert_eq!(m.to_json().unwrap(), doc.to_string());
    }

    #[test]
    fn ints_and_floats_stay_apart() {
        let m = FrozenMap::from_json(r#"{"i": 1, "f": 1.0}"#).unwrap();
        assert_eq!(m.get(&Value::from("i")), Some(&Value::from(1)));
        assert_eq!(m.get(&Value::from("f")), Some(&Value::from(1.0)));
    }

    #[test]
    fn yaml_round_trip() {
        let m = FrozenMap::from_yaml("b: 1\na:\n  - x\n  - 2.5\n  - ~\n1: true\n").unwrap();
        assert_eq!(m.get(&Value::from(1)), Some(&Value::Bool(true)));
        let back = FrozenMap::from_yaml(&m.to_yaml().unwrap()).unwrap();
        assert_eq!(back, m);
        let keys: Vec<Value> = back.keys().iter().cloned().collect();
        assert_eq!(keys, vec![Value::from("b"), Value::from("a"), Value::from(1)]);
    }

    #[test]
    fn json_stringifies_keys() {
        let m: FrozenMap = [(Value::from(1), Value::from("one"))].into_iter().collect();
        let back = FrozenMap::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(back.get(&Value::from("1")), Some(&Value::from("one")));
        assert_eq!(back.get(&Value::from(1)), None);
        let kept = FrozenMap::from_yaml(&m.to_yaml().unwrap()).unwrap();
        assert_eq!(kept, m);
    }

    #[test]
    fn one_way_kinds() {
        let mut m = Map::new();
        m.put("bin", Binary::new(vec![1u8, 2, 3])).unwrap();
        m.put("ty", Type::string_sized(1, 10)).unwrap();
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({"bin": "AQID", "ty": "string[1,10]"})
        );
    }

    #[test]
    fn root_must_be_a_map() {
        assert!(matches!(FrozenMap::from_json("[1,2]"), Err(Error::NotAMap(kind)) if kind == "array"));
        assert!(matches!(Map::from_yaml("- 1\n"), Err(Error::NotAMap(_))));
        assert!(Value::from_json("[1,2]").is_ok());
    }

    #[test]
    fn malformed_documents_report_json_errors() {
        assert!(matches!(FrozenMap::from_json(r#"{"a": }"#), Err(Error::Json(_))));
    }
}
