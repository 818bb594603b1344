//! Validation failures as values.
//!
//! A [`Violation`] is data: it compares, hashes and prints like any other
//! member of the value universe, and can itself be wrapped in a
//! [`Value`](crate::value::Value).

use thiserror::Error;

use crate::types::Type;
use crate::value::Value;

#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Violation {
    #[error("the value {value} cannot be assigned to a variable of type {ty}")]
    IllegalAssignment { value: Value, ty: Type },

    #[error("size constraint violation on type {ty} when attempting resize to {size}")]
    IllegalSize { ty: Type, size: usize },

    #[error("key {key} cannot added to type {ty}")]
    IllegalMapKey { key: Value, ty: Type },

    #[error("missing required {label} of type {ty}")]
    MissingKey { key: Value, label: String, ty: Type },
}

impl Violation {
    pub fn assignment(value: Value, ty: Type) -> Self {
        Violation::IllegalAssignment { value, ty }
    }

    pub fn size(ty: Type, size: usize) -> Self {
        Violation::IllegalSize { ty, size }
    }

    pub fn map_key(ty: Type, key: Value) -> Self {
        Violation::IllegalMapKey { key, ty }
    }

    pub fn missing_key(key: Value, label: String, ty: Type) -> Self {
        Violation::MissingKey { key, label, ty }
    }

    /// The type the failure refers to.
    pub fn target(&self) -> &Type {
        match self {
            Violation::IllegalAssignment { ty, .. }
            | Violation::IllegalSize { ty, .. }
            | Violation::IllegalMapKey { ty, .. }
            | Violation::MissingKey { ty, .. } => ty,
        }
    }

    /// The exact type of this error value.
    pub fn type_of(&self) -> Type {
        Type::exact(Value::from(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructEntry;
    use std::collections::HashSet;

    #[test]
    fn assignment_message() {
        let v = Violation::assignment(Value::from(3), Type::string());
        assert_eq!(v.to_string(), "the value 3 cannot be assigned to a variable of type string");
    }

    #[test]
    fn size_message() {
        let v = Violation::size(Type::string_sized(1, 10), 12);
        assert_eq!(v.to_string(), "size constraint violation on type string[1,10] when attempting resize to 12");
    }

    #[test]
    fn map_key_message() {
        let t = Type::record([StructEntry::new("a", Type::string(), true)], false);
        let v = Violation::map_key(t, Value::from("b"));
        assert_eq!(v.to_string(), r#"key "b" cannot added to type {"a":string}"#);
    }

    #[test]
    fn equal_inputs_make_equal_values() {
        let a = Violation::assignment(Value::from("x"), Type::integer());
        let b = Violation::assignment(Value::from("x"), Type::integer());
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(
            Violation::assignment(Value::from("x"), Type::integer()),
            Violation::assignment(Value::from("y"), Type::integer())
        );
    }

    #[test]
    fn violations_are_values() {
        let v = Violation::size(Type::string_sized(1, 10), 12);
        let value = Value::from(v.clone());
        assert!(v.type_of().instance(&value));
        assert!(Type::error().instance(&value));
        assert_eq!(value.to_string(), v.to_string());
        assert_eq!(v.target(), &Type::string_sized(1, 10));
    }
}
