use std::fmt;

/// Kind tag of a [`Type`](super::Type). Used as the dispatch key by the
/// printer and by callers that branch on kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeIdentifier {
    Any,
    Meta,
    AnyOf,
    OneOf,
    AllOf,
    Not,
    Boolean,
    True,
    False,
    Nil,
    Error,
    ErrorExact,
    StringSized,
    StringExact,
    StringPattern,
    Binary,
    BinaryExact,
    Array,
    ArrayExact,
    Tuple,
    Map,
    MapExact,
    Struct,
    MapEntry,
    MapEntryExact,
    IntegerRange,
    IntegerExact,
    FloatRange,
    FloatExact,
    RegexpExact,
    Native,
}

impl TypeIdentifier {
    pub fn name(self) -> &'static str {
        match self {
            TypeIdentifier::Any => "any",
            TypeIdentifier::Meta => "type",
            TypeIdentifier::AnyOf => "anyOf",
            TypeIdentifier::OneOf => "oneOf",
            TypeIdentifier::AllOf => "allOf",
            TypeIdentifier::Not => "not",
            TypeIdentifier::Boolean => "bool",
            TypeIdentifier::True => "true",
            TypeIdentifier::False => "false",
            TypeIdentifier::Nil => "nil",
            TypeIdentifier::Error | TypeIdentifier::ErrorExact => "error",
            TypeIdentifier::StringSized => "string",
            TypeIdentifier::StringExact => "stringExact",
            TypeIdentifier::StringPattern => "pattern",
            TypeIdentifier::Binary => "binary",
            TypeIdentifier::BinaryExact => "binaryExact",
            TypeIdentifier::Array => "array",
            TypeIdentifier::ArrayExact => "arrayExact",
            TypeIdentifier::Tuple => "tuple",
            TypeIdentifier::Map => "map",
            TypeIdentifier::MapExact => "mapExact",
            TypeIdentifier::Struct => "struct",
            TypeIdentifier::MapEntry => "mapEntry",
            TypeIdentifier::MapEntryExact => "mapEntryExact",
            TypeIdentifier::IntegerRange => "intRange",
            TypeIdentifier::IntegerExact => "intExact",
            TypeIdentifier::FloatRange => "floatRange",
            TypeIdentifier::FloatExact => "floatExact",
            TypeIdentifier::RegexpExact => "regexp",
            TypeIdentifier::Native => "native",
        }
    }

    /// Atomic kinds carry no structure and print as their bare name.
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            TypeIdentifier::Any
                | TypeIdentifier::Boolean
                | TypeIdentifier::True
                | TypeIdentifier::False
                | TypeIdentifier::Nil
                | TypeIdentifier::Error
        )
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
