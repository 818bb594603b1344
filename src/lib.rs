//! Runtime type descriptions and validation for dynamically shaped data.
//!
//! Types are values: they compose (unions, intersections, negation, sized
//! collections, ranges, records), answer assignability and membership
//! queries, and render to a canonical syntax that [`parse`] reads back.
//! Validation failures are [`Violation`] values, not control flow.
pub mod error;
pub mod indent;
pub mod map;
pub mod parse;
pub mod path_de;
pub mod render;
pub mod types;
pub mod value;
pub mod violation;

#[cfg(test)]
mod prop_tests;

pub use error::{Error, Result};
pub use indent::{IndentBuffer, Indenter};
pub use map::{FrozenMap, Map, MapEntry, ReadMap};
pub use parse::parse;
pub use types::{StructEntry, StructType, Type, TypeIdentifier, TypeKind, default_key_label};
pub use value::{Array, Binary, Native, Regexp, Value};
pub use violation::Violation;
