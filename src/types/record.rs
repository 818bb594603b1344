//! Record ("struct") types and the validator that turns structural mismatches
//! into [`Violation`] values.

use tracing::debug;

use super::{Type, TypeKind};
use crate::indent::Indenter;
use crate::value::Value;
use crate::violation::Violation;

/// One declared entry of a record type.
#[derive(Clone, Debug)]
pub struct StructEntry {
    key: Value,
    value: Type,
    required: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StructType {
    entries: Vec<StructEntry>,
    additional: bool,
}

impl StructEntry {
    pub fn new(key: impl Into<Value>, value: Type, required: bool) -> Self {
        StructEntry { key: key.into(), value, required }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn value(&self) -> &Type {
        &self.value
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

impl StructType {
    pub fn new(entries: impl IntoIterator<Item = StructEntry>, additional: bool) -> Self {
        let mut declared: Vec<StructEntry> = Vec::new();
        for entry in entries {
            match declared.iter_mut().find(|e| e.key == entry.key) {
                Some(slot) => *slot = entry,
                None => declared.push(entry),
            }
        }
        StructType { entries: declared, additional }
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[StructEntry] {
        &self.entries
    }

    pub fn get(&self, key: &Value) -> Option<&StructEntry> {
        self.entries.iter().find(|e| e.key == *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when maps described by this type may carry undeclared keys.
    pub fn additional(&self) -> bool {
        self.additional
    }
}

/// `parameter '<key>'`, with string keys unquoted.
pub fn default_key_label(key: &Value) -> String {
    match key {
        Value::String(s) => format!("parameter '{s}'"),
        other => format!("parameter '{other}'"),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION
// ————————————————————————————————————————————————————————————————————————————

impl Type {
    /// Validate `value` against this type, labelling keys with
    /// [`default_key_label`]. An empty result means the value conforms.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        self.validate_with(value, default_key_label)
    }

    /// Validate `value` against this type.
    ///
    /// For record types the candidate map is checked entry by entry, in this
    /// order: missing required keys (declaration order), unrecognized keys
    /// (candidate order), then declared keys whose value is not an instance of
    /// the entry type. Any other type yields at most one assignment error.
    pub fn validate_with(&self, value: &Value, key_label: impl Fn(&Value) -> String) -> Vec<Violation> {
        let TypeKind::Struct(st) = self.kind() else {
            return if self.instance(value) {
                Vec::new()
            } else {
                vec![Violation::assignment(value.clone(), self.clone())]
            };
        };
        let Value::Map(map) = value else {
            return vec![Violation::assignment(value.clone(), self.clone())];
        };

        let mut errors = Vec::new();
        for entry in st.entries() {
            if entry.required() && !map.contains_key(entry.key()) {
                errors.push(Violation::missing_key(
                    entry.key().clone(),
                    key_label(entry.key()),
                    entry.value().clone(),
                ));
            }
        }
        if !st.additional() {
            for key in map.associations().keys() {
                if st.get(key).is_none() {
                    errors.push(Violation::map_key(self.clone(), key.clone()));
                }
            }
        }
        for entry in st.entries() {
            if let Some(v) = map.get(entry.key()) {
                if !entry.value().instance(v) {
                    errors.push(Violation::assignment(v.clone(), entry.value().clone()));
                }
            }
        }
        debug!(ty = %self, errors = errors.len(), "validated map");
        errors
    }

    /// Same checks as [`Type::validate`], but every check, passing or not, is
    /// narrated on `out`. Only the verdict is returned.
    pub fn validate_verbose(&self, value: &Value, out: &mut impl Indenter) -> bool {
        let TypeKind::Struct(st) = self.kind() else {
            let ok = self.instance(value);
            out.write(&format!("Check that {value} is an instance of {self}: "));
            out.write(verdict(ok));
            return ok;
        };
        let Value::Map(map) = value else {
            out.write(&format!("Check that {value} is a map: FAILED!"));
            return false;
        };

        let mut ok = true;
        out.write(&format!("Validating against {self}"));
        out.indent();
        for entry in st.entries() {
            out.newline();
            out.write(&default_key_label(entry.key()));
            out.indent();
            out.newline();
            match map.get(entry.key()) {
                Some(v) => {
                    let matched = entry.value().instance(v);
                    ok &= matched;
                    out.write(&format!("Check that {v} is an instance of {}: ", entry.value()));
                    out.write(verdict(matched));
                }
                None if entry.required() => {
                    ok = false;
                    out.write("Check that it is present: FAILED! (required)");
                }
                None => out.write("Check that it is present: OK! (optional, absent)"),
            }
            out.dedent();
        }
        for key in map.associations().keys() {
            if st.get(key).is_some() {
                continue;
            }
            out.newline();
            out.write(&default_key_label(key));
            out.indent();
            out.newline();
            if st.additional() {
                out.write("Check that it is declared: OK! (additional entries allowed)");
            } else {
                ok = false;
                out.write("Check that it is declared: FAILED!");
            }
            out.dedent();
        }
        out.dedent();
        ok
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok { "OK!" } else { "FAILED!" }
}
