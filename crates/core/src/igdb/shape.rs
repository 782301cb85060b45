//! Structural validation of loosely-typed IGDB records.
//!
//! A [`Schema`] lists the fields a record must (or may) carry, their scalar
//! kind and whether they hold one value or an array. [`Schema::check`] returns
//! either `Ok(())` or every [`Violation`] found, so a caller can report all
//! offending field paths at once.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    client::RawRecord,
    error::{IgdbError, Problem, Violation},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Integer,
    Number,
    String,
    Bool,
    Object(Schema),
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Bool => "boolean",
            Kind::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub required: bool,
}

/// Expected shape of a record. Fields not listed are ignored by
/// [`Schema::check`] and dropped by [`Schema::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn required(self, name: impl Into<String>, kind: Kind) -> Self {
        self.with(name, kind, Cardinality::One, true)
    }

    pub fn optional(self, name: impl Into<String>, kind: Kind) -> Self {
        self.with(name, kind, Cardinality::One, false)
    }

    pub fn required_list(self, name: impl Into<String>, kind: Kind) -> Self {
        self.with(name, kind, Cardinality::Many, true)
    }

    pub fn optional_list(self, name: impl Into<String>, kind: Kind) -> Self {
        self.with(name, kind, Cardinality::Many, false)
    }

    fn with(
        self,
        name: impl Into<String>,
        kind: Kind,
        cardinality: Cardinality,
        required: bool,
    ) -> Self {
        self.field(FieldSpec {
            name: name.into(),
            kind,
            cardinality,
            required,
        })
    }

    /// Check `record` against this schema. `null` counts as absent.
    pub fn check(&self, record: &RawRecord) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        check_object(self, record, "", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Check `record` and keep only the fields this schema names.
    pub fn validate(&self, record: &RawRecord) -> super::Result<ValidatedRecord> {
        self.check(record)
            .map_err(|violations| IgdbError::Schema(violations.into()))?;
        Ok(ValidatedRecord(project(self, record)))
    }
}

/// A record that passed [`Schema::validate`], reduced to the schema's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord(RawRecord);

impl ValidatedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }

    pub fn as_map(&self) -> &RawRecord {
        &self.0
    }

    pub(crate) fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Deserialize into a typed view. Failures are decode errors.
    pub fn into_typed<T: DeserializeOwned>(self) -> super::Result<T> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| IgdbError::Decode(e.to_string()))
    }
}

fn check_object(schema: &Schema, record: &RawRecord, prefix: &str, out: &mut Vec<Violation>) {
    for spec in &schema.fields {
        let path = if prefix.is_empty() {
            spec.name.clone()
        } else {
            format!("{}.{}", prefix, spec.name)
        };

        let value = match record.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    out.push(Violation {
                        path,
                        problem: Problem::Missing,
                    });
                }
                continue;
            }
            Some(value) => value,
        };

        match spec.cardinality {
            Cardinality::One => check_value(&spec.kind, value, &path, out),
            Cardinality::Many => match value.as_array() {
                Some(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        check_value(&spec.kind, item, &format!("{}[{}]", path, idx), out);
                    }
                }
                None => out.push(Violation {
                    path,
                    problem: Problem::Mismatch {
                        expected: format!("array of {}", spec.kind.name()),
                        found: type_name(value),
                    },
                }),
            },
        }
    }
}

fn check_value(kind: &Kind, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let matches = match kind {
        Kind::Integer => value.is_i64() || value.is_u64(),
        Kind::Number => value.is_number(),
        Kind::String => value.is_string(),
        Kind::Bool => value.is_boolean(),
        Kind::Object(schema) => {
            if let Some(object) = value.as_object() {
                check_object(schema, object, path, out);
                return;
            }
            false
        }
    };

    if !matches {
        out.push(Violation {
            path: path.to_string(),
            problem: Problem::Mismatch {
                expected: kind.name().to_string(),
                found: type_name(value),
            },
        });
    }
}

fn project(schema: &Schema, record: &RawRecord) -> RawRecord {
    let mut projected = RawRecord::new();
    for spec in &schema.fields {
        let Some(value) = record.get(&spec.name).filter(|value| !value.is_null()) else {
            continue;
        };
        let value = match (&spec.kind, value) {
            (Kind::Object(nested), Value::Object(object)) => Value::Object(project(nested, object)),
            (Kind::Object(nested), Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(object) => Value::Object(project(nested, object)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            (_, other) => other.clone(),
        };
        projected.insert(spec.name.clone(), value);
    }
    projected
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
