//! Validation Engine
//!
//! Field-level contracts for inbound payloads. A [`Schema`] maps each field
//! name to the set of runtime types it may hold; including
//! [`PrimitiveType::Undefined`] in the set makes the field optional.
//!
//! Validation is a single deterministic pass over the inbound object in its
//! insertion order, so the first offending key reported is the first one the
//! client sent, not the lexicographically smallest.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::error::{ErrorKind, LambdaError};

/// Runtime type names a schema field can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    /// Sentinel marking the field optional
    Undefined,
}

impl PrimitiveType {
    /// Runtime type of a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Null => Self::Null,
        }
    }

    /// Lower-case type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "null" => Ok(Self::Null),
            "undefined" => Ok(Self::Undefined),
            other => Err(format!("unknown type name: {other}")),
        }
    }
}

/// The set of types allowed for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTypes(BTreeSet<PrimitiveType>);

impl FieldTypes {
    /// A single allowed type.
    pub fn one(ty: PrimitiveType) -> Self {
        Self(BTreeSet::from([ty]))
    }

    /// Any of the given types.
    pub fn any_of(types: impl IntoIterator<Item = PrimitiveType>) -> Self {
        Self(types.into_iter().collect())
    }

    /// Whether a value of `ty` satisfies this field.
    pub fn allows(&self, ty: PrimitiveType) -> bool {
        self.0.contains(&ty)
    }

    /// Whether the field may be absent.
    pub fn is_optional(&self) -> bool {
        self.allows(PrimitiveType::Undefined)
    }

    /// Allowed types in stable order.
    pub fn iter(&self) -> impl Iterator<Item = PrimitiveType> + '_ {
        self.0.iter().copied()
    }

    fn to_json(&self) -> Value {
        let mut names: Vec<Value> = self.iter().map(|ty| Value::from(ty.as_str())).collect();
        if names.len() == 1 {
            names.remove(0)
        } else {
            Value::Array(names)
        }
    }
}

/// Errors raised while building a schema from JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema must be a JSON object")]
    NotAnObject,

    #[error("field '{field}' has an unknown type name '{name}'")]
    UnknownType { field: String, name: String },

    #[error("field '{field}' allows no types")]
    EmptyTypeSet { field: String },

    #[error("field '{field}' must be a type name or a list of type names")]
    InvalidEntry { field: String },
}

/// Ordered field contract for an inbound object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, FieldTypes)>,
}

impl Schema {
    /// Empty schema; accepts only `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Required field of one type.
    pub fn field(self, name: impl Into<String>, ty: PrimitiveType) -> Self {
        self.with(name, FieldTypes::one(ty))
    }

    /// Optional field of one type.
    pub fn optional(self, name: impl Into<String>, ty: PrimitiveType) -> Self {
        self.with(name, FieldTypes::any_of([ty, PrimitiveType::Undefined]))
    }

    /// Field allowing any of `types`. Include `Undefined` to make it optional.
    pub fn any_of(self, name: impl Into<String>, types: impl IntoIterator<Item = PrimitiveType>) -> Self {
        self.with(name, FieldTypes::any_of(types))
    }

    /// Insert or replace a field. A replaced field keeps its declared position.
    pub fn with(mut self, name: impl Into<String>, types: FieldTypes) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = types,
            None => self.fields.push((name, types)),
        }
        self
    }

    /// Allowed types of `name`.
    pub fn get(&self, name: &str) -> Option<&FieldTypes> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, types)| types)
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check `object` against the schema.
    pub fn validate(&self, object: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut remaining: Vec<&str> = self.names().collect();

        for (key, value) in object {
            let Some(types) = self.get(key) else {
                return Err(ValidationError::UnknownParameter(key.clone()));
            };
            if !types.allows(PrimitiveType::of(value)) {
                return Err(ValidationError::InvalidParameter(key.clone()));
            }
            remaining.retain(|name| *name != key.as_str());
        }

        let missing: Vec<String> = remaining
            .into_iter()
            .filter(|name| self.get(name).is_some_and(|types| !types.is_optional()))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingParameters(missing))
        }
    }

    /// JSON form, e.g. `{"type": "string", "name": ["string", "undefined"]}`.
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, types)| (name.clone(), types.to_json()))
            .collect();
        Value::Object(fields)
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(fields) = value else {
            return Err(SchemaError::NotAnObject);
        };

        let mut schema = Schema::new();
        for (field, entry) in fields {
            let names: Vec<Value> = match entry {
                Value::String(_) => vec![entry],
                Value::Array(names) => names,
                _ => return Err(SchemaError::InvalidEntry { field }),
            };

            let mut types = BTreeSet::new();
            for name in names {
                let Value::String(name) = name else {
                    return Err(SchemaError::InvalidEntry { field });
                };
                let ty = PrimitiveType::try_from(name.as_str())
                    .map_err(|_| SchemaError::UnknownType { field: field.clone(), name })?;
                types.insert(ty);
            }

            if types.is_empty() {
                return Err(SchemaError::EmptyTypeSet { field });
            }
            schema = schema.with(field, FieldTypes(types));
        }

        Ok(schema)
    }
}

/// A rejected payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Parameter '{0}' is not valid")]
    InvalidParameter(String),

    #[error("Missing parameters [{}]", .0.join(", "))]
    MissingParameters(Vec<String>),
}

impl ValidationError {
    /// Machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownParameter(_) => "unknown_parameter",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::MissingParameters(_) => "missing_parameter",
        }
    }

    /// Build the client-facing error using the endpoint's message templates
    /// and error kind.
    pub fn render(&self, messages: &ValidationMessages, kind: ErrorKind) -> LambdaError {
        let body = match self {
            Self::UnknownParameter(name) => messages.unknown_parameter.replace("{{parameter}}", name),
            Self::InvalidParameter(name) => messages.invalid_parameter.replace("{{parameter}}", name),
            Self::MissingParameters(names) => messages
                .missing_parameter
                .replace("{{parameters}}", &names.join(", ")),
        };
        kind.build(messages.status, body).with_message(self.to_string())
    }
}

/// Status and message templates for validation failures.
///
/// `{{parameter}}` is replaced by the offending field, `{{parameters}}` by the
/// comma-joined list of missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMessages {
    pub status: StatusCode,
    pub missing_parameter: String,
    pub invalid_parameter: String,
    pub unknown_parameter: String,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            missing_parameter: "Missing parameters [{{parameters}}]".to_string(),
            invalid_parameter: "Parameter '{{parameter}}' is not valid".to_string(),
            unknown_parameter: "Unknown parameter '{{parameter}}'".to_string(),
        }
    }
}
