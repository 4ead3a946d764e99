//! # Value Lookup
//!
//! A configuration field may hold either a literal value or a declarative
//! lookup expression that defers resolution to a path query against
//! runtime resource data:
//!
//! ```yaml
//! value:
//!   type: resource
//!   key: Tags[0].Value
//!   default-value: unknown
//! ```
//!
//! Which of the two a value is gets decided exactly once, at parse time:
//! [`LookupSource::parse`] classifies the raw value into the
//! [`LookupSource`] tagged union, and every later use resolves through
//! that variant. A mapping that does not match the lookup shape is a
//! [`LookupError`], never silently treated as a literal.

use serde_json::{json, Value};
use thiserror::Error;

use crate::path::{PathError, PathExpr};

/// The `type` tag of a lookup expression that resolves against the
/// evaluated resource.
pub const RESOURCE_SOURCE: &str = "resource";

const KEY_FIELD: &str = "key";
const TYPE_FIELD: &str = "type";
const DEFAULT_FIELD: &str = "default-value";

/// Errors raised while parsing or resolving a lookup expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The mapping is missing a required lookup field.
    #[error("lookup expression missing required field {field:?}")]
    MissingField {
        /// The absent field name.
        field: &'static str,
    },

    /// The `type` tag names an unsupported lookup source.
    #[error("unsupported lookup source type {found:?}, expected {RESOURCE_SOURCE:?}")]
    UnsupportedSource {
        /// The offending tag value.
        found: String,
    },

    /// A lookup field holds the wrong kind of value.
    #[error("lookup field {field:?} must be a string, found: {found}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
        /// Type name of the value actually present.
        found: String,
    },

    /// The mapping carries a field outside the lookup shape.
    #[error("lookup expression has unknown field {field:?}")]
    UnknownField {
        /// The unrecognized field name.
        field: String,
    },

    /// The key is not a valid path expression.
    #[error("invalid lookup key: {0}")]
    InvalidKey(#[from] PathError),

    /// The key resolved to no value and no default was supplied.
    #[error("lookup for key {key:?} returned no value and no default-value was supplied")]
    Unresolved {
        /// The key that failed to resolve.
        key: String,
    },
}

/// A configuration value, classified once as literal or lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupSource {
    /// A plain value, returned unchanged at resolution time.
    Literal(Value),
    /// A deferred query against the evaluated resource.
    Resource {
        /// Path expression evaluated against the resource.
        key: String,
        /// Value returned when the key resolves to nothing.
        default: Option<Value>,
    },
}

impl LookupSource {
    /// Classify a raw configuration value.
    ///
    /// Mappings must match the lookup shape (`type: resource`, a string
    /// `key`, optional `default-value`); any other value is a literal.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] for a mapping that is not a well-formed
    /// lookup expression.
    pub fn parse(source: &Value) -> Result<Self, LookupError> {
        let map = match source {
            Value::Object(map) => map,
            other => return Ok(Self::Literal(other.clone())),
        };

        for field in map.keys() {
            if field != TYPE_FIELD && field != KEY_FIELD && field != DEFAULT_FIELD {
                return Err(LookupError::UnknownField {
                    field: field.clone(),
                });
            }
        }

        let tag = map
            .get(TYPE_FIELD)
            .ok_or(LookupError::MissingField { field: TYPE_FIELD })?;
        let tag = tag.as_str().ok_or_else(|| LookupError::InvalidField {
            field: TYPE_FIELD,
            found: value_type_name(tag).to_string(),
        })?;
        if tag != RESOURCE_SOURCE {
            return Err(LookupError::UnsupportedSource {
                found: tag.to_string(),
            });
        }

        let key = map
            .get(KEY_FIELD)
            .ok_or(LookupError::MissingField { field: KEY_FIELD })?;
        let key = key.as_str().ok_or_else(|| LookupError::InvalidField {
            field: KEY_FIELD,
            found: value_type_name(key).to_string(),
        })?;

        Ok(Self::Resource {
            key: key.to_string(),
            default: map.get(DEFAULT_FIELD).cloned(),
        })
    }

    /// Resolve this source against optional resource data.
    ///
    /// Literals return their value unchanged. Resource lookups evaluate
    /// the key path; an absent or null result falls back to the default
    /// value when one was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Unresolved`] when the key yields nothing
    /// and no default exists, or [`LookupError::InvalidKey`] for a
    /// malformed key expression.
    pub fn resolve(&self, context: Option<&Value>) -> Result<Value, LookupError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Resource { key, default } => {
                let expr = PathExpr::parse(key)?;
                let found = context.and_then(|data| expr.eval(data));
                match found {
                    Some(value) if !value.is_null() => Ok(value.clone()),
                    _ => default.clone().ok_or_else(|| LookupError::Unresolved {
                        key: key.clone(),
                    }),
                }
            }
        }
    }
}

/// Classify and resolve a raw configuration value in one step.
///
/// # Errors
///
/// Propagates both parse-time and resolution-time [`LookupError`]s.
pub fn extract(source: &Value, context: Option<&Value>) -> Result<Value, LookupError> {
    LookupSource::parse(source)?.resolve(context)
}

/// Declared schema of a lookup-enabled field.
///
/// Authors may supply either a literal matching `field_schema` or a
/// lookup expression whose `default-value` matches `field_schema`; the
/// returned schema is the union of the two shapes.
pub fn lookup_schema(field_schema: &Value) -> Value {
    json!({
        "oneOf": [
            {
                "type": "object",
                "properties": {
                    "type": {"type": "string", "enum": [RESOURCE_SOURCE]},
                    "key": {"type": "string"},
                    "default-value": field_schema,
                },
                "additionalProperties": false,
                "required": ["type", "key"],
            },
            field_schema,
        ]
    })
}

/// Human-oriented type name of a JSON value, for error messages.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
