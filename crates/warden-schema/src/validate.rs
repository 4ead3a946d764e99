//! # Schema Validation
//!
//! Full validation of a policy document against the generated,
//! resource-scoped schema. Violations are collected as structured
//! [`RawViolation`]s (instance path, schema path, message) and reduced
//! to reportable [`ValidationError`]s by the narrowing pass; documents
//! that pass the schema additionally get a document-level uniqueness
//! check over policy names.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use warden_core::ResourceTypeId;

use crate::cache::{InternalSchemaError, SchemaCache};
use crate::narrow;
use crate::source::SchemaSource;

/// Policy attribution used when no policy name can be recovered.
pub const UNKNOWN_POLICY: &str = "unknown";

/// A raw schema violation as produced by the compiled validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawViolation {
    /// JSON Pointer to the violating location in the document.
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the violation.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

/// A reportable validation failure, localized to a policy wherever one
/// can be attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Human-readable description of the failure.
    pub message: String,
    /// Name of the offending policy, or [`UNKNOWN_POLICY`].
    pub policy: String,
    /// JSON Pointer to the violating location in the document.
    pub instance_path: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Schema validator for policy documents.
///
/// Owns a [`SchemaCache`]; repeated validations of documents referencing
/// the same resource types reuse the same compiled validator.
#[derive(Debug)]
pub struct SchemaValidator {
    cache: SchemaCache,
}

impl SchemaValidator {
    /// Validator with a default-capacity cache over `source`.
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            cache: SchemaCache::new(source),
        }
    }

    /// Validator over an explicitly configured cache.
    pub fn with_cache(cache: SchemaCache) -> Self {
        Self { cache }
    }

    /// The cache backing this validator.
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Validate `document` against the schema scoped to
    /// `resource_types`.
    ///
    /// An empty result means the document is valid. A non-empty result
    /// is ordered most-specific-first: either the narrowed schema
    /// violations or, for schema-clean documents, the failures of the
    /// document-level uniqueness check.
    ///
    /// # Errors
    ///
    /// Returns [`InternalSchemaError`] only for schema-machinery
    /// defects; document problems are reported in the `Ok` vector.
    pub fn validate(
        &self,
        document: &Value,
        resource_types: &[ResourceTypeId],
    ) -> Result<Vec<ValidationError>, InternalSchemaError> {
        let compiled = self.cache.validator_for(resource_types)?;

        let violations: Vec<RawViolation> = compiled
            .validator()
            .iter_errors(document)
            .map(|error| RawViolation {
                instance_path: error.instance_path.to_string(),
                schema_path: error.schema_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        if violations.is_empty() {
            return Ok(check_unique(document));
        }
        Ok(narrow::narrow(&violations, document))
    }
}

/// Document-level uniqueness check: every policy name must appear once.
///
/// Runs only on documents that already passed the schema; duplicate
/// names are legal JSON and legal against the schema, but ambiguous for
/// every downstream consumer that addresses policies by name.
pub fn check_unique(document: &Value) -> Vec<ValidationError> {
    let Some(policies) = document.get("policies").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for policy in policies {
        if let Some(name) = policy.get("name").and_then(Value::as_str) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut errors = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for policy in policies {
        let Some(name) = policy.get("name").and_then(Value::as_str) else {
            continue;
        };
        if counts[name] > 1 && reported.insert(name) {
            errors.push(ValidationError {
                message: format!(
                    "duplicate policy name {name:?} appears {} times",
                    counts[name]
                ),
                policy: name.to_string(),
                instance_path: "/policies".to_string(),
            });
        }
    }
    errors
}
