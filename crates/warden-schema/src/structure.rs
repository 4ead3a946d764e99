//! # Structural Pre-Validation
//!
//! Fast validation and inspection of a policy document before any schema
//! is generated. The full schema validator produces deep error trees for
//! what are usually shallow authoring mistakes — a typo in a key, a
//! mapping where a list belongs. This pass catches those with one-line,
//! policy-localized errors, in O(number of policies) with nothing but
//! type and membership checks.
//!
//! It runs unconditionally: even when full schema validation is disabled,
//! a document that fails here never reaches the collection builder.

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use warden_core::{ResourceTypeId, DEFAULT_PROVIDER};

/// The only keys allowed at the top level of a policy document.
pub const ALLOWED_FILE_KEYS: &[&str] = &["variables", "policies"];

/// Keys every policy entry must carry.
pub const REQUIRED_POLICY_KEYS: &[&str] = &["name", "resource"];

/// The full whitelist of keys a policy entry may carry.
pub const ALLOWED_POLICY_KEYS: &[&str] = &[
    "name",
    "resource",
    "title",
    "description",
    "execution-mode",
    "tags",
    "resource-quota",
    "metadata",
    "query",
    "filters",
    "actions",
    "source",
    "conditions",
    // legacy keys subject to deprecation
    "region",
    "start",
    "end",
    "tz",
    "resource-quota-percent",
    "comments",
    "comment",
];

/// A document shape violation. Always fatal, never retried; localized to
/// the offending policy wherever one exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// The document root is not a mapping.
    #[error("policy file top level must be a mapping, found: {found}")]
    NotMapping {
        /// Type name of the value actually found.
        found: String,
    },

    /// The document carries top-level keys outside the allowed set.
    #[error("policy file top level keys are {}, found extra: {}", ALLOWED_FILE_KEYS.join(", "), .extra.join(", "))]
    UnknownFileKeys {
        /// The unrecognized keys, sorted.
        extra: Vec<String>,
    },

    /// The `policies` key is absent.
    #[error("`policies` list missing")]
    PoliciesMissing,

    /// The `policies` key is not a sequence.
    #[error("`policies` key should be an array, found: {found}")]
    PoliciesNotSequence {
        /// Type name of the value actually found.
        found: String,
    },

    /// A policy entry is not a mapping.
    #[error("policy must be a mapping, found: {found} policy:\n{content}")]
    PolicyNotMapping {
        /// Type name of the entry actually found.
        found: String,
        /// The raw entry, pretty-printed.
        content: String,
    },

    /// A policy entry is missing `name` or `resource`.
    #[error("policy missing required keys ({}) data:\n{content}", REQUIRED_POLICY_KEYS.join(", "))]
    MissingRequiredKeys {
        /// The raw entry, pretty-printed.
        content: String,
    },

    /// A policy entry carries keys outside the whitelist.
    #[error("policy:{policy} has unknown keys: {}", .keys.join(","))]
    UnknownPolicyKeys {
        /// Name of the offending policy.
        policy: String,
        /// The unrecognized keys.
        keys: Vec<String>,
    },

    /// `filters` is present but not a sequence or null.
    #[error("policy:{policy} must use a list for filters, found: {found}")]
    FiltersNotSequence {
        /// Name of the offending policy.
        policy: String,
        /// Type name of the value actually found.
        found: String,
    },

    /// A filter element is neither a mapping nor a string.
    #[error("policy:{policy} filter must be a mapping or string, found: {found}")]
    InvalidFilterElement {
        /// Name of the offending policy.
        policy: String,
        /// Type name of the element actually found.
        found: String,
    },

    /// `actions` is present but not a sequence or null.
    #[error("policy:{policy} must use a list for actions, found: {found}")]
    ActionsNotSequence {
        /// Name of the offending policy.
        policy: String,
        /// Type name of the value actually found.
        found: String,
    },

    /// An action element is neither a mapping nor a string.
    #[error("policy:{policy} action must be a mapping or string, found: {found}")]
    InvalidActionElement {
        /// Name of the offending policy.
        policy: String,
        /// Type name of the element actually found.
        found: String,
    },
}

/// Structural validator for policy documents.
///
/// Carries the default provider used to qualify bare resource names; the
/// provider is injected configuration, defaulting to
/// [`warden_core::DEFAULT_PROVIDER`].
#[derive(Debug, Clone)]
pub struct StructureValidator {
    default_provider: String,
}

impl StructureValidator {
    /// Validator with the stock default provider.
    pub fn new() -> Self {
        Self::with_default_provider(DEFAULT_PROVIDER)
    }

    /// Validator qualifying bare resource names with `provider`.
    pub fn with_default_provider(provider: impl Into<String>) -> Self {
        Self {
            default_provider: provider.into(),
        }
    }

    /// The provider applied to bare resource names.
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Validate the document shape, failing on the first violation.
    ///
    /// Checks, in order: the root is a mapping; top-level keys are within
    /// the allowed set; `policies` is present and a sequence; then each
    /// policy entry in sequence order via the per-policy checks.
    ///
    /// # Errors
    ///
    /// Returns the first [`StructureError`] found.
    pub fn validate(&self, document: &Value) -> Result<(), StructureError> {
        let root = match document {
            Value::Object(map) => map,
            other => {
                return Err(StructureError::NotMapping {
                    found: type_name(other).to_string(),
                })
            }
        };

        let extra: Vec<String> = root
            .keys()
            .filter(|key| !ALLOWED_FILE_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !extra.is_empty() {
            return Err(StructureError::UnknownFileKeys { extra });
        }

        let policies = root
            .get("policies")
            .ok_or(StructureError::PoliciesMissing)?;
        let policies = match policies {
            Value::Array(entries) => entries,
            other => {
                return Err(StructureError::PoliciesNotSequence {
                    found: type_name(other).to_string(),
                })
            }
        };

        for policy in policies {
            self.validate_policy(policy)?;
        }
        Ok(())
    }

    /// Validate a single policy entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`StructureError`] found, naming the policy
    /// wherever its `name` is available.
    pub fn validate_policy(&self, policy: &Value) -> Result<(), StructureError> {
        let entry = match policy {
            Value::Object(map) => map,
            other => {
                return Err(StructureError::PolicyNotMapping {
                    found: type_name(other).to_string(),
                    content: pretty(other),
                })
            }
        };

        if REQUIRED_POLICY_KEYS
            .iter()
            .any(|key| !entry.contains_key(*key))
        {
            return Err(StructureError::MissingRequiredKeys {
                content: pretty(policy),
            });
        }

        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        let unknown: Vec<String> = entry
            .keys()
            .filter(|key| !ALLOWED_POLICY_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(StructureError::UnknownPolicyKeys {
                policy: name.to_string(),
                keys: unknown,
            });
        }

        match entry.get("filters") {
            None | Some(Value::Null) => {}
            Some(Value::Array(elements)) => {
                for element in elements {
                    if !matches!(element, Value::Object(_) | Value::String(_)) {
                        return Err(StructureError::InvalidFilterElement {
                            policy: name.to_string(),
                            found: type_name(element).to_string(),
                        });
                    }
                }
            }
            Some(other) => {
                return Err(StructureError::FiltersNotSequence {
                    policy: name.to_string(),
                    found: type_name(other).to_string(),
                })
            }
        }

        match entry.get("actions") {
            None | Some(Value::Null) => {}
            Some(Value::Array(elements)) => {
                for element in elements {
                    if !matches!(element, Value::Object(_) | Value::String(_)) {
                        return Err(StructureError::InvalidActionElement {
                            policy: name.to_string(),
                            found: type_name(element).to_string(),
                        });
                    }
                }
            }
            Some(other) => {
                return Err(StructureError::ActionsNotSequence {
                    policy: name.to_string(),
                    found: type_name(other).to_string(),
                })
            }
        }

        Ok(())
    }

    /// Collect the distinct resource types the document references,
    /// qualifying bare names with the configured default provider.
    ///
    /// Duplicates merge; order is irrelevant (the set is ordered only so
    /// downstream schema-cache keys are deterministic).
    pub fn resource_types(&self, document: &Value) -> BTreeSet<ResourceTypeId> {
        let mut types = BTreeSet::new();
        let Some(policies) = document.get("policies").and_then(Value::as_array) else {
            return types;
        };
        for policy in policies {
            if let Some(raw) = policy.get("resource").and_then(Value::as_str) {
                types.insert(ResourceTypeId::qualified(raw, &self.default_provider));
            }
        }
        types
    }
}

impl Default for StructureValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
