//! # Policy Load Pipeline
//!
//! Orchestrates the full path from raw document to policy collection:
//!
//! 1. structural pre-validation (unconditional, even when schema
//!    validation is disabled);
//! 2. resource-type extraction;
//! 3. catalog resolution, with any unknown type attributed to the first
//!    policy referencing it;
//! 4. schema validation (on by default), surfacing the narrowed error
//!    and its policy;
//! 5. hand-off to the external collection constructor.
//!
//! Failure is always a single [`PolicyLoadError`]; callers distinguish
//! success from failure by that signal alone, never by partial results.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use warden_core::ResourceTypeId;
use warden_schema::{
    InternalSchemaError, SchemaCache, SchemaSource, SchemaValidator, StructureError,
    StructureValidator, ValidationError, UNKNOWN_POLICY,
};

use crate::catalog::ResourceCatalog;
use crate::collection::{CollectionBuilder, ExecutionConfig};
use crate::decode::{self, DecodeError, DocumentFormat};

/// The single failure signal of the load pipeline.
#[derive(Error, Debug)]
pub enum PolicyLoadError {
    /// The document shape is invalid.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// A policy references a resource type the catalog cannot resolve.
    #[error("policy:{policy} references an unknown resource:{resource}")]
    UnknownResource {
        /// Name of the referencing policy.
        policy: String,
        /// The unresolved resource as written in the document.
        resource: String,
    },

    /// The document failed schema validation.
    #[error("failed to validate policy {policy}\n {error}")]
    Validation {
        /// Name of the offending policy, or `unknown`.
        policy: String,
        /// The narrowed, most specific error.
        error: ValidationError,
    },

    /// The schema machinery itself is defective.
    #[error(transparent)]
    Internal(#[from] InternalSchemaError),

    /// The given policy-file path does not exist.
    #[error("invalid path for policy file: {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// The policy file could not be read.
    #[error("failed to read policy file {path}: {reason}")]
    Io {
        /// The offending path.
        path: String,
        /// Reason the read failed.
        reason: String,
    },

    /// The policy file could not be decoded.
    #[error("failed to decode policy file {path}: {source}")]
    Decode {
        /// The offending path.
        path: String,
        /// The decoding failure.
        source: DecodeError,
    },
}

/// The policy-file load pipeline.
///
/// Generic over the external collection constructor; owns its own
/// schema validator and cache, so loaders configured against different
/// schema sources never share state.
pub struct PolicyLoader<B: CollectionBuilder> {
    structure: StructureValidator,
    validator: SchemaValidator,
    catalog: Arc<dyn ResourceCatalog>,
    builder: B,
    config: ExecutionConfig,
    schema_validation: bool,
}

impl<B: CollectionBuilder> PolicyLoader<B> {
    /// Loader over the given collaborators, with schema validation on
    /// and the stock default provider.
    pub fn new(
        catalog: Arc<dyn ResourceCatalog>,
        source: Arc<dyn SchemaSource>,
        builder: B,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            structure: StructureValidator::new(),
            validator: SchemaValidator::new(source),
            catalog,
            builder,
            config,
            schema_validation: true,
        }
    }

    /// Qualify bare resource names with `provider` instead of the stock
    /// default.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.structure = StructureValidator::with_default_provider(provider);
        self
    }

    /// Enable or disable schema validation by default. Per-call
    /// `validate` arguments still override this.
    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.schema_validation = enabled;
        self
    }

    /// The schema cache owned by this loader.
    pub fn schema_cache(&self) -> &SchemaCache {
        self.validator.cache()
    }

    /// Load a policy file from disk.
    ///
    /// Checks existence, decodes by explicit `format` or file
    /// extension, then runs [`load_document`](Self::load_document) with
    /// the loader defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyLoadError::InvalidPath`] for a missing file, the
    /// decode/read variants for unreadable content, or whatever
    /// `load_document` fails with.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        format: Option<DocumentFormat>,
        session: Option<&B::Session>,
    ) -> Result<B::Collection, PolicyLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PolicyLoadError::InvalidPath {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| PolicyLoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let format = format.unwrap_or_else(|| DocumentFormat::from_path(path));
        let document =
            decode::decode_str(&content, format).map_err(|source| PolicyLoadError::Decode {
                path: path.display().to_string(),
                source,
            })?;
        self.load_document(&document, &path.display().to_string(), None, session, None)
    }

    /// Run the pipeline over an already-decoded document.
    ///
    /// `validate` overrides the loader's schema-validation default for
    /// this call; `config` overrides the loader's execution
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyLoadError`] the pipeline hits, in
    /// pipeline order: structure, unknown resource, schema validation,
    /// internal schema defects.
    pub fn load_document(
        &self,
        document: &Value,
        file_identifier: &str,
        validate: Option<bool>,
        session: Option<&B::Session>,
        config: Option<&ExecutionConfig>,
    ) -> Result<B::Collection, PolicyLoadError> {
        tracing::debug!(source = file_identifier, "loading policy document");
        self.structure.validate(document)?;

        let resource_types: Vec<ResourceTypeId> =
            self.structure.resource_types(document).into_iter().collect();

        let missing = self.catalog.resolve(&resource_types);
        if !missing.is_empty() {
            return Err(self.unresolved_resource_error(document, &missing));
        }

        if validate.unwrap_or(self.schema_validation) {
            let errors = self.validator.validate(document, &resource_types)?;
            if let Some(first) = errors.into_iter().next() {
                return Err(PolicyLoadError::Validation {
                    policy: first.policy.clone(),
                    error: first,
                });
            }
        }

        let config = config.unwrap_or(&self.config);
        Ok(self.builder.build(document, config, session))
    }

    /// Attribute unresolved resource types to the first policy
    /// referencing one, so the caller sees which policy to fix rather
    /// than a bare type name.
    fn unresolved_resource_error(
        &self,
        document: &Value,
        missing: &BTreeSet<ResourceTypeId>,
    ) -> PolicyLoadError {
        if let Some(policies) = document.get("policies").and_then(Value::as_array) {
            for policy in policies {
                let Some(raw) = policy.get("resource").and_then(Value::as_str) else {
                    continue;
                };
                let qualified =
                    ResourceTypeId::qualified(raw, self.structure.default_provider());
                if missing.contains(&qualified) {
                    let name = policy
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or(UNKNOWN_POLICY);
                    return PolicyLoadError::UnknownResource {
                        policy: name.to_string(),
                        resource: raw.to_string(),
                    };
                }
            }
        }
        let missing: Vec<&str> = missing.iter().map(ResourceTypeId::as_str).collect();
        PolicyLoadError::UnknownResource {
            policy: UNKNOWN_POLICY.to_string(),
            resource: missing.join(", "),
        }
    }
}
