//! # Schema Generation Boundary
//!
//! The full validation schema for a policy document is produced by an
//! external facility — the component that knows the resource-type
//! catalog and how each resource type's filters and actions are shaped.
//! This module defines the seam Warden consumes it through.
//!
//! Generation is always scoped to exactly the resource types a document
//! references, never the full catalog; that bound is what keeps
//! validator construction proportional to the policies actually present.

use serde_json::Value;
use thiserror::Error;

use warden_core::ResourceTypeId;

/// Error from the external schema generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaSourceError {
    /// Generation failed for the given resource-type scope.
    #[error("schema generation failed for [{}]: {reason}", .resource_types.join(", "))]
    Generation {
        /// The requested scope.
        resource_types: Vec<String>,
        /// Reason generation failed.
        reason: String,
    },
}

/// External schema-generation facility.
///
/// Implementations return a JSON Schema document (Draft 2020-12)
/// describing a policy document limited to the given resource types.
/// The returned schema is self-checked and compiled by the
/// [`SchemaCache`](crate::SchemaCache); implementations never need to
/// compile anything themselves.
pub trait SchemaSource: Send + Sync {
    /// Generate a validation schema scoped to exactly `resource_types`.
    ///
    /// The slice arrives sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaSourceError`] when the scope cannot be
    /// generated.
    fn generate(&self, resource_types: &[ResourceTypeId]) -> Result<Value, SchemaSourceError>;
}
