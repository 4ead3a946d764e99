//! # warden-schema — Policy Document Validation
//!
//! Two-phase validation for declarative policy documents.
//!
//! ## Phase 1: Structural Pre-Validation (`structure`)
//!
//! [`StructureValidator`] checks the document shape — top-level keys,
//! the per-policy key whitelist, filters/actions container types — with
//! one-line, policy-localized errors, before any schema exists. It also
//! extracts the set of resource types a document references, which is
//! what scopes phase 2.
//!
//! ## Phase 2: Schema Validation (`cache`, `validate`, `narrow`)
//!
//! [`SchemaCache`] asks the external [`SchemaSource`] for a schema
//! scoped to exactly the referenced resource types, self-checks it,
//! compiles it, and retains it under a bounded LRU keyed by the sorted
//! resource-type tuple. [`SchemaValidator`] runs the compiled validator
//! and reduces the raw violation sequence to the single most relevant,
//! policy-attributed error via the `narrow` strategy chain; documents
//! that pass the schema get a duplicate-policy-name uniqueness check.
//!
//! ## Crate Policy
//!
//! - Depends only on `warden-core` internally.
//! - Schema generation is a trust boundary owned by the caller; this
//!   crate treats a schema that fails its self-check as a generator
//!   defect, never as a document error.
//! - Narrowing is best-effort and may never panic or propagate its own
//!   failure — the fallback chain always surfaces some actionable error.

pub mod cache;
pub mod narrow;
pub mod source;
pub mod structure;
pub mod validate;

pub use cache::{CompiledSchema, InternalSchemaError, SchemaCache, DEFAULT_CACHE_CAPACITY};
pub use source::{SchemaSource, SchemaSourceError};
pub use structure::{
    StructureError, StructureValidator, ALLOWED_FILE_KEYS, ALLOWED_POLICY_KEYS,
    REQUIRED_POLICY_KEYS,
};
pub use validate::{check_unique, RawViolation, SchemaValidator, ValidationError, UNKNOWN_POLICY};
