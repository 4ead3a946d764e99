//! # Schema Cache
//!
//! Generating and compiling a validation schema is the expensive half of
//! policy-file validation, and documents overwhelmingly reference the
//! same few resource-type combinations. The cache keys compiled
//! validators by the sorted, deduplicated tuple of resource types and
//! retains them with LRU eviction up to a fixed capacity.
//!
//! ## Concurrency
//!
//! The lock is held only for lookup and insert, never across schema
//! generation. Concurrent misses for the same tuple may generate
//! redundantly; whichever finishes last wins the cache slot. A caller
//! never observes a partially built validator, and an `Arc` fetched
//! before an eviction stays valid for the validation using it.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsonschema::Validator;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use warden_core::ResourceTypeId;

use crate::source::{SchemaSource, SchemaSourceError};

/// Default number of distinct resource-type tuples retained.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// A fatal defect in the schema-generation machinery. Distinguishable
/// from user input errors: a document never causes this, a broken
/// generator or catalog does.
#[derive(Error, Debug)]
pub enum InternalSchemaError {
    /// The external generator failed outright.
    #[error("schema generation failed: {0}")]
    Generation(#[from] SchemaSourceError),

    /// The generated schema failed its self-check and could not be
    /// compiled into a validator.
    #[error("generated schema failed self-check: {reason}")]
    SelfCheck {
        /// Reason the schema was rejected.
        reason: String,
    },
}

/// An immutable generated schema plus its compiled validator.
///
/// Never mutated after construction; shared across threads behind `Arc`.
pub struct CompiledSchema {
    schema: Value,
    validator: Validator,
}

impl CompiledSchema {
    /// Self-check and compile a generated schema.
    ///
    /// # Errors
    ///
    /// Returns [`InternalSchemaError::SelfCheck`] when the schema is not
    /// itself valid — a generator defect, not a document error.
    fn compile(schema: Value) -> Result<Self, InternalSchemaError> {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| InternalSchemaError::SelfCheck {
                reason: e.to_string(),
            })?;
        Ok(Self { schema, validator })
    }

    /// The generated schema document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// The compiled validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Bounded LRU cache of compiled validators, keyed by resource-type
/// tuple.
///
/// An explicit component owned by its loader — two loaders with
/// different schema sources each own their own cache and never
/// interfere.
pub struct SchemaCache {
    source: Arc<dyn SchemaSource>,
    entries: Mutex<LruCache<Vec<ResourceTypeId>, Arc<CompiledSchema>>>,
    constructions: AtomicUsize,
}

impl SchemaCache {
    /// Cache with the default capacity of [`DEFAULT_CACHE_CAPACITY`]
    /// tuples.
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self::with_capacity(source, DEFAULT_CACHE_CAPACITY)
    }

    /// Cache retaining at most `capacity` tuples (minimum one).
    pub fn with_capacity(source: Arc<dyn SchemaSource>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            entries: Mutex::new(LruCache::new(capacity)),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Fetch the compiled validator for a resource-type scope, building
    /// and caching it on first request.
    ///
    /// The key is the sorted, deduplicated form of `resource_types`, so
    /// callers need not normalize.
    ///
    /// # Errors
    ///
    /// Returns [`InternalSchemaError`] when generation or the schema
    /// self-check fails.
    pub fn validator_for(
        &self,
        resource_types: &[ResourceTypeId],
    ) -> Result<Arc<CompiledSchema>, InternalSchemaError> {
        let mut key: Vec<ResourceTypeId> = resource_types.to_vec();
        key.sort();
        key.dedup();

        if let Some(hit) = self.entries.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        // Build outside the lock. Concurrent misses for the same key may
        // generate redundantly; publish-on-completion keeps every caller
        // on a fully built validator.
        tracing::debug!(resource_types = ?key, "generating scoped policy schema");
        let schema = self.source.generate(&key)?;
        let compiled = Arc::new(CompiledSchema::compile(schema)?);
        self.constructions.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().put(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of validators built over the cache's lifetime. Exceeds
    /// [`len`](Self::len) when eviction or racing misses forced rebuilds.
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Number of tuples currently cached.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("len", &self.len())
            .field("constructions", &self.construction_count())
            .finish_non_exhaustive()
    }
}
