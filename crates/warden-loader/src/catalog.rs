//! # Resource Catalog Boundary
//!
//! The catalog of available resource types — and however it loads them —
//! lives outside this core. The pipeline only needs one question
//! answered: of the types a document references, which ones does the
//! catalog not know?

use std::collections::BTreeSet;

use warden_core::ResourceTypeId;

/// External resource-type catalog.
pub trait ResourceCatalog: Send + Sync {
    /// Resolve and load the given resource types, returning the subset
    /// that could not be resolved.
    ///
    /// An empty result means every requested type is available. The
    /// pipeline attributes any unresolved type back to the first policy
    /// referencing it, so implementations never need document context.
    fn resolve(&self, resource_types: &[ResourceTypeId]) -> BTreeSet<ResourceTypeId>;
}
