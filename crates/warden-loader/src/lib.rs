//! # warden-loader — Policy-File Load Pipeline
//!
//! The orchestration layer of Warden: takes a policy file (or an
//! already-decoded document), runs the structural pre-check, resolves
//! referenced resource types against the external catalog, runs scoped
//! schema validation, and hands the validated document to the external
//! collection constructor.
//!
//! The external world plugs in through three seams:
//!
//! - [`ResourceCatalog`] — which resource types exist;
//! - [`warden_schema::SchemaSource`] — how a scoped validation schema
//!   is generated;
//! - [`CollectionBuilder`] — how a validated document becomes the
//!   runtime's policy collection.
//!
//! ## Crate Policy
//!
//! - The only filesystem access is the existence check and read in
//!   [`PolicyLoader::load_file`]; everything else operates on in-memory
//!   values.
//! - Failure is always a single [`PolicyLoadError`]; no partial results.

pub mod catalog;
pub mod collection;
pub mod decode;
pub mod loader;

pub use catalog::ResourceCatalog;
pub use collection::{CollectionBuilder, ExecutionConfig};
pub use decode::{decode_str, DecodeError, DocumentFormat};
pub use loader::{PolicyLoader, PolicyLoadError};
