//! # warden-core — Foundational Types for Warden
//!
//! This crate is the leaf of the Warden workspace. It defines the
//! primitives the validation pipeline and its collaborators share,
//! and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`ResourceTypeId`]
//!    carries the `<provider>.<type>` qualification invariant; bare
//!    strings never cross a crate boundary as resource types.
//!
//! 2. **Classify once, resolve many.** A configuration value is either a
//!    literal or a lookup expression. [`LookupSource::parse`] makes that
//!    decision exactly once; call sites match on the variant instead of
//!    re-inspecting raw values.
//!
//! 3. **Absent is not an error.** Path evaluation over resource data
//!    returns `Option`; only malformed expressions and unresolvable
//!    lookups without defaults fail.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `warden-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod lookup;
pub mod path;
pub mod resource;

// Re-export primary types for ergonomic imports.
pub use lookup::{extract, lookup_schema, LookupError, LookupSource, RESOURCE_SOURCE};
pub use path::{search, PathError, PathExpr};
pub use resource::{ResourceTypeId, DEFAULT_PROVIDER};
