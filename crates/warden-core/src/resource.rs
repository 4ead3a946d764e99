//! # Resource Type Identifiers
//!
//! Newtype wrapper for the resource kinds a policy targets. Identifiers
//! are namespaced as `<provider>.<type>`; a bare name like `ec2` is
//! qualified with a default provider before it ever reaches the schema
//! or catalog layers.
//!
//! The default provider is configuration, not a constant baked into call
//! sites: [`DEFAULT_PROVIDER`] is only the value used when the hosting
//! component was not configured otherwise.

use serde::{Deserialize, Serialize};

/// Provider prefix applied to bare resource names when the host has not
/// injected its own.
pub const DEFAULT_PROVIDER: &str = "aws";

/// A fully qualified resource-type identifier (`<provider>.<type>`).
///
/// # Invariants
///
/// - Always carries a provider prefix. [`ResourceTypeId::qualified`] is
///   the constructor used for raw document input; it applies the default
///   provider rule so unprefixed names never leak past the structure layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceTypeId(String);

impl ResourceTypeId {
    /// Construct from an already-qualified identifier such as `aws.ec2`.
    pub fn new(qualified: impl Into<String>) -> Self {
        Self(qualified.into())
    }

    /// Construct from a raw `resource` field value, qualifying bare names
    /// with the given provider.
    ///
    /// A name containing a `.` is taken as already qualified and kept
    /// verbatim.
    pub fn qualified(raw: &str, default_provider: &str) -> Self {
        if raw.contains('.') {
            Self(raw.to_string())
        } else {
            Self(format!("{default_provider}.{raw}"))
        }
    }

    /// The provider namespace (`aws` in `aws.ec2`).
    pub fn provider(&self) -> &str {
        match self.0.split_once('.') {
            Some((provider, _)) => provider,
            None => &self.0,
        }
    }

    /// The bare type name (`ec2` in `aws.ec2`).
    pub fn name(&self) -> &str {
        match self.0.split_once('.') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// The full `<provider>.<type>` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_gets_default_provider() {
        let id = ResourceTypeId::qualified("ec2", DEFAULT_PROVIDER);
        assert_eq!(id.as_str(), "aws.ec2");
        assert_eq!(id.provider(), "aws");
        assert_eq!(id.name(), "ec2");
    }

    #[test]
    fn qualified_name_kept_verbatim() {
        let id = ResourceTypeId::qualified("gcp.instance", DEFAULT_PROVIDER);
        assert_eq!(id.as_str(), "gcp.instance");
        assert_eq!(id.provider(), "gcp");
        assert_eq!(id.name(), "instance");
    }

    #[test]
    fn injected_provider_wins_over_default() {
        let id = ResourceTypeId::qualified("bucket", "azure");
        assert_eq!(id.as_str(), "azure.bucket");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut ids = vec![
            ResourceTypeId::new("aws.s3"),
            ResourceTypeId::new("aws.ec2"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "aws.ec2");
    }
}
