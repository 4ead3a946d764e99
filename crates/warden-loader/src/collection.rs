//! # Collection Construction Boundary
//!
//! A document that survives the pipeline is handed to an external
//! constructor that turns it into whatever the policy-execution runtime
//! consumes. The pipeline performs no further structural checks at this
//! point; per-policy semantic validation is deliberately deferred to
//! callers, who run it after provider-specific initialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution configuration passed through to the collection constructor.
///
/// Opaque to the pipeline: Warden neither reads nor interprets these
/// settings, it only carries them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig(Map<String, Value>);

impl ExecutionConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one setting, builder-style.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Read one setting.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether any settings are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ExecutionConfig {
    fn from(settings: Map<String, Value>) -> Self {
        Self(settings)
    }
}

/// External constructor for the opaque policy collection.
pub trait CollectionBuilder {
    /// Whatever the policy-execution runtime consumes.
    type Collection;
    /// Session/factory context threaded through untouched.
    type Session;

    /// Construct the collection from a validated document.
    fn build(
        &self,
        document: &serde_json::Value,
        config: &ExecutionConfig,
        session: Option<&Self::Session>,
    ) -> Self::Collection;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_round_trips_settings() {
        let config = ExecutionConfig::new()
            .with("region", json!("us-east-1"))
            .with("dryrun", json!(true));
        assert_eq!(config.get("region"), Some(&json!("us-east-1")));
        assert_eq!(config.get("dryrun"), Some(&json!(true)));
        assert_eq!(config.get("missing"), None);
        assert!(!config.is_empty());
        assert!(ExecutionConfig::new().is_empty());
    }
}
