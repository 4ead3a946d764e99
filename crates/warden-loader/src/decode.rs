//! # Document Decoding
//!
//! Policy files arrive as YAML or JSON text; the pipeline operates on
//! `serde_json::Value`. YAML has a richer type system than JSON (tags,
//! anchors, non-string keys), but policy documents use only the
//! JSON-compatible subset, so decoding converts the YAML value tree into
//! the equivalent JSON value tree and rejects what cannot be
//! represented.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Error decoding policy-file text into a document value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not valid YAML.
    #[error("invalid YAML: {reason}")]
    InvalidYaml {
        /// Parser diagnostic.
        reason: String,
    },

    /// The text is not valid JSON.
    #[error("invalid JSON: {reason}")]
    InvalidJson {
        /// Parser diagnostic.
        reason: String,
    },

    /// The YAML uses a construct with no JSON equivalent.
    #[error("YAML-to-JSON conversion failed: {reason}")]
    Conversion {
        /// What could not be represented.
        reason: String,
    },
}

/// Source format of a policy file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML text (the common authoring format).
    Yaml,
    /// JSON text.
    Json,
}

impl DocumentFormat {
    /// Infer the format from a file extension; anything that is not
    /// `.json` is treated as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Decode policy-file text into a document value.
///
/// # Errors
///
/// Returns a [`DecodeError`] for unparseable text or YAML constructs
/// with no JSON representation.
pub fn decode_str(content: &str, format: DocumentFormat) -> Result<Value, DecodeError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| DecodeError::InvalidJson {
                reason: e.to_string(),
            })
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| DecodeError::InvalidYaml {
                    reason: e.to_string(),
                })?;
            yaml_to_json_value(&yaml).map_err(|reason| DecodeError::Conversion { reason })
        }
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => {
            // Ignore YAML tags, just convert the inner value.
            yaml_to_json_value(&tagged.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn yaml_policy_file_decodes() {
        let content = r#"
policies:
  - name: ec2-untagged
    resource: ec2
    filters:
      - "tag:owner": absent
    actions:
      - stop
"#;
        let doc = decode_str(content, DocumentFormat::Yaml).unwrap();
        assert_eq!(doc["policies"][0]["name"], "ec2-untagged");
        assert_eq!(doc["policies"][0]["actions"][0], "stop");
    }

    #[test]
    fn json_policy_file_decodes() {
        let content = r#"{"policies": [{"name": "p", "resource": "ec2"}]}"#;
        let doc = decode_str(content, DocumentFormat::Json).unwrap();
        assert_eq!(doc, json!({"policies": [{"name": "p", "resource": "ec2"}]}));
    }

    #[test]
    fn yaml_numbers_and_bools_convert() {
        let doc = decode_str("count: 42\nratio: 0.5\nenabled: true\n", DocumentFormat::Yaml)
            .unwrap();
        assert_eq!(doc["count"], 42);
        assert_eq!(doc["ratio"], 0.5);
        assert_eq!(doc["enabled"], true);
    }

    #[test]
    fn invalid_yaml_reports_reason() {
        let err = decode_str("policies: [unclosed", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidYaml { .. }));
    }

    #[test]
    fn invalid_json_reports_reason() {
        let err = decode_str("{\"policies\": ", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson { .. }));
    }

    #[test]
    fn format_inferred_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("p.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("p.yml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("policies")),
            DocumentFormat::Yaml
        );
    }
}
