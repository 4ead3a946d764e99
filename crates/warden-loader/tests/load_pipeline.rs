//! Integration test: the full load pipeline with realistic collaborator
//! stubs — a scoped schema generator, a fixed catalog, and a collection
//! builder that records what it was handed.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use warden_core::ResourceTypeId;
use warden_loader::{
    CollectionBuilder, ExecutionConfig, PolicyLoadError, PolicyLoader, ResourceCatalog,
};
use warden_schema::{SchemaSource, SchemaSourceError};

struct Catalog {
    known: BTreeSet<ResourceTypeId>,
}

impl Catalog {
    fn aws() -> Arc<Self> {
        Arc::new(Self {
            known: ["aws.ec2", "aws.s3", "aws.rds"]
                .iter()
                .map(|n| ResourceTypeId::new(*n))
                .collect(),
        })
    }
}

impl ResourceCatalog for Catalog {
    fn resolve(&self, resource_types: &[ResourceTypeId]) -> BTreeSet<ResourceTypeId> {
        resource_types
            .iter()
            .filter(|t| !self.known.contains(t))
            .cloned()
            .collect()
    }
}

/// Scoped generator in the shape of the real thing: one strict entry
/// schema per referenced resource type.
struct Generator {
    generated: AtomicUsize,
}

impl Generator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            generated: AtomicUsize::new(0),
        })
    }

    fn generated(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }
}

impl SchemaSource for Generator {
    fn generate(&self, resource_types: &[ResourceTypeId]) -> Result<Value, SchemaSourceError> {
        self.generated.fetch_add(1, Ordering::Relaxed);
        let entries: Vec<Value> = resource_types
            .iter()
            .map(|rtype| {
                json!({
                    "type": "object",
                    "required": ["name", "resource"],
                    "additionalProperties": false,
                    "properties": {
                        "name": {"type": "string"},
                        "resource": {"enum": [rtype.as_str(), rtype.name()]},
                        "description": {"type": "string"},
                        "execution-mode": {"enum": ["pull", "periodic", "event"]},
                        "filters": {"type": "array"},
                        "actions": {"type": "array"},
                    }
                })
            })
            .collect();
        Ok(json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["policies"],
            "properties": {
                "variables": {"type": "object"},
                "policies": {"type": "array", "items": {"anyOf": entries}},
            }
        }))
    }
}

#[derive(Debug)]
struct Collection {
    policy_names: Vec<String>,
}

struct Builder;

impl CollectionBuilder for Builder {
    type Collection = Collection;
    type Session = ();

    fn build(
        &self,
        document: &Value,
        _config: &ExecutionConfig,
        _session: Option<&()>,
    ) -> Collection {
        Collection {
            policy_names: document["policies"]
                .as_array()
                .map(|policies| {
                    policies
                        .iter()
                        .filter_map(|p| p["name"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn pipeline(generator: Arc<Generator>) -> PolicyLoader<Builder> {
    PolicyLoader::new(Catalog::aws(), generator, Builder, ExecutionConfig::new())
}

#[test]
fn well_formed_document_loads() {
    let doc = json!({
        "variables": {"owner": "platform"},
        "policies": [
            {
                "name": "ec2-untagged",
                "resource": "ec2",
                "execution-mode": "periodic",
                "filters": [{"tag:owner": "absent"}],
                "actions": ["stop"]
            },
            {"name": "s3-audit", "resource": "aws.s3"}
        ]
    });
    let collection = pipeline(Generator::new())
        .load_document(&doc, "mem://policies", None, None, None)
        .unwrap();
    assert_eq!(collection.policy_names, vec!["ec2-untagged", "s3-audit"]);
}

#[test]
fn structural_error_precedes_schema_generation() {
    let generator = Generator::new();
    let doc = json!({"policies": [
        {"name": "p1", "resource": "ec2", "filters": "not-a-list"}
    ]});
    let err = pipeline(generator.clone())
        .load_document(&doc, "mem://policies", None, None, None)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("p1"), "missing policy name: {message}");
    assert!(message.contains("filters"), "missing field: {message}");
    assert_eq!(generator.generated(), 0);
}

#[test]
fn unknown_resource_names_policy_and_resource() {
    let doc = json!({"policies": [
        {"name": "ok", "resource": "ec2"},
        {"name": "dangling", "resource": "dynamodb"}
    ]});
    let err = pipeline(Generator::new())
        .load_document(&doc, "mem://policies", None, None, None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "policy:dangling references an unknown resource:dynamodb"
    );
}

#[test]
fn schema_violation_surfaces_narrowed_error() {
    let doc = json!({"policies": [
        {"name": "bad-mode", "resource": "ec2", "execution-mode": "cron"}
    ]});
    let err = pipeline(Generator::new())
        .load_document(&doc, "mem://policies", None, None, None)
        .unwrap_err();
    match err {
        PolicyLoadError::Validation { policy, error } => {
            assert_eq!(policy, "bad-mode");
            assert!(error.instance_path.starts_with("/policies/0"));
        }
        other => panic!("expected Validation, got: {other}"),
    }
}

#[test]
fn duplicate_policy_names_fail_uniqueness() {
    let doc = json!({"policies": [
        {"name": "dup", "resource": "ec2"},
        {"name": "dup", "resource": "ec2"}
    ]});
    let err = pipeline(Generator::new())
        .load_document(&doc, "mem://policies", None, None, None)
        .unwrap_err();
    match err {
        PolicyLoadError::Validation { policy, error } => {
            assert_eq!(policy, "dup");
            assert!(error.message.contains("duplicate"));
        }
        other => panic!("expected Validation, got: {other}"),
    }
}

#[test]
fn schema_cache_shared_across_loads() {
    let generator = Generator::new();
    let loader = pipeline(generator.clone());
    let doc = json!({"policies": [{"name": "p1", "resource": "ec2"}]});
    loader
        .load_document(&doc, "mem://a", None, None, None)
        .unwrap();
    loader
        .load_document(&doc, "mem://b", None, None, None)
        .unwrap();
    assert_eq!(generator.generated(), 1);
    assert_eq!(loader.schema_cache().construction_count(), 1);
}

#[test]
fn yaml_file_loads_from_disk() {
    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .unwrap();
    write!(
        file,
        "policies:\n  - name: rds-unencrypted\n    resource: rds\n    filters:\n      - encrypted: false\n"
    )
    .unwrap();
    let collection = pipeline(Generator::new())
        .load_file(file.path(), None, None)
        .unwrap();
    assert_eq!(collection.policy_names, vec!["rds-unencrypted"]);
}

#[test]
fn undecodable_file_reports_decode_error() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(file, "{{\"policies\": [").unwrap();
    let err = pipeline(Generator::new())
        .load_file(file.path(), None, None)
        .unwrap_err();
    assert!(matches!(err, PolicyLoadError::Decode { .. }));
}
