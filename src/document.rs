//! Whole-document assembly.
//!
//! Iterates all route descriptors, drives the operation assembler,
//! collects operations into a path map, and produces the final
//! document together with statistics and any non-fatal diagnostics.
//!
//! The builder owns one schema registry per invocation; nothing is
//! shared between builds.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::operation;
use crate::registry::SchemaRegistry;
use crate::security::classify_middleware;
use crate::types::{DocumentConfig, DocumentStats, OverrideRecord, RouteInventory};

/// Severity of a build diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal problem noticed during a build.
///
/// Analysis failures degrade to generic fragments and are recorded
/// here instead of aborting the build.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// `method path` of the route involved, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub message: String,
}

/// Output of a document build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub document: Value,
    pub stats: DocumentStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds one complete document from a route inventory plus optional
/// persisted overrides and externally stored schema records.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    config: DocumentConfig,
}

impl DocumentBuilder {
    pub fn new(config: DocumentConfig) -> Self {
        DocumentBuilder { config }
    }

    /// Build the document.
    ///
    /// Routes are processed strictly in inventory order; registry
    /// mutation order determines the deterministic naming and ordering
    /// of the output. Duplicate (method, path) identities are
    /// last-write-wins with a diagnostic.
    pub fn build(
        &self,
        inventory: &RouteInventory,
        overrides: &[OverrideRecord],
        external_schemas: &Map<String, Value>,
    ) -> BuildResult {
        let mut registry = SchemaRegistry::new();
        let mut paths: Map<String, Value> = Map::new();
        let mut diagnostics = Vec::new();
        let mut used_ids: HashSet<String> = HashSet::new();
        let mut operations = 0usize;
        let mut tags: Vec<String> = Vec::new();

        for route in &inventory.routes {
            let path = operation::normalize_path(&route.path);
            let method = route.method.as_str();

            let override_record = overrides
                .iter()
                .find(|o| o.key() == (method.to_string(), path.clone()) || o.key() == route.key());

            let security = classify_middleware(&route.middleware);

            let base_id = override_record
                .and_then(|o| o.operation_id.clone())
                .unwrap_or_else(|| operation::derive_operation_id(route));
            let operation_id = unique_id(&base_id, &mut used_ids);

            let op = operation::assemble(
                route,
                override_record,
                security.as_deref(),
                &self.config,
                &mut registry,
                &operation_id,
            );

            if let Some(op_tags) = op.get("tags").and_then(|t| t.as_array()) {
                for tag in op_tags {
                    if let Some(name) = tag.as_str() {
                        if !tags.iter().any(|t| t == name) {
                            tags.push(name.to_string());
                        }
                    }
                }
            }

            let path_item = paths
                .entry(path.clone())
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .expect("path items are objects");
            if path_item.contains_key(method) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    route: Some(format!("{} {}", method, path)),
                    message: "duplicate route identity; keeping the last definition".to_string(),
                });
            } else {
                operations += 1;
            }
            path_item.insert(method.to_string(), op);
        }

        let schemas = registry.build(external_schemas);

        let mut info = Map::new();
        info.insert("title".into(), json!(self.config.title));
        info.insert("version".into(), json!(self.config.version));
        if let Some(description) = &self.config.description {
            info.insert("description".into(), json!(description));
        }

        let mut document = Map::new();
        document.insert("openapi".into(), json!("3.0.3"));
        document.insert("info".into(), Value::Object(info));
        document.insert("servers".into(), json!(self.config.servers));
        document.insert("paths".into(), Value::Object(paths.clone()));

        let mut components = Map::new();
        let schema_count = schemas.len();
        components.insert("schemas".into(), Value::Object(schemas));
        components.insert(
            "securitySchemes".into(),
            Value::Object(self.config.security_schemes.clone()),
        );
        document.insert("components".into(), Value::Object(components));

        if let Some(default_security) = &self.config.default_security {
            document.insert("security".into(), json!(default_security));
        }

        document.insert(
            "tags".into(),
            Value::Array(tags.iter().map(|t| json!({ "name": t })).collect()),
        );

        let stats = DocumentStats {
            paths: paths.len(),
            operations,
            schemas: schema_count,
            security_schemes: self.config.security_schemes.len(),
            tags: tags.len(),
        };

        BuildResult {
            document: Value::Object(document),
            stats,
            diagnostics,
        }
    }
}

/// Make an identifier unique within the document by numeric suffixing.
fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
