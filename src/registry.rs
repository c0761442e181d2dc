//! Named schema fragment store with reference-graph tracking.
//!
//! One registry instance is owned by a single document build; it is
//! never shared between builds, so repeated runs cannot leak state.
//! Names collide last-write-wins within a registry lifetime.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::types::REF_PREFIX;

/// Shallow-merge `add` into `base`, later keys winning, except
/// `properties`, which merges recursively.
///
/// This is the composition rule for all schema fragments.
pub fn merge_fragments(base: &mut Value, add: &Value) {
    let Some(add_map) = add.as_object() else {
        *base = add.clone();
        return;
    };
    if !base.is_object() {
        *base = add.clone();
        return;
    }
    let base_map = base.as_object_mut().expect("checked object above");

    for (key, value) in add_map {
        if key == "properties" {
            match base_map.get_mut(key) {
                Some(existing) if existing.is_object() && value.is_object() => {
                    let existing = existing.as_object_mut().expect("checked object");
                    for (prop, prop_value) in value.as_object().expect("checked object") {
                        match existing.get_mut(prop) {
                            Some(slot) => merge_fragments(slot, prop_value),
                            None => {
                                existing.insert(prop.clone(), prop_value.clone());
                            }
                        }
                    }
                }
                _ => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        } else {
            base_map.insert(key.clone(), value.clone());
        }
    }
}

/// Recursively collect schema names referenced via `$ref` from a fragment.
pub fn collect_refs(fragment: &Value, refs: &mut BTreeSet<String>) {
    match fragment {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref") {
                if let Some(name) = target.strip_prefix(REF_PREFIX) {
                    if !name.is_empty() {
                        refs.insert(name.to_string());
                    }
                }
            }
            for value in map.values() {
                collect_refs(value, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

/// Insertion-ordered store of named schema fragments.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Map<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Add a named fragment. Re-adding a name overwrites (last write wins).
    pub fn add(&mut self, name: &str, fragment: Value) {
        self.schemas.insert(name.to_string(), fragment);
    }

    /// Look up a fragment by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Build a `$ref` fragment pointing at a name. The name does not
    /// need to exist yet; `build()` guarantees it will resolve.
    pub fn reference(&self, name: &str) -> Value {
        json!({ "$ref": format!("{}{}", REF_PREFIX, name) })
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Names referenced from any stored fragment.
    fn referenced_names(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        for fragment in self.schemas.values() {
            collect_refs(fragment, &mut refs);
        }
        refs
    }

    /// Finalize the registry into the document's `components.schemas` map.
    ///
    /// External records merge at lower precedence: a name not already
    /// present is inserted whole; for an existing name only an absent
    /// `description`/`example` is backfilled, never a structural key.
    /// Afterwards every referenced-but-absent name gets a placeholder
    /// object fragment, iterating until no dangling references remain
    /// (merged external fragments may themselves introduce references).
    pub fn build(mut self, external: &Map<String, Value>) -> Map<String, Value> {
        for (name, fragment) in external {
            match self.schemas.get_mut(name) {
                None => {
                    self.schemas.insert(name.clone(), fragment.clone());
                }
                Some(existing) => {
                    backfill_annotations(existing, fragment);
                }
            }
        }

        loop {
            let missing: Vec<String> = self
                .referenced_names()
                .into_iter()
                .filter(|name| !self.schemas.contains_key(name))
                .collect();
            if missing.is_empty() {
                break;
            }
            for name in missing {
                let placeholder = json!({
                    "type": "object",
                    "description": format!("Placeholder for undocumented schema `{}`.", name)
                });
                self.schemas.insert(name, placeholder);
            }
        }

        self.schemas
    }
}

/// Copy `description` and `example` from an external record onto an
/// auto-derived fragment, only where the fragment lacks them.
fn backfill_annotations(existing: &mut Value, external: &Value) {
    let (Some(existing), Some(external)) = (existing.as_object_mut(), external.as_object()) else {
        return;
    };
    for key in ["description", "example"] {
        if !existing.contains_key(key) {
            if let Some(value) = external.get(key) {
                existing.insert(key.to_string(), value.clone());
            }
        }
    }
}
