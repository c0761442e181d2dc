//! Response-shape inference from expression trees.
//!
//! A shape expression tree describes the body of a function that
//! constructs a response payload. Front-ends (reflection, syntax-tree
//! analysis, or hand annotation) serialize trees into the inventory as
//! tagged JSON; the inferencer only ever consumes this IR, never raw
//! source.
//!
//! Inference is heuristic and total: it finds the first return whose
//! expression is a map or array literal, converts each entry by
//! node-kind dispatch, and falls back to `{"type": "object"}` for
//! anything it cannot classify. It never fails.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::REF_PREFIX;

/// One entry of a map literal. Keyless entries whose value is a merge
/// or map literal are inlined into the parent object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: ShapeExpr,
}

/// Closed vocabulary of shape-expression node kinds.
///
/// Deserialized from the inventory's `kind`-tagged JSON. Kinds outside
/// this vocabulary land on `Unknown` and infer to a generic object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeExpr {
    String {
        value: String,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Bool {
        value: bool,
    },
    Null,
    /// Property access on the subject model (`$this->created_at`).
    Property {
        name: String,
    },
    /// Method call on the subject model (`$this->isActive()`).
    Call {
        name: String,
    },
    /// Ternary conditional; the condition itself is not analyzed.
    Conditional {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ShapeExpr>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<ShapeExpr>>,
    },
    /// Null-coalescing (`expr ?? fallback`).
    Coalesce {
        left: Box<ShapeExpr>,
    },
    Array {
        #[serde(default)]
        items: Vec<ShapeExpr>,
    },
    Map {
        #[serde(default)]
        entries: Vec<MapEntry>,
    },
    /// Object instantiation (`new UserResource(...)`).
    New {
        class: String,
    },
    /// Class-scoped call (`UserResource::collection(...)`).
    StaticCall {
        class: String,
        method: String,
    },
    /// Spread of another map's keys into the enclosing map, possibly
    /// conditional (`merge`/`mergeWhen` patterns).
    Merge {
        value: Box<ShapeExpr>,
        #[serde(default)]
        conditional: bool,
    },
    Return {
        value: Box<ShapeExpr>,
    },
    Block {
        #[serde(default)]
        statements: Vec<ShapeExpr>,
    },
    #[serde(other)]
    Unknown,
}

/// Result of shape inference: the schema fragment plus whether the
/// shape was a resource collection (drives the paginated envelope).
#[derive(Debug, Clone)]
pub struct InferredShape {
    pub schema: Value,
    pub collection: bool,
}

impl InferredShape {
    fn object() -> Self {
        InferredShape {
            schema: json!({ "type": "object" }),
            collection: false,
        }
    }
}

/// Infer a schema fragment from a shape expression tree.
///
/// Never fails; unanalyzable trees yield `{"type": "object"}`.
pub fn infer(tree: &ShapeExpr) -> InferredShape {
    let root = find_return(tree).unwrap_or(tree);

    match root {
        ShapeExpr::Map { entries } => InferredShape {
            schema: infer_map(entries),
            collection: false,
        },
        ShapeExpr::Array { items } => InferredShape {
            schema: infer_array(items),
            collection: false,
        },
        ShapeExpr::New { class } => match resource_schema(class) {
            Some(shape) => shape,
            None => InferredShape::object(),
        },
        ShapeExpr::StaticCall { class, method } => match static_call_schema(class, method) {
            Some(shape) => shape,
            None => InferredShape::object(),
        },
        _ => InferredShape::object(),
    }
}

/// Find the first return-like statement in the tree.
fn find_return(expr: &ShapeExpr) -> Option<&ShapeExpr> {
    match expr {
        ShapeExpr::Return { value } => Some(value),
        ShapeExpr::Block { statements } => statements.iter().find_map(find_return),
        ShapeExpr::Conditional { then, otherwise } => then
            .as_deref()
            .and_then(find_return)
            .or_else(|| otherwise.as_deref().and_then(find_return)),
        _ => None,
    }
}

/// Convert a map literal's entries into an object schema.
///
/// Merge entries (and keyless map entries) flatten their inferred
/// properties into the parent's property set instead of nesting.
fn infer_map(entries: &[MapEntry]) -> Value {
    let mut properties = Map::new();

    for entry in entries {
        match (&entry.key, &entry.value) {
            (Some(key), value) => {
                properties.insert(key.clone(), infer_node(value));
            }
            (None, ShapeExpr::Merge { value, .. }) => {
                flatten_into(&mut properties, value);
            }
            (None, ShapeExpr::Map { entries }) => {
                for nested in entries {
                    if let Some(key) = &nested.key {
                        properties.insert(key.clone(), infer_node(&nested.value));
                    }
                }
            }
            // Keyless non-map entries carry no name to document.
            (None, _) => {}
        }
    }

    json!({ "type": "object", "properties": properties })
}

/// Flatten the properties of a merged map into the parent's set.
fn flatten_into(properties: &mut Map<String, Value>, value: &ShapeExpr) {
    if let ShapeExpr::Map { entries } = value {
        for entry in entries {
            if let Some(key) = &entry.key {
                properties.insert(key.clone(), infer_node(&entry.value));
            }
        }
    }
}

/// Convert an array literal into an array schema, typing items from
/// the first element.
fn infer_array(items: &[ShapeExpr]) -> Value {
    let item_schema = items
        .first()
        .map(infer_node)
        .unwrap_or_else(|| json!({ "type": "string" }));
    json!({ "type": "array", "items": item_schema })
}

/// Node-kind dispatch for a single map entry value.
fn infer_node(expr: &ShapeExpr) -> Value {
    match expr {
        ShapeExpr::String { value } => json!({ "type": "string", "example": value }),
        ShapeExpr::Int { value } => json!({ "type": "integer", "example": value }),
        ShapeExpr::Float { value } => json!({ "type": "number", "example": value }),
        ShapeExpr::Bool { .. } => json!({ "type": "boolean" }),
        // True type unknown; string is the safe placeholder.
        ShapeExpr::Null => json!({ "type": "string", "nullable": true }),

        ShapeExpr::Property { name } => property_schema(name),
        ShapeExpr::Call { name } => method_schema(name),

        ShapeExpr::Conditional { then, otherwise } => match (then, otherwise) {
            (Some(branch), _) | (None, Some(branch)) => infer_node(branch),
            (None, None) => json!({ "type": "object" }),
        },

        ShapeExpr::Coalesce { left } => {
            let mut schema = infer_node(left);
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("nullable".into(), json!(true));
            }
            schema
        }

        // Deeper literal nesting is approximated, not recursed into.
        ShapeExpr::Array { .. } | ShapeExpr::Map { .. } => {
            json!({ "type": "array", "items": { "type": "string" } })
        }

        ShapeExpr::New { class } => match resource_schema(class) {
            Some(shape) => shape.schema,
            None => json!({ "type": "object" }),
        },

        ShapeExpr::StaticCall { class, method } => match static_call_schema(class, method) {
            Some(shape) => shape.schema,
            None => method_schema(method),
        },

        ShapeExpr::Merge { value, .. } => infer_node(value),
        ShapeExpr::Return { value } => infer_node(value),

        ShapeExpr::Block { .. } | ShapeExpr::Unknown => json!({ "type": "object" }),
    }
}

/// Schema for instantiating a response-item type.
///
/// A class whose name carries a resource-like suffix is assumed to
/// produce a structured item and becomes a `$ref`; a `*Collection`
/// suffix produces an array of refs.
fn resource_schema(class: &str) -> Option<InferredShape> {
    let short = short_name(class);
    if let Some(base) = short.strip_suffix("Collection") {
        if !base.is_empty() {
            return Some(InferredShape {
                schema: json!({ "type": "array", "items": { "$ref": ref_target(base) } }),
                collection: true,
            });
        }
    }
    if let Some(base) = short.strip_suffix("Resource") {
        if !base.is_empty() {
            return Some(InferredShape {
                schema: json!({ "$ref": ref_target(base) }),
                collection: false,
            });
        }
    }
    None
}

/// Schema for a class-scoped call on a resource-like type.
///
/// `collection`-style methods build multiple items, `make`-style
/// methods build one.
fn static_call_schema(class: &str, method: &str) -> Option<InferredShape> {
    let shape = resource_schema(class)?;
    match method {
        "collection" => Some(InferredShape {
            schema: json!({ "type": "array", "items": item_ref(&shape.schema) }),
            collection: true,
        }),
        "make" | "new" => Some(InferredShape {
            schema: item_ref(&shape.schema),
            collection: false,
        }),
        _ => Some(shape),
    }
}

/// Extract the single-item `$ref` from a resource schema, whether it
/// was inferred as one item or as an array of items.
fn item_ref(schema: &Value) -> Value {
    match schema.get("items") {
        Some(items) => items.clone(),
        None => schema.clone(),
    }
}

fn short_name(class: &str) -> &str {
    class
        .rsplit(|c| c == '\\' || c == ':' || c == '.')
        .next()
        .unwrap_or(class)
}

fn ref_target(name: &str) -> String {
    format!("{}{}", REF_PREFIX, name)
}

/// Naming-convention heuristic for property accesses.
fn property_schema(name: &str) -> Value {
    let lower = name.to_ascii_lowercase();

    if lower == "id" || lower.ends_with("_id") {
        return json!({ "type": "string", "format": "uuid" });
    }
    if lower.ends_with("_at") {
        return json!({ "type": "string", "format": "date-time" });
    }
    if lower.ends_with("_date") || lower == "date" {
        return json!({ "type": "string", "format": "date" });
    }
    if lower.starts_with("is_") || lower.starts_with("has_") {
        return json!({ "type": "boolean" });
    }
    if lower == "email" {
        return json!({ "type": "string", "format": "email" });
    }
    if lower == "url" || lower.ends_with("_url") || lower == "link" {
        return json!({ "type": "string", "format": "url" });
    }
    if lower == "uuid" || lower.ends_with("_uuid") {
        return json!({ "type": "string", "format": "uuid" });
    }
    if lower == "count" || lower.ends_with("_count") || lower == "quantity" || lower == "qty" {
        return json!({ "type": "integer" });
    }
    if lower == "price" || lower == "amount" || lower == "total" {
        return json!({ "type": "number" });
    }

    json!({ "type": "string" })
}

/// Naming-convention heuristic for method calls.
fn method_schema(name: &str) -> Value {
    let lower = name.to_ascii_lowercase();

    if lower.starts_with("is") || lower.starts_with("has") {
        return json!({ "type": "boolean" });
    }
    if lower.contains("count") {
        return json!({ "type": "integer" });
    }
    if lower.contains("date") || lower.ends_with("at") {
        return json!({ "type": "string", "format": "date-time" });
    }
    if lower.starts_with("get") {
        return json!({ "type": "string" });
    }

    json!({ "type": "string" })
}
