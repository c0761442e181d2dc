//! routedoc
//!
//! Synthesizes a normalized, cross-referenced OpenAPI-style document
//! from three loosely structured inputs: per-field validation-rule
//! expressions, shape-expression trees of response-producing
//! functions, and a persisted store of human-authored documentation
//! overrides.
//!
//! The pipeline degrades gracefully: unanalyzable rules and shapes
//! become generic fragments, missing schema references get synthesized
//! placeholders, and an absent override store changes nothing. A build
//! either fails to load its route inventory or produces a complete,
//! self-consistent document.
//!
//! # Example
//!
//! ```
//! use routedoc::{DocumentBuilder, DocumentConfig, RouteInventory};
//! use serde_json::{json, Map};
//!
//! let inventory: RouteInventory = serde_json::from_value(json!({
//!     "routes": [{
//!         "method": "post",
//!         "path": "/users",
//!         "handler": "UserController",
//!         "action": "store",
//!         "rules": { "email": "required|email", "age": "integer|min:18" }
//!     }]
//! }))
//! .unwrap();
//!
//! let result = DocumentBuilder::new(DocumentConfig::default())
//!     .build(&inventory, &[], &Map::new());
//!
//! let op = &result.document["paths"]["/users"]["post"];
//! assert_eq!(op["operationId"], json!("userStore"));
//!
//! // The request schema was registered and referenced, not inlined.
//! let schemas = &result.document["components"]["schemas"];
//! assert_eq!(
//!     schemas["UserStoreRequest"]["required"],
//!     json!(["email"])
//! );
//! ```

mod document;
mod error;
mod operation;
mod registry;
mod rules;
mod security;
mod shape;
mod store;
mod sync;
mod types;

pub use document::{BuildResult, Diagnostic, DocumentBuilder, Severity};
pub use error::{BuildError, StoreError};
pub use operation::{assemble, derive_operation_id, derive_tag, normalize_path};
pub use registry::{collect_refs, merge_fragments, SchemaRegistry};
pub use rules::{map_field, map_rules, normalize_tokens, FieldSchema, RuleToken};
pub use security::classify_middleware;
pub use shape::{infer, InferredShape, MapEntry, ShapeExpr};
pub use store::{open_store, FileStore, StoreData, StoreHandle};
pub use sync::{diff, DiffEntry, DiffReport};
pub use types::{
    DocumentConfig, DocumentStats, ErrorResponseConfig, HttpMethod, OverrideRecord,
    PathParameter, RouteDescriptor, RouteInventory, RuleSet, ServerConfig, REF_PREFIX,
};
