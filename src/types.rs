//! Core types shared across the document build pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::shape::ShapeExpr;

/// Prefix for internal schema references in the generated document.
pub const REF_PREFIX: &str = "#/components/schemas/";

/// HTTP method of a route descriptor.
///
/// Deserializes case-insensitively; serializes lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Parse a method from a string, case-insensitively.
    ///
    /// Returns `None` for unknown verbs (caller should degrade or error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Lowercase method name as used for path-map keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Write-like methods carry a request body; read-like methods
    /// document their validation rules as query parameters instead.
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        HttpMethod::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown HTTP method \"{}\"", raw)))
    }
}

/// A path template parameter (`{id}` in `/users/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathParameter {
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Inferred primitive schema; defaults to string when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

fn default_true() -> bool {
    true
}

/// A set of validation rules keyed by field name.
///
/// Field names may encode nesting (`address.city`) or repetition
/// (`tags.*`, `items.*.sku`). Each value is a `|`-delimited string, a
/// list of token strings, or a rule object `{"name": ..., "params": [...]}`.
/// Insertion order is preserved so generated schemas are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet(pub Map<String, Value>);

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One route descriptor from the inventory: a (method, path) pair with
/// everything the analyzers recovered about its handler.
///
/// Regenerated on every scan; never persisted by the core itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub path: String,
    /// Handler type name, e.g. `UserController`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Handler action name, e.g. `show`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Stable route-level name, e.g. `users.show`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered middleware, possibly parameterized as `name:arg1,arg2`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_params: Vec<PathParameter>,
    /// Validation rules recovered from the handler's request type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleSet>,
    /// Validation rules recovered from inline validate calls, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_rules: Vec<RuleSet>,
    /// Shape-expression tree of the response-producing function body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeExpr>,
}

impl RouteDescriptor {
    /// Case-normalized identity key for diffing and override lookup.
    pub fn key(&self) -> (String, String) {
        (self.method.as_str().to_string(), self.path.clone())
    }
}

/// A freshly scanned route inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteInventory {
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

/// Persisted, human-editable documentation overrides for one operation.
///
/// Any non-null field wins over the auto-detected value for the same
/// slot; null/absent fields let auto-detection stand. Identity fields
/// (method, path, handler, name) are maintained by sync; descriptive
/// fields are hand-edited by operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Full replacement parameter list, used verbatim when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Request-body schema override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Per-status overrides: `{"200": {"description": ..., "example": ...}}`.
    /// Replaces description/example only, never an already-built schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Map<String, Value>>,
    /// Explicit security requirements. `Some(vec![])` means "no security",
    /// distinct from `None` meaning "inherit".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_requirements: Option<Vec<Value>>,
    /// Set when the (method, path) no longer appears in the live inventory.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub orphaned: bool,
}

impl OverrideRecord {
    /// Minimal record carrying only identity fields.
    pub fn from_route(route: &RouteDescriptor) -> Self {
        OverrideRecord {
            method: route.method.as_str().to_string(),
            path: route.path.clone(),
            handler: route.handler.clone(),
            name: route.name.clone(),
            operation_id: None,
            summary: None,
            description: None,
            tags: None,
            deprecated: None,
            parameters: None,
            request_body: None,
            responses: None,
            security_requirements: None,
            orphaned: false,
        }
    }

    /// Case-normalized identity key.
    pub fn key(&self) -> (String, String) {
        (self.method.to_ascii_lowercase(), self.path.clone())
    }
}

/// A server entry for the document's `servers` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One default error response injected into operations that can
/// produce the status but define no response for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseConfig {
    pub status: u16,
    pub description: String,
}

/// Document-level configuration.
///
/// Loadable from a JSON file; every field has a usable default so the
/// builder works with `DocumentConfig::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub servers: Vec<ServerConfig>,
    /// Security scheme definitions for `components.securitySchemes`.
    pub security_schemes: Map<String, Value>,
    /// Document-level default security requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_security: Option<Vec<Value>>,
    /// Fixed table of injectable error responses.
    pub error_responses: Vec<ErrorResponseConfig>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: "API Documentation".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            servers: vec![ServerConfig {
                url: "/".to_string(),
                description: None,
            }],
            security_schemes: default_security_schemes(),
            default_security: None,
            error_responses: vec![
                ErrorResponseConfig {
                    status: 401,
                    description: "Unauthenticated".to_string(),
                },
                ErrorResponseConfig {
                    status: 403,
                    description: "Forbidden".to_string(),
                },
                ErrorResponseConfig {
                    status: 404,
                    description: "Not found".to_string(),
                },
                ErrorResponseConfig {
                    status: 422,
                    description: "Validation error".to_string(),
                },
                ErrorResponseConfig {
                    status: 500,
                    description: "Server error".to_string(),
                },
            ],
        }
    }
}

impl DocumentConfig {
    /// Look up the configured description for an error status.
    pub fn error_description(&self, status: u16) -> Option<&str> {
        self.error_responses
            .iter()
            .find(|e| e.status == status)
            .map(|e| e.description.as_str())
    }
}

fn default_security_schemes() -> Map<String, Value> {
    let mut schemes = Map::new();
    schemes.insert(
        "bearerAuth".to_string(),
        json!({
            "type": "http",
            "scheme": "bearer",
            "bearerFormat": "JWT"
        }),
    );
    schemes
}

/// Counts reported after a document build.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DocumentStats {
    pub paths: usize,
    pub operations: usize,
    pub schemas: usize,
    pub security_schemes: usize,
    pub tags: usize,
}
