//! Per-route operation assembly.
//!
//! Combines one route descriptor, the auto-detected schema fragments
//! (rule mapping and shape inference), and an optional override record
//! into one operation object. Precedence is field by field: a non-null
//! override value is used verbatim, otherwise the auto-detected value,
//! otherwise a generated default.

use serde_json::{json, Map, Value};

use crate::registry::SchemaRegistry;
use crate::rules;
use crate::shape::{self, InferredShape};
use crate::types::{DocumentConfig, HttpMethod, OverrideRecord, RouteDescriptor, RuleSet};

/// Normalize a path template: single leading separator, optional
/// parameter markers collapsed into the plain bracketed form.
///
/// Optionality is expressed on the parameter's required flag, not in
/// the path syntax.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    let collapsed = trimmed.replace("?}", "}");
    format!("/{}", collapsed)
}

/// Derive a stable operation identifier for a route.
///
/// Prefers the route-level name (dots become underscores); otherwise
/// concatenates the handler (minus its `Controller` suffix) with the
/// action, lower-camel-cased; otherwise falls back to method + path.
pub fn derive_operation_id(route: &RouteDescriptor) -> String {
    if let Some(name) = &route.name {
        return name.replace('.', "_");
    }

    if let Some(handler) = &route.handler {
        let resource = strip_controller_suffix(handler);
        let action = route.action.as_deref().unwrap_or("handle");
        return format!("{}{}", lower_first(&camel(resource)), camel(action));
    }

    let slug: String = route
        .path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}", route.method.as_str(), slug.trim_matches('_'))
}

/// Derive the default tag for a route: the resource name when a
/// handler is known, otherwise the first static path segment.
pub fn derive_tag(route: &RouteDescriptor) -> String {
    if let Some(handler) = &route.handler {
        return humanize(strip_controller_suffix(handler));
    }
    route
        .path
        .split('/')
        .find(|s| !s.is_empty() && !s.starts_with('{'))
        .map(humanize)
        .unwrap_or_else(|| "General".to_string())
}

/// Assemble one operation object.
///
/// `operation_id` is the document-unique identifier chosen by the
/// builder; `security` is the middleware classifier's output.
pub fn assemble(
    route: &RouteDescriptor,
    override_record: Option<&OverrideRecord>,
    security: Option<&[Value]>,
    config: &DocumentConfig,
    registry: &mut SchemaRegistry,
    operation_id: &str,
) -> Value {
    let mut operation = Map::new();

    operation.insert("operationId".into(), json!(operation_id));

    let summary = override_record
        .and_then(|o| o.summary.clone())
        .unwrap_or_else(|| derive_summary(route));
    operation.insert("summary".into(), json!(summary));

    if let Some(description) = override_record.and_then(|o| o.description.as_ref()) {
        operation.insert("description".into(), json!(description));
    }

    let tags = override_record
        .and_then(|o| o.tags.clone())
        .unwrap_or_else(|| vec![derive_tag(route)]);
    operation.insert("tags".into(), json!(tags));

    if override_record.and_then(|o| o.deprecated) == Some(true) {
        operation.insert("deprecated".into(), json!(true));
    }

    let parameters = match override_record.and_then(|o| o.parameters.clone()) {
        Some(value) => value,
        None => build_parameters(route),
    };
    if parameters.as_array().map(|a| !a.is_empty()).unwrap_or(true) {
        operation.insert("parameters".into(), parameters);
    }

    let request_body = build_request_body(route, override_record, registry, operation_id);
    let has_body = request_body.is_some();
    if let Some(body) = request_body {
        operation.insert("requestBody".into(), body);
    }

    let effective_security = resolve_security(override_record, security);
    let responses = build_responses(
        route,
        override_record,
        config,
        registry,
        has_body,
        effective_security
            .as_ref()
            .map(|s| !s.is_empty())
            .unwrap_or(false),
    );
    operation.insert("responses".into(), responses);

    if let Some(requirements) = effective_security {
        operation.insert("security".into(), Value::Array(requirements));
    }

    Value::Object(operation)
}

/// Resolve the operation's security requirements.
///
/// An explicit override list wins outright, including an explicit
/// empty list meaning "no security". `None` means "inherit the
/// document default" and keeps the key off the operation.
fn resolve_security(
    override_record: Option<&OverrideRecord>,
    classified: Option<&[Value]>,
) -> Option<Vec<Value>> {
    if let Some(explicit) = override_record.and_then(|o| o.security_requirements.clone()) {
        return Some(explicit);
    }
    classified.map(|s| s.to_vec())
}

/// Fixed action-verb to summary mapping.
fn derive_summary(route: &RouteDescriptor) -> String {
    let resource = route
        .handler
        .as_deref()
        .map(strip_controller_suffix)
        .map(humanize)
        .unwrap_or_else(|| derive_tag(route));

    match route.action.as_deref() {
        Some("index") | Some("list") => format!("List {}", pluralize(&resource)),
        Some("show") | Some("get") | Some("find") | Some("detail") => {
            format!("Get {}", resource)
        }
        Some("store") | Some("create") => format!("Create {}", resource),
        Some("update") | Some("edit") => format!("Update {}", resource),
        Some("destroy") | Some("delete") | Some("remove") => format!("Delete {}", resource),
        Some(other) => format!("{} {}", humanize(other), resource),
        None => match route.method {
            HttpMethod::Get | HttpMethod::Head => format!("Get {}", resource),
            HttpMethod::Post => format!("Create {}", resource),
            HttpMethod::Put | HttpMethod::Patch => format!("Update {}", resource),
            HttpMethod::Delete => format!("Delete {}", resource),
            HttpMethod::Options => format!("Inspect {}", resource),
        },
    }
}

/// Path parameters from the route, plus query parameters derived from
/// validation rules on methods without a request body.
fn build_parameters(route: &RouteDescriptor) -> Value {
    let mut parameters = Vec::new();

    for param in &route.path_params {
        parameters.push(json!({
            "name": param.name,
            "in": "path",
            "required": param.required,
            "schema": param.schema.clone().unwrap_or_else(|| json!({ "type": "string" }))
        }));
    }

    if !route.method.allows_body() {
        if let Some(rules) = effective_rules(route) {
            for (field, value) in &rules.0 {
                // Only top-level scalar fields document cleanly as
                // query parameters.
                if field.contains('.') || field.contains('*') {
                    continue;
                }
                let mapped = rules::map_field(&rules::normalize_tokens(value));
                if mapped.fragment.get("type") == Some(&json!("object")) {
                    continue;
                }
                parameters.push(json!({
                    "name": field,
                    "in": "query",
                    "required": mapped.required,
                    "schema": mapped.fragment
                }));
            }
        }
    }

    Value::Array(parameters)
}

/// Rules used for auto-detection: the handler's request rules, falling
/// back to the first inline validate call.
fn effective_rules(route: &RouteDescriptor) -> Option<&RuleSet> {
    route
        .rules
        .as_ref()
        .filter(|r| !r.is_empty())
        .or_else(|| route.inline_rules.iter().find(|r| !r.is_empty()))
}

/// Build the request body for write-like methods.
///
/// Schema priority: override record, analyzed validation schema, first
/// inline validation schema, generic object. Auto-detected schemas are
/// registered under `{OperationId}Request` and referenced.
fn build_request_body(
    route: &RouteDescriptor,
    override_record: Option<&OverrideRecord>,
    registry: &mut SchemaRegistry,
    operation_id: &str,
) -> Option<Value> {
    if !route.method.allows_body() {
        return None;
    }

    if let Some(schema) = override_record.and_then(|o| o.request_body.clone()) {
        return Some(json!({
            "required": true,
            "content": { "application/json": { "schema": schema } }
        }));
    }

    match effective_rules(route) {
        Some(rules) => {
            let schema = rules::map_rules(rules);
            let name = format!("{}Request", camel(operation_id));
            registry.add(&name, schema);
            Some(json!({
                "required": true,
                "content": {
                    "application/json": { "schema": registry.reference(&name) }
                }
            }))
        }
        None => Some(json!({
            "required": false,
            "content": {
                "application/json": { "schema": { "type": "object" } }
            }
        })),
    }
}

/// Assemble the response map: one success response plus injected
/// default error responses, then per-status overrides.
fn build_responses(
    route: &RouteDescriptor,
    override_record: Option<&OverrideRecord>,
    config: &DocumentConfig,
    registry: &mut SchemaRegistry,
    has_body: bool,
    has_security: bool,
) -> Value {
    let mut responses = Map::new();

    let (status, description) = success_status(route);
    let shape = route
        .shape
        .as_ref()
        .map(shape::infer)
        .unwrap_or_else(|| InferredShape {
            schema: json!({ "type": "object" }),
            collection: false,
        });
    let envelope = if shape.collection {
        paginated_envelope(&shape.schema, registry)
    } else {
        data_envelope(&shape.schema)
    };
    responses.insert(
        status.to_string(),
        json!({
            "description": description,
            "content": { "application/json": { "schema": envelope } }
        }),
    );

    for error in &config.error_responses {
        if responses.contains_key(&error.status.to_string()) {
            continue;
        }
        if !error_applies(error.status, route, has_body, has_security) {
            continue;
        }
        responses.insert(
            error.status.to_string(),
            json!({
                "description": error.description,
                "content": {
                    "application/json": { "schema": error_schema(error.status, registry) }
                }
            }),
        );
    }

    apply_response_overrides(&mut responses, override_record);

    Value::Object(responses)
}

/// Success status by fixed rule: create-like writes 201, everything
/// else 200.
fn success_status(route: &RouteDescriptor) -> (u16, &'static str) {
    match route.method {
        HttpMethod::Post => (201, "Created"),
        _ => (200, "Successful response"),
    }
}

/// Whether a default error status is plausible for this operation.
fn error_applies(status: u16, route: &RouteDescriptor, has_body: bool, has_security: bool) -> bool {
    match status {
        401 | 403 => has_security,
        404 => !route.path_params.is_empty(),
        422 => has_body || effective_rules(route).is_some(),
        _ => true,
    }
}

/// Shared error schema, registered once per build and referenced.
fn error_schema(status: u16, registry: &mut SchemaRegistry) -> Value {
    if status == 422 {
        registry.add(
            "ValidationError",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" },
                    "errors": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    }
                }
            }),
        );
        registry.reference("ValidationError")
    } else {
        registry.add(
            "Error",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                }
            }),
        );
        registry.reference("Error")
    }
}

/// Wrap an item schema in the plain data envelope.
fn data_envelope(item: &Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "data": item,
            "message": { "type": "string" }
        }
    })
}

/// Wrap a collection schema in the paginated envelope. The meta and
/// links fragments are shared across operations via the registry.
fn paginated_envelope(collection: &Value, registry: &mut SchemaRegistry) -> Value {
    registry.add(
        "PaginationMeta",
        json!({
            "type": "object",
            "properties": {
                "current_page": { "type": "integer" },
                "per_page": { "type": "integer" },
                "total": { "type": "integer" }
            }
        }),
    );
    registry.add(
        "PaginationLinks",
        json!({
            "type": "object",
            "properties": {
                "first": { "type": "string", "format": "url", "nullable": true },
                "last": { "type": "string", "format": "url", "nullable": true },
                "prev": { "type": "string", "format": "url", "nullable": true },
                "next": { "type": "string", "format": "url", "nullable": true }
            }
        }),
    );
    json!({
        "type": "object",
        "properties": {
            "data": collection,
            "meta": registry.reference("PaginationMeta"),
            "links": registry.reference("PaginationLinks")
        }
    })
}

/// Apply per-status overrides: replace description and example only,
/// never an already-built schema. Statuses with no built response are
/// created fresh (and may carry a schema of their own).
fn apply_response_overrides(
    responses: &mut Map<String, Value>,
    override_record: Option<&OverrideRecord>,
) {
    let Some(overrides) = override_record.and_then(|o| o.responses.as_ref()) else {
        return;
    };

    for (status, patch) in overrides {
        let Some(patch_obj) = patch.as_object() else {
            continue;
        };

        match responses.get_mut(status) {
            Some(existing) => {
                let existing = existing.as_object_mut().expect("responses hold objects");
                if let Some(description) = patch_obj.get("description") {
                    existing.insert("description".into(), description.clone());
                }
                if let Some(example) = patch_obj.get("example") {
                    if let Some(media) = existing
                        .get_mut("content")
                        .and_then(|c| c.get_mut("application/json"))
                        .and_then(|m| m.as_object_mut())
                    {
                        media.insert("example".into(), example.clone());
                    }
                }
            }
            None => {
                let mut fresh = Map::new();
                fresh.insert(
                    "description".into(),
                    patch_obj
                        .get("description")
                        .cloned()
                        .unwrap_or_else(|| json!("Response")),
                );
                let mut media = Map::new();
                if let Some(schema) = patch_obj.get("schema") {
                    media.insert("schema".into(), schema.clone());
                }
                if let Some(example) = patch_obj.get("example") {
                    media.insert("example".into(), example.clone());
                }
                if !media.is_empty() {
                    fresh.insert(
                        "content".into(),
                        json!({ "application/json": Value::Object(media) }),
                    );
                }
                responses.insert(status.clone(), Value::Object(fresh));
            }
        }
    }
}

// --- Name helpers ---

fn strip_controller_suffix(handler: &str) -> &str {
    let short = handler
        .rsplit(|c| c == '\\' || c == ':' || c == '.')
        .next()
        .unwrap_or(handler);
    short.strip_suffix("Controller").unwrap_or(short)
}

/// Upper-camel-case a snake_case or kebab-case name.
fn camel(name: &str) -> String {
    name.split(|c| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(upper_first)
        .collect()
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Split a snake/camel name into space-separated capitalized words.
fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in name.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| upper_first(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn pluralize(name: &str) -> String {
    if name.ends_with('s') {
        name.to_string()
    } else {
        format!("{}s", name)
    }
}
