//! Validation-rule to schema-fragment mapping.
//!
//! Transforms declarative per-field rule expressions into OpenAPI-style
//! schema fragments. Tokens are applied strictly left to right; each
//! token may only add or overwrite fragment keys, never revert a
//! previous one. Size constraints resolve against the type declared at
//! the time they are applied, so `integer|min:18` and `min:18|integer`
//! produce different output by contract.
//!
//! Unrecognized tokens are no-ops. The mapper never fails: an empty or
//! unanalyzable rule list yields `{"type": "string"}`.

use serde_json::{json, Map, Value};

use crate::registry::merge_fragments;
use crate::types::RuleSet;

/// Closed vocabulary of recognized rule tokens.
///
/// Anything outside this vocabulary parses to `Unknown` and is ignored
/// when applied, keeping the "unknown is a safe no-op" fallback total.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleToken {
    // Type tokens
    TypeString,
    TypeInteger,
    TypeNumber,
    TypeBoolean,
    TypeArray,
    TypeObject,
    TypeBinary,
    // Format tokens
    Email,
    Url,
    Uuid,
    Ip,
    Date,
    DateTime,
    Time,
    Password,
    // Constraint tokens
    Min(f64),
    Max(f64),
    Between(f64, f64),
    Size(f64),
    Digits(u64),
    DigitsBetween(u64, u64),
    In(Vec<String>),
    Regex(String),
    Alpha,
    AlphaNum,
    AlphaDash,
    // Presence tokens
    Nullable,
    Sometimes,
    Required,
    RequiredIf,
    RequiredUnless,
    RequiredWith,
    RequiredWithout,
    // Fallback
    Unknown(String),
}

impl RuleToken {
    /// Parse a single token string (`name` or `name:arg1,arg2`).
    pub fn parse(token: &str) -> RuleToken {
        let (name, args) = match token.split_once(':') {
            Some((name, args)) => (name.trim(), args),
            None => (token.trim(), ""),
        };

        match name {
            "string" => RuleToken::TypeString,
            "integer" | "int" => RuleToken::TypeInteger,
            "numeric" | "number" | "decimal" => RuleToken::TypeNumber,
            "boolean" | "bool" => RuleToken::TypeBoolean,
            "array" => RuleToken::TypeArray,
            "json" | "object" => RuleToken::TypeObject,
            "file" | "image" => RuleToken::TypeBinary,

            "email" => RuleToken::Email,
            "url" | "active_url" => RuleToken::Url,
            "uuid" => RuleToken::Uuid,
            "ip" | "ipv4" | "ipv6" => RuleToken::Ip,
            "date" => RuleToken::Date,
            "datetime" | "date_format" => RuleToken::DateTime,
            "time" => RuleToken::Time,
            "password" => RuleToken::Password,

            "min" => match parse_number(args) {
                Some(n) => RuleToken::Min(n),
                None => RuleToken::Unknown(token.to_string()),
            },
            "max" => match parse_number(args) {
                Some(n) => RuleToken::Max(n),
                None => RuleToken::Unknown(token.to_string()),
            },
            "between" => match parse_number_pair(args) {
                Some((lo, hi)) => RuleToken::Between(lo, hi),
                None => RuleToken::Unknown(token.to_string()),
            },
            "size" => match parse_number(args) {
                Some(n) => RuleToken::Size(n),
                None => RuleToken::Unknown(token.to_string()),
            },
            "digits" => match args.trim().parse::<u64>() {
                Ok(n) => RuleToken::Digits(n),
                Err(_) => RuleToken::Unknown(token.to_string()),
            },
            "digits_between" => match parse_number_pair(args) {
                Some((lo, hi)) => RuleToken::DigitsBetween(lo as u64, hi as u64),
                None => RuleToken::Unknown(token.to_string()),
            },
            "in" | "enum" => RuleToken::In(
                args.split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect(),
            ),
            "regex" => RuleToken::Regex(strip_regex_delimiters(args)),
            "alpha" => RuleToken::Alpha,
            "alpha_num" => RuleToken::AlphaNum,
            "alpha_dash" => RuleToken::AlphaDash,

            "nullable" => RuleToken::Nullable,
            "sometimes" => RuleToken::Sometimes,
            "required" => RuleToken::Required,
            "required_if" => RuleToken::RequiredIf,
            "required_unless" => RuleToken::RequiredUnless,
            "required_with" | "required_with_all" => RuleToken::RequiredWith,
            "required_without" | "required_without_all" => RuleToken::RequiredWithout,

            _ => RuleToken::Unknown(token.to_string()),
        }
    }

    /// True for tokens that mark the field required on its container.
    pub fn is_required_family(&self) -> bool {
        matches!(
            self,
            RuleToken::Required
                | RuleToken::RequiredIf
                | RuleToken::RequiredUnless
                | RuleToken::RequiredWith
                | RuleToken::RequiredWithout
        )
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn parse_number_pair(s: &str) -> Option<(f64, f64)> {
    let (lo, hi) = s.split_once(',')?;
    Some((parse_number(lo)?, parse_number(hi)?))
}

/// Strip enclosing delimiters and trailing flags from a regex rule
/// argument (`/^a-z$/i` becomes `^a-z$`). Undelimited patterns pass
/// through unchanged.
fn strip_regex_delimiters(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let Some(delim) = chars.next() else {
        return String::new();
    };
    if delim.is_alphanumeric() || delim == '^' || delim == '\\' {
        return raw.to_string();
    }
    match raw.rfind(delim) {
        Some(end) if end > 0 => raw[1..end].to_string(),
        _ => raw.to_string(),
    }
}

/// Render a rule number as a JSON value, preferring integers.
fn num_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// Render a rule number as a length bound. Length keys are
/// non-negative; negative rule values clamp to zero.
fn len_value(n: f64) -> Value {
    json!(n.max(0.0) as u64)
}

/// Current declared type of a fragment, used for size polymorphism.
fn declared_type(fragment: &Map<String, Value>) -> Option<&str> {
    fragment.get("type").and_then(|t| t.as_str())
}

/// Keys used by size constraints for the fragment's current type.
///
/// Numeric types bound values, strings bound length, arrays bound item
/// count. A fragment with no type yet behaves as a string.
fn size_keys(fragment: &Map<String, Value>) -> (&'static str, &'static str, bool) {
    match declared_type(fragment) {
        Some("integer") | Some("number") => ("minimum", "maximum", true),
        Some("array") => ("minItems", "maxItems", false),
        _ => ("minLength", "maxLength", false),
    }
}

/// Apply one token to a fragment in place.
///
/// Returns nothing; unknown and presence-only tokens leave the fragment
/// untouched.
fn apply_token(fragment: &mut Map<String, Value>, token: &RuleToken) {
    match token {
        RuleToken::TypeString => {
            fragment.insert("type".into(), json!("string"));
        }
        RuleToken::TypeInteger => {
            fragment.insert("type".into(), json!("integer"));
        }
        RuleToken::TypeNumber => {
            fragment.insert("type".into(), json!("number"));
        }
        RuleToken::TypeBoolean => {
            fragment.insert("type".into(), json!("boolean"));
        }
        RuleToken::TypeArray => {
            fragment.insert("type".into(), json!("array"));
            fragment
                .entry("items")
                .or_insert_with(|| json!({ "type": "string" }));
        }
        RuleToken::TypeObject => {
            fragment.insert("type".into(), json!("object"));
        }
        RuleToken::TypeBinary => {
            fragment.insert("type".into(), json!("string"));
            fragment.insert("format".into(), json!("binary"));
        }

        RuleToken::Email => set_string_format(fragment, "email"),
        RuleToken::Url => set_string_format(fragment, "url"),
        RuleToken::Uuid => set_string_format(fragment, "uuid"),
        RuleToken::Ip => set_string_format(fragment, "ip"),
        RuleToken::Date => set_string_format(fragment, "date"),
        RuleToken::DateTime => set_string_format(fragment, "date-time"),
        RuleToken::Time => set_string_format(fragment, "time"),
        RuleToken::Password => set_string_format(fragment, "password"),

        RuleToken::Min(n) => {
            let (min_key, _, numeric) = size_keys(fragment);
            let value = if numeric { num_value(*n) } else { len_value(*n) };
            fragment.insert(min_key.into(), value);
        }
        RuleToken::Max(n) => {
            let (_, max_key, numeric) = size_keys(fragment);
            let value = if numeric { num_value(*n) } else { len_value(*n) };
            fragment.insert(max_key.into(), value);
        }
        RuleToken::Between(lo, hi) => {
            let (min_key, max_key, numeric) = size_keys(fragment);
            if numeric {
                fragment.insert(min_key.into(), num_value(*lo));
                fragment.insert(max_key.into(), num_value(*hi));
            } else {
                fragment.insert(min_key.into(), len_value(*lo));
                fragment.insert(max_key.into(), len_value(*hi));
            }
        }
        RuleToken::Size(n) => {
            let (min_key, max_key, numeric) = size_keys(fragment);
            if numeric {
                fragment.insert(min_key.into(), num_value(*n));
                fragment.insert(max_key.into(), num_value(*n));
            } else {
                fragment.insert(min_key.into(), len_value(*n));
                fragment.insert(max_key.into(), len_value(*n));
            }
        }
        RuleToken::Digits(n) => {
            if declared_type(fragment).is_none() {
                fragment.insert("type".into(), json!("integer"));
            }
            fragment.insert("pattern".into(), json!(format!("^\\d{{{}}}$", n)));
        }
        RuleToken::DigitsBetween(lo, hi) => {
            if declared_type(fragment).is_none() {
                fragment.insert("type".into(), json!("integer"));
            }
            fragment.insert("pattern".into(), json!(format!("^\\d{{{},{}}}$", lo, hi)));
        }
        RuleToken::In(values) => {
            let numeric = matches!(declared_type(fragment), Some("integer") | Some("number"));
            let entries: Vec<Value> = values
                .iter()
                .map(|v| {
                    if numeric {
                        v.parse::<f64>().map(num_value).unwrap_or_else(|_| json!(v))
                    } else {
                        json!(v)
                    }
                })
                .collect();
            fragment.insert("enum".into(), Value::Array(entries));
        }
        RuleToken::Regex(pattern) => {
            fragment.insert("pattern".into(), json!(pattern));
        }
        RuleToken::Alpha => {
            fragment.insert("pattern".into(), json!("^[a-zA-Z]+$"));
        }
        RuleToken::AlphaNum => {
            fragment.insert("pattern".into(), json!("^[a-zA-Z0-9]+$"));
        }
        RuleToken::AlphaDash => {
            fragment.insert("pattern".into(), json!("^[a-zA-Z0-9_-]+$"));
        }

        RuleToken::Nullable => {
            fragment.insert("nullable".into(), json!(true));
        }

        // Presence-only and unknown tokens do not touch the fragment.
        RuleToken::Sometimes
        | RuleToken::Required
        | RuleToken::RequiredIf
        | RuleToken::RequiredUnless
        | RuleToken::RequiredWith
        | RuleToken::RequiredWithout
        | RuleToken::Unknown(_) => {}
    }
}

fn set_string_format(fragment: &mut Map<String, Value>, format: &str) {
    if declared_type(fragment).is_none() {
        fragment.insert("type".into(), json!("string"));
    }
    fragment.insert("format".into(), json!(format));
}

/// Normalize a rule expression value into an ordered token list.
///
/// Accepts a `|`-delimited string, a list of token strings (opaque rule
/// objects in the list are stringified where possible), or a single
/// rule object. Anything else yields no tokens.
pub fn normalize_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split('|')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => {
                    let s = s.trim();
                    (!s.is_empty()).then(|| s.to_string())
                }
                Value::Object(_) => object_token(item),
                _ => None,
            })
            .collect(),
        Value::Object(_) => object_token(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Stringify an opaque rule object to a recognized token where possible.
///
/// Expects `{"name": "in", "params": ["a", "b"]}` shapes; objects
/// without a string `name` are dropped (degrade, don't fail).
fn object_token(value: &Value) -> Option<String> {
    let name = value.get("name").and_then(|n| n.as_str())?;
    let params = value
        .get("params")
        .and_then(|p| p.as_array())
        .map(|items| {
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();

    if params.is_empty() {
        Some(name.to_string())
    } else {
        Some(format!("{}:{}", name, params))
    }
}

/// Result of mapping one field's rule list.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub fragment: Value,
    pub required: bool,
}

/// Map one field's token list to a schema fragment.
///
/// Never fails; an empty or fully unrecognized list yields
/// `{"type": "string"}`.
pub fn map_field(tokens: &[String]) -> FieldSchema {
    let mut fragment = Map::new();
    let mut required = false;

    for raw in tokens {
        let token = RuleToken::parse(raw);
        if token.is_required_family() {
            required = true;
        }
        apply_token(&mut fragment, &token);
    }

    if declared_type(&fragment).is_none() {
        fragment.insert("type".into(), json!("string"));
    }

    FieldSchema {
        fragment: Value::Object(fragment),
        required,
    }
}

/// Map a whole rule expression to an object schema.
///
/// Dotted field names become nested `properties` containers and `*`
/// segments become `items` containers. Sibling fields sharing a prefix
/// merge into the same container. Required fields are recorded once,
/// by their top-level name, on the root object.
pub fn map_rules(rules: &RuleSet) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();

    for (field, value) in &rules.0 {
        let tokens = normalize_tokens(value);
        let mapped = map_field(&tokens);

        let segments: Vec<&str> = field.split('.').collect();
        insert_field(&mut properties, &segments, mapped.fragment);

        if mapped.required {
            let top = segments[0].to_string();
            if !top.is_empty() && top != "*" && !required.contains(&top) {
                required.push(top);
            }
        }
    }

    let mut root = Map::new();
    root.insert("type".into(), json!("object"));
    root.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        root.insert(
            "required".into(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    Value::Object(root)
}

/// Insert a field fragment at a dotted/starred path, merging with any
/// containers previously created by sibling fields.
fn insert_field(properties: &mut Map<String, Value>, segments: &[&str], fragment: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        match properties.get_mut(*head) {
            Some(existing) => merge_fragments(existing, &fragment),
            None => {
                properties.insert(head.to_string(), fragment);
            }
        }
        return;
    }

    if rest[0] == "*" {
        let entry = properties
            .entry(head.to_string())
            .or_insert_with(|| json!({}));
        let container = ensure_object(entry);
        container.insert("type".into(), json!("array"));
        if !container.contains_key("items") {
            container.insert("items".into(), json!({}));
        }
        let items = container.get_mut("items").unwrap();

        let tail = &rest[1..];
        if tail.is_empty() {
            merge_fragments(items, &fragment);
        } else {
            let items_obj = ensure_object(items);
            items_obj.insert("type".into(), json!("object"));
            if !items_obj.contains_key("properties") {
                items_obj.insert("properties".into(), json!({}));
            }
            let nested = items_obj
                .get_mut("properties")
                .and_then(|p| p.as_object_mut())
                .expect("properties container just ensured");
            insert_field(nested, tail, fragment);
        }
        return;
    }

    let entry = properties
        .entry(head.to_string())
        .or_insert_with(|| json!({}));
    let container = ensure_object(entry);
    container.insert("type".into(), json!("object"));
    if !container.contains_key("properties") {
        container.insert("properties".into(), json!({}));
    }
    let nested = container
        .get_mut("properties")
        .and_then(|p| p.as_object_mut())
        .expect("properties container just ensured");
    insert_field(nested, rest, fragment);
}

/// Coerce a value into an object map, replacing non-objects.
fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = json!({});
    }
    value.as_object_mut().expect("object just ensured")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleSet;
    use serde_json::json;

    fn ruleset(value: Value) -> RuleSet {
        RuleSet(value.as_object().unwrap().clone())
    }

    fn tokens(raw: &str) -> Vec<String> {
        normalize_tokens(&json!(raw))
    }

    // === Token parsing ===

    #[test]
    fn parse_type_tokens() {
        assert_eq!(RuleToken::parse("string"), RuleToken::TypeString);
        assert_eq!(RuleToken::parse("integer"), RuleToken::TypeInteger);
        assert_eq!(RuleToken::parse("numeric"), RuleToken::TypeNumber);
        assert_eq!(RuleToken::parse("array"), RuleToken::TypeArray);
    }

    #[test]
    fn parse_constraint_tokens() {
        assert_eq!(RuleToken::parse("min:5"), RuleToken::Min(5.0));
        assert_eq!(RuleToken::parse("between:1,10"), RuleToken::Between(1.0, 10.0));
        assert_eq!(RuleToken::parse("digits:4"), RuleToken::Digits(4));
        assert_eq!(
            RuleToken::parse("in:red,green,blue"),
            RuleToken::In(vec!["red".into(), "green".into(), "blue".into()])
        );
    }

    #[test]
    fn parse_unknown_token() {
        assert_eq!(
            RuleToken::parse("exists:users,id"),
            RuleToken::Unknown("exists:users,id".into())
        );
        assert_eq!(
            RuleToken::parse("min:notanumber"),
            RuleToken::Unknown("min:notanumber".into())
        );
    }

    #[test]
    fn regex_delimiters_stripped() {
        assert_eq!(strip_regex_delimiters("/^[a-z]+$/"), "^[a-z]+$");
        assert_eq!(strip_regex_delimiters("/^[a-z]+$/i"), "^[a-z]+$");
        assert_eq!(strip_regex_delimiters("#abc#"), "abc");
        assert_eq!(strip_regex_delimiters("^plain$"), "^plain$");
    }

    // === Field mapping ===

    #[test]
    fn empty_tokens_default_to_string() {
        let mapped = map_field(&[]);
        assert_eq!(mapped.fragment, json!({ "type": "string" }));
        assert!(!mapped.required);
    }

    #[test]
    fn email_rule_sets_format() {
        let mapped = map_field(&tokens("required|email"));
        assert_eq!(
            mapped.fragment,
            json!({ "type": "string", "format": "email" })
        );
        assert!(mapped.required);
    }

    #[test]
    fn integer_bounds_use_minimum_maximum() {
        let mapped = map_field(&tokens("integer|min:18|max:65"));
        assert_eq!(
            mapped.fragment,
            json!({ "type": "integer", "minimum": 18, "maximum": 65 })
        );
    }

    #[test]
    fn string_bounds_use_length_keys() {
        let mapped = map_field(&tokens("string|min:2|max:40"));
        assert_eq!(
            mapped.fragment,
            json!({ "type": "string", "minLength": 2, "maxLength": 40 })
        );
    }

    #[test]
    fn array_bounds_use_item_keys() {
        let mapped = map_field(&tokens("array|min:1|max:5"));
        assert_eq!(
            mapped.fragment,
            json!({
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1,
                "maxItems": 5
            })
        );
    }

    #[test]
    fn constraint_before_type_resolves_as_string() {
        // Order matters by contract: min applied before the integer type
        // token lands on minLength, not minimum.
        let mapped = map_field(&tokens("min:5|integer"));
        assert_eq!(
            mapped.fragment,
            json!({ "minLength": 5, "type": "integer" })
        );
    }

    #[test]
    fn later_type_token_wins() {
        let mapped = map_field(&tokens("string|integer"));
        assert_eq!(mapped.fragment["type"], json!("integer"));
    }

    #[test]
    fn in_rule_with_integer_type_yields_numeric_enum() {
        let mapped = map_field(&tokens("integer|in:1,2,3"));
        assert_eq!(mapped.fragment["enum"], json!([1, 2, 3]));
    }

    #[test]
    fn in_rule_without_type_yields_string_enum() {
        let mapped = map_field(&tokens("in:draft,published"));
        assert_eq!(mapped.fragment["enum"], json!(["draft", "published"]));
    }

    #[test]
    fn nullable_sets_flag_without_requiredness() {
        let mapped = map_field(&tokens("nullable|string"));
        assert_eq!(mapped.fragment["nullable"], json!(true));
        assert!(!mapped.required);
    }

    #[test]
    fn nullable_and_required_coexist() {
        let mapped = map_field(&tokens("required|nullable|string"));
        assert_eq!(mapped.fragment["nullable"], json!(true));
        assert!(mapped.required);
    }

    #[test]
    fn unknown_tokens_are_noops() {
        let mapped = map_field(&tokens("required|exists:users,id|string"));
        assert_eq!(mapped.fragment, json!({ "type": "string" }));
        assert!(mapped.required);
    }

    #[test]
    fn negative_length_bounds_clamp_to_zero() {
        let mapped = map_field(&tokens("string|min:-5"));
        assert_eq!(mapped.fragment["minLength"], json!(0));

        // Numeric bounds keep the signed value.
        let mapped = map_field(&tokens("integer|min:-5"));
        assert_eq!(mapped.fragment["minimum"], json!(-5));
    }

    #[test]
    fn size_sets_both_bounds() {
        let mapped = map_field(&tokens("string|size:10"));
        assert_eq!(mapped.fragment["minLength"], json!(10));
        assert_eq!(mapped.fragment["maxLength"], json!(10));
    }

    #[test]
    fn digits_implies_integer_with_pattern() {
        let mapped = map_field(&tokens("digits:4"));
        assert_eq!(
            mapped.fragment,
            json!({ "type": "integer", "pattern": "^\\d{4}$" })
        );
    }

    // === Normalization ===

    #[test]
    fn normalize_list_form() {
        let toks = normalize_tokens(&json!(["required", "string", "max:20"]));
        assert_eq!(toks, vec!["required", "string", "max:20"]);
    }

    #[test]
    fn normalize_object_form() {
        let toks = normalize_tokens(&json!({ "name": "in", "params": ["a", "b"] }));
        assert_eq!(toks, vec!["in:a,b"]);
    }

    #[test]
    fn normalize_object_without_name_is_dropped() {
        let toks = normalize_tokens(&json!(["string", { "rule": "mystery" }]));
        assert_eq!(toks, vec!["string"]);
    }

    #[test]
    fn normalize_min_length_object() {
        let toks = normalize_tokens(&json!({ "name": "min", "params": [3] }));
        assert_eq!(toks, vec!["min:3"]);
        let mapped = map_field(&toks);
        assert_eq!(mapped.fragment["minLength"], json!(3));
    }

    // === Whole rule maps ===

    #[test]
    fn scenario_email_and_age() {
        let rules = ruleset(json!({
            "email": "required|email",
            "age": "integer|min:18|max:65"
        }));
        assert_eq!(
            map_rules(&rules),
            json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "format": "email" },
                    "age": { "type": "integer", "minimum": 18, "maximum": 65 }
                },
                "required": ["email"]
            })
        );
    }

    #[test]
    fn dotted_field_nests_properties() {
        let rules = ruleset(json!({ "address.city": "required|string" }));
        let schema = map_rules(&rules);
        assert_eq!(schema["properties"]["address"]["type"], json!("object"));
        assert_eq!(
            schema["properties"]["address"]["properties"]["city"]["type"],
            json!("string")
        );
        assert_eq!(schema["required"], json!(["address"]));
    }

    #[test]
    fn star_field_builds_array_items() {
        let rules = ruleset(json!({ "tags.*": "string" }));
        assert_eq!(
            map_rules(&rules),
            json!({
                "type": "object",
                "properties": {
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            })
        );
    }

    #[test]
    fn star_with_nested_field() {
        let rules = ruleset(json!({ "items.*.sku": "required|string" }));
        let schema = map_rules(&rules);
        let items = &schema["properties"]["items"];
        assert_eq!(items["type"], json!("array"));
        assert_eq!(items["items"]["type"], json!("object"));
        assert_eq!(
            items["items"]["properties"]["sku"]["type"],
            json!("string")
        );
        assert_eq!(schema["required"], json!(["items"]));
    }

    #[test]
    fn sibling_fields_merge_into_one_container() {
        let rules = ruleset(json!({
            "address.city": "string",
            "address.zip": "string|size:5"
        }));
        let schema = map_rules(&rules);
        let address = &schema["properties"]["address"];
        assert!(address["properties"].get("city").is_some());
        assert!(address["properties"].get("zip").is_some());
    }

    #[test]
    fn array_declaration_merges_with_star_items() {
        let rules = ruleset(json!({
            "tags": "required|array|max:10",
            "tags.*": "string|max:30"
        }));
        let schema = map_rules(&rules);
        let tags = &schema["properties"]["tags"];
        assert_eq!(tags["type"], json!("array"));
        assert_eq!(tags["maxItems"], json!(10));
        assert_eq!(tags["items"]["maxLength"], json!(30));
        assert_eq!(schema["required"], json!(["tags"]));
    }

    #[test]
    fn required_recorded_once_per_top_level_field() {
        let rules = ruleset(json!({
            "items.*.sku": "required|string",
            "items.*.qty": "required|integer"
        }));
        let schema = map_rules(&rules);
        assert_eq!(schema["required"], json!(["items"]));
    }
}
