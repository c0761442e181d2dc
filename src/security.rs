//! Middleware-list classification into security requirements.
//!
//! The operation assembler consumes this module's output as an opaque
//! requirement list, so a different classifier can be substituted at
//! the call site without touching assembly.

use serde_json::{json, Value};

/// Derive security requirements from an ordered middleware list.
///
/// Middleware entries may be parameterized as `name:arg1,arg2`. Scope
/// middleware (`scopes:...`/`ability:...`) attaches its arguments to
/// the most recently derived requirement, defaulting to bearer when
/// none precedes it.
///
/// Returns `None` when no auth-related middleware is present, meaning
/// "inherit the document-level default".
pub fn classify_middleware(middleware: &[String]) -> Option<Vec<Value>> {
    let mut requirements: Vec<(String, Vec<String>)> = Vec::new();

    for entry in middleware {
        let (name, args) = match entry.split_once(':') {
            Some((name, args)) => (name.trim(), args),
            None => (entry.trim(), ""),
        };

        match name {
            "auth" => {
                requirements.push(("bearerAuth".to_string(), Vec::new()));
            }
            "auth.basic" => {
                requirements.push(("basicAuth".to_string(), Vec::new()));
            }
            "api_key" | "auth.key" => {
                requirements.push(("apiKeyAuth".to_string(), Vec::new()));
            }
            "scopes" | "scope" | "ability" | "abilities" => {
                let scopes: Vec<String> = args
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                match requirements.last_mut() {
                    Some((_, existing)) => existing.extend(scopes),
                    None => requirements.push(("bearerAuth".to_string(), scopes)),
                }
            }
            _ => {}
        }
    }

    if requirements.is_empty() {
        return None;
    }

    Some(
        requirements
            .into_iter()
            .map(|(scheme, scopes)| json!({ scheme: scopes }))
            .collect(),
    )
}
