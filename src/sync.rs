//! Incremental reconciliation of a live route inventory against the
//! persisted one.
//!
//! The engine only classifies; applying the classification (writing
//! records, pruning orphans) is the caller's responsibility. Diffing
//! the same two inventories twice yields identical sets.

use serde::Serialize;

use crate::operation::normalize_path;
use crate::types::{OverrideRecord, RouteDescriptor};

/// One classified route in a diff report.
#[derive(Debug, Clone, Serialize)]
pub struct DiffEntry {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DiffEntry {
    fn from_route(route: &RouteDescriptor) -> Self {
        DiffEntry {
            method: route.method.as_str().to_string(),
            path: normalize_path(&route.path),
            handler: route.handler.clone(),
            name: route.name.clone(),
        }
    }

    fn from_record(record: &OverrideRecord) -> Self {
        DiffEntry {
            method: record.method.to_ascii_lowercase(),
            path: record.path.clone(),
            handler: record.handler.clone(),
            name: record.name.clone(),
        }
    }
}

/// Classification of live routes against persisted records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffReport {
    pub new: Vec<DiffEntry>,
    pub updated: Vec<DiffEntry>,
    pub removed: Vec<DiffEntry>,
    pub unchanged: Vec<DiffEntry>,
}

impl DiffReport {
    /// True when live and persisted inventories agree completely.
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Diff a live inventory against persisted records.
///
/// Identity is the case-normalized (method, path) pair. A live route
/// with no persisted identity is new; an identity match with differing
/// tracked fields (handler, name) is updated; an exact match is
/// unchanged; a persisted identity no longer live is removed.
pub fn diff(live: &[RouteDescriptor], persisted: &[OverrideRecord]) -> DiffReport {
    let mut report = DiffReport::default();

    for route in live {
        let key = (
            route.method.as_str().to_string(),
            normalize_path(&route.path),
        );
        match persisted.iter().find(|r| r.key() == key) {
            None => report.new.push(DiffEntry::from_route(route)),
            Some(record) => {
                if record.handler == route.handler && record.name == route.name {
                    report.unchanged.push(DiffEntry::from_route(route));
                } else {
                    report.updated.push(DiffEntry::from_route(route));
                }
            }
        }
    }

    for record in persisted {
        let live_match = live.iter().any(|route| {
            (
                route.method.as_str().to_string(),
                normalize_path(&route.path),
            ) == record.key()
        });
        if !live_match {
            report.removed.push(DiffEntry::from_record(record));
        }
    }

    report
}
