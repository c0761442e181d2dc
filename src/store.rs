//! Persisted override store.
//!
//! A single JSON document holding operation override records and named
//! schema records. The store is strictly additive to a build: the
//! engine works identically with the store absent, so access goes
//! through a capability handle that reports unavailability as a value
//! instead of an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::operation::normalize_path;
use crate::types::{OverrideRecord, RouteDescriptor};

/// On-disk shape of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub operations: Vec<OverrideRecord>,
    #[serde(default)]
    pub schemas: Map<String, Value>,
}

/// An opened, readable and writable override store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: StoreData,
}

impl FileStore {
    /// Load a store from disk. A missing file opens as an empty store;
    /// the first save creates it.
    pub fn load(path: &Path) -> Result<FileStore, StoreError> {
        if !path.exists() {
            return Ok(FileStore {
                path: path.to_path_buf(),
                data: StoreData::default(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| StoreError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let data = serde_json::from_str(&content).map_err(|source| StoreError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(FileStore {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Write the store back to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let content =
            serde_json::to_string_pretty(&self.data).expect("store data serializes cleanly");
        std::fs::write(&self.path, content).map_err(|source| StoreError::WriteError {
            path: self.path.clone(),
            source,
        })
    }

    pub fn operations(&self) -> &[OverrideRecord] {
        &self.data.operations
    }

    pub fn schemas(&self) -> &Map<String, Value> {
        &self.data.schemas
    }

    /// Create or refresh the record for a route.
    ///
    /// Only identity fields (handler, name) are written on existing
    /// records; descriptive fields stay hand-edited. The orphaned flag
    /// clears because the route is demonstrably live.
    pub fn upsert_from_route(&mut self, route: &RouteDescriptor) {
        let key = (
            route.method.as_str().to_string(),
            normalize_path(&route.path),
        );
        match self.data.operations.iter_mut().find(|r| r.key() == key) {
            Some(existing) => {
                existing.handler = route.handler.clone();
                existing.name = route.name.clone();
                existing.orphaned = false;
            }
            None => {
                let mut record = OverrideRecord::from_route(route);
                record.path = normalize_path(&route.path);
                self.data.operations.push(record);
            }
        }
    }

    /// Flag a record whose route no longer exists.
    pub fn mark_orphaned(&mut self, method: &str, path: &str) {
        let key = (method.to_ascii_lowercase(), path.to_string());
        if let Some(record) = self.data.operations.iter_mut().find(|r| r.key() == key) {
            record.orphaned = true;
        }
    }

    /// Delete a record outright. Returns whether anything was removed.
    pub fn remove_operation(&mut self, method: &str, path: &str) -> bool {
        let key = (method.to_ascii_lowercase(), path.to_string());
        let before = self.data.operations.len();
        self.data.operations.retain(|r| r.key() != key);
        self.data.operations.len() != before
    }

    /// Store a named schema record (hand-authored documentation).
    pub fn put_schema(&mut self, name: &str, fragment: Value) {
        self.data.schemas.insert(name.to_string(), fragment);
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.data = StoreData::default();
    }
}

/// Capability handle for the override store.
///
/// Callers branch on availability; an unavailable store behaves as an
/// empty one for reads and rejects nothing — store contributions are
/// never load-bearing for core correctness.
#[derive(Debug)]
pub enum StoreHandle {
    Open(FileStore),
    Unavailable { reason: String },
}

impl StoreHandle {
    pub fn is_available(&self) -> bool {
        matches!(self, StoreHandle::Open(_))
    }

    pub fn operations(&self) -> &[OverrideRecord] {
        match self {
            StoreHandle::Open(store) => store.operations(),
            StoreHandle::Unavailable { .. } => &[],
        }
    }

    pub fn schemas(&self) -> Map<String, Value> {
        match self {
            StoreHandle::Open(store) => store.schemas().clone(),
            StoreHandle::Unavailable { .. } => Map::new(),
        }
    }
}

/// Open a store path as a capability handle.
///
/// `None` (no store configured) and any load failure both produce
/// `Unavailable`; the build proceeds on auto-detected data alone.
pub fn open_store(path: Option<&Path>) -> StoreHandle {
    match path {
        None => StoreHandle::Unavailable {
            reason: "no store configured".to_string(),
        },
        Some(path) => match FileStore::load(path) {
            Ok(store) => StoreHandle::Open(store),
            Err(e) => StoreHandle::Unavailable {
                reason: e.to_string(),
            },
        },
    }
}
