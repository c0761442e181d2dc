//! Error types for document building and store access.

use std::path::PathBuf;
use thiserror::Error;

/// Errors fatal to a whole document build.
///
/// Per-route and per-field analysis failures never surface here; they
/// degrade to generic fragments and at most a diagnostic. Only failing
/// to obtain the route inventory itself aborts a build.
#[derive(Debug, Error)]
pub enum BuildError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid route inventory: {message}")]
    InvalidInventory { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::FileNotFound { .. }
            | BuildError::ReadError { .. }
            | BuildError::WriteError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors raised by the override store.
///
/// Store unavailability is not an error: callers open a store through
/// `store::open_store`, which returns a capability handle that reports
/// unavailability as a value. These errors cover failures on a store
/// that was successfully opened.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read store {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write store {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store {path} is not valid JSON: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            StoreError::ReadError { .. } | StoreError::WriteError { .. } => 3,
            StoreError::InvalidJson { .. } => 2,
        }
    }
}
