// src/error.rs
//! Error and diagnostic types.
//!
//! The matching engine itself is total: nothing in `fuzzy`, `relevance`, `rules` or
//! `engine` returns an error. Failures live at the edges (loading records from disk),
//! and cache problems are reported as non-fatal diagnostics.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a rule snapshot from persisted records.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record file could not be read
    #[error("reading records from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record file is not valid JSON for the account record shape
    #[error("parsing JSON records: {0}")]
    Json(#[from] serde_json::Error),

    /// Record file is not valid TOML for the account record shape
    #[error("parsing TOML records: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is neither `.json` nor `.toml`
    #[error("unsupported record format: {0}")]
    UnsupportedFormat(String),
}

/// Non-fatal conditions observed on the cached snapshot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDiagnostic {
    /// The cached snapshot has zero entries (never loaded, or loaded empty).
    #[error("cache not initialised: snapshot has no entries")]
    UninitializedCache,

    /// A snapshot was loaded but lists no accounts to follow.
    #[error("no accounts listed to follow in stream")]
    EmptyFollowList,
}
