// src/store.rs
//! Snapshot sources: where account/post/rule records come from.
//!
//! Record files are either a JSON array of account records or a TOML document with an
//! `[[accounts]]` table array. Accounts flagged `deleted = true` are skipped.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::{AccountRecord, RuleSnapshot};

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Build a complete new snapshot. Must not return partial data.
    async fn load(&self) -> Result<RuleSnapshot, StoreError>;
    fn name(&self) -> &'static str;
}

/// Reads account records from a `.json` or `.toml` file on each load.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<RuleSnapshot, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records = parse_records(&content, &extension_of(&self.path))?;
        Ok(RuleSnapshot::from_records(records))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Fixed in-memory records, handy for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    records: Vec<AccountRecord>,
}

impl StaticSnapshotSource {
    pub fn new(records: Vec<AccountRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(Self::new(parse_records(json, "json")?))
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn load(&self) -> Result<RuleSnapshot, StoreError> {
        Ok(RuleSnapshot::from_records(self.records.clone()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Parse account records; `ext` is the file extension (`json` or `toml`).
pub fn parse_records(content: &str, ext: &str) -> Result<Vec<AccountRecord>, StoreError> {
    match ext {
        "json" => Ok(serde_json::from_str(content)?),
        "toml" => {
            #[derive(Deserialize)]
            struct TomlRecords {
                #[serde(default)]
                accounts: Vec<AccountRecord>,
            }
            let doc: TomlRecords = toml::from_str(content)?;
            Ok(doc.accounts)
        }
        other => Err(StoreError::UnsupportedFormat(other.to_string())),
    }
}
