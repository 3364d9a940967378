//! `codes_index.json`: listing of every saved latent code.

use std::path::Path;

use crate::error::StoreError;

use super::record::write_json_atomic;

/// Index format version.
pub const INDEX_VERSION: &str = "1.0";

/// One saved code.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexEntry {
    /// Output identity, e.g. `iris-001`.
    pub id: String,
    pub code: String,
    /// Name of the `.txt` file the code was read from.
    pub filename: String,
    /// Parsed sibling JSON record, or `{}` when absent or unreadable.
    pub metadata: serde_json::Value,
}

/// Index of all codes under `codes/`, sorted by id.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CodesIndex {
    pub version: String,
    pub count: usize,
    pub codes: Vec<IndexEntry>,
    pub last_updated: Option<String>,
}

impl CodesIndex {
    /// Build the index from `code_*.txt` files in `codes_dir`.
    ///
    /// Unreadable text files are skipped with a warning.
    pub fn scan(codes_dir: &Path) -> Result<Self, StoreError> {
        let entries = match std::fs::read_dir(codes_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(StoreError::io(codes_dir, e)),
        };

        let mut codes = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(codes_dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(id) = stem.strip_prefix("code_") else {
                continue;
            };
            let code = match std::fs::read_to_string(&path) {
                Ok(s) => s.trim().to_string(),
                Err(e) => {
                    tracing::warn!("could not read {}: {}", path.display(), e);
                    continue;
                }
            };
            let metadata = std::fs::read_to_string(path.with_extension("json"))
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_else(|| serde_json::json!({}));
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            codes.push(IndexEntry {
                id: id.to_string(),
                code,
                filename,
                metadata,
            });
        }
        codes.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            version: INDEX_VERSION.to_string(),
            count: codes.len(),
            codes,
            last_updated: None,
        })
    }

    fn empty() -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            count: 0,
            codes: Vec::new(),
            last_updated: None,
        }
    }

    /// Write atomically (temporary sibling, then rename).
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        write_json_atomic(path, self)
    }
}
