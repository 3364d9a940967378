//! On-disk output layout under one data directory.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

use super::OutputId;

/// Directory names and file naming rules for persisted outputs.
///
/// ```text
/// <root>/processed/<id>.jpg
/// <root>/processed/metadata_<id>.json
/// <root>/fft/fft_<id>.jpg
/// <root>/codes/code_<id>.json
/// <root>/codes/code_<id>.txt
/// <root>/analysis/analysis_<id>.json
/// <root>/codes_index.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

/// Every file path written for one output identity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutputPaths {
    pub safe_zone: PathBuf,
    pub metadata: PathBuf,
    pub spectrum: PathBuf,
    pub code_json: PathBuf,
    pub code_txt: PathBuf,
    pub analysis: PathBuf,
}

impl OutputLayout {
    /// Identity prefix of processed images.
    pub const ID_PREFIX: &'static str = "iris";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn fft_dir(&self) -> PathBuf {
        self.root.join("fft")
    }

    pub fn codes_dir(&self) -> PathBuf {
        self.root.join("codes")
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join("analysis")
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("codes_index.json")
    }

    /// Create all output directories.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for dir in [
            self.processed_dir(),
            self.fft_dir(),
            self.codes_dir(),
            self.analysis_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    /// File paths for `id`.
    pub fn paths_for(&self, id: &OutputId) -> OutputPaths {
        OutputPaths {
            safe_zone: self.processed_dir().join(format!("{id}.jpg")),
            metadata: metadata_path_for(&self.processed_dir().join(format!("{id}.jpg"))),
            spectrum: self.fft_dir().join(format!("fft_{id}.jpg")),
            code_json: self.codes_dir().join(format!("code_{id}.json")),
            code_txt: self.codes_dir().join(format!("code_{id}.txt")),
            analysis: self.analysis_dir().join(format!("analysis_{id}.json")),
        }
    }
}

/// Metadata side-channel file next to a safe-zone image:
/// `<dir>/<stem>.jpg` → `<dir>/metadata_<stem>.json`.
pub fn metadata_path_for(safe_zone: &Path) -> PathBuf {
    let stem = safe_zone
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    safe_zone.with_file_name(format!("metadata_{stem}.json"))
}
