//! Persisted JSON records.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::features::{FeatureSet, LegacyFeatures};
use crate::latent::LatentCode;
use crate::pipeline::IrisAnalysis;
use crate::spectral::RadialWaveform;

/// `codes/code_<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct CodeRecord {
    pub latent_code: String,
    pub seed: u32,
    pub features: FeatureSet,
    /// Hex SHA-256 digest behind `seed`.
    pub digest: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl CodeRecord {
    pub fn new(latent: &LatentCode, timestamp: f64) -> Self {
        Self {
            latent_code: latent.code.clone(),
            seed: latent.seed,
            features: latent.features,
            digest: latent.digest.clone(),
            timestamp,
        }
    }
}

/// `processed/metadata_<id>.json`, the confidence side-channel.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct RingMetadata {
    /// File name of the safe-zone image.
    pub iris_file: String,
    pub confidence: f64,
    /// File name of the source photo.
    pub input_file: String,
}

/// `analysis/analysis_<id>.json`: legacy triple, waveform and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub legacy: LegacyFeatures,
    pub waveform: RadialWaveform,
    pub confidence: f64,
}

impl AnalysisRecord {
    /// Record for a fresh pipeline run, carrying its own confidence.
    pub fn new(analysis: &IrisAnalysis) -> Self {
        Self {
            legacy: analysis.legacy,
            waveform: analysis.waveform.clone(),
            confidence: analysis.confidence(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)
    }
}

/// Confidence recorded in a metadata file.
///
/// Missing file, malformed JSON or a missing/non-numeric `confidence` all
/// yield 0.0; only the malformed cases are logged.
pub fn read_prior_confidence(path: &Path) -> f64 {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return 0.0,
    };
    let value: serde_json::Value = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("ignoring malformed metadata {}: {}", path.display(), e);
            return 0.0;
        }
    };
    match value.get("confidence").and_then(serde_json::Value::as_f64) {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => {
            tracing::warn!("metadata {} has no usable confidence", path.display());
            0.0
        }
    }
}

/// Pretty-print `value` to `path`.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| StoreError::io(path, e))
}

/// [`write_json`] through a temporary sibling renamed into place, so readers
/// never observe a partially written file.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    write_json(&tmp, value)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        StoreError::io(path, e)
    })
}

/// Read and decode a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let data = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&data).map_err(|e| StoreError::json(path, e))
}
