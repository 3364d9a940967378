//! Error types for loading, configuration, persistence and whole-pipeline runs.
//!
//! Pupil-detection failure is not an error: it is reported as `None` and
//! handled by the center-crop fallback. Numeric degeneracies (uniform
//! spectra, empty masks) are guarded in place and never surface here.

use std::path::PathBuf;

/// Errors raised while reading an input raster.
#[derive(Debug)]
pub enum RasterError {
    /// The file is missing or could not be read.
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file was read but is not a decodable image.
    Decode {
        /// Offending path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
    /// The raster has zero width or height.
    Empty,
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read image {}: {}", path.display(), source)
            }
            Self::Decode { path, message } => {
                write!(f, "cannot decode image {}: {}", path.display(), message)
            }
            Self::Empty => write!(f, "image has zero width or height"),
        }
    }
}

impl std::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Invalid or unreadable pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its admissible range.
    Invalid {
        /// Dotted parameter name, e.g. `ring.outer_ratio`.
        field: &'static str,
        /// Human-readable constraint.
        reason: String,
    },
    /// The configuration file could not be read or parsed.
    Load {
        /// Offending path.
        path: PathBuf,
        /// Reader or parser message.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::Load { path, message } => {
                write!(f, "cannot load config {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised while writing or reading persisted outputs.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure.
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// JSON encoding or decoding failure.
    Json {
        /// Offending path.
        path: PathBuf,
        /// Serializer message.
        message: String,
    },
    /// Image encoding failure.
    Encode {
        /// Offending path.
        path: PathBuf,
        /// Encoder message.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, err: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot write {}: {}", path.display(), source),
            Self::Json { path, message } => {
                write!(f, "invalid JSON at {}: {}", path.display(), message)
            }
            Self::Encode { path, message } => {
                write!(f, "cannot encode image {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Terminal failure of one image's pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// The input image could not be loaded.
    Input(RasterError),
    /// An output file could not be written.
    Store(StoreError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(e) => write!(f, "input error: {}", e),
            Self::Store(e) => write!(f, "persistence error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<RasterError> for PipelineError {
    fn from(e: RasterError) -> Self {
        Self::Input(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_wraps_source() {
        let err: PipelineError = RasterError::Io {
            path: PathBuf::from("missing.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("missing.jpg"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn store_failure_converts_to_store_variant() {
        let err: PipelineError = StoreError::Encode {
            path: PathBuf::from("out/iris-001.jpg"),
            message: "bad".into(),
        }
        .into();
        assert!(matches!(err, PipelineError::Store(StoreError::Encode { .. })));
        assert!(err.to_string().starts_with("persistence error:"), "{err}");
    }

    #[test]
    fn config_error_names_field() {
        let err = ConfigError::invalid("ring.crop_size", "must be > 0");
        assert_eq!(err.to_string(), "invalid ring.crop_size: must be > 0");
    }
}
