//! iriscode: deterministic latent codes from iris photographs.
//!
//! The pipeline stages are:
//!
//! 1. **Pupil** – Gaussian smoothing, ordered threshold strategies, contour
//!    circularity filtering, minimal enclosing circle, confidence scoring.
//! 2. **Ring** – safe-zone annulus between 1.1× and 2.2× the pupil radius,
//!    rescaled onto a fixed-size square; centered crop when no pupil is found.
//! 3. **Spectral** – centered log-magnitude 2-D spectrum and its fixed-length
//!    radial waveform.
//! 4. **Features** – image-domain and spectral-domain statistics
//!    (`GHO`, `GDH`, `GRO`, `GRING`, `GTEX`, `G/1`).
//! 5. **Latent** – SHA-256 seed and the `IRIS/I?SEED=…` code string.
//!
//! # Public API
//! - [`IrisEncoder`] as the primary entry point
//! - [`PipelineConfig`] for tuning
//! - [`store`] for writing outputs under a data directory
//!
//! Stage modules are public for callers that need a single stage.

mod api;
mod config;
mod error;
mod pipeline;
mod raster;

pub mod features;
pub mod latent;
pub mod pupil;
pub mod ring;
pub mod spectral;
pub mod store;

pub use api::IrisEncoder;
pub use config::{
    FeatureConfig, PipelineConfig, PupilConfig, RingConfig, SpectralConfig, ThresholdStrategy,
};
pub use error::{ConfigError, PipelineError, RasterError, StoreError};
pub use features::{FeatureKey, FeatureSchema, FeatureSet, LegacyFeatures};
pub use latent::LatentCode;
pub use pipeline::IrisAnalysis;
pub use pupil::{ConfidenceBreakdown, PupilDetection};
pub use raster::RasterImage;
pub use ring::{SafeZoneImage, SafeZoneSource};
pub use spectral::{RadialWaveform, Spectrum2D};

#[cfg(test)]
pub(crate) mod test_utils;
