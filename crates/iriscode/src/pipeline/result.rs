use crate::features::{FeatureSchema, FeatureSet, LegacyFeatures};
use crate::latent::LatentCode;
use crate::pupil::PupilDetection;
use crate::ring::SafeZoneImage;
use crate::spectral::{RadialWaveform, Spectrum2D};

/// Everything one pipeline run produces for a single image.
#[derive(Debug, Clone)]
pub struct IrisAnalysis {
    /// Source image dimensions `[width, height]`.
    pub image_size: [u32; 2],
    /// Pupil detection, `None` when the fallback crop was used.
    pub pupil: Option<PupilDetection>,
    /// Fixed-size safe-zone raster with its confidence.
    pub safe_zone: SafeZoneImage,
    /// Centered log-magnitude spectrum of the safe zone.
    pub spectrum: Spectrum2D,
    /// Fixed-length radial waveform of `spectrum`.
    pub waveform: RadialWaveform,
    /// Encoded features, seed and code string.
    pub latent: LatentCode,
    /// Deprecated energy/complexity summary.
    pub legacy: LegacyFeatures,
}

impl IrisAnalysis {
    /// Confidence in `[0, 1]`; exactly 0.0 on the fallback path.
    pub fn confidence(&self) -> f64 {
        self.safe_zone.confidence()
    }

    /// Canonical features.
    pub fn features(&self) -> &FeatureSet {
        &self.latent.features
    }

    /// The latent code string.
    pub fn code(&self) -> &str {
        &self.latent.code
    }

    pub fn seed(&self) -> u32 {
        self.latent.seed
    }

    /// Features rendered as JSON under the requested schema.
    pub fn features_json(&self, schema: FeatureSchema) -> serde_json::Value {
        let value = match schema {
            FeatureSchema::Canonical => serde_json::to_value(self.latent.features),
            FeatureSchema::Legacy => serde_json::to_value(self.legacy),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Compact JSON summary (no raster data).
    pub fn summary_json(&self, schema: FeatureSchema) -> serde_json::Value {
        serde_json::json!({
            "image_size": self.image_size,
            "pupil": self.pupil,
            "safe_zone": {
                "size": self.safe_zone.size(),
                "source": self.safe_zone.source(),
            },
            "confidence": self.confidence(),
            "latent_code": self.latent.code,
            "seed": self.latent.seed,
            "digest": self.latent.digest,
            "schema": schema,
            "features": self.features_json(schema),
            "waveform": self.waveform,
        })
    }
}
