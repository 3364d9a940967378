//! Pipeline configuration.
//!
//! Every stage owns a small config struct with a `Default` carrying the
//! reference constants; [`PipelineConfig`] aggregates them and can be
//! partially overridden from JSON.

use std::path::Path;

use crate::error::ConfigError;

/// Upper bound for [`RingConfig::padding_px`].
pub const MAX_PADDING_PX: u32 = 4096;

/// Binarization strategy tried by the pupil detector.
///
/// All strategies mark dark pixels as foreground.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStrategy {
    /// Global automatic (Otsu) threshold.
    Otsu,
    /// Local Gaussian-weighted mean minus `offset`.
    AdaptiveGaussian {
        /// Odd neighbourhood size in pixels.
        block_size: u32,
        /// Constant subtracted from the local mean.
        offset: f32,
    },
    /// Fixed intensity level; pixels `<= level` are foreground.
    Fixed {
        /// Threshold level in `[0, 255]`.
        level: u8,
    },
}

impl ThresholdStrategy {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::AdaptiveGaussian { .. } => "adaptive_gaussian",
            Self::Fixed { .. } => "fixed",
        }
    }
}

/// Pupil localization and confidence-scoring parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PupilConfig {
    /// Gaussian pre-smoothing sigma (pixels).
    pub blur_sigma: f32,
    /// Strategies tried in order; the first valid circle wins.
    pub strategies: Vec<ThresholdStrategy>,
    /// Contours with a smaller area (px²) are discarded.
    pub min_contour_area: f64,
    /// Contours must have circularity strictly above this value.
    pub min_circularity: f64,
    /// Circularity at which the circularity score saturates.
    pub circularity_target: f64,
    /// Absolute floor for the accepted radius (pixels).
    pub min_radius_px: f64,
    /// Minimum radius as a fraction of the shorter image side.
    pub min_radius_frac: f64,
    /// Maximum radius as a fraction of the shorter image side.
    pub max_radius_frac: f64,
    /// Center must lie farther than this fraction of the shorter side from every border.
    pub border_margin_frac: f64,
    /// Ideal radius band `[lo, hi]` as fractions of the shorter side.
    pub ideal_radius_frac: [f64; 2],
    /// Polygon-approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Vertex count at which the smoothness score reaches zero.
    pub smoothness_ref_vertices: usize,
}

impl Default for PupilConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            strategies: vec![
                ThresholdStrategy::Otsu,
                ThresholdStrategy::AdaptiveGaussian {
                    block_size: 11,
                    offset: 2.0,
                },
                ThresholdStrategy::Fixed { level: 30 },
            ],
            min_contour_area: 100.0,
            min_circularity: 0.5,
            circularity_target: 0.7,
            min_radius_px: 10.0,
            min_radius_frac: 0.05,
            max_radius_frac: 1.0 / 3.0,
            border_margin_frac: 0.1,
            ideal_radius_frac: [0.10, 0.15],
            approx_epsilon_frac: 0.02,
            smoothness_ref_vertices: 20,
        }
    }
}

/// Safe-zone ring extraction parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Inner annulus radius as a multiple of the pupil radius.
    pub inner_ratio: f64,
    /// Outer annulus radius as a multiple of the pupil radius.
    pub outer_ratio: f64,
    /// Padding added around the annulus bounding box (pixels).
    pub padding_px: u32,
    /// Side length of the square safe-zone output (pixels).
    pub crop_size: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            inner_ratio: 1.1,
            outer_ratio: 2.2,
            padding_px: 10,
            crop_size: 2048,
        }
    }
}

/// Spectrum and waveform parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Fixed length of the radial waveform.
    pub waveform_len: usize,
    /// Side length of the rendered spectrum visualization (pixels).
    pub visualization_size: u32,
    /// Subtract the image mean before the transform. Off by default, which
    /// keeps the image sum in the zero-frequency bin.
    pub remove_mean: bool,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            waveform_len: 64,
            visualization_size: 512,
            remove_mean: false,
        }
    }
}

/// Feature-extraction constants.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Stabilizer added to ratio denominators.
    pub epsilon: f64,
    /// Mid-band ring limits as fractions of the maximum radial distance.
    pub ring_band: [f64; 2],
    /// Frequency balance reported when no spectrum is available.
    pub placeholder_freq_balance: f64,
    /// Ring energy reported when no spectrum is available.
    pub placeholder_ring_energy: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-10,
            ring_band: [0.3, 0.6],
            placeholder_freq_balance: 0.010,
            placeholder_ring_energy: 0.5,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pupil detector.
    pub pupil: PupilConfig,
    /// Ring extractor.
    pub ring: RingConfig,
    /// Spectral analyzer.
    pub spectral: SpectralConfig,
    /// Feature extractor.
    pub features: FeatureConfig,
}

impl PipelineConfig {
    /// Load a (possibly partial) JSON override on top of the defaults and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with a different safe-zone size.
    pub fn with_crop_size(crop_size: u32) -> Self {
        let mut config = Self::default();
        config.ring.crop_size = crop_size;
        config
    }

    /// Reject parameter combinations the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pupil;
        if !p.blur_sigma.is_finite() || p.blur_sigma <= 0.0 {
            return Err(ConfigError::invalid("pupil.blur_sigma", "must be finite and > 0"));
        }
        if p.strategies.is_empty() {
            return Err(ConfigError::invalid(
                "pupil.strategies",
                "at least one strategy is required",
            ));
        }
        for s in &p.strategies {
            if let ThresholdStrategy::AdaptiveGaussian { block_size, offset } = *s {
                if block_size < 3 || block_size % 2 == 0 {
                    return Err(ConfigError::invalid(
                        "pupil.strategies.block_size",
                        "must be odd and >= 3",
                    ));
                }
                if !offset.is_finite() {
                    return Err(ConfigError::invalid(
                        "pupil.strategies.offset",
                        "must be finite",
                    ));
                }
            }
        }
        if !(0.0..=1.0).contains(&p.min_circularity) {
            return Err(ConfigError::invalid("pupil.min_circularity", "must be in [0, 1]"));
        }
        if !p.circularity_target.is_finite() || p.circularity_target <= 0.0 {
            return Err(ConfigError::invalid(
                "pupil.circularity_target",
                "must be finite and > 0",
            ));
        }
        if !(p.max_radius_frac > 0.0 && p.max_radius_frac <= 1.0) {
            return Err(ConfigError::invalid(
                "pupil.max_radius_frac",
                "must be in (0, 1]",
            ));
        }
        if !(p.min_radius_frac > 0.0 && p.min_radius_frac < p.max_radius_frac) {
            return Err(ConfigError::invalid(
                "pupil.min_radius_frac",
                "must satisfy 0 < min_radius_frac < max_radius_frac",
            ));
        }
        if !(p.min_radius_px.is_finite() && p.min_radius_px >= 0.0) {
            return Err(ConfigError::invalid(
                "pupil.min_radius_px",
                "must be finite and >= 0",
            ));
        }
        if !(0.0..0.5).contains(&p.border_margin_frac) {
            return Err(ConfigError::invalid(
                "pupil.border_margin_frac",
                "must be in [0, 0.5)",
            ));
        }
        if !(p.ideal_radius_frac[0] > 0.0 && p.ideal_radius_frac[0] <= p.ideal_radius_frac[1]) {
            return Err(ConfigError::invalid(
                "pupil.ideal_radius_frac",
                "must satisfy 0 < lo <= hi",
            ));
        }
        if p.smoothness_ref_vertices == 0 {
            return Err(ConfigError::invalid(
                "pupil.smoothness_ref_vertices",
                "must be >= 1",
            ));
        }

        let r = &self.ring;
        if !(r.inner_ratio > 0.0 && r.inner_ratio < r.outer_ratio && r.outer_ratio.is_finite()) {
            return Err(ConfigError::invalid(
                "ring.inner_ratio",
                "must satisfy 0 < inner_ratio < outer_ratio",
            ));
        }
        if r.crop_size == 0 {
            return Err(ConfigError::invalid("ring.crop_size", "must be > 0"));
        }
        if r.padding_px > MAX_PADDING_PX {
            return Err(ConfigError::invalid(
                "ring.padding_px",
                format!("must be <= {MAX_PADDING_PX}"),
            ));
        }

        if self.spectral.waveform_len == 0 {
            return Err(ConfigError::invalid("spectral.waveform_len", "must be > 0"));
        }
        if self.spectral.visualization_size == 0 {
            return Err(ConfigError::invalid(
                "spectral.visualization_size",
                "must be > 0",
            ));
        }

        let f = &self.features;
        if !f.epsilon.is_finite() || f.epsilon <= 0.0 {
            return Err(ConfigError::invalid("features.epsilon", "must be finite and > 0"));
        }
        if !(0.0 <= f.ring_band[0] && f.ring_band[0] < f.ring_band[1]) {
            return Err(ConfigError::invalid(
                "features.ring_band",
                "must satisfy 0 <= lo < hi",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "ring": { "crop_size": 256 } }"#).unwrap();
        let cfg = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.ring.crop_size, 256);
        assert_eq!(cfg.ring.inner_ratio, 1.1);
        assert_eq!(cfg.spectral.waveform_len, 64);
        assert_eq!(cfg.pupil.strategies.len(), 3);
    }

    #[test]
    fn strategies_roundtrip_through_json() {
        let json = serde_json::to_string(&PupilConfig::default()).unwrap();
        assert!(json.contains("adaptive_gaussian"), "{json}");
        let back: PupilConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.strategies, PupilConfig::default().strategies);
    }

    #[test]
    fn inverted_ring_ratios_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.ring.inner_ratio = 3.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ring.inner_ratio", .. }));
    }

    #[test]
    fn out_of_range_geometry_rejected() {
        let cases: [(&str, fn(&mut PipelineConfig)); 5] = [
            ("pupil.max_radius_frac", |c| c.pupil.max_radius_frac = 1.5),
            ("pupil.max_radius_frac", |c| c.pupil.max_radius_frac = f64::NAN),
            ("pupil.border_margin_frac", |c| c.pupil.border_margin_frac = 0.5),
            ("pupil.border_margin_frac", |c| c.pupil.border_margin_frac = -0.1),
            ("ring.padding_px", |c| c.ring.padding_px = u32::MAX),
        ];
        for (field, tweak) in cases {
            let mut cfg = PipelineConfig::default();
            tweak(&mut cfg);
            match cfg.validate() {
                Err(ConfigError::Invalid { field: f, .. }) => assert_eq!(f, field),
                other => panic!("{field}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn padding_at_limit_accepted() {
        let mut cfg = PipelineConfig::default();
        cfg.ring.padding_px = MAX_PADDING_PX;
        cfg.validate().unwrap();
    }

    #[test]
    fn negative_min_radius_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.pupil.min_radius_px = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "pupil.min_radius_px", .. }));
    }

    #[test]
    fn even_block_size_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.pupil.strategies = vec![ThresholdStrategy::AdaptiveGaussian {
            block_size: 10,
            offset: 2.0,
        }];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unreadable_file_is_load_error() {
        let err = PipelineConfig::from_json_file(Path::new("/nope/cfg.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
