//! High-level encoding API.
//!
//! [`IrisEncoder`] is the primary entry point. It wraps a
//! [`PipelineConfig`] and runs the full pipeline on in-memory or on-disk
//! images.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError};
use crate::pipeline::{self, IrisAnalysis};
use crate::raster::RasterImage;
use crate::store::{self, OutputLayout, PersistedOutput, SequenceAllocator};

/// Primary encoding interface.
///
/// Create once, encode many images. Encoding holds no mutable state, so a
/// shared `&IrisEncoder` may be used from several threads.
///
/// # Examples
///
/// ```no_run
/// use iriscode::IrisEncoder;
/// use std::path::Path;
///
/// let encoder = IrisEncoder::new();
/// let analysis = encoder.encode_path(Path::new("eye.jpg")).unwrap();
/// println!("{} (confidence {:.2})", analysis.code(), analysis.confidence());
/// ```
#[derive(Debug, Clone, Default)]
pub struct IrisEncoder {
    config: PipelineConfig,
}

impl IrisEncoder {
    /// Encoder with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control. The config is validated.
    pub fn with_config(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load a JSON config override and create an encoder from it.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            config: PipelineConfig::from_json_file(path)?,
        })
    }

    /// Access the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    ///
    /// Changes are not re-validated.
    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    /// Encode a loaded image.
    pub fn encode(&self, image: &RasterImage) -> IrisAnalysis {
        pipeline::run(image, &self.config)
    }

    /// Load and encode an image file.
    ///
    /// A missing or undecodable file fails this image only.
    pub fn encode_path(&self, path: &Path) -> Result<IrisAnalysis, PipelineError> {
        tracing::info!("Loading image: {}", path.display());
        let image = RasterImage::open(path)?;
        Ok(self.encode(&image))
    }

    /// Load, encode and persist an image file under `layout`.
    ///
    /// Nothing is written when the input cannot be loaded. The codes index
    /// is not refreshed; see [`store::refresh_index`].
    pub fn encode_to(
        &self,
        path: &Path,
        layout: &OutputLayout,
        sequence: &SequenceAllocator,
    ) -> Result<(IrisAnalysis, PersistedOutput), PipelineError> {
        let analysis = self.encode_path(path)?;
        let out = store::persist(
            layout,
            sequence,
            &analysis,
            path,
            self.config.spectral.visualization_size,
        )?;
        Ok((analysis, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disc_image, draw_eye_image, uniform_image};

    fn encoder() -> IrisEncoder {
        IrisEncoder::with_config(PipelineConfig::with_crop_size(128)).unwrap()
    }

    #[test]
    fn encoding_is_deterministic() {
        let eye = RasterImage::Rgb(draw_eye_image(240, 240, 28.0, 21));
        let enc = encoder();
        let a = enc.encode(&eye);
        let b = enc.encode(&eye);
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.code(), b.code());
        assert_eq!(a.latent.digest, b.latent.digest);
    }

    #[test]
    fn encoding_from_file_matches_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eye.png");
        let eye = draw_eye_image(240, 240, 28.0, 4);
        eye.save(&path).unwrap();

        let enc = encoder();
        let from_file = enc.encode_path(&path).unwrap();
        let in_memory = enc.encode(&RasterImage::Rgb(eye));
        assert_eq!(from_file.code(), in_memory.code());
    }

    #[test]
    fn different_eyes_get_different_codes() {
        let enc = encoder();
        let a = enc.encode(&RasterImage::Rgb(draw_eye_image(240, 240, 28.0, 1)));
        let b = enc.encode(&RasterImage::Rgb(draw_eye_image(240, 240, 28.0, 2)));
        assert_ne!(a.latent.digest, b.latent.digest);
        assert_ne!(a.code(), b.code());
    }

    #[test]
    fn disc_scenario_detects_radius_and_confidence() {
        let img = RasterImage::Gray(draw_disc_image(300, 300, [150.0, 150.0], 35.0, 15, 230));
        let out = encoder().encode(&img);
        let pupil = out.pupil.expect("pupil");
        assert!((pupil.radius - 35.0).abs() < 2.0, "radius {}", pupil.radius);
        assert!(out.confidence() > 0.7);
    }

    #[test]
    fn bright_image_falls_back() {
        let out = encoder().encode(&RasterImage::Gray(uniform_image(200, 200, 240)));
        assert!(out.pupil.is_none());
        assert_eq!(out.confidence(), 0.0);
        assert_eq!(out.safe_zone.size(), 128);
    }

    #[test]
    fn uniform_image_has_all_zero_waveform() {
        let out = encoder().encode(&RasterImage::Gray(uniform_image(200, 200, 240)));
        assert!(out.waveform.as_slice().iter().all(|&v| v == 0.0));
        assert!(out.features().freq_balance.is_finite());
        assert!(out.features().gring.is_finite());
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = encoder()
            .encode_path(Path::new("/definitely/not/here.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }

    #[test]
    fn encode_to_persists_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eye.png");
        draw_eye_image(200, 200, 24.0, 3).save(&input).unwrap();
        let layout = OutputLayout::new(dir.path().join("data"));
        let seq = store::open_sequence(&layout).unwrap();

        let mut enc = encoder();
        enc.config_mut().spectral.visualization_size = 48;
        let (analysis, out) = enc.encode_to(&input, &layout, &seq).unwrap();
        assert_eq!(out.id.to_string(), "iris-001");
        let txt = std::fs::read_to_string(&out.paths.code_txt).unwrap();
        assert_eq!(txt, analysis.code());
        let fft = image::open(&out.paths.spectrum).unwrap();
        assert_eq!(fft.width(), 48);
    }

    #[test]
    fn encode_to_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("data"));
        let seq = store::open_sequence(&layout).unwrap();
        let err = encoder()
            .encode_to(&dir.path().join("gone.jpg"), &layout, &seq)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
        assert!(!layout.root().exists());
    }

    #[test]
    fn encode_to_unwritable_layout_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eye.png");
        draw_eye_image(160, 160, 18.0, 5).save(&input).unwrap();
        // A regular file where the data directory should be.
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"").unwrap();
        let layout = OutputLayout::new(&blocker);
        let seq = SequenceAllocator::starting_at(OutputLayout::ID_PREFIX, 1);
        let err = encoder().encode_to(&input, &layout, &seq).unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)), "{err}");
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.spectral.waveform_len = 0;
        assert!(IrisEncoder::with_config(cfg).is_err());
    }

    #[test]
    fn config_mut_updates_config() {
        let mut enc = IrisEncoder::new();
        enc.config_mut().ring.crop_size = 96;
        assert_eq!(enc.config().ring.crop_size, 96);
    }
}
