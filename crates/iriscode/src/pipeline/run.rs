//! Stage orchestrator: pupil → safe zone → spectrum → features → code.

use crate::config::PipelineConfig;
use crate::features::{extract_features, legacy_features};
use crate::latent::LatentCode;
use crate::pupil::detect_pupil;
use crate::raster::RasterImage;
use crate::ring::extract_safe_zone;
use crate::spectral;

use super::IrisAnalysis;

/// Run every stage on one loaded image.
///
/// Never fails: a missing pupil degrades to the center-crop fallback and
/// numeric degeneracies are guarded inside the stages.
pub fn run(image: &RasterImage, config: &PipelineConfig) -> IrisAnalysis {
    let (w, h) = image.dimensions();
    tracing::debug!("Image size: {}x{}", w, h);

    let pupil = detect_pupil(image, &config.pupil);
    match &pupil {
        Some(p) => tracing::info!(
            "pupil at ({:.1}, {:.1}) r={:.1} confidence={:.3}",
            p.center_x,
            p.center_y,
            p.radius,
            p.confidence
        ),
        None => tracing::info!("no pupil detected; falling back to center crop"),
    }

    let safe_zone = extract_safe_zone(image, pupil.as_ref(), &config.ring);
    let gray = safe_zone.image().to_gray();

    let (spectrum, waveform) = spectral::analyze(&gray, &config.spectral);
    let features = extract_features(&gray, Some(&spectrum), &config.features);
    let latent = LatentCode::encode(&features);
    let legacy = legacy_features(&gray);

    tracing::info!("latent code {}", latent.code);
    tracing::debug!(
        seed = latent.seed,
        confidence = safe_zone.confidence(),
        "encoding finished"
    );

    IrisAnalysis {
        image_size: [w, h],
        pupil,
        safe_zone,
        spectrum,
        waveform,
        latent,
        legacy,
    }
}
