//! Deprecated energy/complexity feature triple.
//!
//! Superseded by [`FeatureSet`](super::FeatureSet). Still computed for the
//! analysis record so that older consumers keep working; it never feeds the
//! latent code.

use image::GrayImage;

use crate::latent::derive_seed;

/// Intensities at or below this (on a 0–1 scale) are treated as masked out.
const RING_PIXEL_FLOOR: f64 = 0.01;

/// Legacy summary of the ring pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LegacyFeatures {
    /// Digest of `"{energy:.6}{complexity:.6}"`.
    pub seed: u32,
    /// Sum of normalized ring intensities.
    pub energy: f64,
    /// Standard deviation of the Sobel gradient magnitude over ring pixels.
    pub complexity: f64,
}

impl LegacyFeatures {
    const ZERO: Self = Self {
        seed: 0,
        energy: 0.0,
        complexity: 0.0,
    };
}

/// Compute the legacy triple. All zeros when no pixel is above the floor.
pub fn legacy_features(gray: &GrayImage) -> LegacyFeatures {
    let ring: Vec<usize> = gray
        .as_raw()
        .iter()
        .enumerate()
        .filter(|(_, &v)| v as f64 / 255.0 > RING_PIXEL_FLOOR)
        .map(|(i, _)| i)
        .collect();
    if ring.is_empty() {
        return LegacyFeatures::ZERO;
    }

    let raw = gray.as_raw();
    let energy: f64 = ring.iter().map(|&i| raw[i] as f64 / 255.0).sum();

    let gx = imageproc::gradients::horizontal_sobel(gray);
    let gy = imageproc::gradients::vertical_sobel(gray);
    let (gx, gy) = (gx.as_raw(), gy.as_raw());
    let mags: Vec<f64> = ring
        .iter()
        .map(|&i| {
            let x = gx[i] as f64 / 255.0;
            let y = gy[i] as f64 / 255.0;
            (x * x + y * y).sqrt()
        })
        .collect();
    let n = mags.len() as f64;
    let mean = mags.iter().sum::<f64>() / n;
    let complexity = (mags.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n).sqrt();

    let seed = derive_seed(&format!("{energy:.6}{complexity:.6}")).seed;
    LegacyFeatures {
        seed,
        energy,
        complexity,
    }
}
