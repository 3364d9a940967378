//! Frequency-domain analysis of the safe-zone image.
//!
//! 1. **Spectrum** – 2-D DFT, zero frequency shifted to the grid middle,
//!    magnitude compressed with `ln(1 + |F|)`. The image mean can optionally
//!    be removed first ([`SpectralConfig::remove_mean`]).
//! 2. **Radial waveform** – log-magnitude averaged per integer radius,
//!    min/max-normalized, resampled to a fixed length.
//! 3. **Visualization** – viridis rendering of the spectrum for display.

mod fft;
mod radial_profile;
mod render;

use image::GrayImage;

use crate::config::SpectralConfig;

pub use radial_profile::{normalize_unit, radial_profile, resample_linear, RadialWaveform};
pub use render::render_spectrum;

/// Centered, log-scaled 2-D magnitude spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum2D {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Spectrum2D {
    /// Width in bins (equals source image width).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in bins (equals source image height).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid position of the zero-frequency bin.
    pub fn center(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Log-magnitude at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Row-major log-magnitudes.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// `(min, max)` over all bins; `(0, 0)` for an empty grid.
    pub fn min_max(&self) -> (f64, f64) {
        if self.data.is_empty() {
            return (0.0, 0.0);
        }
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// True when no bin other than the zero frequency has a linear magnitude
    /// above `rel_tol` times the zero-frequency magnitude.
    ///
    /// Holds for uniform images under either spectrum variant; the off-center
    /// bins then contain only transform round-off.
    pub fn is_dc_only(&self, rel_tol: f64) -> bool {
        if self.data.is_empty() {
            return true;
        }
        let (cx, cy) = self.center();
        let dc_index = cy * self.width + cx;
        let limit = rel_tol * self.data[dc_index].exp_m1();
        self.data
            .iter()
            .enumerate()
            .all(|(i, &v)| i == dc_index || v.exp_m1() <= limit)
    }

    /// Copy rescaled to `[0, 1]` as `(v - min) / (max - min + eps)`.
    pub fn normalized(&self, eps: f64) -> Spectrum2D {
        let (lo, hi) = self.min_max();
        let denom = hi - lo + eps;
        Spectrum2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| (v - lo) / denom).collect(),
        }
    }
}

/// Compute the centered log-magnitude spectrum of a grayscale image.
///
/// The zero-frequency bin holds the image sum, so for any image with
/// non-zero mean it is the spectrum maximum.
pub fn compute_spectrum(gray: &GrayImage) -> Spectrum2D {
    spectrum_of(gray, 0.0)
}

/// Like [`compute_spectrum`] but with the image mean subtracted first.
///
/// The zero-frequency bin is then ~0 and carries no brightness, and a
/// uniform image of any level has an all-zero spectrum.
pub fn compute_spectrum_mean_removed(gray: &GrayImage) -> Spectrum2D {
    let raw = gray.as_raw();
    let mean = if raw.is_empty() {
        0.0
    } else {
        raw.iter().map(|&v| v as f64).sum::<f64>() / raw.len() as f64
    };
    spectrum_of(gray, mean)
}

fn spectrum_of(gray: &GrayImage, offset: f64) -> Spectrum2D {
    let (w, h) = gray.dimensions();
    let (w, h) = (w as usize, h as usize);
    let samples: Vec<f64> = gray.as_raw().iter().map(|&v| v as f64 - offset).collect();
    let freq = fft::fft2d(&samples, w, h);
    let shifted = fft::fftshift(&freq, w, h);
    Spectrum2D {
        width: w,
        height: h,
        data: shifted.iter().map(|c| c.norm().ln_1p()).collect(),
    }
}

/// Spectrum (per `config.remove_mean`) plus its fixed-length radial waveform.
pub fn analyze(gray: &GrayImage, config: &SpectralConfig) -> (Spectrum2D, RadialWaveform) {
    let spectrum = if config.remove_mean {
        compute_spectrum_mean_removed(gray)
    } else {
        compute_spectrum(gray)
    };
    let waveform = RadialWaveform::from_spectrum(&spectrum, config.waveform_len);
    (spectrum, waveform)
}
