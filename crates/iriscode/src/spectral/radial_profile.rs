//! Radially averaged spectrum profile and its fixed-length waveform.

use super::Spectrum2D;

/// Off-center energy, relative to the zero frequency, below which a
/// spectrum counts as structureless.
const DC_ONLY_REL_TOL: f64 = 1e-9;

/// Fixed-length radial profile of a spectrum, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RadialWaveform(Vec<f64>);

impl RadialWaveform {
    /// Radial profile of `spectrum`, normalized to `[0, 1]` and resampled to
    /// exactly `len` samples.
    ///
    /// A spectrum with energy only at the zero frequency (a uniform image)
    /// yields all zeros.
    pub fn from_spectrum(spectrum: &Spectrum2D, len: usize) -> Self {
        if spectrum.is_dc_only(DC_ONLY_REL_TOL) {
            return Self(vec![0.0; len]);
        }
        let profile = radial_profile(spectrum);
        let normalized = normalize_unit(&profile);
        Self(resample_linear(&normalized, len))
    }

    /// Wrap precomputed samples.
    pub fn from_vec(samples: Vec<f64>) -> Self {
        Self(samples)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

/// Mean log-magnitude per integer radius around the spectrum center.
///
/// Bin `i` collects bins whose distance from the center truncates to `i`.
/// Bins that receive no sample (possible only for degenerate grids) are 0.
pub fn radial_profile(spectrum: &Spectrum2D) -> Vec<f64> {
    let (w, h) = (spectrum.width(), spectrum.height());
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let (cx, cy) = spectrum.center();
    let far_x = cx.max(w - 1 - cx) as f64;
    let far_y = cy.max(h - 1 - cy) as f64;
    let n_bins = (far_x * far_x + far_y * far_y).sqrt() as usize + 1;

    let mut sums = vec![0.0f64; n_bins];
    let mut counts = vec![0usize; n_bins];
    for y in 0..h {
        let dy = y as f64 - cy as f64;
        for x in 0..w {
            let dx = x as f64 - cx as f64;
            let bin = ((dx * dx + dy * dy).sqrt() as usize).min(n_bins - 1);
            sums[bin] += spectrum.get(x, y);
            counts[bin] += 1;
        }
    }
    sums.iter()
        .zip(&counts)
        .map(|(&s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
        .collect()
}

/// Rescale to `[0, 1]` by min/max. A constant input maps to all zeros.
pub fn normalize_unit(values: &[f64]) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() || !(hi > lo) {
        return vec![0.0; values.len()];
    }
    let span = hi - lo;
    values.iter().map(|&v| (v - lo) / span).collect()
}

/// Piecewise-linear resampling onto `len` evenly spaced positions spanning
/// the first to the last input sample.
///
/// An empty input yields `len` zeros; a single sample is repeated.
pub fn resample_linear(values: &[f64], len: usize) -> Vec<f64> {
    match values.len() {
        0 => return vec![0.0; len],
        1 => return vec![values[0]; len],
        _ => {}
    }
    if len == 1 {
        return vec![values[0]];
    }
    let last = (values.len() - 1) as f64;
    let step = last / (len - 1) as f64;
    (0..len)
        .map(|i| {
            let pos = (i as f64 * step).min(last);
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(values.len() - 1);
            let t = pos - i0 as f64;
            values[i0] * (1.0 - t) + values[i1] * t
        })
        .collect()
}
