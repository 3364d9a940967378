//! Named numeric features of a safe-zone image and its spectrum.
//!
//! The canonical schema has six keys in a fixed order:
//!
//! | key     | domain   | meaning                                         |
//! |---------|----------|-------------------------------------------------|
//! | `GHO`   | image    | mean brightness (0–255 scale)                   |
//! | `GDH`   | image    | intensity standard deviation (0–255 scale)      |
//! | `GRO`   | image    | central-quarter / border mean intensity ratio   |
//! | `GRING` | spectral | mean normalized magnitude in the mid-band ring  |
//! | `GTEX`  | image    | Sobel gradient variance, both axes summed       |
//! | `G/1`   | spectral | low- / high-frequency mean magnitude ratio      |
//!
//! The older energy/complexity schema survives in [`legacy`] and is only
//! emitted in analysis records.

pub mod legacy;

use image::GrayImage;

use crate::config::FeatureConfig;
use crate::spectral::Spectrum2D;

pub use legacy::{legacy_features, LegacyFeatures};

/// Feature key of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Gho,
    Gdh,
    Gro,
    Gring,
    Gtex,
    FreqBalance,
}

impl FeatureKey {
    /// Order used by the seed string and the code string.
    pub const ORDER: [FeatureKey; 6] = [
        FeatureKey::Gho,
        FeatureKey::Gdh,
        FeatureKey::Gro,
        FeatureKey::Gring,
        FeatureKey::Gtex,
        FeatureKey::FreqBalance,
    ];

    /// Key name as it appears in codes and records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gho => "GHO",
            Self::Gdh => "GDH",
            Self::Gro => "GRO",
            Self::Gring => "GRING",
            Self::Gtex => "GTEX",
            Self::FreqBalance => "G/1",
        }
    }

    /// Keys rendered as truncated integers in the code string.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Gho | Self::Gdh)
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which feature schema to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    /// `GHO`/`GDH`/`GRO`/`GRING`/`GTEX`/`G/1`. Drives seed and code.
    #[default]
    Canonical,
    /// Deprecated `seed`/`energy`/`complexity` triple.
    Legacy,
}

impl std::str::FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(Self::Canonical),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown feature schema '{other}' (canonical|legacy)")),
        }
    }
}

/// The six canonical features. Serializes with the schema's key names, in order.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureSet {
    #[serde(rename = "GHO")]
    pub gho: f64,
    #[serde(rename = "GDH")]
    pub gdh: f64,
    #[serde(rename = "GRO")]
    pub gro: f64,
    #[serde(rename = "GRING")]
    pub gring: f64,
    #[serde(rename = "GTEX")]
    pub gtex: f64,
    #[serde(rename = "G/1")]
    pub freq_balance: f64,
}

impl FeatureSet {
    /// Combine the two feature domains.
    pub fn from_parts(image: ImageFeatures, spectral: SpectralFeatures) -> Self {
        Self {
            gho: image.brightness,
            gdh: image.contrast,
            gro: image.radial_ratio,
            gring: spectral.ring_energy,
            gtex: image.texture,
            freq_balance: spectral.freq_balance,
        }
    }

    pub fn get(&self, key: FeatureKey) -> f64 {
        match key {
            FeatureKey::Gho => self.gho,
            FeatureKey::Gdh => self.gdh,
            FeatureKey::Gro => self.gro,
            FeatureKey::Gring => self.gring,
            FeatureKey::Gtex => self.gtex,
            FeatureKey::FreqBalance => self.freq_balance,
        }
    }

    /// `(key, value)` pairs in [`FeatureKey::ORDER`].
    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        FeatureKey::ORDER.iter().map(move |&k| (k, self.get(k)))
    }
}

/// Intensity statistics of the safe-zone image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFeatures {
    pub brightness: f64,
    pub contrast: f64,
    pub texture: f64,
    pub radial_ratio: f64,
}

/// Statistics of the normalized spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralFeatures {
    pub freq_balance: f64,
    pub ring_energy: f64,
}

impl SpectralFeatures {
    /// Constants reported when no spectrum is available.
    pub fn placeholder(cfg: &FeatureConfig) -> Self {
        Self {
            freq_balance: cfg.placeholder_freq_balance,
            ring_energy: cfg.placeholder_ring_energy,
        }
    }
}

/// Extract the canonical feature set.
///
/// Without a spectrum the spectral features take their placeholder values.
pub fn extract_features(
    gray: &GrayImage,
    spectrum: Option<&Spectrum2D>,
    cfg: &FeatureConfig,
) -> FeatureSet {
    let image = image_features(gray, cfg);
    let spectral = match spectrum {
        Some(s) => spectral_features(s, cfg),
        None => {
            tracing::debug!("no spectrum supplied; using placeholder spectral features");
            SpectralFeatures::placeholder(cfg)
        }
    };
    FeatureSet::from_parts(image, spectral)
}

/// Image-domain features on intensities scaled to `[0, 1]`.
pub fn image_features(gray: &GrayImage, cfg: &FeatureConfig) -> ImageFeatures {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return ImageFeatures {
            brightness: 0.0,
            contrast: 0.0,
            texture: 0.0,
            radial_ratio: 0.0,
        };
    }
    let norm: Vec<f64> = gray.as_raw().iter().map(|&v| v as f64 / 255.0).collect();
    let (mean, var) = mean_var(norm.iter().copied());

    let gx = imageproc::gradients::horizontal_sobel(gray);
    let gy = imageproc::gradients::vertical_sobel(gray);
    let (_, var_x) = mean_var(gx.as_raw().iter().map(|&v| v as f64 / 255.0));
    let (_, var_y) = mean_var(gy.as_raw().iter().map(|&v| v as f64 / 255.0));

    ImageFeatures {
        brightness: mean * 255.0,
        contrast: var.sqrt() * 255.0,
        texture: var_x + var_y,
        radial_ratio: radial_ratio(&norm, w as usize, h as usize, cfg.epsilon),
    }
}

/// Mean of the central `[h/4, 3h/4) × [w/4, 3w/4)` block over the mean of
/// the four border strips. Corner pixels belong to two strips and are
/// counted twice.
fn radial_ratio(norm: &[f64], w: usize, h: usize, eps: f64) -> f64 {
    let (x0, x1) = (w / 4, 3 * w / 4);
    let (y0, y1) = (h / 4, 3 * h / 4);
    let px = |x: usize, y: usize| norm[y * w + x];

    let center = mean_var((y0..y1).flat_map(|y| (x0..x1).map(move |x| px(x, y)))).0;

    let top = (0..y0).flat_map(|y| (0..w).map(move |x| (x, y)));
    let bottom = (y1..h).flat_map(|y| (0..w).map(move |x| (x, y)));
    let left = (0..h).flat_map(|y| (0..x0).map(move |x| (x, y)));
    let right = (0..h).flat_map(|y| (x1..w).map(move |x| (x, y)));
    let border = mean_var(
        top.chain(bottom)
            .chain(left)
            .chain(right)
            .map(|(x, y)| px(x, y)),
    )
    .0;

    center / (border + eps)
}

/// Spectral features on the min/max-normalized spectrum.
pub fn spectral_features(spectrum: &Spectrum2D, cfg: &FeatureConfig) -> SpectralFeatures {
    let (w, h) = (spectrum.width(), spectrum.height());
    if w == 0 || h == 0 {
        return SpectralFeatures::placeholder(cfg);
    }
    let norm = spectrum.normalized(cfg.epsilon);
    let (cx, cy) = norm.center();

    // Low-frequency window [c - s, c + s) on both axes.
    let s = w.min(h) / 4;
    let in_window =
        |x: usize, y: usize| s > 0 && x + s >= cx && x < cx + s && y + s >= cy && y < cy + s;

    let max_dist = ((cx * cx + cy * cy) as f64).sqrt() + cfg.epsilon;
    let [band_lo, band_hi] = cfg.ring_band;

    let (mut low_sum, mut low_n) = (0.0, 0usize);
    let (mut high_sum, mut high_n) = (0.0, 0usize);
    let (mut ring_sum, mut ring_n) = (0.0, 0usize);
    for y in 0..h {
        let dy = y as f64 - cy as f64;
        for x in 0..w {
            let v = norm.get(x, y);
            if in_window(x, y) {
                low_sum += v;
                low_n += 1;
            } else {
                high_sum += v;
                high_n += 1;
            }
            let dx = x as f64 - cx as f64;
            let d = (dx * dx + dy * dy).sqrt() / max_dist;
            if d >= band_lo && d <= band_hi {
                ring_sum += v;
                ring_n += 1;
            }
        }
    }

    let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { sum / n as f64 };
    let low = mean(low_sum, low_n);
    let high = mean(high_sum, high_n);
    SpectralFeatures {
        freq_balance: low / (high + cfg.epsilon),
        ring_energy: mean(ring_sum, ring_n),
    }
}

/// Population mean and variance; `(0, 0)` for an empty sequence.
fn mean_var(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut n, mut mean, mut m2) = (0usize, 0.0f64, 0.0f64);
    for v in values {
        n += 1;
        let delta = v - mean;
        mean += delta / n as f64;
        m2 += delta * (v - mean);
    }
    if n == 0 {
        (0.0, 0.0)
    } else {
        (mean, m2 / n as f64)
    }
}
