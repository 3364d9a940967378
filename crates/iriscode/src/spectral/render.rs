//! False-color rendering of a spectrum.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::Spectrum2D;

// Polynomial fit of matplotlib's viridis, evaluated per channel.
const VIRIDIS: [[f64; 3]; 7] = [
    [0.277_727_327_223_417_7, 0.005_407_344_544_966_578, 0.334_099_805_335_306_1],
    [0.105_093_043_108_577_4, 1.404_613_529_898_575, 1.384_590_162_594_685],
    [-0.330_861_828_725_556_3, 0.214_847_559_468_213, 0.095_095_163_028_236_59],
    [-4.634_230_498_983_486, -5.799_100_973_351_585, -19.332_440_956_279_87],
    [6.228_269_936_347_081, 14.179_933_366_805_09, 56.690_552_600_681_05],
    [4.776_384_997_670_288, -13.745_145_377_746_01, -65.353_032_633_372_34],
    [-5.435_455_855_934_631, 4.645_852_612_178_535, 26.312_435_249_583_2],
];

/// Map `t` in `[0, 1]` to a viridis color.
pub(crate) fn viridis(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mut rgb = [0u8; 3];
    for (c, out) in rgb.iter_mut().enumerate() {
        let v = VIRIDIS
            .iter()
            .rev()
            .fold(0.0, |acc, coeffs| acc * t + coeffs[c]);
        *out = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    Rgb(rgb)
}

/// Render `spectrum` as a `size × size` viridis image, min/max stretched.
///
/// A constant spectrum renders entirely in the lowest colormap color.
pub fn render_spectrum(spectrum: &Spectrum2D, size: u32) -> RgbImage {
    let (w, h) = (spectrum.width() as u32, spectrum.height() as u32);
    if w == 0 || h == 0 || size == 0 {
        return RgbImage::from_pixel(size, size, viridis(0.0));
    }
    let (lo, hi) = spectrum.min_max();
    let span = hi - lo;
    let colored = RgbImage::from_fn(w, h, |x, y| {
        let v = spectrum.get(x as usize, y as usize);
        let t = if span > 0.0 { (v - lo) / span } else { 0.0 };
        viridis(t)
    });
    if (w, h) == (size, size) {
        return colored;
    }
    imageops::resize(&colored, size, size, FilterType::Triangle)
}
