//! Owned input rasters.
//!
//! A [`RasterImage`] is loaded once, consumed by one pipeline run and dropped.
//! Grayscale sources stay single-channel; everything else is normalized to
//! 8-bit RGB.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::RasterError;

/// Grayscale or 3-channel 8-bit raster.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterImage {
    /// Single-channel intensities.
    Gray(GrayImage),
    /// Interleaved RGB samples.
    Rgb(RgbImage),
}

impl RasterImage {
    /// Read and decode an image file (JPEG or PNG).
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let bytes = std::fs::read(path).map_err(|source| RasterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| RasterError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_dynamic(decoded)
    }

    /// Convert a decoded `image` buffer, rejecting zero-sized rasters.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, RasterError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(RasterError::Empty);
        }
        Ok(match img {
            DynamicImage::ImageLuma8(g) => Self::Gray(g),
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) => {
                Self::Gray(img.to_luma8())
            }
            DynamicImage::ImageRgb8(rgb) => Self::Rgb(rgb),
            other => Self::Rgb(other.to_rgb8()),
        })
    }

    /// Image dimensions `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Gray(g) => g.dimensions(),
            Self::Rgb(c) => c.dimensions(),
        }
    }

    /// Length of the shorter side in pixels.
    pub fn min_dimension(&self) -> u32 {
        let (w, h) = self.dimensions();
        w.min(h)
    }

    /// Number of interleaved channels (1 or 3).
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// Grayscale view using ITU-R BT.601 luma weights.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Self::Gray(g) => g.clone(),
            Self::Rgb(c) => rgb_to_gray(c),
        }
    }

    /// Convert into a `DynamicImage` for encoding.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Self::Gray(g) => DynamicImage::ImageLuma8(g.clone()),
            Self::Rgb(c) => DynamicImage::ImageRgb8(c.clone()),
        }
    }
}

impl From<GrayImage> for RasterImage {
    fn from(g: GrayImage) -> Self {
        Self::Gray(g)
    }
}

impl From<RgbImage> for RasterImage {
    fn from(c: RgbImage) -> Self {
        Self::Rgb(c)
    }
}

fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([l.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn gray_conversion_uses_bt601_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([0, 0, 255]));
        let gray = RasterImage::Rgb(rgb).to_gray();
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RasterImage::open(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, RasterError::Io { .. }));
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let err = RasterImage::open(&path).unwrap_err();
        assert!(matches!(err, RasterError::Decode { .. }));
    }

    #[test]
    fn zero_sized_raster_rejected() {
        let err = RasterImage::from_dynamic(DynamicImage::new_luma8(0, 4)).unwrap_err();
        assert!(matches!(err, RasterError::Empty));
    }

    #[test]
    fn rgba_is_normalized_to_rgb() {
        let img = RasterImage::from_dynamic(DynamicImage::new_rgba8(4, 2)).unwrap();
        assert_eq!(img.channels(), 3);
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.min_dimension(), 2);
    }
}
