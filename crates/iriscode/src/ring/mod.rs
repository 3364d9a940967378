//! Safe-zone ring isolation.
//!
//! Keeps the iris annulus between `inner_ratio` and `outer_ratio` pupil
//! radii (excluding the pupil itself and the eyelid-prone periphery), crops
//! it, rescales it to the configured size and centers it on a black square
//! canvas. Without a usable detection a plain centered crop is taken
//! instead, with confidence forced to 0.0.

mod mask;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};

use crate::config::RingConfig;
use crate::pupil::PupilDetection;
use crate::raster::RasterImage;

pub use mask::RingMask;

/// How a [`SafeZoneImage`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SafeZoneSource {
    /// Annulus around a detected pupil.
    Ring {
        /// Inner annulus radius in source pixels.
        inner_radius: f64,
        /// Outer annulus radius in source pixels.
        outer_radius: f64,
        /// Uniform scale applied to the cropped ring.
        scale: f64,
    },
    /// Centered square crop of the source.
    CenterCrop,
}

/// Fixed-size square safe-zone raster paired with its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeZoneImage {
    image: RasterImage,
    confidence: f64,
    source: SafeZoneSource,
}

impl SafeZoneImage {
    /// The square safe-zone raster.
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Confidence of the detection that produced this image (0.0 for the fallback crop).
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Extraction path taken.
    pub fn source(&self) -> SafeZoneSource {
        self.source
    }

    /// `true` when the centered-crop fallback was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, SafeZoneSource::CenterCrop)
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.image.dimensions().0
    }

    /// Consume into the raster.
    pub fn into_image(self) -> RasterImage {
        self.image
    }
}

/// Build the safe-zone image for `image`, falling back to a centered crop
/// when `detection` is absent or its annulus covers no pixels.
pub fn extract_safe_zone(
    image: &RasterImage,
    detection: Option<&PupilDetection>,
    config: &RingConfig,
) -> SafeZoneImage {
    let Some(det) = detection else {
        tracing::info!("pupil not detected; using centered crop");
        return center_crop_fallback(image, config.crop_size);
    };

    let (w, h) = image.dimensions();
    let mask = RingMask::from_detection(det, w, h, config);
    let Some(bbox) = mask.foreground_bbox() else {
        tracing::info!("ring mask is empty; using centered crop");
        return center_crop_fallback(image, config.crop_size);
    };

    let crop = padded_crop(bbox, config.padding_px, w, h);
    let (ring_image, scale) = match image {
        RasterImage::Gray(g) => {
            let (out, s) = ring_to_canvas(g, &mask, crop, config.crop_size);
            (RasterImage::Gray(out), s)
        }
        RasterImage::Rgb(c) => {
            let (out, s) = ring_to_canvas(c, &mask, crop, config.crop_size);
            (RasterImage::Rgb(out), s)
        }
    };
    tracing::debug!(
        "safe zone: crop {}x{} at ({}, {}), scale {:.3}",
        crop[2],
        crop[3],
        crop[0],
        crop[1],
        scale
    );

    SafeZoneImage {
        image: ring_image,
        confidence: det.confidence.clamp(0.0, 1.0),
        source: SafeZoneSource::Ring {
            inner_radius: mask.inner_radius(),
            outer_radius: mask.outer_radius(),
            scale,
        },
    }
}

/// Centered `crop_size × crop_size` crop, zero-padded when the source is smaller.
pub fn center_crop_fallback(image: &RasterImage, crop_size: u32) -> SafeZoneImage {
    let out = match image {
        RasterImage::Gray(g) => RasterImage::Gray(center_crop(g, crop_size)),
        RasterImage::Rgb(c) => RasterImage::Rgb(center_crop(c, crop_size)),
    };
    SafeZoneImage {
        image: out,
        confidence: 0.0,
        source: SafeZoneSource::CenterCrop,
    }
}

/// Inclusive bbox `[x0, y0, x1, y1]` grown by `pad`, clipped to the image,
/// returned as `[x, y, width, height]` with an exclusive far edge.
fn padded_crop(bbox: [u32; 4], pad: u32, w: u32, h: u32) -> [u32; 4] {
    let x0 = bbox[0].saturating_sub(pad);
    let y0 = bbox[1].saturating_sub(pad);
    let x1 = bbox[2].saturating_add(pad).min(w);
    let y1 = bbox[3].saturating_add(pad).min(h);
    [x0, y0, x1 - x0, y1 - y0]
}

fn ring_to_canvas<P>(
    img: &ImageBuffer<P, Vec<u8>>,
    mask: &RingMask,
    crop: [u32; 4],
    size: u32,
) -> (ImageBuffer<P, Vec<u8>>, f64)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let [cx0, cy0, cw, ch] = crop;
    let mut ring = imageops::crop_imm(img, cx0, cy0, cw, ch).to_image();
    for (x, y, p) in ring.enumerate_pixels_mut() {
        if !mask.contains(x + cx0, y + cy0) {
            p.channels_mut().iter_mut().for_each(|c| *c = 0);
        }
    }

    let (new_w, new_h, scale) = fit_within(cw, ch, size);
    // Lanczos when enlarging, Catmull-Rom (bicubic) when shrinking.
    let filter = if scale > 1.0 {
        FilterType::Lanczos3
    } else {
        FilterType::CatmullRom
    };
    let resized = imageops::resize(&ring, new_w, new_h, filter);

    let mut canvas = ImageBuffer::<P, Vec<u8>>::new(size, size);
    let off_x = (size - new_w) / 2;
    let off_y = (size - new_h) / 2;
    imageops::replace(&mut canvas, &resized, off_x as i64, off_y as i64);
    (canvas, scale)
}

/// Uniform scale that makes the longer of `w × h` exactly `size`, and the
/// resulting dimensions (rounded, at least 1).
fn fit_within(w: u32, h: u32, size: u32) -> (u32, u32, f64) {
    let scale = (size as f64 / w as f64).min(size as f64 / h as f64);
    let new_w = ((w as f64 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, size);
    (new_w, new_h, scale)
}

fn center_crop<P>(img: &ImageBuffer<P, Vec<u8>>, size: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (w, h) = img.dimensions();
    let half = size / 2;
    let cx = w / 2;
    let cy = h / 2;
    let x0 = cx.saturating_sub(half);
    let y0 = cy.saturating_sub(half);
    let x1 = (cx + half).min(w);
    let y1 = (cy + half).min(h);
    let cropped = imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image();
    let (cw, ch) = cropped.dimensions();
    if cw == size && ch == size {
        return cropped;
    }
    let mut canvas = ImageBuffer::<P, Vec<u8>>::new(size, size);
    let off_x = (size - cw) / 2;
    let off_y = (size - ch) / 2;
    imageops::replace(&mut canvas, &cropped, off_x as i64, off_y as i64);
    canvas
}
