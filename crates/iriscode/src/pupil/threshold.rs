//! Dark-foreground binarization strategies.
//!
//! Every strategy returns a mask with 255 where the (pre-smoothed) input is
//! dark enough to belong to the pupil and 0 elsewhere.

use image::{GrayImage, ImageBuffer, Luma};

use crate::config::ThresholdStrategy;

/// Binarize a smoothed grayscale image with the given strategy.
pub(crate) fn binarize(smoothed: &GrayImage, strategy: &ThresholdStrategy) -> GrayImage {
    match *strategy {
        ThresholdStrategy::Otsu => {
            let level = imageproc::contrast::otsu_level(smoothed);
            tracing::trace!("otsu level {}", level);
            threshold_at_most(smoothed, level)
        }
        ThresholdStrategy::AdaptiveGaussian { block_size, offset } => {
            adaptive_gaussian(smoothed, block_size, offset)
        }
        ThresholdStrategy::Fixed { level } => threshold_at_most(smoothed, level),
    }
}

/// Foreground where `value <= level`.
fn threshold_at_most(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] <= level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Gaussian sigma matching a `block_size × block_size` kernel.
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Foreground where the pixel is at most its Gaussian-weighted local mean minus `offset`.
fn adaptive_gaussian(img: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let f = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(w, h, |x, y| {
        Luma([img.get_pixel(x, y)[0] as f32])
    });
    let local_mean = imageproc::filter::gaussian_blur_f32(&f, block_sigma(block_size));
    GrayImage::from_fn(w, h, |x, y| {
        let v = img.get_pixel(x, y)[0] as f32;
        if v <= local_mean.get_pixel(x, y)[0] - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
