//! Shared synthetic images for unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Render a filled disc on a flat background.
///
/// Pixels at distance `d <= radius` from `center` get `disc_pix`,
/// everything else `bg_pix`.
pub(crate) fn draw_disc_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    disc_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        if (dx * dx + dy * dy).sqrt() <= radius {
            Luma([disc_pix])
        } else {
            Luma([bg_pix])
        }
    })
}

/// Synthetic eye: dark pupil, textured iris annulus, bright sclera.
pub(crate) fn draw_eye_image(w: u32, h: u32, pupil_radius: f32, seed: u64) -> RgbImage {
    use rand::prelude::*;

    let mut rng = StdRng::seed_from_u64(seed);
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let iris_radius = pupil_radius * 2.6;
    let spokes: Vec<f32> = (0..24).map(|_| rng.gen_range(0.0..1.0)).collect();
    RgbImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let d = (dx * dx + dy * dy).sqrt();
        if d <= pupil_radius {
            Rgb([12, 10, 10])
        } else if d <= iris_radius {
            let theta = dy.atan2(dx) + std::f32::consts::PI;
            let k = ((theta / std::f32::consts::TAU) * spokes.len() as f32) as usize;
            let tex = spokes[k.min(spokes.len() - 1)];
            let ring = ((d / 3.0).sin() * 0.5 + 0.5) * 30.0;
            let v = 150.0 + tex * 40.0 + ring;
            Rgb([(v * 0.92) as u8, (v * 0.96) as u8, v as u8])
        } else {
            Rgb([205, 202, 198])
        }
    })
}

/// Constant image.
pub(crate) fn uniform_image(w: u32, h: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([value]))
}

/// Deterministic uniform noise.
pub(crate) fn noise_image(w: u32, h: u32, seed: u64) -> GrayImage {
    use rand::prelude::*;

    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(w, h, |_, _| Luma([rng.gen::<u8>()]))
}
