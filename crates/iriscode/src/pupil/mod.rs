//! Pupil localization.
//!
//! The pupil is the dark, roughly circular blob near the image center. The
//! input is Gaussian-smoothed, then each configured [`ThresholdStrategy`] is
//! tried in order:
//!
//! 1. binarize (dark = foreground),
//! 2. enumerate outer contours, drop tiny and non-circular ones,
//! 3. keep the largest survivor and fit its minimal enclosing circle,
//! 4. validate radius and border margin.
//!
//! The first strategy yielding a valid circle wins; later strategies are
//! never evaluated. No valid circle anywhere means `None`, which callers
//! treat as a signal for the fallback crop rather than an error.

mod confidence;
mod contour;
mod threshold;

use image::GrayImage;

use crate::config::{PupilConfig, ThresholdStrategy};
use crate::raster::RasterImage;

pub use confidence::ConfidenceBreakdown;

/// A located pupil.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PupilDetection {
    /// Circle center x (pixels).
    pub center_x: f64,
    /// Circle center y (pixels).
    pub center_y: f64,
    /// Circle radius (pixels).
    pub radius: f64,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Per-cue scores behind `confidence`.
    pub breakdown: ConfidenceBreakdown,
    /// Circularity of the winning contour.
    pub circularity: f64,
    /// Strategy whose mask produced the detection.
    pub strategy: ThresholdStrategy,
}

/// Locate the pupil in a color or grayscale raster.
pub fn detect_pupil(image: &RasterImage, config: &PupilConfig) -> Option<PupilDetection> {
    detect_pupil_gray(&image.to_gray(), config)
}

/// Locate the pupil in a grayscale image.
pub fn detect_pupil_gray(gray: &GrayImage, config: &PupilConfig) -> Option<PupilDetection> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let smoothed = imageproc::filter::gaussian_blur_f32(gray, config.blur_sigma);

    let found = config.strategies.iter().find_map(|strategy| {
        let mask = threshold::binarize(&smoothed, strategy);
        let det = evaluate_mask(&mask, strategy, config);
        if det.is_none() {
            tracing::debug!("pupil strategy {} found no valid circle", strategy.name());
        }
        det
    });

    match &found {
        Some(d) => tracing::debug!(
            "pupil via {}: center=({:.1}, {:.1}) r={:.1} conf={:.3}",
            d.strategy.name(),
            d.center_x,
            d.center_y,
            d.radius,
            d.confidence
        ),
        None => tracing::debug!("no pupil candidate survived any strategy"),
    }
    found
}

/// Geometric gates applied to the fitted circle.
struct CircleGate {
    min_radius: f64,
    max_radius: f64,
    margin: f64,
    width: f64,
    height: f64,
}

impl CircleGate {
    fn new(width: u32, height: u32, cfg: &PupilConfig) -> Self {
        let min_dim = width.min(height) as f64;
        Self {
            min_radius: cfg.min_radius_px.max((min_dim * cfg.min_radius_frac).floor()),
            max_radius: (min_dim * cfg.max_radius_frac).floor(),
            margin: (min_dim * cfg.border_margin_frac).floor(),
            width: width as f64,
            height: height as f64,
        }
    }

    fn accepts(&self, center: [f64; 2], radius: f64) -> bool {
        let radius_ok = radius >= self.min_radius && radius <= self.max_radius;
        let [cx, cy] = center;
        let inside = self.margin < cx
            && cx < self.width - self.margin
            && self.margin < cy
            && cy < self.height - self.margin;
        radius_ok && inside
    }
}

struct Candidate {
    points: Vec<[f64; 2]>,
    area: f64,
    perimeter: f64,
    circularity: f64,
}

fn evaluate_mask(
    mask: &GrayImage,
    strategy: &ThresholdStrategy,
    cfg: &PupilConfig,
) -> Option<PupilDetection> {
    let contours = contour::external_contours(mask);
    let n_contours = contours.len();

    let mut best: Option<Candidate> = None;
    let mut n_valid = 0usize;
    for points in contours {
        let area = contour::polygon_area(&points);
        if area < cfg.min_contour_area {
            continue;
        }
        let perimeter = contour::closed_arc_length(&points);
        if perimeter <= 0.0 {
            continue;
        }
        let circularity = contour::circularity(area, perimeter);
        if circularity <= cfg.min_circularity {
            continue;
        }
        n_valid += 1;
        // Strictly greater keeps the first of equally large candidates.
        if best.as_ref().map_or(true, |b| area > b.area) {
            best = Some(Candidate {
                points,
                area,
                perimeter,
                circularity,
            });
        }
    }
    tracing::trace!(
        "strategy {}: {} contours, {} circular candidates",
        strategy.name(),
        n_contours,
        n_valid
    );

    let best = best?;
    let (center, radius) = contour::min_enclosing_circle(&best.points)?;
    let (w, h) = mask.dimensions();
    if !CircleGate::new(w, h, cfg).accepts(center, radius) {
        tracing::trace!(
            "strategy {}: circle ({:.1}, {:.1}) r={:.1} rejected by gates",
            strategy.name(),
            center[0],
            center[1],
            radius
        );
        return None;
    }

    let approx = contour::approximate_closed_polygon(
        &best.points,
        cfg.approx_epsilon_frac * best.perimeter,
    );
    let breakdown = confidence::score(
        &confidence::ContourCues {
            circularity: best.circularity,
            radius,
            center,
            image_size: (w, h),
            approx_vertices: approx.len(),
        },
        cfg,
    );

    Some(PupilDetection {
        center_x: center[0],
        center_y: center[1],
        radius,
        confidence: breakdown.total(),
        breakdown,
        circularity: best.circularity,
        strategy: *strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disc_image, draw_eye_image, noise_image, uniform_image};

    #[test]
    fn finds_centered_dark_disc() {
        let r = 25.0f32;
        let img = draw_disc_image(200, 200, [100.0, 100.0], r, 20, 220);
        let det = detect_pupil_gray(&img, &PupilConfig::default()).expect("pupil");
        assert!((det.radius - r as f64).abs() < 2.0, "radius {}", det.radius);
        assert!((det.center_x - 100.0).abs() < 1.5);
        assert!((det.center_y - 100.0).abs() < 1.5);
        assert!(det.confidence > 0.7, "confidence {}", det.confidence);
        assert!(det.confidence <= 1.0);
        assert_eq!(det.strategy, ThresholdStrategy::Otsu);
    }

    #[test]
    fn bright_featureless_image_has_no_pupil() {
        let img = uniform_image(200, 200, 230);
        assert!(detect_pupil_gray(&img, &PupilConfig::default()).is_none());
    }

    #[test]
    fn disc_touching_border_rejected_by_margin() {
        let img = draw_disc_image(200, 200, [15.0, 100.0], 20.0, 15, 220);
        assert!(detect_pupil_gray(&img, &PupilConfig::default()).is_none());
    }

    #[test]
    fn tiny_disc_is_ignored() {
        let img = draw_disc_image(200, 200, [100.0, 100.0], 4.0, 15, 220);
        assert!(detect_pupil_gray(&img, &PupilConfig::default()).is_none());
    }

    #[test]
    fn detects_pupil_in_color_eye() {
        let eye = RasterImage::Rgb(draw_eye_image(240, 240, 26.0, 7));
        let det = detect_pupil(&eye, &PupilConfig::default()).expect("pupil");
        assert!((det.radius - 26.0).abs() < 3.0, "radius {}", det.radius);
        assert!((0.0..=1.0).contains(&det.confidence));
    }

    #[test]
    fn later_strategy_used_when_earlier_fails() {
        let img = draw_disc_image(200, 200, [100.0, 100.0], 25.0, 20, 220);
        let cfg = PupilConfig {
            strategies: vec![
                ThresholdStrategy::Fixed { level: 5 },
                ThresholdStrategy::Fixed { level: 60 },
            ],
            ..PupilConfig::default()
        };
        let det = detect_pupil_gray(&img, &cfg).expect("pupil");
        assert_eq!(det.strategy, ThresholdStrategy::Fixed { level: 60 });
    }

    #[test]
    fn detection_is_deterministic_on_noise() {
        let img = noise_image(120, 120, 3);
        let a = detect_pupil_gray(&img, &PupilConfig::default());
        let b = detect_pupil_gray(&img, &PupilConfig::default());
        assert_eq!(a, b);
    }
}
