//! Binary annulus over image coordinates.

use image::{GrayImage, Luma};

use crate::config::RingConfig;
use crate::pupil::PupilDetection;

/// Annulus `inner_radius < d <= outer_radius` around the pupil center.
///
/// Radii are the pupil radius times the configured ratios, truncated to
/// whole pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RingMask {
    width: u32,
    height: u32,
    center: [f64; 2],
    inner_radius: f64,
    outer_radius: f64,
}

impl RingMask {
    /// Derive the annulus for a detection inside a `width × height` image.
    pub fn from_detection(det: &PupilDetection, width: u32, height: u32, cfg: &RingConfig) -> Self {
        Self {
            width,
            height,
            center: [det.center_x, det.center_y],
            inner_radius: (det.radius * cfg.inner_ratio).floor(),
            outer_radius: (det.radius * cfg.outer_ratio).floor(),
        }
    }

    /// Inner (excluded) radius in pixels.
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Outer radius in pixels.
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    /// Whether pixel `(x, y)` belongs to the annulus.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let dx = x as f64 - self.center[0];
        let dy = y as f64 - self.center[1];
        let d2 = dx * dx + dy * dy;
        d2 > self.inner_radius * self.inner_radius && d2 <= self.outer_radius * self.outer_radius
    }

    /// Inclusive bounding box `[x0, y0, x1, y1]` of annulus pixels, `None` when empty.
    pub fn foreground_bbox(&self) -> Option<[u32; 4]> {
        if self.outer_radius <= 0.0 || self.width == 0 || self.height == 0 {
            return None;
        }
        let r = self.outer_radius;
        let clamp_x = |v: f64| v.clamp(0.0, (self.width - 1) as f64) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, (self.height - 1) as f64) as u32;
        let xs = clamp_x((self.center[0] - r).floor())..=clamp_x((self.center[0] + r).ceil());
        let ys = clamp_y((self.center[1] - r).floor())..=clamp_y((self.center[1] + r).ceil());

        let mut bbox: Option<[u32; 4]> = None;
        for y in ys {
            for x in xs.clone() {
                if !self.contains(x, y) {
                    continue;
                }
                bbox = Some(match bbox {
                    None => [x, y, x, y],
                    Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
                });
            }
        }
        bbox
    }

    /// Rasterize as a 0/255 mask.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.contains(x, y) { 255 } else { 0 }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pupil::ConfidenceBreakdown;

    fn det(cx: f64, cy: f64, r: f64) -> PupilDetection {
        PupilDetection {
            center_x: cx,
            center_y: cy,
            radius: r,
            confidence: 1.0,
            breakdown: ConfidenceBreakdown {
                circularity: 1.0,
                size: 1.0,
                position: 1.0,
                smoothness: 1.0,
            },
            circularity: 1.0,
            strategy: crate::config::ThresholdStrategy::Otsu,
        }
    }

    #[test]
    fn radii_follow_ratios() {
        let m = RingMask::from_detection(&det(50.0, 50.0, 10.0), 100, 100, &RingConfig::default());
        assert_eq!(m.inner_radius(), 11.0);
        assert_eq!(m.outer_radius(), 22.0);
        assert!(!m.contains(50, 50));
        assert!(!m.contains(61, 50));
        assert!(m.contains(62, 50));
        assert!(m.contains(72, 50));
        assert!(!m.contains(73, 50));
    }

    #[test]
    fn bbox_is_tight_and_clipped() {
        let m = RingMask::from_detection(&det(50.0, 50.0, 10.0), 100, 100, &RingConfig::default());
        assert_eq!(m.foreground_bbox(), Some([28, 28, 72, 72]));

        let clipped =
            RingMask::from_detection(&det(5.0, 50.0, 10.0), 100, 100, &RingConfig::default());
        let bbox = clipped.foreground_bbox().unwrap();
        assert_eq!(bbox[0], 0);
        assert_eq!(bbox[2], 27);
    }

    #[test]
    fn mask_image_matches_contains() {
        let m = RingMask::from_detection(&det(20.0, 20.0, 5.0), 40, 40, &RingConfig::default());
        let img = m.to_image();
        let n = img.pixels().filter(|p| p[0] == 255).count();
        let expected = std::f64::consts::PI * (11.0f64.powi(2) - 5.0f64.powi(2));
        assert!((n as f64 - expected).abs() / expected < 0.1, "n = {n}");
    }
}
