//! Deterministic detection-confidence scoring.
//!
//! Weighted sum of four cues, capped at 1.0:
//! circularity (0.4), size appropriateness (0.3), centeredness (0.2) and
//! contour smoothness (0.1).

use crate::config::PupilConfig;

const W_CIRCULARITY: f64 = 0.4;
const W_SIZE: f64 = 0.3;
const W_POSITION: f64 = 0.2;
const W_SMOOTHNESS: f64 = 0.1;

/// Geometric measurements of the winning contour.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContourCues {
    pub circularity: f64,
    pub radius: f64,
    pub center: [f64; 2],
    pub image_size: (u32, u32),
    pub approx_vertices: usize,
}

/// Per-cue scores in `[0, 1]` before weighting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfidenceBreakdown {
    /// Circularity relative to the configured target.
    pub circularity: f64,
    /// Radius relative to the ideal band.
    pub size: f64,
    /// Distance of the center from the image center.
    pub position: f64,
    /// Vertex count of the simplified contour.
    pub smoothness: f64,
}

impl ConfidenceBreakdown {
    /// Weighted total, capped to `[0, 1]`.
    pub fn total(&self) -> f64 {
        let sum = W_CIRCULARITY * self.circularity
            + W_SIZE * self.size
            + W_POSITION * self.position
            + W_SMOOTHNESS * self.smoothness;
        sum.clamp(0.0, 1.0)
    }
}

pub(crate) fn score(cues: &ContourCues, cfg: &PupilConfig) -> ConfidenceBreakdown {
    let (w, h) = cues.image_size;
    let min_dim = w.min(h) as f64;

    let circularity = (cues.circularity / cfg.circularity_target).clamp(0.0, 1.0);

    let ideal_min = min_dim * cfg.ideal_radius_frac[0];
    let ideal_max = min_dim * cfg.ideal_radius_frac[1];
    let r = cues.radius;
    let size = if r >= ideal_min && r <= ideal_max {
        1.0
    } else if r < ideal_min {
        (r / ideal_min).max(0.0)
    } else {
        (1.0 - (r - ideal_max) / ideal_max).max(0.0)
    };

    let half_w = w as f64 / 2.0;
    let half_h = h as f64 / 2.0;
    let off_center = (cues.center[0] - half_w).hypot(cues.center[1] - half_h);
    let max_off = half_w.hypot(half_h);
    let position = if max_off > 0.0 {
        1.0 - (off_center / max_off).min(1.0)
    } else {
        0.0
    };

    let reference = cfg.smoothness_ref_vertices.max(1) as f64;
    let smoothness = 1.0 - (cues.approx_vertices as f64 / reference).min(1.0);

    ConfidenceBreakdown {
        circularity,
        size,
        position,
        smoothness,
    }
}
