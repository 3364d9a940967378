//! Closed-contour geometry: extraction, area, perimeter, polygon
//! simplification and minimal enclosing circle.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Seed for the point shuffle in [`min_enclosing_circle`]; fixed so that
/// detection stays bit-for-bit reproducible.
const ENCLOSING_SHUFFLE_SEED: u64 = 0x1215_2024;

/// Outer borders of top-level foreground regions (non-zero pixels).
///
/// Hole borders and regions nested inside holes are skipped.
pub(crate) fn external_contours(mask: &GrayImage) -> Vec<Vec<[f64; 2]>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            c.points
                .iter()
                .map(|p| [p.x as f64, p.y as f64])
                .collect()
        })
        .collect()
}

/// Absolute polygon area via the shoelace formula.
pub(crate) fn polygon_area(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let [x0, y0] = pts[i];
        let [x1, y1] = pts[(i + 1) % n];
        acc += x0 * y1 - x1 * y0;
    }
    0.5 * acc.abs()
}

/// Perimeter of the closed polyline through `pts`.
pub(crate) fn closed_arc_length(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| dist(pts[i], pts[(i + 1) % n])).sum()
}

/// `4π·area / perimeter²`; 1.0 for a perfect circle, 0.0 for a degenerate contour.
pub(crate) fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}

/// Douglas–Peucker simplification of a closed contour.
///
/// The contour is split at the point farthest from the first point and
/// both open halves are simplified independently.
pub(crate) fn approximate_closed_polygon(pts: &[[f64; 2]], epsilon: f64) -> Vec<[f64; 2]> {
    let n = pts.len();
    if n < 3 {
        return pts.to_vec();
    }
    let far = (1..n)
        .max_by(|&a, &b| {
            dist(pts[0], pts[a])
                .partial_cmp(&dist(pts[0], pts[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0);
    if far == 0 {
        return vec![pts[0]];
    }

    let first: Vec<[f64; 2]> = pts[..=far].to_vec();
    let mut second: Vec<[f64; 2]> = pts[far..].to_vec();
    second.push(pts[0]);

    let mut out = simplify_open(&first, epsilon);
    let tail = simplify_open(&second, epsilon);
    // Skip the shared split vertex and the closing copy of pts[0].
    out.extend_from_slice(&tail[1..tail.len() - 1]);
    out
}

fn simplify_open(pts: &[[f64; 2]], epsilon: f64) -> Vec<[f64; 2]> {
    let n = pts.len();
    if n < 3 {
        return pts.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;
    let mut stack = vec![(0usize, n - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut best = lo;
        let mut best_d = -1.0;
        for i in (lo + 1)..hi {
            let d = point_segment_distance(pts[i], pts[lo], pts[hi]);
            if d > best_d {
                best_d = d;
                best = i;
            }
        }
        if best_d > epsilon {
            keep[best] = true;
            stack.push((lo, best));
            stack.push((best, hi));
        }
    }
    pts.iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|(p, _)| *p)
        .collect()
}

/// Smallest circle containing every point, as `(center, radius)`.
///
/// Iterative Welzl over a deterministically shuffled copy of the input.
pub(crate) fn min_enclosing_circle(pts: &[[f64; 2]]) -> Option<([f64; 2], f64)> {
    use rand::prelude::*;

    if pts.is_empty() {
        return None;
    }
    let mut p = pts.to_vec();
    let mut rng = StdRng::seed_from_u64(ENCLOSING_SHUFFLE_SEED);
    p.shuffle(&mut rng);

    const TOL: f64 = 1e-7;
    let mut c = p[0];
    let mut r = 0.0f64;
    for i in 1..p.len() {
        if dist(c, p[i]) <= r + TOL {
            continue;
        }
        c = p[i];
        r = 0.0;
        for j in 0..i {
            if dist(c, p[j]) <= r + TOL {
                continue;
            }
            c = midpoint(p[i], p[j]);
            r = 0.5 * dist(p[i], p[j]);
            for k in 0..j {
                if dist(c, p[k]) <= r + TOL {
                    continue;
                }
                match circumcircle(p[i], p[j], p[k]) {
                    Some((cc, rr)) => {
                        c = cc;
                        r = rr;
                    }
                    None => {
                        // Collinear triple: the widest pair spans it.
                        let pairs = [(p[i], p[j]), (p[i], p[k]), (p[j], p[k])];
                        let (a, b) = pairs
                            .into_iter()
                            .max_by(|x, y| {
                                dist(x.0, x.1)
                                    .partial_cmp(&dist(y.0, y.1))
                                    .unwrap_or(std::cmp::Ordering::Equal)
                            })
                            .unwrap_or((p[i], p[j]));
                        c = midpoint(a, b);
                        r = 0.5 * dist(a, b);
                    }
                }
            }
        }
    }
    Some((c, r))
}

fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<([f64; 2], f64)> {
    let bx = b[0] - a[0];
    let by = b[1] - a[1];
    let cx = c[0] - a[0];
    let cy = c[1] - a[1];
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < 1e-12 {
        return None;
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    let center = [a[0] + ux, a[1] + uy];
    Some((center, (ux * ux + uy * uy).sqrt()))
}

fn point_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let vx = b[0] - a[0];
    let vy = b[1] - a[1];
    let len2 = vx * vx + vy * vy;
    if len2 <= f64::EPSILON {
        return dist(p, a);
    }
    let t = (((p[0] - a[0]) * vx + (p[1] - a[1]) * vy) / len2).clamp(0.0, 1.0);
    dist(p, [a[0] + t * vx, a[1] + t * vy])
}

#[inline]
fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

#[inline]
fn midpoint(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Luma;

    fn circle_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                [cx + r * t.cos(), cy + r * t.sin()]
            })
            .collect()
    }

    #[test]
    fn square_area_and_perimeter() {
        let sq = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert_abs_diff_eq!(polygon_area(&sq), 100.0);
        assert_abs_diff_eq!(closed_arc_length(&sq), 40.0);
        assert_abs_diff_eq!(circularity(100.0, 40.0), std::f64::consts::PI / 4.0);
    }

    #[test]
    fn enclosing_circle_of_sampled_circle() {
        let pts = circle_points(50.0, 40.0, 12.0, 360);
        let (c, r) = min_enclosing_circle(&pts).unwrap();
        assert_abs_diff_eq!(c[0], 50.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c[1], 40.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r, 12.0, epsilon = 1e-6);
    }

    #[test]
    fn enclosing_circle_contains_all_points() {
        let pts = vec![[0.0, 0.0], [4.0, 1.0], [2.0, 7.0], [1.0, 3.0], [3.0, 3.0]];
        let (c, r) = min_enclosing_circle(&pts).unwrap();
        for p in &pts {
            assert!(dist(c, *p) <= r + 1e-6);
        }
    }

    #[test]
    fn enclosing_circle_of_collinear_points() {
        let pts = vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]];
        let (c, r) = min_enclosing_circle(&pts).unwrap();
        assert_abs_diff_eq!(c[0], 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn dp_reduces_dense_circle_to_few_vertices() {
        let pts = circle_points(0.0, 0.0, 25.0, 400);
        let perim = closed_arc_length(&pts);
        let approx = approximate_closed_polygon(&pts, 0.02 * perim);
        assert!(
            (4..=12).contains(&approx.len()),
            "unexpected vertex count {}",
            approx.len()
        );
    }

    #[test]
    fn dp_keeps_square_corners() {
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push([i as f64, 0.0]);
        }
        for i in 0..10 {
            pts.push([10.0, i as f64]);
        }
        for i in 0..10 {
            pts.push([10.0 - i as f64, 10.0]);
        }
        for i in 0..10 {
            pts.push([0.0, 10.0 - i as f64]);
        }
        let approx = approximate_closed_polygon(&pts, 0.5);
        assert_eq!(approx.len(), 4);
    }

    #[test]
    fn external_contours_skip_holes() {
        // Filled square with a hole: one outer border survives.
        let mut img = GrayImage::new(30, 30);
        for y in 5..25 {
            for x in 5..25 {
                let hole = (12..18).contains(&x) && (12..18).contains(&y);
                if !hole {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        let area = polygon_area(&contours[0]);
        assert!(area > 300.0 && area < 400.0, "area {area}");
    }
}
