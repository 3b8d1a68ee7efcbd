use std::f64::consts::PI;

use super::{Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel segments return `None`; use [`collinear_overlap_2d`] for those.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = da.x * db.y - da.y * db.x;
    let scale = da.norm() * db.norm();
    if scale < TOLERANCE || cross.abs() < TOLERANCE * scale {
        return None;
    }

    let d = b0 - a0;
    let t = (d.x * db.y - d.y * db.x) / cross;
    let u = (d.x * da.y - d.y * da.x) / cross;

    // Use a small epsilon to include endpoints.
    let eps = 1e-9;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Overlap of two collinear segments.
///
/// Returns the two ends of the shared interval, or a single repeated point
/// when the segments only touch. Returns `None` if the segments are not
/// collinear within `tol` or do not overlap.
#[must_use]
pub fn collinear_overlap_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    tol: f64,
) -> Option<(Point2, Point2)> {
    let da = a1 - a0;
    let len = da.norm();
    if len < TOLERANCE {
        return None;
    }
    let dir = da / len;
    let off = |p: &Point2| {
        let v = p - a0;
        (v.x * dir.y - v.y * dir.x).abs()
    };
    if off(b0) > tol || off(b1) > tol {
        return None;
    }

    let s0 = (b0 - a0).dot(&dir);
    let s1 = (b1 - a0).dot(&dir);
    let (lo, hi) = if s0 <= s1 { (s0, s1) } else { (s1, s0) };
    let start = lo.max(0.0);
    let end = hi.min(len);
    if end < start - tol {
        return None;
    }
    let end = end.max(start);
    Some((a0 + dir * start, a0 + dir * end))
}

/// Intersection of a line segment with a circular arc in 2D.
///
/// The segment goes from `a0` to `a1`. The arc has `center`, `radius`,
/// `start_angle`, and `sweep`.
///
/// Returns a vector of `(point, t_seg, t_arc)` where:
/// - `t_seg` is the parameter on the segment `[0, 1]`
/// - `t_arc` is the parameter on the arc `[0, 1]`
#[must_use]
pub fn line_arc_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    center: &Point2,
    radius: f64,
    start_angle: f64,
    sweep: f64,
) -> Vec<(Point2, f64, f64)> {
    let mut results = Vec::new();
    if radius < TOLERANCE || sweep.abs() < TOLERANCE {
        return results;
    }

    let d = a1 - a0;
    let seg_len_sq = d.norm_squared();
    if seg_len_sq < TOLERANCE * TOLERANCE {
        return results;
    }

    // Substitute parametric line into circle equation:
    // |a0 + t*d - c|² = r²
    let f = a0 - center;
    let a = seg_len_sq;
    let b = 2.0 * f.dot(&d);
    let c = f.norm_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    let disc_tol = 1e-12 * (b * b).max(a * radius * radius).max(1.0);
    if discriminant < -disc_tol {
        return results;
    }
    let disc_sqrt = discriminant.max(0.0).sqrt();

    let eps = 1e-9;
    let t_roots = if discriminant.abs() <= disc_tol {
        // Tangent case: single root.
        vec![-b / (2.0 * a)]
    } else {
        vec![(-b - disc_sqrt) / (2.0 * a), (-b + disc_sqrt) / (2.0 * a)]
    };

    for t_seg in t_roots {
        if t_seg < -eps || t_seg > 1.0 + eps {
            continue;
        }
        let t_seg = t_seg.clamp(0.0, 1.0);
        let p = a0 + d * t_seg;

        // Check if point is within the arc's angular range.
        let angle = (p.y - center.y).atan2(p.x - center.x);
        if let Some(t_arc) = angle_to_arc_param(angle, start_angle, sweep) {
            results.push((p, t_seg, t_arc));
        }
    }

    results
}

/// Intersection of two circular arcs in 2D.
///
/// Returns a vector of `(point, t1, t2)` where `t1` and `t2` are arc parameters in `[0, 1]`.
/// Coincident arcs (same center and radius) report the endpoints of their
/// shared angular range.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn arc_arc_intersect_2d(
    c1: &Point2,
    r1: f64,
    start1: f64,
    sweep1: f64,
    c2: &Point2,
    r2: f64,
    start2: f64,
    sweep2: f64,
) -> Vec<(Point2, f64, f64)> {
    let mut results = Vec::new();
    if r1 < TOLERANCE || r2 < TOLERANCE {
        return results;
    }

    let dc = c2 - c1;
    let dist_sq = dc.norm_squared();
    let dist = dist_sq.sqrt();
    let scale = r1.max(r2).max(1.0);

    if dist < TOLERANCE * scale {
        if (r1 - r2).abs() < 1e-9 * scale {
            // Same circle: every arc endpoint lying on the other arc is shared.
            overlap_endpoints(c1, r1, (start1, sweep1), (start2, sweep2), &mut results);
        }
        return results;
    }

    // Check if circles intersect.
    let sum = r1 + r2;
    let diff = (r1 - r2).abs();
    if dist > sum + 1e-9 * scale || dist < diff - 1e-9 * scale {
        return results;
    }

    // Distance from c1 along the line c1→c2 to the radical line.
    let a = (r1 * r1 - r2 * r2 + dist_sq) / (2.0 * dist);
    let h_sq = r1 * r1 - a * a;
    if h_sq < -1e-9 * scale * scale {
        return results;
    }
    let h = h_sq.max(0.0).sqrt();

    let m = c1 + dc * (a / dist);
    let perp = nalgebra::Vector2::new(-dc.y / dist, dc.x / dist);

    // Two candidate intersection points (or one if tangent).
    let candidates = if h < 1e-9 * scale {
        vec![m]
    } else {
        vec![m + perp * h, m - perp * h]
    };

    for p in candidates {
        let angle1 = (p.y - c1.y).atan2(p.x - c1.x);
        let angle2 = (p.y - c2.y).atan2(p.x - c2.x);

        if let (Some(t1), Some(t2)) = (
            angle_to_arc_param(angle1, start1, sweep1),
            angle_to_arc_param(angle2, start2, sweep2),
        ) {
            results.push((p, t1, t2));
        }
    }

    results
}

fn overlap_endpoints(
    center: &Point2,
    radius: f64,
    arc1: (f64, f64),
    arc2: (f64, f64),
    out: &mut Vec<(Point2, f64, f64)>,
) {
    let ends = [
        arc1.0,
        arc1.0 + arc1.1,
        arc2.0,
        arc2.0 + arc2.1,
    ];
    for angle in ends {
        let (Some(t1), Some(t2)) = (
            angle_to_arc_param(angle, arc1.0, arc1.1),
            angle_to_arc_param(angle, arc2.0, arc2.1),
        ) else {
            continue;
        };
        let p = Point2::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
        if out.iter().all(|(q, _, _)| (q - p).norm() > 1e-9 * radius.max(1.0)) {
            out.push((p, t1, t2));
        }
    }
}

/// Converts an absolute angle to an arc parameter `t` in `[0, 1]`.
///
/// Returns `None` if the angle is not within the arc's angular range.
#[must_use]
pub fn angle_to_arc_param(angle: f64, start_angle: f64, sweep: f64) -> Option<f64> {
    let eps = TOLERANCE * 100.0;

    let mut delta = angle - start_angle;

    // Normalize delta to match the sweep direction.
    if sweep > 0.0 {
        while delta < -eps {
            delta += 2.0 * PI;
        }
        while delta > 2.0 * PI + eps {
            delta -= 2.0 * PI;
        }
    } else {
        while delta > eps {
            delta -= 2.0 * PI;
        }
        while delta < -2.0 * PI - eps {
            delta += 2.0 * PI;
        }
    }

    let t = delta / sweep;
    if t >= -eps && t <= 1.0 + eps {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}
